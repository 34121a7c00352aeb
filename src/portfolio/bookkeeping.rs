mod engine;
mod error;
mod gain_aggregator;
mod ledger;
mod superficial_loss;

pub use self::engine::*;
pub use self::error::*;
pub use self::gain_aggregator::*;
pub use self::ledger::*;
pub use self::superficial_loss::{
    get_first_day_in_superficial_loss_period,
    get_last_day_in_superficial_loss_period,
    SflOutcome,
};
