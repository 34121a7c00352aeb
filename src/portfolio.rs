pub mod bookkeeping;
pub mod csv_common;
pub mod cumulative_gains;
pub mod io;
pub mod model;
pub mod render;
#[cfg(any(test, feature = "testlib"))]
pub mod testlib;

pub use self::cumulative_gains::*;
pub use self::model::currency::*;
pub use self::model::gain::*;
pub use self::model::tx::*;
