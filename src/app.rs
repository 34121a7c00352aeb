mod approot;
pub mod outfmt;

pub use self::approot::*;

pub const ACB_GAINS_APP_VERSION: &str = env!("CARGO_PKG_VERSION");
