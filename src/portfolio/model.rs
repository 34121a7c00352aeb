pub mod currency;
pub mod gain;
pub mod tx;
