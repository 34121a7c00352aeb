pub mod app;
pub mod cmd;
pub mod fx;
pub mod log;
pub mod portfolio;
pub mod tracing;
pub mod util;

extern crate lazy_static;

#[cfg(test)]
mod testlib;
