pub mod basic;
pub mod date;
pub mod decimal;
pub mod http;
pub mod rc;
pub mod rw;
pub mod sys;

#[cfg(not(target_arch = "wasm32"))]
pub mod os;
