//! Logging setup shared by the generator and the execution-time driver.
mod logger;
pub use logger::*;
