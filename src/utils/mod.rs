pub mod logging;
pub mod precision;
pub mod stopwatch;
