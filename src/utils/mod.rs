//! Utility helpers
//!
//! Logging setup and timing.

pub mod logger;
mod timer;

pub use timer::{Stopwatch, Timer};
