//! Test execution engine
//!
//! Compilation plus sequential and bounded-parallel test execution.

mod compiler;
mod pool;
mod runner;

pub use compiler::Compiler;
pub use pool::{effective_limit, ProcessPool};
pub use runner::TestRunner;
