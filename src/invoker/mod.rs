//! External process invocation
//!
//! Builds `javac`/`java` command lines and runs test classes.

mod command;
mod java;

pub use command::{CommandBuilder, CompileSources, JavaCommand};
pub use java::{Invoker, JavaInvoker};
