//! Environment provisioning
//!
//! Java detection, XLT download/unpack and prerequisite checks.

mod archive;
mod download;
mod environment;

pub use download::Provisioner;
pub use environment::{check_prerequisites, java_version};
