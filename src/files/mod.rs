//! Filesystem collaborators
//!
//! Glob based discovery of test sources and classes, and cleanup.

mod cleaner;
mod discovery;

pub use cleaner::{clean, delete_all_test_case_classes, delete_dir_recursive, delete_file};
pub use discovery::{find_matching, find_test_case_classes, find_test_case_sources};
