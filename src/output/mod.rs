//! Output formatting module
//!
//! Renders run summaries for the terminal and for result files.

mod formatter;

pub use formatter::{write_summary_to_file, OutputFormat, ResultFormatter};
