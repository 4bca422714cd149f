//! Output formatters for run results
//!
//! Provides table, JSON, CSV and one-line summary formats.

use std::io::Write;

use crate::models::{ItemOutcome, ItemStatus, RunSummary};

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    JsonPretty,
    Csv,
    Summary,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "csv" => Some(OutputFormat::Csv),
            "summary" => Some(OutputFormat::Summary),
            _ => None,
        }
    }
}

/// Result formatter
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    fn status_label(&self, status: ItemStatus) -> String {
        let label = format!("{} {}", status.symbol(), status);
        if !self.colorize {
            return label;
        }
        let color = match status {
            ItemStatus::Pass => "32",
            ItemStatus::Timeout => "33",
            ItemStatus::Fail | ItemStatus::Error => "31",
        };
        format!("\x1b[{color}m{label}\x1b[0m")
    }

    fn format_outcome_table(&self, outcome: &ItemOutcome) -> String {
        format!(
            "{:40} {:10} [{:>7}ms]",
            outcome.target,
            self.status_label(outcome.status),
            outcome.duration_ms
        )
    }

    /// Format a run summary
    pub fn format_summary(&self, summary: &RunSummary) -> String {
        match self.format {
            OutputFormat::Table => self.format_summary_table(summary),
            OutputFormat::Json => serde_json::to_string(summary).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(summary).unwrap_or_default(),
            OutputFormat::Csv => format_summary_csv(summary),
            OutputFormat::Summary => format_summary_brief(summary),
        }
    }

    fn format_summary_table(&self, summary: &RunSummary) -> String {
        let mut output = String::new();

        output.push_str("\n╔══════════════════════════════════════════════════════════════╗\n");
        output.push_str(&format!(
            "║  XLT run {}  (max {} concurrent)\n",
            summary.started_at.format("%Y-%m-%d %H:%M:%S"),
            summary.concurrency
        ));
        output.push_str("╠══════════════════════════════════════════════════════════════╣\n");

        for outcome in &summary.outcomes {
            output.push_str(&format!("║  {}\n", self.format_outcome_table(outcome)));
            if let Some(message) = &outcome.message {
                output.push_str(&format!("║      {message}\n"));
            }
        }

        output.push_str("╠══════════════════════════════════════════════════════════════╣\n");
        output.push_str(&format!(
            "║  Total: {} | Pass: {} | Fail: {} | Error: {} | Timeout: {}\n",
            summary.total, summary.passed, summary.failed, summary.errors, summary.timeouts
        ));

        let verdict = match (summary.success, self.colorize) {
            (true, true) => "\x1b[32mOK\x1b[0m".to_string(),
            (false, true) => "\x1b[31mFAILED\x1b[0m".to_string(),
            (true, false) => "OK".to_string(),
            (false, false) => "FAILED".to_string(),
        };
        output.push_str(&format!(
            "║  Result: {} | Pass Rate: {:5.1}% | Peak: {} | Duration: {}ms\n",
            verdict,
            summary.pass_rate(),
            summary.peak_active,
            summary.total_duration_ms
        ));
        output.push_str("╚══════════════════════════════════════════════════════════════╝\n");

        output
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(OutputFormat::Table)
    }
}

fn format_outcome_csv(outcome: &ItemOutcome) -> String {
    format!(
        "{},{},{},\"{}\"",
        outcome.target,
        outcome.status,
        outcome.duration_ms,
        outcome.message.as_deref().unwrap_or("").replace('"', "\"\"")
    )
}

fn format_summary_csv(summary: &RunSummary) -> String {
    let mut output = String::from("target,status,duration_ms,message\n");
    for outcome in &summary.outcomes {
        output.push_str(&format_outcome_csv(outcome));
        output.push('\n');
    }
    output
}

fn format_summary_brief(summary: &RunSummary) -> String {
    format!(
        "{}: {}/{} passed ({:.1}%) in {}ms, peak {} concurrent",
        if summary.success { "OK" } else { "FAILED" },
        summary.passed,
        summary.total,
        summary.pass_rate(),
        summary.total_duration_ms,
        summary.peak_active
    )
}

/// Write a run summary to a file, without colors
pub fn write_summary_to_file(
    path: &str,
    summary: &RunSummary,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let formatter = ResultFormatter::new(format).no_color();
    let content = formatter.format_summary(summary);

    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    fn summary() -> RunSummary {
        RunSummary::new(
            Utc::now(),
            2,
            2,
            vec![
                ItemOutcome::pass("shop.TSearch", 1200),
                ItemOutcome::error("shop.TCart", 3, "Failed to spawn `java`: \"not found\""),
            ],
        )
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("TABLE"), Some(OutputFormat::Table));
        assert_eq!(OutputFormat::from_str("unknown"), None);
    }

    #[test]
    fn test_format_summary_csv_escapes_quotes() {
        let output = ResultFormatter::new(OutputFormat::Csv).format_summary(&summary());
        let lines: Vec<_> = output.lines().collect();

        assert_eq!(lines[0], "target,status,duration_ms,message");
        assert_eq!(lines[1], "shop.TSearch,PASS,1200,\"\"");
        assert!(lines[2].contains("\"\"not found\"\""));
    }

    #[test]
    fn test_format_summary_brief() {
        let output = ResultFormatter::new(OutputFormat::Summary).format_summary(&summary());
        assert!(output.starts_with("FAILED: 1/2 passed"));
    }

    #[test]
    fn test_table_without_color() {
        let output = ResultFormatter::new(OutputFormat::Table)
            .no_color()
            .format_summary(&summary());
        assert!(output.contains("shop.TSearch"));
        assert!(output.contains("Result: FAILED"));
        assert!(!output.contains("\x1b["));
    }

    #[test]
    fn test_write_summary_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.json");

        write_summary_to_file(path.to_str().unwrap(), &summary(), OutputFormat::Json).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["total"], 2);
        assert_eq!(json["success"], false);
        assert_eq!(json["outcomes"][1]["status"], "error");
    }
}
