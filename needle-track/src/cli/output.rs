//! Output formatting for CLI commands

use crate::ingest::IngestReport;
use crate::store::TransientRecord;
use colored::Colorize;
use serde::Serialize;
use std::fmt::Display;

/// Supported output formats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
    /// Plain text (minimal formatting)
    Plain,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "plain" => Ok(OutputFormat::Plain),
            _ => Err(format!(
                "Unknown output format '{}'. Valid options: table, json, plain",
                s
            )),
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Plain => write!(f, "plain"),
        }
    }
}

/// Compact flag summary, e.g. `new,updated`; `-` when no flag is set.
pub fn flags_summary(record: &TransientRecord) -> String {
    let flags: Vec<&str> = [
        (record.is_new, "new"),
        (record.is_updated, "updated"),
        (record.is_followup, "followup"),
        (record.is_removed, "removed"),
        (record.annotation_status, "annotated"),
    ]
    .into_iter()
    .filter_map(|(set, name)| set.then_some(name))
    .collect();

    if flags.is_empty() {
        "-".to_string()
    } else {
        flags.join(",")
    }
}

/// Output formatter for consistent CLI output
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Plain => println!("{}", message),
            OutputFormat::Table => {
                println!("{} {}", "✓".green(), message);
            }
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        match self.format {
            OutputFormat::Json => {
                eprintln!(
                    "{}",
                    serde_json::json!({"status": "error", "message": message})
                );
            }
            OutputFormat::Plain => eprintln!("{}", message),
            OutputFormat::Table => {
                eprintln!("{} {}", "✗".red(), message);
            }
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        match self.format {
            OutputFormat::Json => {
                eprintln!(
                    "{}",
                    serde_json::json!({"status": "warning", "message": message})
                );
            }
            _ => {
                eprintln!("{} {}", "⚠".yellow(), message);
            }
        }
    }

    /// Print data as JSON
    pub fn json<T: Serialize>(&self, data: &T) {
        match serde_json::to_string_pretty(data) {
            Ok(json) => println!("{}", json),
            Err(e) => self.error(&format!("Failed to serialize to JSON: {}", e)),
        }
    }

    /// Print a simple key-value pair
    pub fn kv(&self, key: &str, value: &str) {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::json!({key: value}));
            }
            OutputFormat::Table => {
                println!("{}: {}", key.cyan(), value);
            }
            OutputFormat::Plain => {
                println!("{}: {}", key, value);
            }
        }
    }

    /// Print a table header
    pub fn table_header(&self, columns: &[&str]) {
        if self.format == OutputFormat::Table {
            let header: Vec<_> = columns.iter().map(|c| c.bold().to_string()).collect();
            println!("{}", header.join("  "));
            println!("{}", "-".repeat(columns.iter().map(|c| c.len() + 2).sum()));
        }
    }

    /// Print a table row
    pub fn table_row(&self, values: &[&str]) {
        match self.format {
            OutputFormat::Table => println!("{}", values.join("  ")),
            OutputFormat::Plain => println!("{}", values.join("\t")),
            OutputFormat::Json => {}
        }
    }

    /// Print a section title
    pub fn section(&self, title: &str) {
        match self.format {
            OutputFormat::Table => {
                println!();
                println!("{}", title.bold().underline());
                println!();
            }
            OutputFormat::Plain => {
                println!();
                println!("{}", title);
                println!();
            }
            _ => {}
        }
    }

    /// Print a list item
    pub fn list_item(&self, item: &str) {
        match self.format {
            OutputFormat::Table => {
                println!("  {} {}", "•".cyan(), item);
            }
            _ => {
                println!("  - {}", item);
            }
        }
    }

    /// Print every field of one record
    pub fn record(&self, record: &TransientRecord) {
        if self.format == OutputFormat::Json {
            self.json(record);
            return;
        }

        self.section(&record.object_id);
        self.kv("Link", &record.link);
        self.kv("Tags", &display_tags(&record.tags));
        self.kv("Flags", &flags_summary(record));
        self.kv("Created", &record.created_at.to_rfc3339());
        self.kv("Updated", &record.updated_at.to_rfc3339());
        self.kv("Properties", &record.properties.to_string());
        if record.comments.is_empty() {
            self.kv("Comments", "(none)");
        } else {
            self.kv("Comments", &record.comments.len().to_string());
            for comment in &record.comments {
                self.list_item(&format!("[{}] {}", comment.timestamp.to_rfc3339(), comment.text));
            }
        }
    }

    /// Print a result set, one row per record
    pub fn records(&self, records: &[TransientRecord]) {
        if self.format == OutputFormat::Json {
            self.json(&records);
            return;
        }
        if records.is_empty() {
            self.success("No matching records");
            return;
        }

        self.table_header(&["OBJECT ID", "TAGS", "FLAGS", "UPDATED"]);
        for record in records {
            let tags = display_tags(&record.tags);
            let flags = flags_summary(record);
            let updated = record.updated_at.to_rfc3339();
            self.table_row(&[record.object_id.as_str(), tags.as_str(), flags.as_str(), updated.as_str()]);
        }
        if self.format == OutputFormat::Table {
            println!();
            println!("{} record(s)", records.len());
        }
    }

    /// Print an ingestion report
    pub fn report(&self, report: &IngestReport) {
        match self.format {
            OutputFormat::Json => self.json(report),
            _ => {
                self.section("Ingestion Report");
                self.kv("inserted", &report.inserted.to_string());
                self.kv("updated", &report.updated.to_string());
                self.kv("no_change", &report.no_change.to_string());
                if report.skipped > 0 {
                    self.kv("skipped", &report.skipped.to_string());
                }
            }
        }
    }
}

fn display_tags(tags: &[String]) -> String {
    if tags.is_empty() {
        "-".to_string()
    } else {
        tags.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn record() -> TransientRecord {
        let now = Utc::now();
        TransientRecord {
            object_id: "ZTF21aa".to_string(),
            properties: json!({}),
            tags: vec![],
            comments: vec![],
            annotation_status: false,
            link: String::new(),
            is_followup: false,
            is_new: true,
            is_removed: false,
            is_updated: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn output_format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("plain".parse::<OutputFormat>(), Ok(OutputFormat::Plain));
        assert!("rtfs".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn flags_summary_lists_set_flags() {
        let mut r = record();
        assert_eq!(flags_summary(&r), "new");
        r.is_updated = true;
        r.is_removed = true;
        assert_eq!(flags_summary(&r), "new,updated,removed");
        r.is_new = false;
        r.is_updated = false;
        r.is_removed = false;
        assert_eq!(flags_summary(&r), "-");
    }
}
