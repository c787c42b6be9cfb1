//! Rendering of status records
//!
//! Every command produces [`StatusRecord`]s. They are written to stdout one
//! by one as colored human lines, JSON lines, or CSV rows.

mod formatters;

pub use formatters::{CsvFormatter, HumanFormatter, JsonFormatter};

use anyhow::Result;
use dsman_core::StatusRecord;
use std::io::Write;

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Csv,
}

impl OutputFormat {
    /// Parse output format from string
    pub fn from_string(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "human" | "text" => Ok(Self::Human),
            "json" | "json-lines" | "jsonl" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => anyhow::bail!("Unknown output format: {}", s),
        }
    }
}

/// Trait for record formatters
pub trait RecordFormatter: Send + Sync {
    /// Text written before the first record, if any
    fn header(&self) -> Result<Option<String>> {
        Ok(None)
    }

    /// Format a single record as one line, without trailing newline
    fn format_record(&self, record: &StatusRecord) -> Result<String>;
}

/// Create a formatter based on output format
pub fn create_formatter(format: OutputFormat, use_color: bool) -> Box<dyn RecordFormatter> {
    match format {
        OutputFormat::Human => Box::new(HumanFormatter::new(use_color)),
        OutputFormat::Json => Box::new(JsonFormatter::new()),
        OutputFormat::Csv => Box::new(CsvFormatter::new()),
    }
}

/// Write all records to `out`
pub fn write_records<W: Write>(
    out: &mut W,
    formatter: &dyn RecordFormatter,
    records: &[StatusRecord],
) -> Result<()> {
    if let Some(header) = formatter.header()? {
        writeln!(out, "{header}")?;
    }
    for record in records {
        writeln!(out, "{}", formatter.format_record(record)?)?;
    }
    out.flush()?;
    Ok(())
}
