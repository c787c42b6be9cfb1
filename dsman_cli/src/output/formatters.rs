use super::RecordFormatter;
use anyhow::Result;
use colored::*;
use dsman_core::{Status, StatusRecord};

/// Formatter for human-readable output
///
/// One line per record: `action(status): path [message]`.
pub struct HumanFormatter {
    use_color: bool,
}

impl HumanFormatter {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    fn colorize(&self, text: &str, color: fn(&str) -> ColoredString) -> String {
        if self.use_color {
            color(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn status(&self, status: Status) -> String {
        let text = status.as_str();
        match status {
            Status::Ok => self.colorize(text, |s| s.green()),
            Status::NotNeeded => self.colorize(text, |s| s.yellow()),
            Status::Impossible | Status::Error => self.colorize(text, |s| s.red().bold()),
        }
    }
}

impl RecordFormatter for HumanFormatter {
    fn format_record(&self, record: &StatusRecord) -> Result<String> {
        let mut line = format!(
            "{}({}): {}",
            self.colorize(&record.action, |s| s.bold()),
            self.status(record.status),
            record.path.display()
        );

        if let Some(project) = &record.project {
            line.push_str(&format!(" -> {}", self.colorize(project, |s| s.cyan())));
        } else if let Some(url) = &record.url {
            line.push_str(&format!(" -> {}", self.colorize(url, |s| s.cyan())));
        }
        if let Some(message) = &record.message {
            line.push_str(&format!(" [{message}]"));
        }

        Ok(line)
    }
}

/// JSON Lines formatter for machine-readable output
#[derive(Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl RecordFormatter for JsonFormatter {
    fn format_record(&self, record: &StatusRecord) -> Result<String> {
        Ok(serde_json::to_string(record)?)
    }
}

/// CSV formatter for tabular output
#[derive(Default)]
pub struct CsvFormatter;

impl CsvFormatter {
    pub fn new() -> Self {
        Self
    }

    fn get_headers() -> Vec<&'static str> {
        vec![
            "action", "path", "type", "status", "message", "refds", "site", "sibling", "project",
            "name", "url",
        ]
    }

    fn record_to_row(record: &StatusRecord) -> Vec<String> {
        let optional = |value: Option<&str>| value.unwrap_or_default().to_string();
        let optional_path = |value: Option<&std::path::Path>| {
            value
                .map(|path| path.display().to_string())
                .unwrap_or_default()
        };

        vec![
            record.action.clone(),
            record.path.display().to_string(),
            match record.record_type {
                dsman_core::status::RecordType::Dataset => "dataset".to_string(),
                dsman_core::status::RecordType::File => "file".to_string(),
            },
            record.status.as_str().to_string(),
            optional(record.message.as_deref()),
            optional_path(record.refds.as_deref()),
            optional(record.site.as_deref()),
            optional(record.sibling.as_deref()),
            optional(record.project.as_deref()),
            optional(record.name.as_deref()),
            optional(record.url.as_deref()),
        ]
    }

    fn write_row<I, T>(row: I) -> Result<String>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let mut wtr = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(vec![]);
        wtr.write_record(row)?;
        let data = wtr.into_inner()?;
        Ok(String::from_utf8(data)?.trim_end_matches('\n').to_string())
    }
}

impl RecordFormatter for CsvFormatter {
    fn header(&self) -> Result<Option<String>> {
        Ok(Some(Self::write_row(Self::get_headers())?))
    }

    fn format_record(&self, record: &StatusRecord) -> Result<String> {
        Self::write_row(Self::record_to_row(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> StatusRecord {
        StatusRecord::ok("create_sibling_gitlab", "/data/root")
            .with_site("theone")
            .with_project("secret/sub")
            .with_message("dry run, no project created")
    }

    #[test]
    fn test_human_line_without_color() {
        let line = HumanFormatter::new(false).format_record(&record()).unwrap();
        assert_eq!(
            line,
            "create_sibling_gitlab(ok): /data/root -> secret/sub [dry run, no project created]"
        );
    }

    #[test]
    fn test_json_line_omits_absent_fields() {
        let line = JsonFormatter::new().format_record(&record()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["type"], "dataset");
        assert_eq!(value["project"], "secret/sub");
        assert!(value.get("url").is_none());
    }

    #[test]
    fn test_csv_row_quotes_commas() {
        let record = StatusRecord::error("clone", "/data/x").with_message("a, b");
        let row = CsvFormatter::new().format_record(&record).unwrap();
        assert_eq!(row, "clone,/data/x,dataset,error,\"a, b\",,,,,,");
    }
}
