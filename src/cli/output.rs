//! Output formatting for decoded records.
//!
//! Records of one result share their column order, so headers are taken
//! from the first record.

use std::io::Write;

use clap::ValueEnum;
use frameflow_core::record::Record;
use frameflow_core::value::Value;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed table (default)
    Table,
    /// Comma-separated values
    Csv,
    /// JSON Lines (one JSON object per row)
    Json,
}

/// Formats records for output.
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    /// Create a new formatter with the specified format.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format records and write them to the given writer.
    pub fn write<W: Write>(&self, records: &[Record], writer: &mut W) -> std::io::Result<()> {
        match self.format {
            OutputFormat::Table => self.write_table(records, writer),
            OutputFormat::Csv => self.write_csv(records, writer, true),
            OutputFormat::Json => self.write_json(records, writer),
        }
    }

    /// Write rows only, for continuing output already started with [`write`].
    ///
    /// CSV skips the header line; the other formats are unchanged.
    ///
    /// [`write`]: OutputFormatter::write
    pub fn write_continuation<W: Write>(
        &self,
        records: &[Record],
        writer: &mut W,
    ) -> std::io::Result<()> {
        match self.format {
            OutputFormat::Csv => self.write_csv(records, writer, false),
            _ => self.write(records, writer),
        }
    }

    fn format_value(value: Option<&Value>) -> String {
        match value {
            None | Some(Value::Null) => String::new(),
            Some(value) => value.to_string(),
        }
    }

    fn headers(records: &[Record]) -> Vec<&str> {
        records
            .first()
            .map(|r| r.keys().collect())
            .unwrap_or_default()
    }

    fn write_table<W: Write>(&self, records: &[Record], writer: &mut W) -> std::io::Result<()> {
        use comfy_table::{Cell, Table};

        let headers = Self::headers(records);
        let mut table = Table::new();
        table.set_header(headers.iter().map(Cell::new));

        for record in records {
            let row: Vec<Cell> = headers
                .iter()
                .map(|name| Cell::new(Self::format_value(record.get(name))))
                .collect();
            table.add_row(row);
        }

        writeln!(writer, "{table}")
    }

    fn write_csv<W: Write>(
        &self,
        records: &[Record],
        writer: &mut W,
        header: bool,
    ) -> std::io::Result<()> {
        let headers = Self::headers(records);
        if header && !headers.is_empty() {
            let names: Vec<String> = headers.iter().map(|h| escape_csv(h)).collect();
            writeln!(writer, "{}", names.join(","))?;
        }

        for record in records {
            let values: Vec<String> = headers
                .iter()
                .map(|name| escape_csv(&Self::format_value(record.get(name))))
                .collect();
            writeln!(writer, "{}", values.join(","))?;
        }

        Ok(())
    }

    fn write_json<W: Write>(&self, records: &[Record], writer: &mut W) -> std::io::Result<()> {
        for record in records {
            writeln!(writer, "{}", record.to_json())?;
        }
        Ok(())
    }
}

fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<Record> {
        vec![
            [("State", Value::from("FLORIDA")), ("Count", Value::Int(3))]
                .into_iter()
                .collect(),
            [("State", Value::from("NEW YORK, NY")), ("Count", Value::Null)]
                .into_iter()
                .collect(),
        ]
    }

    fn render(format: OutputFormat) -> String {
        let mut output = Vec::new();
        OutputFormatter::new(format)
            .write(&records(), &mut output)
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_table_output() {
        let output = render(OutputFormat::Table);
        assert!(output.contains("State"));
        assert!(output.contains("FLORIDA"));
        assert!(output.contains("NEW YORK, NY"));
    }

    #[test]
    fn test_csv_output() {
        let output = render(OutputFormat::Csv);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines, vec!["State,Count", "FLORIDA,3", "\"NEW YORK, NY\","]);
    }

    #[test]
    fn test_csv_continuation_has_no_header() {
        let mut output = Vec::new();
        OutputFormatter::new(OutputFormat::Csv)
            .write_continuation(&records()[..1], &mut output)
            .unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "FLORIDA,3\n");
    }

    #[test]
    fn test_json_output_keeps_types() {
        let output = render(OutputFormat::Json);
        let first = output.lines().next().unwrap();
        assert_eq!(first, r#"{"State":"FLORIDA","Count":3}"#);
        assert!(output.contains(r#""Count":null"#));
    }

    #[test]
    fn test_empty_records() {
        assert_eq!(render_empty(OutputFormat::Csv), "");
        assert_eq!(render_empty(OutputFormat::Json), "");
    }

    fn render_empty(format: OutputFormat) -> String {
        let mut output = Vec::new();
        OutputFormatter::new(format).write(&[], &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }
}
