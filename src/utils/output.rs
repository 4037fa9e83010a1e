//! Report output in text, JSON or CSV.
//!
//! Listings go to stdout unless an output file is given.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use std::fs::File;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned columns for the terminal
    #[default]
    Text,
    Json,
    Csv,
}

/// Rows rendered as text or CSV
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<&'static str>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Render as space-padded columns
    pub fn render_text(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.len()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.len());
                }
            }
        }

        let line = |cells: Vec<&str>| {
            cells
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:<width$}", c, width = w))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut out = line(self.headers.clone());
        out.push('\n');
        let dashes: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&line(dashes.iter().map(String::as_str).collect()));
        out.push('\n');
        for row in &self.rows {
            out.push_str(&line(row.iter().map(String::as_str).collect()));
            out.push('\n');
        }
        out
    }
}

fn open_writer(output: Option<&str>) -> Result<Box<dyn Write>> {
    Ok(match output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create output file: {}", path))?,
        ),
        None => Box::new(io::stdout()),
    })
}

/// Write a listing in the requested format.
///
/// `json` is the structured form of the same data shown in `table`.
pub fn emit<T: Serialize + ?Sized>(
    output: Option<&str>,
    format: OutputFormat,
    json: &T,
    table: &Table,
) -> Result<()> {
    let mut writer = open_writer(output)?;

    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, json).context("Failed to write JSON")?;
            writeln!(writer)?;
        }
        OutputFormat::Csv => {
            let mut csv_writer = csv::Writer::from_writer(&mut writer);
            csv_writer.write_record(&table.headers)?;
            for row in &table.rows {
                csv_writer.write_record(row)?;
            }
            csv_writer.flush()?;
        }
        OutputFormat::Text => {
            writer.write_all(table.render_text().as_bytes())?;
        }
    }
    writer.flush()?;

    if let Some(path) = output {
        eprintln!("Output written to: {}", path);
    }
    Ok(())
}
