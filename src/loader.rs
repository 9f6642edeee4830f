use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, StringRecord};

use crate::config::{ascii_byte, LoaderConfig};
use crate::logger::{debug, info, warn};
use crate::record::{Record, FIELD_COUNT};
use crate::store::Store;

/// How many rejected rows a [`LoadReport`] keeps for display.
pub const REJECT_SAMPLE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    pub delimiter: u8,
    pub quote: u8,
    pub has_header: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { delimiter: b',', quote: b'\'', has_header: true }
    }
}

impl TryFrom<&LoaderConfig> for LoadOptions {
    type Error = anyhow::Error;

    fn try_from(c: &LoaderConfig) -> Result<Self> {
        Ok(Self {
            delimiter: ascii_byte(c.delimiter, "delimiter")?,
            quote: ascii_byte(c.quote, "quote")?,
            has_header: c.has_header,
        })
    }
}

/// A data row that was not stored because it did not have ten fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    pub line: u64,
    pub field_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub header: Option<Vec<String>>,
    pub inserted: usize,
    pub rejected: usize,
    /// The first [`REJECT_SAMPLE`] rejected rows.
    pub rejected_sample: Vec<RejectedRow>,
}

impl LoadReport {
    fn reject(&mut self, row: RejectedRow) {
        self.rejected += 1;
        if self.rejected_sample.len() < REJECT_SAMPLE {
            self.rejected_sample.push(row);
        }
    }
}

/// Replaces the contents of a store with the rows of a delimited file.
pub struct Loader {
    options: LoadOptions,
}

impl Loader {
    pub fn new(options: LoadOptions) -> Result<Self> {
        if options.delimiter == options.quote {
            bail!(
                "delimiter and quote must differ, both are {:?}",
                options.delimiter as char
            );
        }
        Ok(Self { options })
    }

    pub fn load(&self, input: &Path, store: &mut Store) -> Result<LoadReport> {
        let file = File::open(input)
            .with_context(|| format!("failed to open input {}", input.display()))?;
        info(&format!(
            "loading {} into {}",
            input.display(),
            store.path().display()
        ));
        self.load_from_reader(file, store)
            .with_context(|| format!("failed to load {}", input.display()))
    }

    /// Create the table if needed, clear it, and insert every ten-field row.
    /// All of it commits at once; an error leaves the previous rows untouched.
    pub fn load_from_reader<R: Read>(&self, reader: R, store: &mut Store) -> Result<LoadReport> {
        let mut reader = BufReader::new(reader);
        let mut report = LoadReport::default();
        // The csv reader skips empty lines, so a blank first line would let the
        // real header through as the header. Take it off here instead.
        let blank_header = self.options.has_header && take_blank_line(&mut reader)?;
        if blank_header {
            debug("loader: header line is empty");
            report.header = Some(Vec::new());
        }
        let line_offset = u64::from(blank_header);

        let mut rdr = ReaderBuilder::new()
            .delimiter(self.options.delimiter)
            .quote(self.options.quote)
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        store.ensure_table()?;
        let mut tx = store.replace_all()?;
        let mut row = StringRecord::new();
        let mut first = !blank_header;

        while rdr
            .read_record(&mut row)
            .with_context(|| format!("failed to read record after line {}", rdr.position().line()))?
        {
            let line = row.position().map_or(0, |p| p.line()) + line_offset;
            if first && self.options.has_header {
                first = false;
                debug(&format!("loader: skipping header with {} fields", row.len()));
                report.header = Some(row.iter().map(str::to_string).collect());
                continue;
            }
            first = false;

            if row.len() != FIELD_COUNT {
                debug(&format!(
                    "loader: rejecting line {} with {} fields",
                    line,
                    row.len()
                ));
                report.reject(RejectedRow { line, field_count: row.len() });
                continue;
            }
            tx.insert(&Record::try_from(&row)?)?;
        }

        report.inserted = tx.commit()?;
        info(&format!(
            "loader: inserted {} records, rejected {}",
            report.inserted, report.rejected
        ));
        if report.rejected > 0 {
            warn(&format!(
                "loader: {} rows did not have {} fields",
                report.rejected, FIELD_COUNT
            ));
        }
        Ok(report)
    }
}

/// Consume the first line if it is empty. Returns whether it was.
fn take_blank_line<R: BufRead>(reader: &mut R) -> Result<bool> {
    let buf = reader.fill_buf().context("failed to read input")?;
    let n = if buf.starts_with(b"\r\n") {
        2
    } else if buf.starts_with(b"\n") || buf.starts_with(b"\r") {
        1
    } else {
        return Ok(false);
    };
    reader.consume(n);
    Ok(true)
}
