use std::fmt;

use anyhow::{bail, Result};
use csv::StringRecord;

/// Number of text columns every record carries.
pub const FIELD_COUNT: usize = 10;

/// Column names of the `records` table, in storage order.
///
/// The abbreviations come from the external schema the input files follow.
/// Their meaning is not documented, so they are kept as opaque names.
pub const FIELD_NAMES: [&str; FIELD_COUNT] = ["o", "f", "l", "v", "p", "a", "s", "t", "vo", "ci"];

/// One stored row: exactly ten text values, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    fields: [String; FIELD_COUNT],
}

impl Record {
    /// Build a record from any sequence of values. Fails unless there are exactly ten.
    pub fn from_values<I, S>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        let count = values.len();
        match <[String; FIELD_COUNT]>::try_from(values) {
            Ok(fields) => Ok(Self { fields }),
            Err(_) => bail!("expected {} fields, got {}", FIELD_COUNT, count),
        }
    }

    pub fn fields(&self) -> &[String; FIELD_COUNT] {
        &self.fields
    }

    /// Look up a value by column name.
    pub fn get(&self, name: &str) -> Option<&str> {
        FIELD_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.fields[i].as_str())
    }
}

impl TryFrom<&StringRecord> for Record {
    type Error = anyhow::Error;

    fn try_from(row: &StringRecord) -> Result<Self> {
        Record::from_values(row.iter())
    }
}

/// Renders as a tuple of quoted strings: `('a', 'b', ...)`.
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, value) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(&quote_text(value))?;
        }
        f.write_str(")")
    }
}

/// Quote a value the way it is shown on the console.
///
/// Single quotes unless the value holds a single quote and no double quote.
pub fn quote_text(value: &str) -> String {
    let quote = if value.contains('\'') && !value.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}
