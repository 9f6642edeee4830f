use std::io::Write;

use anyhow::{Context, Result};

use crate::logger::debug;
use crate::record::Record;
use crate::store::Store;

/// Prints a bounded sample of stored records for manual checking.
pub struct Inspector {
    limit: usize,
}

impl Inspector {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    pub fn sample(&self, store: &Store) -> Result<Vec<Record>> {
        let records = store
            .fetch(self.limit)
            .with_context(|| format!("failed to read records from {}", store.path().display()))?;
        debug(&format!("inspector: fetched {} records", records.len()));
        Ok(records)
    }

    /// Write one `Record <n>: (...)` line per sampled record, numbered from 1.
    /// Returns how many lines were written.
    pub fn print<W: Write>(&self, store: &Store, out: &mut W) -> Result<usize> {
        let records = self.sample(store)?;
        for (i, record) in records.iter().enumerate() {
            writeln!(out, "Record {}: {}", i + 1, record)?;
        }
        out.flush()?;
        Ok(records.len())
    }
}
