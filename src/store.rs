use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Connection, OpenFlags, Transaction};

use crate::logger::debug;
use crate::record::{Record, FIELD_COUNT};

pub const TABLE: &str = "records";

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS records (
    o TEXT,
    f TEXT,
    l TEXT,
    v TEXT,
    p TEXT,
    a TEXT,
    s TEXT,
    t TEXT,
    vo TEXT,
    ci TEXT
)";

const INSERT: &str = "INSERT INTO records VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)";

/// A SQLite file holding the `records` table.
pub struct Store {
    conn: Connection,
    path: PathBuf,
}

impl Store {
    /// Open for reading and writing, creating the file if missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug(&format!("store: opening {}", path.display()));
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open store {}", path.display()))?;
        Ok(Self { conn, path: path.to_path_buf() })
    }

    /// Open an existing store read-only. Fails if the file does not exist.
    pub fn open_existing(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug(&format!("store: opening {} read-only", path.display()));
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags)
            .with_context(|| format!("failed to open store {}", path.display()))?;
        Ok(Self { conn, path: path.to_path_buf() })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory store")?;
        Ok(Self { conn, path: PathBuf::from(":memory:") })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ensure_table(&self) -> Result<()> {
        self.conn
            .execute_batch(CREATE_TABLE)
            .with_context(|| format!("failed to create table {TABLE}"))
    }

    /// Start replacing the table contents. Existing rows are deleted inside
    /// the returned transaction; nothing is visible to other readers until
    /// [`Replace::commit`].
    pub fn replace_all(&mut self) -> Result<Replace<'_>> {
        let tx = self.conn.transaction().context("failed to begin transaction")?;
        let cleared = tx
            .execute("DELETE FROM records", [])
            .with_context(|| format!("failed to clear table {TABLE}"))?;
        debug(&format!("store: cleared {cleared} rows"));
        Ok(Replace { tx, inserted: 0 })
    }

    pub fn count(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))
            .with_context(|| format!("failed to count rows in {TABLE}"))?;
        Ok(n as usize)
    }

    /// First `limit` rows in whatever order SQLite returns them.
    pub fn fetch(&self, limit: usize) -> Result<Vec<Record>> {
        let mut stmt = self
            .conn
            .prepare("SELECT o, f, l, v, p, a, s, t, vo, ci FROM records LIMIT ?1")
            .with_context(|| format!("failed to query table {TABLE}"))?;
        // SQLite treats a negative LIMIT as unbounded
        let mut rows = stmt.query([i64::try_from(limit).unwrap_or(i64::MAX)])?;

        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(FIELD_COUNT);
            for i in 0..FIELD_COUNT {
                values.push(text_of(row.get_ref(i)?));
            }
            records.push(Record::from_values(values)?);
        }
        Ok(records)
    }

    pub fn close(self) -> Result<()> {
        let path = self.path;
        self.conn
            .close()
            .map_err(|(_, e)| e)
            .with_context(|| format!("failed to close store {}", path.display()))
    }
}

/// Open replace transaction returned by [`Store::replace_all`].
/// Dropping it without committing rolls back, leaving the old rows in place.
pub struct Replace<'a> {
    tx: Transaction<'a>,
    inserted: usize,
}

impl Replace<'_> {
    pub fn insert(&mut self, record: &Record) -> Result<()> {
        self.tx
            .prepare_cached(INSERT)?
            .execute(params_from_iter(record.fields().iter()))
            .with_context(|| format!("failed to insert into {TABLE}"))?;
        self.inserted += 1;
        Ok(())
    }

    pub fn commit(self) -> Result<usize> {
        self.tx.commit().context("failed to commit load")?;
        Ok(self.inserted)
    }
}

// stringify conservatively; rows written by other tools may hold non-text values
fn text_of(cell: ValueRef<'_>) -> String {
    match cell {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => format!("<blob {} bytes>", b.len()),
    }
}
