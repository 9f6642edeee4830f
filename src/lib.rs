//! Load delimited text files into a SQLite `records` table and print a
//! sample of what was stored.

pub mod config;
pub mod inspector;
pub mod loader;
pub mod logger;
pub mod record;
pub mod store;

pub use config::Config;
pub use inspector::Inspector;
pub use loader::{LoadOptions, LoadReport, Loader, RejectedRow};
pub use record::{Record, FIELD_COUNT, FIELD_NAMES};
pub use store::Store;
