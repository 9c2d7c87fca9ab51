//! # tabulon-csv
//!
//! CSV import/export for tabulon documents. Import builds a single static
//! segment of untyped cells; export writes computed display values, so a
//! read/write round trip evaluates every formula exactly once.

pub mod error;
pub mod options;
pub mod reader;
pub mod writer;

pub use error::{CsvError, Result};
pub use options::{CsvReadOptions, CsvWriteOptions};
pub use reader::{read, read_path};
pub use writer::{write, write_path};
