//! # tabulon-common
//!
//! Leaf types shared by the tabulon formula language and document model:
//! the error taxonomy, cell addresses and A1-name handling, the runtime
//! [`Value`] model with its casting rules, and the [`EvalContext`] that
//! carries cell lookups and circular-reference detection through an
//! evaluation.

pub mod addr;
pub mod context;
pub mod error;
pub mod value;

pub use addr::{column_to_letters, letters_to_column, CellAddress, CellReference};
pub use context::{CellSource, EvalContext, VisitGuard};
pub use error::{Error, Result};
pub use value::{Value, ValueKind};

/// Maximum number of rows a sheet can address
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns a sheet can address
pub const MAX_COLS: u32 = 16_384;

/// Maximum length of a sheet title, in characters
pub const MAX_SHEET_TITLE_LEN: usize = 31;
