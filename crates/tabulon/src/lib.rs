//! # tabulon
//!
//! Spreadsheet engine for terminal frontends: a formula language with
//! Excel-style semantics over exact decimal arithmetic, and a segmented
//! document model with lazy cell typing and circular-reference detection.
//!
//! ```
//! use tabulon::prelude::*;
//!
//! let mut doc = Document::new();
//! let sheet = doc.new_sheet("")?;
//! doc.set_cell(sheet, 0, 0, "2")?;
//! doc.set_cell(sheet, 0, 1, "3")?;
//! doc.set_cell(sheet, 1, 0, "=A1*A2")?;
//! assert_eq!(doc.cell_display(sheet, 1, 0), "6");
//! # Ok::<(), tabulon::Error>(())
//! ```

pub use tabulon_common as common;
pub use tabulon_core as core;
pub use tabulon_csv as csv;
pub use tabulon_formula as formula;

pub use tabulon_common::{CellAddress, CellReference, Error, Result, Value};
pub use tabulon_core::{Cell, Document, Rect, Sheet};

/// The types most callers need.
pub mod prelude {
    pub use tabulon_common::{CellAddress, CellReference, Error, Result, Value};
    pub use tabulon_core::{Cell, Content, Document, Rect, Segment, Sheet};
    pub use tabulon_csv::{CsvReadOptions, CsvWriteOptions};
}
