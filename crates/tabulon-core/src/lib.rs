//! # tabulon-core
//!
//! The document model: [`Document`] owns sheets, a sheet stores its cells
//! in rectangular [`Segment`]s, and each [`Cell`] lazily derives a typed
//! content from the text the user typed. Formula cells parse and evaluate
//! through `tabulon-formula`, with every cell reference interned in the
//! document's [`RefArena`].

pub mod cell;
pub mod document;
pub mod registry;
pub mod segment;
pub mod sheet;

pub use cell::{Cell, Content};
pub use document::Document;
pub use registry::{RefArena, RefId};
pub use segment::{Rect, Segment};
pub use sheet::{Sheet, DEFAULT_COL_SIZE, DEFAULT_ROW_SIZE};
