//! CSV import
//!
//! Reading produces a document with a single sheet backed by one static
//! segment of untyped cells. Typing (numbers, booleans, formulas) happens
//! lazily inside the document model on first access; the reader never
//! evaluates anything. Ragged rows are padded with empty cells.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tabulon_core::{Cell, Document, Rect};

use crate::error::Result;
use crate::options::CsvReadOptions;

/// Read CSV data into a fresh single-sheet document.
pub fn read<R: Read>(input: R, opts: &CsvReadOptions) -> Result<Document> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(opts.delimiter)
        .quote(opts.quote)
        .has_headers(false)
        .flexible(true)
        .from_reader(input);

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    let height = rows.len();
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);

    let mut doc = Document::new();
    let sheet = doc.new_sheet("")?;
    if width > 0 && height > 0 {
        // column-major grid; missing fields of short rows become empty cells
        let cells = (0..width)
            .map(|x| {
                (0..height)
                    .map(|y| Cell::new(rows[y].get(x).map(String::as_str).unwrap_or("")))
                    .collect()
            })
            .collect();
        doc.sheet_mut(sheet)?
            .add_static_segment(Rect::new(0, 0, width as u32, height as u32), cells)?;
    }
    Ok(doc)
}

pub fn read_path<P: AsRef<Path>>(path: P, opts: &CsvReadOptions) -> Result<Document> {
    read(File::open(path)?, opts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn read_str(data: &str) -> Document {
        read(data.as_bytes(), &CsvReadOptions::default()).unwrap()
    }

    #[test]
    fn test_read_basic() {
        let doc = read_str("1,2\n3,4\n");
        assert_eq!(doc.sheet(0).unwrap().size(), (2, 2));
        assert_eq!(doc.cell_display(0, 0, 0), "1");
        assert_eq!(doc.cell_display(0, 1, 1), "4");
    }

    #[test]
    fn test_read_preserves_raw_text() {
        let doc = read_str("=A2*2,x\n21,y\n");
        let cell = doc.sheet(0).unwrap().cell(0, 0).unwrap().into_owned();
        assert_eq!(cell.raw_value(), "=A2*2");
        // typing is lazy: the formula computes on display
        assert_eq!(doc.cell_display(0, 0, 0), "42");
    }

    #[test]
    fn test_read_ragged_rows() {
        let doc = read_str("a,b,c\nd\n");
        assert_eq!(doc.sheet(0).unwrap().size(), (3, 2));
        assert_eq!(doc.cell_display(0, 2, 0), "c");
        assert_eq!(doc.cell_display(0, 1, 1), "");
        assert_eq!(doc.cell_display(0, 2, 1), "");
    }

    #[test]
    fn test_read_empty_input() {
        let doc = read_str("");
        assert_eq!(doc.sheet_count(), 1);
        assert_eq!(doc.sheet(0).unwrap().size(), (0, 0));
    }

    #[test]
    fn test_read_custom_delimiter() {
        let opts = CsvReadOptions {
            delimiter: b';',
            ..CsvReadOptions::default()
        };
        let doc = read("a;b\n".as_bytes(), &opts).unwrap();
        assert_eq!(doc.cell_display(0, 1, 0), "b");
    }

    #[test]
    fn test_read_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "7,8\n").unwrap();
        let doc = read_path(&path, &CsvReadOptions::default()).unwrap();
        assert_eq!(doc.cell_display(0, 0, 0), "7");
        assert_eq!(doc.cell_display(0, 1, 0), "8");
    }
}
