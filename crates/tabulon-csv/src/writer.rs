//! CSV export
//!
//! Writing dumps computed display values row by row: formulas come out as
//! their results, and cells that fail to evaluate come out as the error
//! message text, the same way the screen shows them.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tabulon_core::Document;

use crate::error::Result;
use crate::options::CsvWriteOptions;

/// Write one sheet of a document as CSV.
pub fn write<W: Write>(
    doc: &Document,
    sheet: usize,
    output: W,
    opts: &CsvWriteOptions,
) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(opts.delimiter)
        .from_writer(output);

    let (width, height) = doc.sheet(sheet)?.size();
    for y in 0..height {
        let record: Vec<String> = (0..width).map(|x| doc.cell_display(sheet, x, y)).collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_path<P: AsRef<Path>>(
    doc: &Document,
    sheet: usize,
    path: P,
    opts: &CsvWriteOptions,
) -> Result<()> {
    write(doc, sheet, File::create(path)?, opts)
}
