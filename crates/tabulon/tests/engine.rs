//! End-to-end tests driving the public API: building documents, evaluating
//! formulas across sheets, extrapolation fills, and CSV round trips.

use pretty_assertions::assert_eq;
use tabulon::prelude::*;

fn set(doc: &mut Document, sheet: usize, name: &str, raw: &str) {
    let r = CellReference::parse(sheet, name).unwrap();
    doc.set_cell(sheet, r.addr.x, r.addr.y, raw).unwrap();
}

fn display(doc: &Document, sheet: usize, name: &str) -> String {
    let r = CellReference::parse(sheet, name).unwrap();
    doc.cell_display(sheet, r.addr.x, r.addr.y)
}

#[test]
fn formula_chain_across_sheets() {
    let mut doc = Document::new();
    let main = doc.new_sheet("").unwrap();
    let data = doc.new_sheet("Data").unwrap();

    set(&mut doc, data, "A1", "10");
    set(&mut doc, data, "A2", "32");
    set(&mut doc, main, "A1", "=SUM(Data!A1:A2)");
    set(&mut doc, main, "B1", "=A1*2");

    assert_eq!(display(&doc, main, "A1"), "42");
    assert_eq!(display(&doc, main, "B1"), "84");
}

#[test]
fn operators_and_functions() {
    let mut doc = Document::new();
    let s = doc.new_sheet("").unwrap();
    set(&mut doc, s, "A1", "=2+2*2");
    set(&mut doc, s, "A2", "=TRUE+TRUE");
    set(&mut doc, s, "A3", "=IF(A1>5; \"big\"; \"small\")");
    set(&mut doc, s, "A4", "=TRIM(\"  hi  \")");
    set(&mut doc, s, "A5", "=AVERAGE(1; 2; 3; 4)");

    assert_eq!(display(&doc, s, "A1"), "6");
    assert_eq!(display(&doc, s, "A2"), "2");
    assert_eq!(display(&doc, s, "A3"), "big");
    assert_eq!(display(&doc, s, "A4"), "hi");
    assert_eq!(display(&doc, s, "A5"), "2.5");
}

#[test]
fn errors_surface_as_cell_text() {
    let mut doc = Document::new();
    let s = doc.new_sheet("").unwrap();
    set(&mut doc, s, "A1", "=1/0");
    set(&mut doc, s, "A2", "=A2");
    set(&mut doc, s, "A3", "=NOPE()");
    set(&mut doc, s, "A4", "=Gone!B2");

    assert_eq!(display(&doc, s, "A1"), "division by zero");
    assert_eq!(display(&doc, s, "A2"), "circular reference");
    assert_eq!(display(&doc, s, "A3"), "function NOPE does not exist");
    assert_eq!(display(&doc, s, "A4"), "sheet does not exist");
}

#[test]
fn overflow_renders_as_cell_text() {
    let mut doc = Document::new();
    let s = doc.new_sheet("").unwrap();
    set(&mut doc, s, "A1", "9e27");
    set(&mut doc, s, "B1", "=A1*A1");
    set(&mut doc, s, "B2", "=2^100");

    assert_eq!(display(&doc, s, "B1"), "decimal overflow");
    assert_eq!(display(&doc, s, "B2"), "decimal overflow");
    // the document stays usable afterwards
    set(&mut doc, s, "C1", "=A1+1");
    assert_eq!(display(&doc, s, "C1"), "9000000000000000000000000001");
}

#[test]
fn extrapolated_column_follows_its_source() {
    let mut doc = Document::new();
    let s = doc.new_sheet("").unwrap();
    for (y, v) in ["1", "2", "3", "4"].iter().enumerate() {
        doc.set_cell(s, 0, y as u32, v).unwrap();
    }
    // B1 doubles A1; the fill extends it down the column
    doc.sheet_mut(s)
        .unwrap()
        .add_extrapolation_segment(Rect::new(1, 0, 1, 4), 0, 0, Cell::new("=A1*2"))
        .unwrap();

    for y in 0..4 {
        let expected = ((y + 1) * 2).to_string();
        assert_eq!(doc.cell_display(s, 1, y), expected);
    }
    // every synthesized cell re-renders with its own references
    assert_eq!(doc.cell_expression(s, 1, 3).unwrap(), "=A4*2");
}

#[test]
fn row_insertion_shifts_stored_cells() {
    let mut doc = Document::new();
    let s = doc.new_sheet("").unwrap();
    set(&mut doc, s, "A1", "first");
    set(&mut doc, s, "A2", "second");

    doc.sheet_mut(s).unwrap().insert_empty_row(1).unwrap();
    assert_eq!(display(&doc, s, "A1"), "first");
    assert_eq!(display(&doc, s, "A2"), "");
    assert_eq!(display(&doc, s, "A3"), "second");
}

#[test]
fn csv_round_trip_evaluates_formulas() {
    let input = "1,2,=A1+B1\n4,5,=SUM(A1:B2)\n";
    let doc = tabulon::csv::read(input.as_bytes(), &CsvReadOptions::default()).unwrap();

    let mut out = Vec::new();
    tabulon::csv::write(&doc, 0, &mut out, &CsvWriteOptions::default()).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "1,2,3\n4,5,12\n");
}

#[test]
fn reference_arena_tracks_document_edits() {
    let mut doc = Document::new();
    let s = doc.new_sheet("").unwrap();
    set(&mut doc, s, "A1", "=B1+B2");
    assert_eq!(display(&doc, s, "A1"), "0");
    assert_eq!(doc.live_ref_count(), 2);

    set(&mut doc, s, "A1", "=B1");
    assert_eq!(display(&doc, s, "A1"), "");
    assert_eq!(doc.live_ref_count(), 1);

    doc.clear_sheet(s).unwrap();
    assert_eq!(doc.live_ref_count(), 0);
}
