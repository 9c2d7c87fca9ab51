//! Documents
//!
//! A document owns an ordered list of sheets, the shared reference arena,
//! and the notion of a current sheet. It implements [`CellSource`], which is
//! how formula evaluation reaches back into the document: Document → Sheet →
//! Segment → Cell, with every hop guarded against circular references by the
//! evaluation context.

use std::cell::RefCell;

use rust_decimal::Decimal;
use tabulon_common::{
    CellAddress, CellReference, CellSource, Error, EvalContext, Result, Value, MAX_SHEET_TITLE_LEN,
};

use crate::cell::{quote_sheet_title, Cell};
use crate::registry::RefArena;
use crate::sheet::Sheet;

const FORBIDDEN_TITLE_CHARS: [char; 7] = [':', '\\', '/', '?', '*', '[', ']'];

#[derive(Debug, Default)]
pub struct Document {
    sheets: Vec<Sheet>,
    current_sheet: usize,
    /// Monotonic counter feeding "Sheet N" auto-titles
    max_sheet_idx: usize,
    refs: RefCell<RefArena>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet and return its index. An empty title auto-generates
    /// `"Sheet N"`. Titles are limited to 31 characters, may not contain
    /// `: \ / ? * [ ]`, and must be unique ignoring case.
    pub fn new_sheet(&mut self, title: &str) -> Result<usize> {
        let title = if title.is_empty() {
            loop {
                self.max_sheet_idx += 1;
                let candidate = format!("Sheet {}", self.max_sheet_idx);
                if !self.title_taken(&candidate) {
                    break candidate;
                }
            }
        } else {
            self.validate_title(title)?;
            title.to_string()
        };
        let idx = self.sheets.len();
        self.sheets.push(Sheet::new(idx, title));
        Ok(idx)
    }

    /// Rename a sheet, applying the same validation as [`new_sheet`].
    ///
    /// [`new_sheet`]: Document::new_sheet
    pub fn rename_sheet(&mut self, idx: usize, title: &str) -> Result<()> {
        if !self
            .sheet(idx)?
            .title()
            .eq_ignore_ascii_case(title)
        {
            self.validate_title(title)?;
        }
        self.sheet_mut(idx)?.set_title(title.to_string());
        Ok(())
    }

    fn validate_title(&self, title: &str) -> Result<()> {
        if title.chars().count() > MAX_SHEET_TITLE_LEN {
            return Err(Error::name(format!(
                "sheet title exceeds {MAX_SHEET_TITLE_LEN} characters"
            )));
        }
        if let Some(c) = title.chars().find(|c| FORBIDDEN_TITLE_CHARS.contains(c)) {
            return Err(Error::name(format!(
                "sheet title contains forbidden character '{c}'"
            )));
        }
        if self.title_taken(title) {
            return Err(Error::name("duplicating sheet title"));
        }
        Ok(())
    }

    fn title_taken(&self, title: &str) -> bool {
        self.sheets
            .iter()
            .any(|s| s.title().eq_ignore_ascii_case(title))
    }

    pub fn sheet(&self, idx: usize) -> Result<&Sheet> {
        self.sheets
            .get(idx)
            .ok_or_else(|| Error::reference("sheet does not exist"))
    }

    pub fn sheet_mut(&mut self, idx: usize) -> Result<&mut Sheet> {
        self.sheets
            .get_mut(idx)
            .ok_or_else(|| Error::reference("sheet does not exist"))
    }

    /// Sheet index by title, ignoring case.
    pub fn sheet_index(&self, title: &str) -> Result<usize> {
        self.sheets
            .iter()
            .position(|s| s.title().eq_ignore_ascii_case(title))
            .ok_or_else(|| Error::name("sheet does not exist"))
    }

    pub fn sheet_title(&self, idx: usize) -> Result<&str> {
        Ok(self.sheet(idx)?.title())
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn current_sheet(&self) -> usize {
        self.current_sheet
    }

    pub fn set_current_sheet(&mut self, idx: usize) -> Result<()> {
        self.sheet(idx)?;
        self.current_sheet = idx;
        Ok(())
    }

    pub(crate) fn refs(&self) -> &RefCell<RefArena> {
        &self.refs
    }

    /// Live entries in the reference arena.
    pub fn live_ref_count(&self) -> usize {
        self.refs.borrow().live_count()
    }

    /// Resolve a cell name on the current sheet. Anchors are accepted and
    /// ignored.
    pub fn find_cell(&self, cell_name: &str) -> Result<CellReference> {
        CellReference::parse(self.current_sheet, cell_name)
    }

    /// Resolve a `title!name` pair to an address.
    pub fn to_address(&self, sheet_title: &str, cell_name: &str) -> Result<CellAddress> {
        let sheet = self.sheet_index(sheet_title)?;
        Ok(CellReference::parse(sheet, cell_name)?.addr)
    }

    /// Render an address as `Title!Name`, quoting the title when needed.
    pub fn from_address(&self, addr: CellAddress) -> Result<String> {
        let title = self.sheet_title(addr.sheet)?;
        let name = CellReference::new(addr).name();
        Ok(format!("{}!{}", quote_sheet_title(title), name))
    }

    /// Fresh evaluation context rooted at the current sheet.
    pub fn eval_context(&self) -> EvalContext<'_> {
        EvalContext::new(self, self.current_sheet)
    }

    pub fn set_cell(&mut self, sheet: usize, x: u32, y: u32, raw: &str) -> Result<()> {
        let Self { sheets, refs, .. } = self;
        let sheet = sheets
            .get_mut(sheet)
            .ok_or_else(|| Error::reference("sheet does not exist"))?;
        sheet.set_cell(x, y, Cell::new(raw), refs.get_mut())
    }

    /// Delete a row on a sheet, releasing the references of dropped cells.
    pub fn delete_row(&mut self, sheet: usize, y: u32) -> Result<()> {
        let Self { sheets, refs, .. } = self;
        let sheet = sheets
            .get_mut(sheet)
            .ok_or_else(|| Error::reference("sheet does not exist"))?;
        sheet.delete_row(y, refs.get_mut())
    }

    pub fn delete_col(&mut self, sheet: usize, x: u32) -> Result<()> {
        let Self { sheets, refs, .. } = self;
        let sheet = sheets
            .get_mut(sheet)
            .ok_or_else(|| Error::reference("sheet does not exist"))?;
        sheet.delete_col(x, refs.get_mut())
    }

    /// Drop every cell of a sheet, releasing their references. The sheet
    /// itself stays, so other sheets' indices never shift.
    pub fn clear_sheet(&mut self, sheet: usize) -> Result<()> {
        let Self { sheets, refs, .. } = self;
        let sheet = sheets
            .get_mut(sheet)
            .ok_or_else(|| Error::reference("sheet does not exist"))?;
        sheet.clear(refs.get_mut());
        Ok(())
    }

    /// Computed display text of a cell; evaluation errors render as their
    /// message, a missing cell as `""`.
    pub fn cell_display(&self, sheet: usize, x: u32, y: u32) -> String {
        let addr = CellAddress::new(sheet, x, y);
        let ctx = EvalContext::new(self, sheet);
        let result = (|| -> Result<String> {
            let _guard = ctx.visit(addr)?;
            match self.sheet(sheet)?.cell(x, y) {
                Some(cell) => cell.string_value(self, &ctx, sheet),
                None => Ok(String::new()),
            }
        })();
        result.unwrap_or_else(|e| e.to_string())
    }

    /// Canonical formula text of a cell (raw text for non-formula cells).
    pub fn cell_expression(&self, sheet: usize, x: u32, y: u32) -> Result<String> {
        match self.sheet(sheet)?.cell(x, y) {
            Some(cell) => cell.expression(self, sheet),
            None => Ok(String::new()),
        }
    }
}

impl CellSource for Document {
    fn value(&self, ctx: &EvalContext, addr: CellAddress) -> Result<Value> {
        match self.sheet(addr.sheet)?.cell(addr.x, addr.y) {
            Some(cell) => cell.value(self, ctx, addr.sheet),
            None => Ok(Value::Empty),
        }
    }

    fn bool_value(&self, ctx: &EvalContext, addr: CellAddress) -> Result<bool> {
        match self.sheet(addr.sheet)?.cell(addr.x, addr.y) {
            Some(cell) => cell.bool_value(self, ctx, addr.sheet),
            None => Ok(false),
        }
    }

    fn decimal_value(&self, ctx: &EvalContext, addr: CellAddress) -> Result<Decimal> {
        match self.sheet(addr.sheet)?.cell(addr.x, addr.y) {
            Some(cell) => cell.decimal_value(self, ctx, addr.sheet),
            None => Ok(Decimal::ZERO),
        }
    }

    fn string_value(&self, ctx: &EvalContext, addr: CellAddress) -> Result<String> {
        match self.sheet(addr.sheet)?.cell(addr.x, addr.y) {
            Some(cell) => cell.string_value(self, ctx, addr.sheet),
            None => Ok(String::new()),
        }
    }
}
