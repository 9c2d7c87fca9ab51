//! Cells
//!
//! A cell stores the text the user typed and derives a typed [`Content`]
//! from it on first access. Derivation needs the owning [`Document`] to
//! resolve sheet qualifiers in formulas, so it happens lazily rather than
//! at write time, and the result is cached in a `OnceCell`.
//!
//! Extrapolation copies do not re-store text; they carry an offset that is
//! applied to every non-anchored reference axis during derivation, which is
//! what keeps `$A$1` pinned while `A1` slides.

use once_cell::unsync::OnceCell;
use rust_decimal::Decimal;
use tabulon_common::{CellReference, EvalContext, Result, Value};
use tabulon_formula::{evaluate, parse, render, Expr};

use crate::document::Document;
use crate::registry::{RefArena, RefId};

#[derive(Debug, Clone)]
pub struct Cell {
    raw: String,
    offset: (i64, i64),
    /// Stored cells intern their references in the document's arena;
    /// synthesized extrapolation copies do not.
    tracked: bool,
    content: OnceCell<Content>,
}

/// Typed cell content, derived from the raw text.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Empty,
    Text(String),
    Integer(i64),
    Decimal(Decimal),
    Bool(bool),
    Formula(Formula),
}

/// A parsed formula with its references resolved against the document.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    pub(crate) expr: Expr,
    pub(crate) refs: Vec<FormulaRef>,
}

/// One reference of a formula; `to` is present for ranges.
#[derive(Debug, Clone, PartialEq)]
pub struct FormulaRef {
    pub(crate) from: TrackedRef,
    pub(crate) to: Option<TrackedRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackedRef {
    pub(crate) id: Option<RefId>,
    pub(crate) cell: CellReference,
}

impl Cell {
    pub fn new<S: Into<String>>(raw: S) -> Self {
        Self {
            raw: raw.into(),
            offset: (0, 0),
            tracked: true,
            content: OnceCell::new(),
        }
    }

    /// The text as typed.
    pub fn raw_value(&self) -> &str {
        &self.raw
    }

    /// Untracked copy whose formula references are shifted by `(dx, dy)` on
    /// the non-anchored axes. Used to fill extrapolation segments.
    pub fn copy_with_offset(&self, dx: i64, dy: i64) -> Cell {
        Cell {
            raw: self.raw.clone(),
            offset: (self.offset.0 + dx, self.offset.1 + dy),
            tracked: false,
            content: OnceCell::new(),
        }
    }

    /// Derive (or fetch the cached) typed content. `sheet` is the sheet the
    /// cell lives on; unqualified formula references resolve against it.
    pub fn content(&self, doc: &Document, sheet: usize) -> Result<&Content> {
        self.content.get_or_try_init(|| self.derive(doc, sheet))
    }

    fn derive(&self, doc: &Document, sheet: usize) -> Result<Content> {
        let raw = self.raw.as_str();
        if raw.is_empty() {
            return Ok(Content::Empty);
        }
        if raw.starts_with('=') && raw.len() > 1 {
            return Ok(Content::Formula(self.derive_formula(doc, sheet)?));
        }
        if let Ok(i) = raw.parse::<i64>() {
            return Ok(Content::Integer(i));
        }
        if let Some(d) = parse_decimal(raw) {
            return Ok(Content::Decimal(d));
        }
        if raw.eq_ignore_ascii_case("true") {
            return Ok(Content::Bool(true));
        }
        if raw.eq_ignore_ascii_case("false") {
            return Ok(Content::Bool(false));
        }
        Ok(Content::Text(raw.to_string()))
    }

    fn derive_formula(&self, doc: &Document, sheet: usize) -> Result<Formula> {
        let parsed = parse(&self.raw)?;
        let (dx, dy) = self.offset;
        let mut refs = Vec::with_capacity(parsed.refs.len());
        for sref in &parsed.refs {
            let from_sheet = match &sref.from.sheet {
                Some(title) => doc.sheet_index(title)?,
                None => sheet,
            };
            let from = CellReference::parse(from_sheet, &sref.from.cell)?.with_offset(dx, dy);
            // a cross-sheet range derives fine; using it fails at evaluation
            let to = match &sref.to {
                Some(end) => {
                    let to_sheet = match &end.sheet {
                        Some(title) => doc.sheet_index(title)?,
                        None => from_sheet,
                    };
                    Some(CellReference::parse(to_sheet, &end.cell)?.with_offset(dx, dy))
                }
                None => None,
            };
            let (from_id, to_id) = if self.tracked {
                let mut arena = doc.refs().borrow_mut();
                (
                    Some(arena.intern(from.addr)),
                    to.map(|t| arena.intern(t.addr)),
                )
            } else {
                (None, None)
            };
            refs.push(FormulaRef {
                from: TrackedRef {
                    id: from_id,
                    cell: from,
                },
                to: to.map(|cell| TrackedRef { id: to_id, cell }),
            });
        }
        Ok(Formula {
            expr: parsed.expr,
            refs,
        })
    }

    pub fn value(&self, doc: &Document, ctx: &EvalContext, sheet: usize) -> Result<Value> {
        Ok(match self.content(doc, sheet)? {
            Content::Empty => Value::Empty,
            Content::Text(s) => Value::String(s.clone()),
            Content::Integer(i) => Value::Decimal(Decimal::from(*i)),
            Content::Decimal(d) => Value::Decimal(*d),
            Content::Bool(b) => Value::Bool(*b),
            Content::Formula(f) => {
                let values: Vec<Value> = f.refs.iter().map(FormulaRef::to_value).collect();
                evaluate(&f.expr, &values, ctx)?
            }
        })
    }

    pub fn bool_value(&self, doc: &Document, ctx: &EvalContext, sheet: usize) -> Result<bool> {
        self.value(doc, ctx, sheet)?.as_bool(ctx)
    }

    pub fn decimal_value(
        &self,
        doc: &Document,
        ctx: &EvalContext,
        sheet: usize,
    ) -> Result<Decimal> {
        self.value(doc, ctx, sheet)?.as_decimal(ctx)
    }

    pub fn string_value(&self, doc: &Document, ctx: &EvalContext, sheet: usize) -> Result<String> {
        self.value(doc, ctx, sheet)?.as_string(ctx)
    }

    /// Computed display text; evaluation errors render as their message.
    pub fn display(&self, doc: &Document, ctx: &EvalContext, sheet: usize) -> String {
        self.string_value(doc, ctx, sheet)
            .unwrap_or_else(|e| e.to_string())
    }

    /// Canonical formula text with refreshed reference names; non-formula
    /// cells return their raw text.
    pub fn expression(&self, doc: &Document, sheet: usize) -> Result<String> {
        match self.content(doc, sheet)? {
            Content::Formula(f) => {
                let names = f
                    .refs
                    .iter()
                    .map(|r| r.name(doc, sheet))
                    .collect::<Result<Vec<_>>>()?;
                Ok(render(&f.expr, &names))
            }
            _ => Ok(self.raw.clone()),
        }
    }

    /// Replace the text, releasing any interned references. The typed
    /// content is re-derived on next access.
    pub fn set_value_untyped<S: Into<String>>(&mut self, text: S, arena: &mut RefArena) {
        self.release_refs(arena);
        self.raw = text.into();
        self.offset = (0, 0);
        self.content = OnceCell::new();
    }

    /// Reset to an empty cell.
    pub fn erase(&mut self, arena: &mut RefArena) {
        self.set_value_untyped("", arena);
    }

    /// Give back every reference this cell interned. Called by the owning
    /// sheet when the cell is overwritten or deleted.
    pub fn release_refs(&self, arena: &mut RefArena) {
        if let Some(Content::Formula(f)) = self.content.get() {
            for r in &f.refs {
                if let Some(id) = r.from.id {
                    arena.release(id);
                }
                if let Some(end) = &r.to {
                    if let Some(id) = end.id {
                        arena.release(id);
                    }
                }
            }
        }
    }
}

impl FormulaRef {
    fn to_value(&self) -> Value {
        match &self.to {
            Some(end) => Value::Range(self.from.cell, end.cell),
            None => Value::Ref(self.from.cell),
        }
    }

    /// Reference text for rendering: sheet-qualified when the target lives
    /// on a different sheet than the formula.
    fn name(&self, doc: &Document, home_sheet: usize) -> Result<String> {
        let mut out = String::new();
        if self.from.cell.addr.sheet != home_sheet {
            let title = doc.sheet_title(self.from.cell.addr.sheet)?;
            out.push_str(&quote_sheet_title(title));
            out.push('!');
        }
        out.push_str(&self.from.cell.name());
        if let Some(end) = &self.to {
            out.push(':');
            if end.cell.addr.sheet != self.from.cell.addr.sheet {
                let title = doc.sheet_title(end.cell.addr.sheet)?;
                out.push_str(&quote_sheet_title(title));
                out.push('!');
            }
            out.push_str(&end.cell.name());
        }
        Ok(out)
    }
}

// bare identifiers are fine unquoted; anything else gets '...' with '' escaping
pub(crate) fn quote_sheet_title(title: &str) -> String {
    let plain = !title.is_empty()
        && title.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !title.starts_with(|c: char| c.is_ascii_digit());
    if plain {
        title.to_string()
    } else {
        format!("'{}'", title.replace('\'', "''"))
    }
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    if let Ok(d) = raw.parse::<Decimal>() {
        return Some(d);
    }
    if raw.contains(['e', 'E']) {
        return Decimal::from_scientific(raw).ok();
    }
    None
}
