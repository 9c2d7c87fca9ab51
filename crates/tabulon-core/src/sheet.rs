//! Sheets
//!
//! A sheet is an ordered collection of non-overlapping segments plus the
//! presentation state that belongs to it: column/row sizes, cursor and
//! viewport. Cell lookups scan the segments; writes land in the owning
//! segment or create a fresh single-cell one.

use std::borrow::Cow;

use ahash::AHashMap;

use tabulon_common::{Error, Result};

use crate::cell::Cell;
use crate::registry::RefArena;
use crate::segment::{Rect, Segment};

/// Default column width, in terminal cells.
pub const DEFAULT_COL_SIZE: u32 = 80;
/// Default row height, in terminal cells.
pub const DEFAULT_ROW_SIZE: u32 = 10;

const MAX_COL_SIZE: u32 = DEFAULT_COL_SIZE * 10;
const MAX_ROW_SIZE: u32 = DEFAULT_ROW_SIZE * 10;

#[derive(Debug, Clone)]
pub struct Sheet {
    idx: usize,
    title: String,
    segments: Vec<Segment>,
    width: u32,
    height: u32,
    col_sizes: AHashMap<u32, u32>,
    row_sizes: AHashMap<u32, u32>,
    cursor: (u32, u32),
    viewport: Rect,
}

impl Sheet {
    pub(crate) fn new(idx: usize, title: String) -> Self {
        Self {
            idx,
            title,
            segments: Vec::new(),
            width: 0,
            height: 0,
            col_sizes: AHashMap::new(),
            row_sizes: AHashMap::new(),
            cursor: (0, 0),
            viewport: Rect::new(0, 0, 0, 0),
        }
    }

    pub fn idx(&self) -> usize {
        self.idx
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub(crate) fn set_title(&mut self, title: String) {
        self.title = title;
    }

    /// Bounding size of all segments: `(width, height)`.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn cell(&self, x: u32, y: u32) -> Option<Cow<'_, Cell>> {
        self.segments.iter().find_map(|s| s.cell(x, y))
    }

    /// Write a cell. The write goes to the segment owning `(x, y)` when one
    /// exists, otherwise a single-cell segment is created.
    pub fn set_cell(&mut self, x: u32, y: u32, cell: Cell, arena: &mut RefArena) -> Result<()> {
        if let Some(seg) = self.segments.iter_mut().find(|s| s.contains(x, y)) {
            seg.set_cell(x, y, cell, arena)?;
        } else {
            self.segments.push(Segment::single(x, y, cell));
            self.grow_to(x + 1, y + 1);
        }
        Ok(())
    }

    pub fn add_static_segment(&mut self, rect: Rect, cells: Vec<Vec<Cell>>) -> Result<()> {
        self.add_segment(Segment::new_static(rect, cells)?)
    }

    pub fn add_extrapolation_segment(
        &mut self,
        rect: Rect,
        key_x: u32,
        key_y: u32,
        key: Cell,
    ) -> Result<()> {
        self.add_segment(Segment::new_extrapolation(rect, key_x, key_y, key)?)
    }

    fn add_segment(&mut self, segment: Segment) -> Result<()> {
        let rect = segment.rect();
        if self.segments.iter().any(|s| s.rect().overlaps(&rect)) {
            return Err(Error::reference("segments overlap"));
        }
        self.segments.push(segment);
        self.grow_to(rect.x + rect.w, rect.y + rect.h);
        Ok(())
    }

    /// Insert an empty row at `y`: segments starting at or below shift
    /// down, segments straddling it grow. Fails without changing anything
    /// if the row cuts through an extrapolation segment.
    pub fn insert_empty_row(&mut self, y: u32) -> Result<()> {
        self.check_row_structural(y, false)?;
        for seg in &mut self.segments {
            let rect = seg.rect();
            if y <= rect.y {
                seg.move_by(0, 1);
            } else if rect.contains_y(y) {
                seg.insert_empty_row(y)?;
            }
        }
        self.row_sizes = shift_sizes_insert(&self.row_sizes, y);
        self.recompute_size();
        Ok(())
    }

    pub fn insert_empty_col(&mut self, x: u32) -> Result<()> {
        self.check_col_structural(x, false)?;
        for seg in &mut self.segments {
            let rect = seg.rect();
            if x <= rect.x {
                seg.move_by(1, 0);
            } else if rect.contains_x(x) {
                seg.insert_empty_col(x)?;
            }
        }
        self.col_sizes = shift_sizes_insert(&self.col_sizes, x);
        self.recompute_size();
        Ok(())
    }

    /// Delete row `y`: straddling segments shrink (emptied ones go away),
    /// segments below shift up. Fails without changing anything if the row
    /// touches an extrapolation segment.
    pub fn delete_row(&mut self, y: u32, arena: &mut RefArena) -> Result<()> {
        self.check_row_structural(y, true)?;
        let mut keep = Vec::with_capacity(self.segments.len());
        for mut seg in self.segments.drain(..) {
            let rect = seg.rect();
            if rect.contains_y(y) {
                if seg.delete_row(y, arena)? {
                    continue;
                }
            } else if rect.y > y {
                seg.move_by(0, -1);
            }
            keep.push(seg);
        }
        self.segments = keep;
        self.row_sizes = shift_sizes_delete(&self.row_sizes, y);
        self.recompute_size();
        Ok(())
    }

    pub fn delete_col(&mut self, x: u32, arena: &mut RefArena) -> Result<()> {
        self.check_col_structural(x, true)?;
        let mut keep = Vec::with_capacity(self.segments.len());
        for mut seg in self.segments.drain(..) {
            let rect = seg.rect();
            if rect.contains_x(x) {
                if seg.delete_col(x, arena)? {
                    continue;
                }
            } else if rect.x > x {
                seg.move_by(-1, 0);
            }
            keep.push(seg);
        }
        self.segments = keep;
        self.col_sizes = shift_sizes_delete(&self.col_sizes, x);
        self.recompute_size();
        Ok(())
    }

    // structural ops never touch the inside of an extrapolation segment;
    // delete also rejects its edge rows/cols
    fn check_row_structural(&self, y: u32, include_start: bool) -> Result<()> {
        for seg in &self.segments {
            if let Segment::Extrapolation { rect, .. } = seg {
                let cuts = if include_start {
                    rect.contains_y(y)
                } else {
                    y > rect.y && rect.contains_y(y)
                };
                if cuts {
                    return Err(Error::reference("cannot modify an extrapolation segment"));
                }
            }
        }
        Ok(())
    }

    fn check_col_structural(&self, x: u32, include_start: bool) -> Result<()> {
        for seg in &self.segments {
            if let Segment::Extrapolation { rect, .. } = seg {
                let cuts = if include_start {
                    rect.contains_x(x)
                } else {
                    x > rect.x && rect.contains_x(x)
                };
                if cuts {
                    return Err(Error::reference("cannot modify an extrapolation segment"));
                }
            }
        }
        Ok(())
    }

    pub fn col_size(&self, x: u32) -> u32 {
        self.col_sizes.get(&x).copied().unwrap_or(DEFAULT_COL_SIZE)
    }

    pub fn row_size(&self, y: u32) -> u32 {
        self.row_sizes.get(&y).copied().unwrap_or(DEFAULT_ROW_SIZE)
    }

    /// Override a column width. Sizes outside `[1, 10×default]` are
    /// rejected and leave the current value in place.
    pub fn set_col_size(&mut self, x: u32, size: u32) {
        if (1..=MAX_COL_SIZE).contains(&size) {
            self.col_sizes.insert(x, size);
        }
    }

    pub fn set_row_size(&mut self, y: u32, size: u32) {
        if (1..=MAX_ROW_SIZE).contains(&size) {
            self.row_sizes.insert(y, size);
        }
    }

    pub fn cursor(&self) -> (u32, u32) {
        self.cursor
    }

    pub fn set_cursor(&mut self, x: u32, y: u32) {
        self.cursor = (x, y);
    }

    pub fn cell_under_cursor(&self) -> Option<Cow<'_, Cell>> {
        self.cell(self.cursor.0, self.cursor.1)
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Rect) {
        self.viewport = viewport;
    }

    /// Drop every segment, giving all held references back to the arena.
    /// Sizes, cursor and viewport are kept.
    pub fn clear(&mut self, arena: &mut RefArena) {
        for seg in self.segments.drain(..) {
            seg.release_refs(arena);
        }
        self.width = 0;
        self.height = 0;
    }

    fn grow_to(&mut self, w: u32, h: u32) {
        self.width = self.width.max(w);
        self.height = self.height.max(h);
    }

    fn recompute_size(&mut self) {
        self.width = 0;
        self.height = 0;
        for seg in &self.segments {
            let r = seg.rect();
            self.width = self.width.max(r.x + r.w);
            self.height = self.height.max(r.y + r.h);
        }
    }
}

fn shift_sizes_insert(sizes: &AHashMap<u32, u32>, at: u32) -> AHashMap<u32, u32> {
    sizes
        .iter()
        .map(|(&k, &v)| (if k >= at { k + 1 } else { k }, v))
        .collect()
}

fn shift_sizes_delete(sizes: &AHashMap<u32, u32>, at: u32) -> AHashMap<u32, u32> {
    sizes
        .iter()
        .filter(|(&k, _)| k != at)
        .map(|(&k, &v)| (if k > at { k - 1 } else { k }, v))
        .collect()
}
