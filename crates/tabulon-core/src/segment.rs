//! Sheet segments
//!
//! A sheet stores its cells in rectangular segments. `Static` segments hold
//! a dense column-major grid. `Extrapolation` segments hold a single key
//! cell and synthesize every other position as an offset copy of it, so a
//! formula dragged over a region costs one stored cell.

use std::borrow::Cow;

use tabulon_common::{Error, Result};

use crate::cell::Cell;
use crate::registry::RefArena;

/// Axis-aligned cell rectangle, in sheet coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        self.contains_x(x) && self.contains_y(y)
    }

    pub fn contains_x(&self, x: u32) -> bool {
        x >= self.x && x < self.x + self.w
    }

    pub fn contains_y(&self, y: u32) -> bool {
        y >= self.y && y < self.y + self.h
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }
}

#[derive(Debug, Clone)]
pub enum Segment {
    Static {
        rect: Rect,
        /// Column-major: `cells[x][y]`, local coordinates
        cells: Vec<Vec<Cell>>,
    },
    Extrapolation {
        rect: Rect,
        /// Key position, local coordinates
        key_x: u32,
        key_y: u32,
        key: Cell,
    },
}

fn extrapolation_write() -> Error {
    Error::reference("cannot modify an extrapolation segment")
}

fn out_of_rect() -> Error {
    Error::reference("coordinates outside the segment")
}

impl Segment {
    /// Dense segment from a column-major grid. Grid dimensions must match
    /// the rectangle.
    pub fn new_static(rect: Rect, cells: Vec<Vec<Cell>>) -> Result<Self> {
        if cells.len() != rect.w as usize || cells.iter().any(|col| col.len() != rect.h as usize) {
            return Err(Error::reference("segment cells do not match its rectangle"));
        }
        Ok(Segment::Static { rect, cells })
    }

    /// Single-cell static segment.
    pub fn single(x: u32, y: u32, cell: Cell) -> Self {
        Segment::Static {
            rect: Rect::new(x, y, 1, 1),
            cells: vec![vec![cell]],
        }
    }

    pub fn new_extrapolation(rect: Rect, key_x: u32, key_y: u32, key: Cell) -> Result<Self> {
        if key_x >= rect.w || key_y >= rect.h {
            return Err(Error::reference("extrapolation key outside its rectangle"));
        }
        Ok(Segment::Extrapolation {
            rect,
            key_x,
            key_y,
            key,
        })
    }

    pub fn rect(&self) -> Rect {
        match self {
            Segment::Static { rect, .. } | Segment::Extrapolation { rect, .. } => *rect,
        }
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        self.rect().contains(x, y)
    }

    /// Cell at sheet coordinates `(x, y)`, or `None` outside the rectangle.
    /// Extrapolation positions other than the key are synthesized.
    pub fn cell(&self, x: u32, y: u32) -> Option<Cow<'_, Cell>> {
        if !self.contains(x, y) {
            return None;
        }
        match self {
            Segment::Static { rect, cells } => {
                let lx = (x - rect.x) as usize;
                let ly = (y - rect.y) as usize;
                Some(Cow::Borrowed(&cells[lx][ly]))
            }
            Segment::Extrapolation {
                rect,
                key_x,
                key_y,
                key,
            } => {
                let lx = x - rect.x;
                let ly = y - rect.y;
                if lx == *key_x && ly == *key_y {
                    Some(Cow::Borrowed(key))
                } else {
                    let dx = lx as i64 - *key_x as i64;
                    let dy = ly as i64 - *key_y as i64;
                    Some(Cow::Owned(key.copy_with_offset(dx, dy)))
                }
            }
        }
    }

    /// Replace the cell at sheet coordinates `(x, y)`, releasing the old
    /// cell's references. Extrapolation segments only accept writes to the
    /// key position.
    pub fn set_cell(&mut self, x: u32, y: u32, cell: Cell, arena: &mut RefArena) -> Result<()> {
        if !self.contains(x, y) {
            return Err(out_of_rect());
        }
        match self {
            Segment::Static { rect, cells } => {
                let lx = (x - rect.x) as usize;
                let ly = (y - rect.y) as usize;
                cells[lx][ly].release_refs(arena);
                cells[lx][ly] = cell;
                Ok(())
            }
            Segment::Extrapolation {
                rect,
                key_x,
                key_y,
                key,
            } => {
                if x - rect.x != *key_x || y - rect.y != *key_y {
                    return Err(extrapolation_write());
                }
                key.release_refs(arena);
                *key = cell;
                Ok(())
            }
        }
    }

    /// Shift the whole segment.
    pub fn move_by(&mut self, dx: i64, dy: i64) {
        let rect = match self {
            Segment::Static { rect, .. } | Segment::Extrapolation { rect, .. } => rect,
        };
        rect.x = (rect.x as i64 + dx).max(0) as u32;
        rect.y = (rect.y as i64 + dy).max(0) as u32;
    }

    /// Insert an empty row at sheet row `y`, which must fall inside the
    /// rectangle. Rows at and below it move down.
    pub fn insert_empty_row(&mut self, y: u32) -> Result<()> {
        if !self.rect().contains_y(y) {
            return Err(out_of_rect());
        }
        match self {
            Segment::Static { rect, cells } => {
                let ly = (y - rect.y) as usize;
                for col in cells.iter_mut() {
                    col.insert(ly, Cell::new(""));
                }
                rect.h += 1;
                Ok(())
            }
            Segment::Extrapolation { .. } => Err(extrapolation_write()),
        }
    }

    /// Insert an empty column at sheet column `x`, which must fall inside
    /// the rectangle. Columns at and right of it move right.
    pub fn insert_empty_col(&mut self, x: u32) -> Result<()> {
        if !self.rect().contains_x(x) {
            return Err(out_of_rect());
        }
        match self {
            Segment::Static { rect, cells } => {
                let lx = (x - rect.x) as usize;
                cells.insert(lx, vec![Cell::new(""); rect.h as usize]);
                rect.w += 1;
                Ok(())
            }
            Segment::Extrapolation { .. } => Err(extrapolation_write()),
        }
    }

    /// Delete sheet row `y`, which must fall inside the rectangle. Returns
    /// `true` when the segment became empty and should be removed. Dropped
    /// cells release their references.
    pub fn delete_row(&mut self, y: u32, arena: &mut RefArena) -> Result<bool> {
        if !self.rect().contains_y(y) {
            return Err(out_of_rect());
        }
        match self {
            Segment::Static { rect, cells } => {
                let ly = (y - rect.y) as usize;
                for col in cells.iter_mut() {
                    col.remove(ly).release_refs(arena);
                }
                rect.h -= 1;
                Ok(rect.h == 0)
            }
            Segment::Extrapolation { .. } => Err(extrapolation_write()),
        }
    }

    /// Delete sheet column `x`, which must fall inside the rectangle.
    /// Returns `true` when the segment became empty.
    pub fn delete_col(&mut self, x: u32, arena: &mut RefArena) -> Result<bool> {
        if !self.rect().contains_x(x) {
            return Err(out_of_rect());
        }
        match self {
            Segment::Static { rect, cells } => {
                let lx = (x - rect.x) as usize;
                for cell in cells.remove(lx) {
                    cell.release_refs(arena);
                }
                rect.w -= 1;
                Ok(rect.w == 0)
            }
            Segment::Extrapolation { .. } => Err(extrapolation_write()),
        }
    }

    /// References held by every stored cell go back to the arena.
    pub fn release_refs(&self, arena: &mut RefArena) {
        match self {
            Segment::Static { cells, .. } => {
                for col in cells {
                    for cell in col {
                        cell.release_refs(arena);
                    }
                }
            }
            Segment::Extrapolation { key, .. } => key.release_refs(arena),
        }
    }
}
