//! Cell addresses and references
//!
//! Coordinates are zero-based: `(x, y)` is column `x`, row `y`, so `"A1"`
//! maps to `(0, 0)`. Column letters use bijective base-26 (`A..Z`, `AA..`).

use lazy_regex::regex_captures;
use std::fmt;

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};

/// Absolute location of a cell inside a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellAddress {
    /// Sheet index within the document
    pub sheet: usize,
    /// Column, zero-based
    pub x: u32,
    /// Row, zero-based
    pub y: u32,
}

impl CellAddress {
    pub fn new(sheet: usize, x: u32, y: u32) -> Self {
        Self { sheet, x, y }
    }
}

/// A reference to a cell as written in a formula: an address plus the
/// per-axis `$` anchor markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellReference {
    pub addr: CellAddress,
    /// Column is anchored (`$A1`)
    pub anchored_x: bool,
    /// Row is anchored (`A$1`)
    pub anchored_y: bool,
}

impl CellReference {
    pub fn new(addr: CellAddress) -> Self {
        Self {
            addr,
            anchored_x: false,
            anchored_y: false,
        }
    }

    /// Parse an A1-style cell name onto the given sheet.
    ///
    /// Accepts optional `$` anchors before the column letters and the row
    /// number. Input is case-insensitive.
    pub fn parse(sheet: usize, name: &str) -> Result<Self> {
        let (_, anchor_x, letters, anchor_y, digits) =
            regex_captures!(r"^(\$?)([A-Za-z]+)(\$?)([1-9][0-9]*)$", name)
                .ok_or_else(malformed)?;
        let x = letters_to_column(letters)?;
        let row: u32 = digits.parse().map_err(|_| malformed())?;
        if row > MAX_ROWS {
            return Err(malformed());
        }
        Ok(Self {
            addr: CellAddress::new(sheet, x, row - 1),
            anchored_x: !anchor_x.is_empty(),
            anchored_y: !anchor_y.is_empty(),
        })
    }

    /// The cell name without a sheet qualifier, anchors included.
    pub fn name(&self) -> String {
        let mut out = String::new();
        if self.anchored_x {
            out.push('$');
        }
        out.push_str(&column_to_letters(self.addr.x));
        if self.anchored_y {
            out.push('$');
        }
        out.push_str(&(self.addr.y + 1).to_string());
        out
    }

    /// Shift the non-anchored axes by the given offset, saturating at the
    /// sheet origin. Anchored axes stay put.
    pub fn with_offset(&self, dx: i64, dy: i64) -> Self {
        let mut r = *self;
        if !r.anchored_x {
            r.addr.x = offset_coord(r.addr.x, dx);
        }
        if !r.anchored_y {
            r.addr.y = offset_coord(r.addr.y, dy);
        }
        r
    }
}

impl fmt::Display for CellReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn offset_coord(v: u32, d: i64) -> u32 {
    let shifted = v as i64 + d;
    shifted.clamp(0, u32::MAX as i64) as u32
}

fn malformed() -> Error {
    Error::name("malformed cell name")
}

/// Convert a column index to letters (0 = A, 25 = Z, 26 = AA, ...).
pub fn column_to_letters(x: u32) -> String {
    let mut out = String::new();
    let mut n = x + 1;
    while n > 0 {
        n -= 1;
        out.insert(0, ((n % 26) as u8 + b'A') as char);
        n /= 26;
    }
    out
}

/// Convert column letters to an index (A = 0, Z = 25, AA = 26, ...).
/// Case-insensitive.
pub fn letters_to_column(letters: &str) -> Result<u32> {
    if letters.is_empty() {
        return Err(malformed());
    }
    let mut col: u64 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return Err(malformed());
        }
        col = col * 26 + (c.to_ascii_uppercase() as u64 - 'A' as u64 + 1);
        if col > MAX_COLS as u64 {
            return Err(malformed());
        }
    }
    Ok(col as u32 - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_column_to_letters() {
        assert_eq!(column_to_letters(0), "A");
        assert_eq!(column_to_letters(1), "B");
        assert_eq!(column_to_letters(25), "Z");
        assert_eq!(column_to_letters(26), "AA");
        assert_eq!(column_to_letters(27), "AB");
        assert_eq!(column_to_letters(701), "ZZ");
        assert_eq!(column_to_letters(702), "AAA");
    }

    #[test]
    fn test_letters_to_column() {
        assert_eq!(letters_to_column("A").unwrap(), 0);
        assert_eq!(letters_to_column("B").unwrap(), 1);
        assert_eq!(letters_to_column("Z").unwrap(), 25);
        assert_eq!(letters_to_column("AA").unwrap(), 26);
        assert_eq!(letters_to_column("ZZ").unwrap(), 701);
        assert_eq!(letters_to_column("AAA").unwrap(), 702);

        // case insensitive
        assert_eq!(letters_to_column("a").unwrap(), 0);
        assert_eq!(letters_to_column("aa").unwrap(), 26);

        assert!(letters_to_column("").is_err());
        assert!(letters_to_column("A1").is_err());
    }

    #[test]
    fn test_parse() {
        let r = CellReference::parse(0, "A1").unwrap();
        assert_eq!(r.addr, CellAddress::new(0, 0, 0));
        assert!(!r.anchored_x);
        assert!(!r.anchored_y);

        let r = CellReference::parse(2, "C10").unwrap();
        assert_eq!(r.addr, CellAddress::new(2, 2, 9));

        let r = CellReference::parse(0, "$B$2").unwrap();
        assert_eq!(r.addr, CellAddress::new(0, 1, 1));
        assert!(r.anchored_x);
        assert!(r.anchored_y);

        let r = CellReference::parse(0, "$B2").unwrap();
        assert!(r.anchored_x);
        assert!(!r.anchored_y);

        let r = CellReference::parse(0, "B$2").unwrap();
        assert!(!r.anchored_x);
        assert!(r.anchored_y);

        // lower case is accepted
        let r = CellReference::parse(0, "aaa999").unwrap();
        assert_eq!(r.addr, CellAddress::new(0, 702, 998));
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["", "A", "1", "A0", "A01", "1A", "A1B", "A-1", "$$A1"] {
            assert_eq!(
                CellReference::parse(0, bad).unwrap_err(),
                Error::name("malformed cell name"),
                "case {bad}"
            );
        }
    }

    #[test]
    fn test_name_round_trip() {
        for (x, y, name) in [
            (0, 0, "A1"),
            (25, 0, "Z1"),
            (26, 0, "AA1"),
            (701, 0, "ZZ1"),
            (702, 0, "AAA1"),
            (2, 99, "C100"),
        ] {
            let r = CellReference::new(CellAddress::new(0, x, y));
            assert_eq!(r.name(), name);
            assert_eq!(CellReference::parse(0, name).unwrap(), r);
        }
    }

    #[test]
    fn test_anchored_name() {
        let r = CellReference {
            addr: CellAddress::new(0, 0, 0),
            anchored_x: true,
            anchored_y: true,
        };
        assert_eq!(r.name(), "$A$1");
    }

    #[test]
    fn test_with_offset_honors_anchors() {
        let r = CellReference::parse(0, "B$2").unwrap();
        let moved = r.with_offset(2, 3);
        assert_eq!(moved.name(), "D$2");

        let r = CellReference::parse(0, "$B2").unwrap();
        let moved = r.with_offset(2, 3);
        assert_eq!(moved.name(), "$B5");

        // shifting past the origin saturates
        let r = CellReference::parse(0, "B2").unwrap();
        let moved = r.with_offset(-5, -5);
        assert_eq!(moved.name(), "A1");
    }
}
