//! Evaluation context
//!
//! An [`EvalContext`] is threaded through every computation triggered by a
//! single formula. It provides cell lookups through [`CellSource`] and keeps
//! the stack of cells currently being resolved, which is how circular
//! references are detected: revisiting a cell that is already on the stack
//! fails, while diamond-shaped dependency graphs evaluate normally because
//! each branch pushes and pops independently.

use std::cell::RefCell;

use rust_decimal::Decimal;

use crate::addr::CellAddress;
use crate::error::{Error, Result};
use crate::value::Value;

/// Read access to cell values by address.
///
/// A missing cell behaves like an empty one: `false`, zero, `""`.
pub trait CellSource {
    fn value(&self, ctx: &EvalContext, addr: CellAddress) -> Result<Value>;
    fn bool_value(&self, ctx: &EvalContext, addr: CellAddress) -> Result<bool>;
    fn decimal_value(&self, ctx: &EvalContext, addr: CellAddress) -> Result<Decimal>;
    fn string_value(&self, ctx: &EvalContext, addr: CellAddress) -> Result<String>;
}

pub struct EvalContext<'a> {
    source: &'a dyn CellSource,
    current_sheet: usize,
    visited: RefCell<Vec<CellAddress>>,
}

impl<'a> EvalContext<'a> {
    pub fn new(source: &'a dyn CellSource, current_sheet: usize) -> Self {
        Self {
            source,
            current_sheet,
            visited: RefCell::new(Vec::new()),
        }
    }

    pub fn source(&self) -> &'a dyn CellSource {
        self.source
    }

    /// Sheet the formula being evaluated lives on; unqualified references
    /// resolve against it.
    pub fn current_sheet(&self) -> usize {
        self.current_sheet
    }

    /// Mark `addr` as being resolved for the lifetime of the returned guard.
    ///
    /// Fails with `circular reference` if the cell is already on the stack.
    /// The guard pops the cell again when dropped, on success and error
    /// paths alike.
    pub fn visit(&self, addr: CellAddress) -> Result<VisitGuard<'_>> {
        let mut visited = self.visited.borrow_mut();
        if visited.contains(&addr) {
            return Err(Error::circular());
        }
        visited.push(addr);
        Ok(VisitGuard {
            visited: &self.visited,
        })
    }

    /// Current depth of the visited stack.
    pub fn depth(&self) -> usize {
        self.visited.borrow().len()
    }
}

/// Scope guard returned by [`EvalContext::visit`].
#[derive(Debug)]
pub struct VisitGuard<'a> {
    visited: &'a RefCell<Vec<CellAddress>>,
}

impl Drop for VisitGuard<'_> {
    fn drop(&mut self) {
        self.visited.borrow_mut().pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct EmptySource;

    impl CellSource for EmptySource {
        fn value(&self, _: &EvalContext, _: CellAddress) -> Result<Value> {
            Ok(Value::Empty)
        }
        fn bool_value(&self, _: &EvalContext, _: CellAddress) -> Result<bool> {
            Ok(false)
        }
        fn decimal_value(&self, _: &EvalContext, _: CellAddress) -> Result<Decimal> {
            Ok(Decimal::ZERO)
        }
        fn string_value(&self, _: &EvalContext, _: CellAddress) -> Result<String> {
            Ok(String::new())
        }
    }

    #[test]
    fn test_revisit_is_circular() {
        let source = EmptySource;
        let ctx = EvalContext::new(&source, 0);
        let a1 = CellAddress::new(0, 0, 0);
        let _guard = ctx.visit(a1).unwrap();
        assert_eq!(ctx.visit(a1).unwrap_err(), Error::circular());
    }

    #[test]
    fn test_guard_pops_on_drop() {
        let source = EmptySource;
        let ctx = EvalContext::new(&source, 0);
        let a1 = CellAddress::new(0, 0, 0);
        {
            let _guard = ctx.visit(a1).unwrap();
            assert_eq!(ctx.depth(), 1);
        }
        assert_eq!(ctx.depth(), 0);
        // visiting again after the guard is gone works
        let _guard = ctx.visit(a1).unwrap();
    }

    #[test]
    fn test_distinct_cells_nest() {
        let source = EmptySource;
        let ctx = EvalContext::new(&source, 0);
        let _a = ctx.visit(CellAddress::new(0, 0, 0)).unwrap();
        let _b = ctx.visit(CellAddress::new(0, 1, 0)).unwrap();
        let _c = ctx.visit(CellAddress::new(1, 0, 0)).unwrap();
        assert_eq!(ctx.depth(), 3);
    }
}
