//! The runtime value model
//!
//! Every expression evaluates to a [`Value`]. References stay unresolved
//! until a concrete type is requested, so a formula result can be handed
//! around cheaply and the referenced cell is only computed when needed.
//!
//! Casting rules:
//!
//! | from      | to bool          | to decimal        | to string       |
//! |-----------|------------------|-------------------|-----------------|
//! | `Empty`   | `false`          | `0`               | `""`            |
//! | `Bool`    | itself           | `1` / `0`         | `TRUE`/`FALSE`  |
//! | `Decimal` | `!= 0`           | itself            | canonical text  |
//! | `String`  | error[^e]        | error[^e]         | itself          |
//! | `Range`   | error            | error             | error           |
//!
//! [^e]: the empty string casts to `false` / `0`.

use rust_decimal::Decimal;

use crate::addr::{CellAddress, CellReference};
use crate::context::EvalContext;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Empty,
    Bool(bool),
    Decimal(Decimal),
    String(String),
    /// Unresolved reference to a single cell
    Ref(CellReference),
    /// Unresolved reference to a rectangular range; `from` is the top-left
    /// corner, `to` the bottom-right
    Range(CellReference, CellReference),
}

/// The shape a [`Value`] resolves to, used for operator dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Empty,
    Bool,
    Decimal,
    String,
    Range,
}

impl Value {
    /// Chase references until a concrete value is reached.
    ///
    /// Each hop is guarded against circular references.
    pub fn resolve(&self, ctx: &EvalContext) -> Result<Value> {
        match self {
            Value::Ref(r) => {
                let _guard = ctx.visit(r.addr)?;
                let v = ctx.source().value(ctx, r.addr)?;
                v.resolve(ctx)
            }
            other => Ok(other.clone()),
        }
    }

    /// Kind of the resolved value.
    pub fn kind(&self, ctx: &EvalContext) -> Result<ValueKind> {
        Ok(match self.resolve(ctx)? {
            Value::Empty => ValueKind::Empty,
            Value::Bool(_) => ValueKind::Bool,
            Value::Decimal(_) => ValueKind::Decimal,
            Value::String(_) => ValueKind::String,
            Value::Range(..) => ValueKind::Range,
            Value::Ref(_) => unreachable!("resolve() never returns a ref"),
        })
    }

    pub fn as_bool(&self, ctx: &EvalContext) -> Result<bool> {
        match self {
            Value::Empty => Ok(false),
            Value::Bool(b) => Ok(*b),
            Value::Decimal(d) => Ok(!d.is_zero()),
            Value::String(s) => {
                if s.is_empty() {
                    Ok(false)
                } else {
                    Err(Error::casting(format!(
                        "unable to cast string value {s} to bool"
                    )))
                }
            }
            Value::Ref(r) => {
                let _guard = ctx.visit(r.addr)?;
                ctx.source().bool_value(ctx, r.addr)
            }
            Value::Range(..) => Err(Error::casting("unable to cast range to bool")),
        }
    }

    pub fn as_decimal(&self, ctx: &EvalContext) -> Result<Decimal> {
        match self {
            Value::Empty => Ok(Decimal::ZERO),
            Value::Bool(b) => Ok(if *b { Decimal::ONE } else { Decimal::ZERO }),
            Value::Decimal(d) => Ok(*d),
            Value::String(s) => {
                if s.is_empty() {
                    Ok(Decimal::ZERO)
                } else {
                    Err(Error::casting(format!(
                        "unable to cast string value {s} to decimal"
                    )))
                }
            }
            Value::Ref(r) => {
                let _guard = ctx.visit(r.addr)?;
                ctx.source().decimal_value(ctx, r.addr)
            }
            Value::Range(..) => Err(Error::casting("unable to cast range to decimal")),
        }
    }

    pub fn as_string(&self, ctx: &EvalContext) -> Result<String> {
        match self {
            Value::Empty => Ok(String::new()),
            Value::Bool(b) => Ok(if *b { "TRUE" } else { "FALSE" }.to_string()),
            Value::Decimal(d) => Ok(d.normalize().to_string()),
            Value::String(s) => Ok(s.clone()),
            Value::Ref(r) => {
                let _guard = ctx.visit(r.addr)?;
                ctx.source().string_value(ctx, r.addr)
            }
            Value::Range(..) => Err(Error::casting("unable to cast range to string")),
        }
    }

    pub fn is_range(&self) -> bool {
        matches!(self, Value::Range(..))
    }

    /// Iterate a range column by column, feeding each cell's decimal value
    /// to `f`. Only valid on `Range` values.
    pub fn for_each_decimal(
        &self,
        ctx: &EvalContext,
        f: &mut dyn FnMut(Decimal) -> Result<()>,
    ) -> Result<()> {
        self.for_each_cell(ctx, &mut |ctx, addr| {
            let v = ctx.source().decimal_value(ctx, addr)?;
            f(v)
        })
    }

    /// Iterate a range column by column, feeding each cell's resolved value
    /// to `f`. Only valid on `Range` values.
    pub fn for_each_value(
        &self,
        ctx: &EvalContext,
        f: &mut dyn FnMut(Value) -> Result<()>,
    ) -> Result<()> {
        self.for_each_cell(ctx, &mut |ctx, addr| {
            let v = ctx.source().value(ctx, addr)?;
            let v = v.resolve(ctx)?;
            f(v)
        })
    }

    fn for_each_cell(
        &self,
        ctx: &EvalContext,
        f: &mut dyn FnMut(&EvalContext, CellAddress) -> Result<()>,
    ) -> Result<()> {
        let (from, to) = match self {
            Value::Range(from, to) => (from, to),
            _ => return Err(Error::casting("unable to iterate a non-range value")),
        };
        if from.addr.sheet != to.addr.sheet {
            return Err(Error::reference("cross-sheets ranges are not allowed"));
        }
        if from.addr.x > to.addr.x || from.addr.y > to.addr.y {
            return Err(Error::reference("invalid range bounds"));
        }
        for x in from.addr.x..=to.addr.x {
            for y in from.addr.y..=to.addr.y {
                let addr = CellAddress::new(from.addr.sheet, x, y);
                let _guard = ctx.visit(addr)?;
                f(ctx, addr)?;
            }
        }
        Ok(())
    }
}
