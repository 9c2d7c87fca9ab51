//! Built-in function registry

use ahash::AHashMap;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use tabulon_common::{Error, EvalContext, Result, Value};

use crate::eval::overflow;

const MAX_ARGUMENTS: usize = 1000;

type FunctionImpl = fn(&EvalContext, &[Value]) -> Result<Value>;

pub struct FunctionDef {
    pub name: &'static str,
    pub min_args: usize,
    pub max_args: usize,
    pub func: FunctionImpl,
}

/// Look up a built-in by name. Names are case-insensitive.
pub fn function(name: &str) -> Option<&'static FunctionDef> {
    REGISTRY.get(name.to_ascii_uppercase().as_str())
}

static REGISTRY: Lazy<AHashMap<&'static str, FunctionDef>> = Lazy::new(|| {
    let defs = [
        FunctionDef {
            name: "TRIM",
            min_args: 1,
            max_args: 1,
            func: trim,
        },
        FunctionDef {
            name: "SUM",
            min_args: 1,
            max_args: MAX_ARGUMENTS,
            func: sum,
        },
        FunctionDef {
            name: "IF",
            min_args: 3,
            max_args: 3,
            func: if_,
        },
        FunctionDef {
            name: "COUNT",
            min_args: 1,
            max_args: MAX_ARGUMENTS,
            func: count,
        },
        FunctionDef {
            name: "MIN",
            min_args: 1,
            max_args: MAX_ARGUMENTS,
            func: min,
        },
        FunctionDef {
            name: "MAX",
            min_args: 1,
            max_args: MAX_ARGUMENTS,
            func: max,
        },
        FunctionDef {
            name: "AVERAGE",
            min_args: 1,
            max_args: MAX_ARGUMENTS,
            func: average,
        },
    ];
    defs.into_iter().map(|d| (d.name, d)).collect()
});

fn trim(ctx: &EvalContext, args: &[Value]) -> Result<Value> {
    let s = args[0].as_string(ctx)?;
    Ok(Value::String(
        s.trim_matches(|c: char| matches!(c, ' ' | '\t' | '\r' | '\n'))
            .to_string(),
    ))
}

fn sum(ctx: &EvalContext, args: &[Value]) -> Result<Value> {
    let mut total = Decimal::ZERO;
    for arg in args {
        if arg.is_range() {
            arg.for_each_decimal(ctx, &mut |d| {
                total = total.checked_add(d).ok_or_else(overflow)?;
                Ok(())
            })?;
        } else {
            total = total
                .checked_add(arg.as_decimal(ctx)?)
                .ok_or_else(overflow)?;
        }
    }
    Ok(Value::Decimal(total))
}

// The evaluator short-circuits IF before arguments are computed; this body
// only runs when the registry is invoked directly with materialized values.
fn if_(ctx: &EvalContext, args: &[Value]) -> Result<Value> {
    let cond = args[0].as_bool(ctx)?;
    Ok(if cond {
        args[1].clone()
    } else {
        args[2].clone()
    })
}

fn count(ctx: &EvalContext, args: &[Value]) -> Result<Value> {
    let mut n: i64 = 0;
    fold_values(ctx, args, &mut |v| {
        if matches!(v, Value::Decimal(_)) {
            n += 1;
        }
        Ok(())
    })?;
    Ok(Value::Decimal(Decimal::from(n)))
}

fn min(ctx: &EvalContext, args: &[Value]) -> Result<Value> {
    fold_extremum(ctx, args, |best, d| d < best)
}

fn max(ctx: &EvalContext, args: &[Value]) -> Result<Value> {
    fold_extremum(ctx, args, |best, d| d > best)
}

fn average(ctx: &EvalContext, args: &[Value]) -> Result<Value> {
    let mut total = Decimal::ZERO;
    let mut n: i64 = 0;
    fold_values(ctx, args, &mut |v| {
        if !matches!(v, Value::Empty) {
            total = total.checked_add(v.as_decimal(ctx)?).ok_or_else(overflow)?;
            n += 1;
        }
        Ok(())
    })?;
    if n == 0 {
        return Err(Error::Div0);
    }
    Ok(Value::Decimal(total / Decimal::from(n)))
}

fn fold_extremum(
    ctx: &EvalContext,
    args: &[Value],
    replace: fn(Decimal, Decimal) -> bool,
) -> Result<Value> {
    let mut best: Option<Decimal> = None;
    fold_values(ctx, args, &mut |v| {
        if !matches!(v, Value::Empty) {
            let d = v.as_decimal(ctx)?;
            best = Some(match best {
                Some(b) if !replace(b, d) => b,
                _ => d,
            });
        }
        Ok(())
    })?;
    Ok(Value::Decimal(best.unwrap_or(Decimal::ZERO)))
}

/// Feed every resolved value in `args` to `f`, expanding ranges cell by
/// cell.
fn fold_values(
    ctx: &EvalContext,
    args: &[Value],
    f: &mut dyn FnMut(Value) -> Result<()>,
) -> Result<()> {
    for arg in args {
        if arg.is_range() {
            arg.for_each_value(ctx, f)?;
        } else {
            f(arg.resolve(ctx)?)?;
        }
    }
    Ok(())
}
