//! Tree-walking formula evaluator
//!
//! Binary and unary operators dispatch on the resolved type of their first
//! operand; the remaining operands are cast to that type. An empty first
//! operand evaluates in the decimal lane.
//!
//! `IF` is the one lazily evaluated function: only the selected branch is
//! computed. All other functions receive eagerly evaluated arguments, with
//! ranges passed through unresolved for the aggregate folds.

use rust_decimal::{Decimal, MathematicalOps};
use tabulon_common::{Error, EvalContext, Result, Value, ValueKind};

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::func::function;

/// Evaluate an expression. `refs` carries the resolved values of the
/// formula's reference list, in the same order as during parsing.
pub fn evaluate(expr: &Expr, refs: &[Value], ctx: &EvalContext) -> Result<Value> {
    match expr {
        Expr::Number(d) => Ok(Value::Decimal(*d)),
        Expr::Str(s) => Ok(Value::String(s.clone())),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Ref(i) => refs
            .get(*i)
            .cloned()
            .ok_or_else(|| Error::reference("unresolved reference")),
        Expr::Unary { op, operand } => {
            let v = evaluate(operand, refs, ctx)?;
            unary_op(*op, &v, ctx)
        }
        Expr::Binary { op, lhs, rhs } => {
            let l = evaluate(lhs, refs, ctx)?;
            let r = evaluate(rhs, refs, ctx)?;
            binary_op(*op, &l, &r, ctx)
        }
        Expr::Call { name, args } => call(name, args, refs, ctx),
    }
}

fn call(name: &str, args: &[Expr], refs: &[Value], ctx: &EvalContext) -> Result<Value> {
    let def = function(name)
        .ok_or_else(|| Error::formula(format!("function {name} does not exist")))?;
    if args.len() < def.min_args || args.len() > def.max_args {
        return Err(Error::formula(format!(
            "function {name} accepts from {} to {} arguments, {} provided",
            def.min_args,
            def.max_args,
            args.len()
        )));
    }
    // IF picks its branch before anything is evaluated
    if def.name == "IF" {
        let cond = evaluate(&args[0], refs, ctx)?.as_bool(ctx)?;
        let branch = if cond { &args[1] } else { &args[2] };
        return evaluate(branch, refs, ctx);
    }
    let values = args
        .iter()
        .map(|a| evaluate(a, refs, ctx))
        .collect::<Result<Vec<_>>>()?;
    (def.func)(ctx, &values)
}

fn binary_op(op: BinaryOp, lhs: &Value, rhs: &Value, ctx: &EvalContext) -> Result<Value> {
    match lhs.kind(ctx)? {
        ValueKind::Bool => bool_op(op, lhs.as_bool(ctx)?, rhs.as_bool(ctx)?),
        ValueKind::Empty | ValueKind::Decimal => {
            decimal_op(op, lhs.as_decimal(ctx)?, rhs.as_decimal(ctx)?)
        }
        ValueKind::String => string_op(op, &lhs.as_string(ctx)?, &rhs.as_string(ctx)?),
        ValueKind::Range => Err(Error::casting("unable to get type for a range")),
    }
}

fn unary_op(op: UnaryOp, v: &Value, ctx: &EvalContext) -> Result<Value> {
    match v.kind(ctx)? {
        // unary plus keeps a bool a bool; minus casts through decimal
        ValueKind::Bool => Ok(match op {
            UnaryOp::Plus => Value::Bool(v.as_bool(ctx)?),
            UnaryOp::Neg => Value::Decimal(-v.as_decimal(ctx)?),
        }),
        ValueKind::Empty | ValueKind::Decimal => {
            let d = v.as_decimal(ctx)?;
            Ok(Value::Decimal(match op {
                UnaryOp::Plus => d,
                UnaryOp::Neg => -d,
            }))
        }
        ValueKind::String => Err(Error::formula(format!(
            "arithmetic ({}) on string operand",
            op.symbol()
        ))),
        ValueKind::Range => Err(Error::casting("unable to get type for a range")),
    }
}

// Excel-like boolean arithmetic: TRUE acts as 1, FALSE as 0, and the
// result of an arithmetic operator is a decimal.
fn bool_op(op: BinaryOp, a: bool, b: bool) -> Result<Value> {
    let ones = |x: bool| if x { Decimal::ONE } else { Decimal::ZERO };
    Ok(match op {
        BinaryOp::Eq => Value::Bool(a == b),
        BinaryOp::Ne => Value::Bool(a != b),
        // TRUE > FALSE
        BinaryOp::Lt => Value::Bool(!a && b),
        BinaryOp::Le => Value::Bool(!a || b),
        BinaryOp::Gt => Value::Bool(a && !b),
        BinaryOp::Ge => Value::Bool(a || !b),
        BinaryOp::Add | BinaryOp::Mul => Value::Decimal(ones(a) + ones(b)),
        BinaryOp::Sub | BinaryOp::Div => Value::Decimal(ones(a) - ones(b)),
        // FALSE^TRUE = 0, everything else = 1
        BinaryOp::Pow => Value::Decimal(if a || !b { Decimal::ONE } else { Decimal::ZERO }),
    })
}

// `Decimal` is fixed-width, so arithmetic that leaves its range must
// surface as a formula error rather than a panic.
pub(crate) fn overflow() -> Error {
    Error::formula("decimal overflow")
}

fn decimal_op(op: BinaryOp, a: Decimal, b: Decimal) -> Result<Value> {
    Ok(match op {
        BinaryOp::Eq => Value::Bool(a == b),
        BinaryOp::Ne => Value::Bool(a != b),
        BinaryOp::Lt => Value::Bool(a < b),
        BinaryOp::Le => Value::Bool(a <= b),
        BinaryOp::Gt => Value::Bool(a > b),
        BinaryOp::Ge => Value::Bool(a >= b),
        BinaryOp::Add => Value::Decimal(a.checked_add(b).ok_or_else(overflow)?),
        BinaryOp::Sub => Value::Decimal(a.checked_sub(b).ok_or_else(overflow)?),
        BinaryOp::Mul => Value::Decimal(a.checked_mul(b).ok_or_else(overflow)?),
        BinaryOp::Div => {
            if b.is_zero() {
                return Err(Error::Div0);
            }
            Value::Decimal(a.checked_div(b).ok_or_else(overflow)?)
        }
        BinaryOp::Pow => Value::Decimal(a.checked_powd(b).ok_or_else(overflow)?),
    })
}

fn string_op(op: BinaryOp, a: &str, b: &str) -> Result<Value> {
    Ok(match op {
        BinaryOp::Eq => Value::Bool(a == b),
        BinaryOp::Ne => Value::Bool(a != b),
        BinaryOp::Lt => Value::Bool(a < b),
        BinaryOp::Le => Value::Bool(a <= b),
        BinaryOp::Gt => Value::Bool(a > b),
        BinaryOp::Ge => Value::Bool(a >= b),
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Pow => {
            return Err(Error::formula(format!(
                "arithmetic ({}) on string operand",
                op.symbol()
            )));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use ahash::AHashMap;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;
    use tabulon_common::{CellAddress, CellReference, CellSource};

    /// Cell source backed by a plain map of concrete values.
    struct MapSource {
        cells: AHashMap<CellAddress, Value>,
    }

    impl MapSource {
        fn new(cells: &[((u32, u32), Value)]) -> Self {
            Self {
                cells: cells
                    .iter()
                    .map(|((x, y), v)| (CellAddress::new(0, *x, *y), v.clone()))
                    .collect(),
            }
        }

        fn get(&self, addr: CellAddress) -> Value {
            self.cells.get(&addr).cloned().unwrap_or(Value::Empty)
        }
    }

    impl CellSource for MapSource {
        fn value(&self, _: &EvalContext, addr: CellAddress) -> Result<Value> {
            Ok(self.get(addr))
        }
        fn bool_value(&self, ctx: &EvalContext, addr: CellAddress) -> Result<bool> {
            self.get(addr).as_bool(ctx)
        }
        fn decimal_value(&self, ctx: &EvalContext, addr: CellAddress) -> Result<Decimal> {
            self.get(addr).as_decimal(ctx)
        }
        fn string_value(&self, ctx: &EvalContext, addr: CellAddress) -> Result<String> {
            self.get(addr).as_string(ctx)
        }
    }

    fn dec(s: &str) -> Value {
        Value::Decimal(Decimal::from_str(s).unwrap())
    }

    /// Parse and evaluate with refs resolved onto sheet 0 of `source`.
    fn eval_str(formula: &str, source: &MapSource) -> Result<String> {
        let parsed = parse(formula)?;
        let refs = parsed
            .refs
            .iter()
            .map(|r| {
                let from = CellReference::parse(0, &r.from.cell).unwrap();
                match &r.to {
                    Some(to) => {
                        Value::Range(from, CellReference::parse(0, &to.cell).unwrap())
                    }
                    None => Value::Ref(from),
                }
            })
            .collect::<Vec<_>>();
        let ctx = EvalContext::new(source, 0);
        evaluate(&parsed.expr, &refs, &ctx)?.as_string(&ctx)
    }

    fn eval_lit(formula: &str) -> Result<String> {
        eval_str(formula, &MapSource::new(&[]))
    }

    #[test]
    fn test_literal_arithmetic() {
        assert_eq!(eval_lit("=1").unwrap(), "1");
        assert_eq!(eval_lit("=1+1").unwrap(), "2");
        assert_eq!(eval_lit("=2+2*2").unwrap(), "6");
        assert_eq!(eval_lit("=(2+2)*2").unwrap(), "8");
        assert_eq!(eval_lit("=1+1*1+1").unwrap(), "3");
        assert_eq!(eval_lit("=7/2").unwrap(), "3.5");
        assert_eq!(eval_lit("=2^10").unwrap(), "1024");
        assert_eq!(eval_lit("=0.1+0.2").unwrap(), "0.3");
    }

    #[test]
    fn test_unary() {
        assert_eq!(eval_lit("=-1").unwrap(), "-1");
        assert_eq!(eval_lit("=+1").unwrap(), "1");
        assert_eq!(eval_lit("=--1").unwrap(), "1");
        assert_eq!(eval_lit("=-TRUE").unwrap(), "-1");
        assert_eq!(eval_lit("=+TRUE").unwrap(), "TRUE");
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(eval_lit("=1=1").unwrap(), "TRUE");
        assert_eq!(eval_lit("=1<>1").unwrap(), "FALSE");
        assert_eq!(eval_lit("=1>1").unwrap(), "FALSE");
        assert_eq!(eval_lit("=1<1").unwrap(), "FALSE");
        assert_eq!(eval_lit("=1>=1").unwrap(), "TRUE");
        assert_eq!(eval_lit("=1<=1").unwrap(), "TRUE");
        // scale does not matter
        assert_eq!(eval_lit("=1.0=1").unwrap(), "TRUE");
    }

    #[test]
    fn test_bool_lane() {
        assert_eq!(eval_lit("=TRUE+TRUE").unwrap(), "2");
        assert_eq!(eval_lit("=TRUE+FALSE").unwrap(), "1");
        assert_eq!(eval_lit("=TRUE-TRUE").unwrap(), "0");
        assert_eq!(eval_lit("=FALSE-TRUE").unwrap(), "-1");
        assert_eq!(eval_lit("=TRUE^FALSE").unwrap(), "1");
        assert_eq!(eval_lit("=FALSE^TRUE").unwrap(), "0");
        assert_eq!(eval_lit("=TRUE>FALSE").unwrap(), "TRUE");
        // the second operand is cast to bool first: 5 -> TRUE -> 1
        assert_eq!(eval_lit("=TRUE+5").unwrap(), "2");
    }

    #[test]
    fn test_string_lane() {
        assert_eq!(eval_lit("=\"a\"=\"a\"").unwrap(), "TRUE");
        assert_eq!(eval_lit("=\"a\"<\"b\"").unwrap(), "TRUE");
        assert_eq!(
            eval_lit("=\"a\"+\"b\"").unwrap_err(),
            Error::formula("arithmetic (+) on string operand")
        );
        assert_eq!(
            eval_lit("=-\"a\"").unwrap_err(),
            Error::formula("arithmetic (-) on string operand")
        );
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval_lit("=1/0").unwrap_err(), Error::Div0);
        assert_eq!(eval_lit("=1/0").unwrap_err().to_string(), "division by zero");
    }

    #[test]
    fn test_overflow_is_an_error() {
        // past Decimal's 96-bit range in every lane that can get there
        assert_eq!(
            eval_lit("=2^100").unwrap_err(),
            Error::formula("decimal overflow")
        );
        assert_eq!(
            eval_lit("=9000000000000000000000000000*9000000000000000000000000000").unwrap_err(),
            Error::formula("decimal overflow")
        );
        assert_eq!(
            eval_lit("=79228162514264337593543950335+1").unwrap_err(),
            Error::formula("decimal overflow")
        );
        assert_eq!(
            eval_lit("=79228162514264337593543950335/0.1").unwrap_err(),
            Error::formula("decimal overflow")
        );
    }

    #[test]
    fn test_refs_resolve_through_source() {
        let source = MapSource::new(&[((0, 0), dec("4"))]);
        assert_eq!(eval_str("=A1", &source).unwrap(), "4");
        assert_eq!(eval_str("=-A1", &source).unwrap(), "-4");
        assert_eq!(eval_str("=A1+A1", &source).unwrap(), "8");
    }

    #[test]
    fn test_empty_cell_in_decimal_lane() {
        let source = MapSource::new(&[]);
        assert_eq!(eval_str("=B1+1", &source).unwrap(), "1");
    }

    #[test]
    fn test_sum_over_range() {
        let source = MapSource::new(&[
            ((0, 0), dec("1")),
            ((0, 1), dec("2")),
            ((1, 0), dec("3")),
            ((1, 1), dec("4")),
        ]);
        assert_eq!(eval_str("=SUM(A1:B2)", &source).unwrap(), "10");
        // empty cells inside the range count as zero
        assert_eq!(eval_str("=SUM(A1:C3)", &source).unwrap(), "10");
    }

    #[test]
    fn test_invalid_range_bounds() {
        let source = MapSource::new(&[]);
        assert_eq!(
            eval_str("=SUM(C2:B1)", &source).unwrap_err(),
            Error::reference("invalid range bounds")
        );
    }

    #[test]
    fn test_if_is_lazy() {
        // the unselected branch would divide by zero
        assert_eq!(eval_lit("=IF(TRUE; 1; 1/0)").unwrap(), "1");
        assert_eq!(eval_lit("=IF(FALSE; 1/0; 2)").unwrap(), "2");
        assert_eq!(eval_lit("=IF(FALSE; 1; 1/0)").unwrap_err(), Error::Div0);
    }

    #[test]
    fn test_function_errors() {
        assert_eq!(
            eval_lit("=NOPE(1)").unwrap_err(),
            Error::formula("function NOPE does not exist")
        );
        assert_eq!(
            eval_lit("=IF(TRUE; 1)").unwrap_err(),
            Error::formula("function IF accepts from 3 to 3 arguments, 2 provided")
        );
        assert_eq!(
            eval_lit("=TRIM()").unwrap_err(),
            Error::formula("function TRIM accepts from 1 to 1 arguments, 0 provided")
        );
    }

    #[test]
    fn test_functions_end_to_end() {
        assert_eq!(eval_lit("=TRIM(\"  ggg  \")").unwrap(), "ggg");
        assert_eq!(eval_lit("=SUM(1)").unwrap(), "1");
        assert_eq!(eval_lit("=SUM(1, 2, 3)").unwrap(), "6");
        assert_eq!(eval_lit("=MIN(3; 1; 2)").unwrap(), "1");
        assert_eq!(eval_lit("=MAX(3; 1; 2)").unwrap(), "3");
        assert_eq!(eval_lit("=AVERAGE(1; 2; 3; 4)").unwrap(), "2.5");
        assert_eq!(eval_lit("=COUNT(1; TRUE; 2)").unwrap(), "2");
    }
}
