//! Formula rendering
//!
//! Turns an AST back into formula text. Parentheses are not stored in the
//! tree, so they are reinserted wherever a child binds looser than its
//! parent. Rendering then reparsing yields the same tree.

use crate::ast::{BinaryOp, Expr};

/// Render a formula, including the leading `=`. `ref_names` supplies the
/// display text for each entry of the formula's reference list, e.g.
/// `B2` or `Sheet2!$A$1:C3`.
pub fn render(expr: &Expr, ref_names: &[String]) -> String {
    let mut out = String::from("=");
    write_expr(&mut out, expr, ref_names);
    out
}

fn write_expr(out: &mut String, expr: &Expr, ref_names: &[String]) {
    match expr {
        Expr::Number(d) => out.push_str(&d.normalize().to_string()),
        Expr::Str(s) => {
            out.push('"');
            out.push_str(&s.replace('"', "\"\""));
            out.push('"');
        }
        Expr::Bool(true) => out.push_str("TRUE"),
        Expr::Bool(false) => out.push_str("FALSE"),
        Expr::Ref(i) => match ref_names.get(*i) {
            Some(name) => out.push_str(name),
            None => out.push_str("#REF!"),
        },
        Expr::Unary { op, operand } => {
            out.push_str(op.symbol());
            // unary binds tighter than every binary operator
            write_child(out, operand, ref_names, matches!(**operand, Expr::Binary { .. }));
        }
        Expr::Binary { op, lhs, rhs } => {
            write_child(out, lhs, ref_names, needs_parens(lhs, *op, true));
            out.push_str(op.symbol());
            write_child(out, rhs, ref_names, needs_parens(rhs, *op, false));
        }
        Expr::Call { name, args } => {
            out.push_str(name);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str("; ");
                }
                write_expr(out, arg, ref_names);
            }
            out.push(')');
        }
    }
}

fn write_child(out: &mut String, child: &Expr, ref_names: &[String], parens: bool) {
    if parens {
        out.push('(');
        write_expr(out, child, ref_names);
        out.push(')');
    } else {
        write_expr(out, child, ref_names);
    }
}

fn needs_parens(child: &Expr, parent: BinaryOp, is_lhs: bool) -> bool {
    let Expr::Binary { op: child_op, .. } = child else {
        return false;
    };
    let (c, p) = (child_op.precedence(), parent.precedence());
    if c != p {
        return c < p;
    }
    // equal precedence: associativity decides which side re-parses freely
    match parent {
        BinaryOp::Pow => is_lhs,
        _ => !is_lhs,
    }
}
