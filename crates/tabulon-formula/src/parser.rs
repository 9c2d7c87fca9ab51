//! Recursive-descent formula parser
//!
//! Grammar, lowest to highest precedence:
//!
//! ```text
//! formula     = "=" equality
//! equality    = comparison { ("=" | "<>") comparison }
//! comparison  = addition { ("<" | "<=" | ">" | ">=") addition }
//! addition    = multiplication { ("+" | "-") multiplication }
//! multiplication = power { ("*" | "/") power }
//! power       = unary [ "^" power ]            ; right-associative
//! unary       = ("+" | "-") unary | primary
//! primary     = "(" equality ")" | number | string | boolean
//!             | funcname "(" [ args ] ")" | reference
//! args        = equality { (";" | ",") equality }
//! reference   = [ sheet "!" ] cell [ ":" [ sheet "!" ] cell ]
//! ```
//!
//! Parsing collects references in source order without resolving them;
//! the document model turns each [`SourceRef`] into a live reference when
//! the cell is first evaluated.

use lazy_regex::regex_is_match;
use tabulon_common::{Error, Result};

use crate::ast::{BinaryOp, Expr, RefText, SourceRef, UnaryOp};
use crate::lexer::{tokenize, Token};

/// A parsed formula: the expression tree plus the references it mentions,
/// in source order. `Expr::Ref(i)` indexes into `refs`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFormula {
    pub expr: Expr,
    pub refs: Vec<SourceRef>,
}

/// Parse formula source, which must start with `=`.
pub fn parse(source: &str) -> Result<ParsedFormula> {
    let body = source
        .strip_prefix('=')
        .ok_or_else(|| Error::formula("formula must start with '='"))?;
    let mut parser = Parser {
        tokens: tokenize(body)?,
        pos: 0,
        refs: Vec::new(),
    };
    let expr = parser.parse_equality()?;
    if let Some(t) = parser.peek() {
        return Err(Error::formula(format!("unexpected token {}", t.describe())));
    }
    Ok(ParsedFormula {
        expr,
        refs: parser.refs,
    })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    refs: Vec<SourceRef>,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("expected {}", token.describe())))
        }
    }

    fn unexpected(&self, expected: &str) -> Error {
        match self.peek() {
            Some(t) => Error::formula(format!(
                "unexpected token {} ({expected})",
                t.describe()
            )),
            None => Error::formula(format!("unexpected end of formula ({expected})")),
        }
    }

    fn parse_equality(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_comparison()?;
        loop {
            let op = match self.peek() {
                Some(Token::Eq) => BinaryOp::Eq,
                Some(Token::Ne) => BinaryOp::Ne,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_comparison()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_addition()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::Le) => BinaryOp::Le,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::Ge) => BinaryOp::Ge,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_addition()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn parse_addition(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_multiplication()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_multiplication()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn parse_multiplication(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_power()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_power()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn parse_power(&mut self) -> Result<Expr> {
        let lhs = self.parse_unary()?;
        if self.eat(&Token::Caret) {
            let rhs = self.parse_power()?;
            return Ok(binary(BinaryOp::Pow, lhs, rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let op = match self.peek() {
            Some(Token::Plus) => UnaryOp::Plus,
            Some(Token::Minus) => UnaryOp::Neg,
            _ => return self.parse_primary(),
        };
        self.pos += 1;
        let operand = self.parse_unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.advance() {
            Some(Token::LParen) => {
                let expr = self.parse_equality()?;
                self.expect(&Token::RParen)?;
                Ok(expr)
            }
            Some(Token::Number(d)) => Ok(Expr::Number(d)),
            Some(Token::Str(s)) => Ok(Expr::Str(s)),
            Some(Token::Bool(b)) => Ok(Expr::Bool(b)),
            Some(Token::QuotedSheet(sheet)) => {
                self.expect(&Token::Bang)?;
                let cell = self.expect_cell_name()?;
                self.parse_reference(RefText {
                    sheet: Some(sheet),
                    cell,
                })
            }
            Some(Token::Ident(name)) => {
                if self.eat(&Token::LParen) {
                    return self.parse_call(name);
                }
                if self.eat(&Token::Bang) {
                    let cell = self.expect_cell_name()?;
                    return self.parse_reference(RefText {
                        sheet: Some(name),
                        cell,
                    });
                }
                let cell = cell_name(&name)?;
                self.parse_reference(RefText { sheet: None, cell })
            }
            Some(t) => Err(Error::formula(format!(
                "unexpected token {}",
                t.describe()
            ))),
            None => Err(Error::formula("unexpected end of formula")),
        }
    }

    fn parse_call(&mut self, name: String) -> Result<Expr> {
        let mut args = Vec::new();
        if !self.eat(&Token::RParen) {
            loop {
                args.push(self.parse_equality()?);
                if self.eat(&Token::Semicolon) || self.eat(&Token::Comma) {
                    continue;
                }
                self.expect(&Token::RParen)?;
                break;
            }
        }
        // canonical form is upper-case; lookup ignores case anyway
        Ok(Expr::Call {
            name: name.to_ascii_uppercase(),
            args,
        })
    }

    /// Finish a reference whose first end is already parsed: an optional
    /// `:`-separated second end makes it a range.
    fn parse_reference(&mut self, from: RefText) -> Result<Expr> {
        let to = if self.eat(&Token::Colon) {
            Some(self.parse_ref_end()?)
        } else {
            None
        };
        self.refs.push(SourceRef { from, to });
        Ok(Expr::Ref(self.refs.len() - 1))
    }

    fn parse_ref_end(&mut self) -> Result<RefText> {
        match self.advance() {
            Some(Token::QuotedSheet(sheet)) => {
                self.expect(&Token::Bang)?;
                let cell = self.expect_cell_name()?;
                Ok(RefText {
                    sheet: Some(sheet),
                    cell,
                })
            }
            Some(Token::Ident(name)) => {
                if self.eat(&Token::Bang) {
                    let cell = self.expect_cell_name()?;
                    return Ok(RefText {
                        sheet: Some(name),
                        cell,
                    });
                }
                Ok(RefText {
                    sheet: None,
                    cell: cell_name(&name)?,
                })
            }
            Some(t) => Err(Error::formula(format!(
                "unexpected token {} (expected cell name)",
                t.describe()
            ))),
            None => Err(Error::formula(
                "unexpected end of formula (expected cell name)",
            )),
        }
    }

    fn expect_cell_name(&mut self) -> Result<String> {
        match self.advance() {
            Some(Token::Ident(name)) => cell_name(&name),
            Some(t) => Err(Error::formula(format!(
                "unexpected token {} (expected cell name)",
                t.describe()
            ))),
            None => Err(Error::formula(
                "unexpected end of formula (expected cell name)",
            )),
        }
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

// cell names are upper-cased, anchors preserved
fn cell_name(ident: &str) -> Result<String> {
    let name = ident.to_ascii_uppercase();
    if regex_is_match!(r"^\$?[A-Z]+\$?[1-9][0-9]*$", &name) {
        Ok(name)
    } else {
        Err(Error::formula(format!("unexpected token {ident}")))
    }
}
