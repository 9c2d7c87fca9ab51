//! Formula lexer

use rust_decimal::Decimal;
use tabulon_common::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(Decimal),
    /// String literal, `""` unescaped
    Str(String),
    Bool(bool),
    /// Identifier: a function name, bare sheet name or cell name
    Ident(String),
    /// Single-quoted sheet name, `''` unescaped
    QuotedSheet(String),
    Bang,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Colon,
    Semicolon,
    Comma,
}

impl Token {
    pub fn describe(&self) -> String {
        match self {
            Token::Number(d) => d.to_string(),
            Token::Str(s) => format!("\"{s}\""),
            Token::Bool(true) => "TRUE".into(),
            Token::Bool(false) => "FALSE".into(),
            Token::Ident(s) => s.clone(),
            Token::QuotedSheet(s) => format!("'{s}'"),
            Token::Bang => "!".into(),
            Token::Eq => "=".into(),
            Token::Ne => "<>".into(),
            Token::Lt => "<".into(),
            Token::Le => "<=".into(),
            Token::Gt => ">".into(),
            Token::Ge => ">=".into(),
            Token::Plus => "+".into(),
            Token::Minus => "-".into(),
            Token::Star => "*".into(),
            Token::Slash => "/".into(),
            Token::Caret => "^".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
            Token::Colon => ":".into(),
            Token::Semicolon => ";".into(),
            Token::Comma => ",".into(),
        }
    }
}

pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer {
        chars: source.chars().collect(),
        pos: 0,
    }
    .run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
}

impl Lexer {
    fn run(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' | '\n' => {
                    self.pos += 1;
                }
                '(' => tokens.push(self.take(Token::LParen)),
                ')' => tokens.push(self.take(Token::RParen)),
                ':' => tokens.push(self.take(Token::Colon)),
                ';' => tokens.push(self.take(Token::Semicolon)),
                ',' => tokens.push(self.take(Token::Comma)),
                '!' => tokens.push(self.take(Token::Bang)),
                '+' => tokens.push(self.take(Token::Plus)),
                '-' => tokens.push(self.take(Token::Minus)),
                '*' => tokens.push(self.take(Token::Star)),
                '/' => tokens.push(self.take(Token::Slash)),
                '^' => tokens.push(self.take(Token::Caret)),
                '=' => tokens.push(self.take(Token::Eq)),
                '<' => {
                    self.pos += 1;
                    match self.peek() {
                        Some('>') => tokens.push(self.take(Token::Ne)),
                        Some('=') => tokens.push(self.take(Token::Le)),
                        _ => tokens.push(Token::Lt),
                    }
                }
                '>' => {
                    self.pos += 1;
                    if self.peek() == Some('=') {
                        tokens.push(self.take(Token::Ge));
                    } else {
                        tokens.push(Token::Gt);
                    }
                }
                '"' => tokens.push(self.scan_quoted('"', "unterminated string", Token::Str)?),
                '\'' => tokens.push(self.scan_quoted(
                    '\'',
                    "unterminated sheet name",
                    Token::QuotedSheet,
                )?),
                '.' | '0'..='9' => tokens.push(self.scan_number()?),
                c if is_ident_char(c) => tokens.push(self.scan_ident()),
                c => {
                    return Err(Error::formula(format!(
                        "unexpected character '{}' at position {}",
                        c,
                        self.pos + 1
                    )));
                }
            }
        }
        Ok(tokens)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn take(&mut self, token: Token) -> Token {
        self.pos += 1;
        token
    }

    /// Scan a `quote`-delimited literal where a doubled quote stands for a
    /// literal quote character.
    fn scan_quoted(
        &mut self,
        quote: char,
        unterminated: &str,
        make: fn(String) -> Token,
    ) -> Result<Token> {
        self.pos += 1;
        let mut out = String::new();
        loop {
            match self.peek() {
                Some(c) if c == quote => {
                    if self.peek_at(1) == Some(quote) {
                        out.push(quote);
                        self.pos += 2;
                    } else {
                        self.pos += 1;
                        return Ok(make(out));
                    }
                }
                Some(c) => {
                    out.push(c);
                    self.pos += 1;
                }
                None => return Err(Error::formula(unterminated)),
            }
        }
    }

    // \d*\.?\d+([eE][-+]?\d+)?
    fn scan_number(&mut self) -> Result<Token> {
        let start = self.pos;
        while matches!(self.peek(), Some('0'..='9')) {
            self.pos += 1;
        }
        if self.peek() == Some('.') && matches!(self.peek_at(1), Some('0'..='9')) {
            self.pos += 1;
            while matches!(self.peek(), Some('0'..='9')) {
                self.pos += 1;
            }
        }
        let mut scientific = false;
        if matches!(self.peek(), Some('e' | 'E')) {
            let mut offset = 1;
            if matches!(self.peek_at(1), Some('+' | '-')) {
                offset = 2;
            }
            if matches!(self.peek_at(offset), Some('0'..='9')) {
                scientific = true;
                self.pos += offset;
                while matches!(self.peek(), Some('0'..='9')) {
                    self.pos += 1;
                }
            }
        }
        let mut text: String = self.chars[start..self.pos].iter().collect();
        if text.starts_with('.') {
            text.insert(0, '0');
        }
        let number = if scientific {
            Decimal::from_scientific(&text)
        } else {
            text.parse()
        };
        number
            .map(Token::Number)
            .map_err(|_| Error::formula(format!("malformed number {text}")))
    }

    fn scan_ident(&mut self) -> Token {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        if text.eq_ignore_ascii_case("TRUE") {
            Token::Bool(true)
        } else if text.eq_ignore_ascii_case("FALSE") {
            Token::Bool(false)
        } else {
            Token::Ident(text)
        }
    }
}

// covers function names, bare sheet names and $-anchored cell names
fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}
