//! Numeric literal scanning.
//!
//! - `42` int (32-bit), `42L` long
//! - `3.14` / `1e9` / `2.5E-3` double, with `f`/`F` suffix float
//! - `1..5` is `Int DotDot Int`: a `.` only starts a fraction when a digit follows it.

use super::{Lexer, Mark, TokenKind};
use crate::ast::Span;
use crate::diagnostics::Diagnostic;

impl Lexer<'_> {
    /// Scan a number whose first digit was just consumed.
    pub(super) fn scan_number(&mut self, start: Mark) {
        self.eat_digits();

        let mut fractional = false;
        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            fractional = true;
            self.advance();
            self.eat_digits();
        }

        if matches!(self.peek(), Some('e' | 'E')) && self.exponent_follows() {
            fractional = true;
            self.advance();
            if matches!(self.peek(), Some('+' | '-')) {
                self.advance();
            }
            self.eat_digits();
        }

        let digits = self.source.get(start.pos..self.pos).unwrap_or_default().to_string();

        if self.peek().is_some_and(|c| c == 'f' || c == 'F') {
            self.advance();
            let kind = self.parse_float(&digits, start).map(TokenKind::Float);
            self.push_number(kind, start);
        } else if fractional {
            let kind = self.parse_float(&digits, start).map(TokenKind::Double);
            self.push_number(kind, start);
        } else if self.peek() == Some('L') {
            self.advance();
            let kind = self.parse_int(&digits, start).map(TokenKind::Long);
            self.push_number(kind, start);
        } else {
            let kind = self.parse_int(&digits, start).and_then(|value| self.check_int(value, &digits, start));
            self.push_number(kind.map(TokenKind::Int), start);
        }
    }

    fn eat_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    /// `e` followed by digits, or by a sign and digits.
    fn exponent_follows(&self) -> bool {
        let mut rest = self.source.get(self.pos..).unwrap_or_default().chars().skip(1);
        match rest.next() {
            Some(c) if c.is_ascii_digit() => true,
            Some('+' | '-') => rest.next().is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        }
    }

    fn parse_int(&mut self, digits: &str, start: Mark) -> Option<i64> {
        match digits.parse::<i64>() {
            Ok(value) => Some(value),
            Err(_) => {
                self.error(
                    format!("integer literal `{digits}` is out of range"),
                    Span::new(start.pos, self.pos),
                );
                None
            }
        }
    }

    /// An unsuffixed literal is an `int` and must fit in 32 bits.
    fn check_int(&mut self, value: i64, digits: &str, start: Mark) -> Option<i64> {
        if value <= i64::from(i32::MAX) {
            return Some(value);
        }
        self.errors.push(
            Diagnostic::lex(
                format!("integer literal `{digits}` is too large for `int`"),
                Span::new(start.pos, self.pos),
            )
            .with_note(format!("the largest `int` is {}", i32::MAX))
            .with_hint(format!("add an `L` suffix to make it a `long`: `{digits}L`")),
        );
        None
    }

    fn parse_float(&mut self, digits: &str, start: Mark) -> Option<f64> {
        match digits.parse::<f64>() {
            Ok(value) if value.is_finite() => Some(value),
            _ => {
                self.error(
                    format!("floating-point literal `{digits}` is out of range"),
                    Span::new(start.pos, self.pos),
                );
                None
            }
        }
    }

    /// Queue the literal, or a zero placeholder after a reported error so parsing can go on.
    fn push_number(&mut self, kind: Option<TokenKind>, start: Mark) {
        self.push(kind.unwrap_or(TokenKind::Int(0)), start);
    }
}
