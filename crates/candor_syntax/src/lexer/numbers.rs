//! Number scanning for the lexer
//!
//! Handles integer (decimal, hex, octal, binary), float and imaginary literals. The exact spelling
//! is kept on the token; no numeric value is computed.

use super::Lexer;
use super::tokens::{NumberKind, NumberLit, TokenKind};
use crate::ast::Span;
use crate::diagnostics::SyntaxError;

impl<'a> Lexer<'a> {
    pub(super) fn scan_number(&mut self, start: usize, first: char) {
        let mut kind = NumberKind::Int;

        if first == '0' && self.peek().is_some_and(|c| matches!(c, 'x' | 'X' | 'o' | 'O' | 'b' | 'B')) {
            let radix = match self.advance() {
                Some('x' | 'X') => 16,
                Some('o' | 'O') => 8,
                _ => 2,
            };
            let digits = self.scan_digits(|c| c.is_digit(radix));
            if digits == 0 {
                self.errors.push(SyntaxError::new(
                    "invalid integer literal",
                    Span::new(start, self.current_pos),
                ));
                return;
            }
            self.finish_number(start, kind);
            return;
        }

        if first == '.' {
            kind = NumberKind::Float;
            self.scan_digits(|c| c.is_ascii_digit());
        } else {
            self.scan_digits(|c| c.is_ascii_digit());
            if self.peek() == Some('.') {
                kind = NumberKind::Float;
                self.advance();
                self.scan_digits(|c| c.is_ascii_digit());
            }
        }

        // Exponent part, only when digits actually follow
        if matches!(self.peek(), Some('e' | 'E')) {
            let next = self.peek_next();
            let signed = matches!(next, Some('+' | '-'));
            let has_digits = if signed {
                self.source[self.current_pos..]
                    .chars()
                    .nth(2)
                    .is_some_and(|c| c.is_ascii_digit())
            } else {
                next.is_some_and(|c| c.is_ascii_digit())
            };
            if has_digits {
                kind = NumberKind::Float;
                self.advance();
                if signed {
                    self.advance();
                }
                self.scan_digits(|c| c.is_ascii_digit());
            }
        }

        if matches!(self.peek(), Some('j' | 'J')) {
            self.advance();
            kind = NumberKind::Imaginary;
        }

        self.finish_number(start, kind);
    }

    /// Consume digits (and `_` separators) accepted by `accept`; returns the digit count.
    fn scan_digits(&mut self, accept: impl Fn(char) -> bool) -> usize {
        let mut count = 0;
        while let Some(c) = self.peek() {
            if accept(c) {
                count += 1;
            } else if c != '_' {
                break;
            }
            self.advance();
        }
        count
    }

    fn finish_number(&mut self, start: usize, kind: NumberKind) {
        let raw = self.source[start..self.current_pos].to_string();
        if raw.ends_with('_') || raw.contains("__") {
            self.errors.push(SyntaxError::new(
                format!("invalid numeric literal '{raw}'"),
                Span::new(start, self.current_pos),
            ));
            return;
        }
        if self.peek().is_some_and(super::is_ident_start) {
            self.errors.push(SyntaxError::new(
                format!("invalid numeric literal '{raw}'"),
                Span::new(start, self.current_pos),
            ));
            return;
        }
        self.add_token(TokenKind::Number(NumberLit { raw, kind }), start);
    }
}
