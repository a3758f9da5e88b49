//! String scanning for the lexer
//!
//! Handles plain, raw, byte and f-string literals in single or triple quotes.

use super::Lexer;
use super::tokens::{StrLit, TokenKind};
use crate::ast::Span;
use crate::diagnostics::SyntaxError;

// ============================================================================
// Escape sequence handling
// ============================================================================

/// Result of processing an escape sequence
enum EscapeResult {
    /// Successfully decoded character
    Char(char),
    /// Escaped newline: line continuation inside the literal
    Continuation,
    /// Unknown escape, preserved as backslash + text
    Unknown(String),
    /// Malformed numeric escape
    Invalid(String),
    /// End of input during escape
    Eof,
}

impl<'a> Lexer<'a> {
    /// Process an escape sequence. Called after consuming the backslash.
    fn scan_escape(&mut self, bytes: bool) -> EscapeResult {
        match self.advance() {
            Some('\n') => EscapeResult::Continuation,
            Some('n') => EscapeResult::Char('\n'),
            Some('t') => EscapeResult::Char('\t'),
            Some('r') => EscapeResult::Char('\r'),
            Some('a') => EscapeResult::Char('\x07'),
            Some('b') => EscapeResult::Char('\x08'),
            Some('f') => EscapeResult::Char('\x0c'),
            Some('v') => EscapeResult::Char('\x0b'),
            Some(c @ ('\\' | '\'' | '"')) => EscapeResult::Char(c),
            Some(c @ '0'..='7') => {
                let mut digits = String::from(c);
                while digits.len() < 3 && self.peek().is_some_and(|d| ('0'..='7').contains(&d)) {
                    if let Some(d) = self.advance() {
                        digits.push(d);
                    }
                }
                self.code_point(&digits, 8)
            }
            Some('x') => {
                let digits = self.take_hex(2);
                self.code_point(&digits, 16)
            }
            Some('u') if !bytes => {
                let digits = self.take_hex(4);
                self.code_point(&digits, 16)
            }
            Some('U') if !bytes => {
                let digits = self.take_hex(8);
                self.code_point(&digits, 16)
            }
            Some(c) => EscapeResult::Unknown(format!("\\{c}")),
            None => EscapeResult::Eof,
        }
    }

    fn take_hex(&mut self, count: usize) -> String {
        let mut digits = String::new();
        while digits.len() < count && self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
            if let Some(c) = self.advance() {
                digits.push(c);
            }
        }
        if digits.len() < count {
            // Force a parse failure for truncated escapes.
            digits.push('!');
        }
        digits
    }

    fn code_point(&self, digits: &str, radix: u32) -> EscapeResult {
        match u32::from_str_radix(digits, radix).ok().and_then(char::from_u32) {
            Some(c) => EscapeResult::Char(c),
            None => EscapeResult::Invalid(digits.trim_end_matches('!').to_string()),
        }
    }
}

// ============================================================================
// String scanning
// ============================================================================

impl<'a> Lexer<'a> {
    /// Scan a string literal whose opening quote has already been consumed.
    pub(super) fn scan_string(&mut self, start: usize, prefix: String, quote: char) {
        let raw_mode = prefix.contains('r');
        let verbatim = raw_mode || prefix.contains('f');
        let bytes = prefix.contains('b');

        let triple = if self.peek() == Some(quote) && self.peek_next() == Some(quote) {
            self.advance();
            self.advance();
            true
        } else {
            false
        };

        let mut value = String::new();
        let mut terminated = false;

        loop {
            match self.peek() {
                None => break,
                Some(c) if c == quote => {
                    self.advance();
                    if !triple {
                        terminated = true;
                        break;
                    }
                    if self.peek() == Some(quote) && self.peek_next() == Some(quote) {
                        self.advance();
                        self.advance();
                        terminated = true;
                        break;
                    }
                    value.push(quote);
                }
                Some('\n') if !triple => break,
                Some('\\') => {
                    self.advance();
                    if verbatim {
                        // The backslash stays, but it still protects the next character.
                        value.push('\\');
                        if let Some(c) = self.advance() {
                            value.push(c);
                        }
                        continue;
                    }
                    match self.scan_escape(bytes) {
                        EscapeResult::Char(c) => value.push(c),
                        EscapeResult::Continuation => {}
                        EscapeResult::Unknown(text) => value.push_str(&text),
                        EscapeResult::Invalid(digits) => {
                            self.errors.push(SyntaxError::new(
                                format!("invalid escape sequence value '{digits}'"),
                                Span::new(start, self.current_pos),
                            ));
                        }
                        EscapeResult::Eof => break,
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }

        if !terminated {
            let message = if triple {
                "unterminated triple-quoted string literal"
            } else {
                "unterminated string literal"
            };
            self.errors
                .push(SyntaxError::new(message, Span::new(start, self.current_pos)));
            return;
        }

        let raw = self.source[start..self.current_pos].to_string();
        self.add_token(TokenKind::Str(StrLit { prefix, value, raw }), start);
    }
}
