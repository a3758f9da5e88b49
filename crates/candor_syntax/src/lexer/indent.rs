//! Indentation handling for the lexer
//!
//! Implements INDENT/DEDENT tokens. Tabs advance to the next multiple of eight columns.

use super::Lexer;
use super::tokens::{Token, TokenKind};
use crate::ast::Span;
use crate::diagnostics::SyntaxError;

const TAB_WIDTH: usize = 8;

impl<'a> Lexer<'a> {
    pub(super) fn handle_indentation(&mut self) {
        let start = self.current_pos;
        let mut indent = 0;

        while let Some(c) = self.peek() {
            match c {
                ' ' => {
                    indent += 1;
                    self.advance();
                }
                '\t' => {
                    indent = (indent / TAB_WIDTH + 1) * TAB_WIDTH;
                    self.advance();
                }
                '\x0c' => {
                    indent = 0;
                    self.advance();
                }
                '#' => {
                    // Comment-only line
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                    if self.peek() == Some('\n') {
                        self.advance();
                    }
                    return;
                }
                '\n' => {
                    // Blank line
                    self.advance();
                    return;
                }
                '\r' => {
                    self.advance();
                }
                '\\' if self.peek_next() == Some('\n') => {
                    // A continuation on an otherwise empty line joins with the next one.
                    self.advance();
                    self.advance();
                }
                _ => break,
            }
        }

        if self.is_at_end() {
            self.at_line_start = false;
            return;
        }

        let current_indent = *self.indent_stack.last().unwrap_or(&0);

        if indent > current_indent {
            self.indent_stack.push(indent);
            self.tokens
                .push(Token::new(TokenKind::Indent, Span::new(start, self.current_pos)));
        } else if indent < current_indent {
            let mut count = 0;
            while let Some(&top) = self.indent_stack.last() {
                if indent >= top || self.indent_stack.len() == 1 {
                    break;
                }
                self.indent_stack.pop();
                count += 1;
            }

            let landed = *self.indent_stack.last().unwrap_or(&0);
            if indent != landed {
                self.errors.push(SyntaxError::new(
                    format!("unindent does not match any outer indentation level (expected {landed}, got {indent})"),
                    Span::new(start, self.current_pos),
                ));
            }

            if count > 0 {
                self.tokens
                    .push(Token::new(TokenKind::Dedent, Span::new(start, self.current_pos)));
                self.pending_dedents = count - 1;
            }
        }

        self.at_line_start = false;
    }
}
