//! Lexer for candidate programs and tests (a Python subset).
//!
//! Handles tokenization including:
//! - Keywords and identifiers (Unicode identifiers allowed)
//! - Numeric literals (decimal, hex/octal/binary, floats, imaginary)
//! - String literals with prefixes (`r`, `b`, `u`, `f` and combinations), triple quotes
//! - Operators and punctuation
//! - Indentation-based blocks (INDENT/DEDENT tokens)
//! - Implicit line continuation inside brackets and explicit `\` continuation
//!
//! ## Module Structure
//!
//! - `tokens` - Token types (TokenKind, Token, NumberLit, StrLit)
//! - `strings` - String literal scanning
//! - `numbers` - Numeric literal scanning
//! - `indent` - INDENT/DEDENT handling

mod indent;
mod numbers;
mod strings;
pub mod tokens;

pub use tokens::{NumberKind, NumberLit, StrLit, Token, TokenKind, keyword_id};

use crate::ast::Span;
use crate::diagnostics::SyntaxError;
use candor_core::lang::operators::OperatorId;
use candor_core::lang::punctuation::PunctuationId;

// ============================================================================
// LEXER STATE
// ----------------------------------------------------------------------------
// [Start of line] → measure indentation → [Inside code]
//                                              ↓
//                                        see '(' → [bracket_depth++]
//                                              ↓
//                                        see '\n' → skip (inside brackets)
//                                              ↓
//                                        see ')' → [bracket_depth--]
// ============================================================================

/// Lexer for candidate source code.
pub struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    current_pos: usize,
    indent_stack: Vec<usize>,
    pending_dedents: usize,
    at_line_start: bool,
    /// Bracket depth for implicit line continuation (parens, brackets, braces)
    bracket_depth: usize,
    tokens: Vec<Token>,
    errors: Vec<SyntaxError>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            current_pos: 0,
            indent_stack: vec![0],
            pending_dedents: 0,
            at_line_start: true,
            bracket_depth: 0,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Tokenize the entire source code.
    ///
    /// The token stream always ends with `Newline` (if any content was seen), the remaining
    /// `Dedent`s, and a final `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Token>, Vec<SyntaxError>> {
        while !self.is_at_end() {
            self.scan_token();
        }

        while self.pending_dedents > 0 {
            self.pending_dedents -= 1;
            self.push_marker(TokenKind::Dedent);
        }

        if self.bracket_depth > 0 {
            self.errors.push(SyntaxError::new(
                "unexpected EOF: unclosed bracket",
                Span::new(self.current_pos, self.current_pos),
            ));
        }

        // Terminate a final line that has no trailing newline.
        if self
            .tokens
            .last()
            .is_some_and(|t| !matches!(t.kind, TokenKind::Newline | TokenKind::Dedent))
        {
            self.push_marker(TokenKind::Newline);
        }

        // Emit remaining dedents at EOF
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.push_marker(TokenKind::Dedent);
        }

        self.push_marker(TokenKind::Eof);

        if self.errors.is_empty() {
            Ok(self.tokens)
        } else {
            Err(self.errors)
        }
    }

    // ========================================================================
    // Core character handling
    // ========================================================================

    fn is_at_end(&mut self) -> bool {
        self.chars.peek().is_none()
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_next(&self) -> Option<char> {
        let mut iter = self.source[self.current_pos..].chars();
        iter.next(); // skip current
        iter.next()
    }

    fn advance(&mut self) -> Option<char> {
        if let Some((pos, c)) = self.chars.next() {
            self.current_pos = pos + c.len_utf8();
            Some(c)
        } else {
            None
        }
    }

    fn push_marker(&mut self, kind: TokenKind) {
        self.tokens
            .push(Token::new(kind, Span::new(self.current_pos, self.current_pos)));
    }

    // ========================================================================
    // Main scanning dispatch
    // ========================================================================

    fn scan_token(&mut self) {
        // Handle pending dedents first
        if self.pending_dedents > 0 {
            self.pending_dedents -= 1;
            self.push_marker(TokenKind::Dedent);
            return;
        }

        // Handle indentation at line start
        if self.at_line_start {
            self.handle_indentation();
            return;
        }

        // Skip whitespace (but not newlines)
        while let Some(c) = self.peek() {
            if c == ' ' || c == '\t' || c == '\x0c' {
                self.advance();
            } else {
                break;
            }
        }

        let start = self.current_pos;

        let Some(c) = self.advance() else {
            return;
        };

        match c {
            // Comments
            '#' => {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            }

            // Newlines
            '\n' => {
                // Implicit line continuation: skip newlines inside brackets
                if self.bracket_depth > 0 {
                    return;
                }
                if self
                    .tokens
                    .last()
                    .is_some_and(|t| !matches!(t.kind, TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent))
                {
                    self.tokens
                        .push(Token::new(TokenKind::Newline, Span::new(start, self.current_pos)));
                }
                self.at_line_start = true;
            }

            '\r' => {}

            // Explicit line continuation
            '\\' => {
                if self.peek() == Some('\r') {
                    self.advance();
                }
                if !self.match_char('\n') {
                    self.errors.push(SyntaxError::new(
                        "unexpected character after line continuation character",
                        Span::new(start, self.current_pos),
                    ));
                }
            }

            // Operators and punctuation
            '+' => self.operator(start, OperatorId::Plus, &[('=', OperatorId::PlusEq)]),
            '-' => {
                if self.match_char('>') {
                    self.add_punct(PunctuationId::Arrow, start);
                } else {
                    self.operator(start, OperatorId::Minus, &[('=', OperatorId::MinusEq)]);
                }
            }
            '*' => {
                if self.match_char('*') {
                    self.operator(start, OperatorId::StarStar, &[('=', OperatorId::StarStarEq)]);
                } else {
                    self.operator(start, OperatorId::Star, &[('=', OperatorId::StarEq)]);
                }
            }
            '/' => {
                if self.match_char('/') {
                    self.operator(start, OperatorId::SlashSlash, &[('=', OperatorId::SlashSlashEq)]);
                } else {
                    self.operator(start, OperatorId::Slash, &[('=', OperatorId::SlashEq)]);
                }
            }
            '%' => self.operator(start, OperatorId::Percent, &[('=', OperatorId::PercentEq)]),
            '&' => self.operator(start, OperatorId::Amp, &[('=', OperatorId::AmpEq)]),
            '|' => self.operator(start, OperatorId::Pipe, &[('=', OperatorId::PipeEq)]),
            '^' => self.operator(start, OperatorId::Caret, &[('=', OperatorId::CaretEq)]),
            '~' => self.add_op(OperatorId::Tilde, start),
            '@' => {
                if self.match_char('=') {
                    self.add_op(OperatorId::AtEq, start);
                } else {
                    self.add_punct(PunctuationId::At, start);
                }
            }
            ',' => self.add_punct(PunctuationId::Comma, start),
            ';' => self.add_punct(PunctuationId::Semicolon, start),
            '(' => self.open_bracket(PunctuationId::LParen, start),
            ')' => self.close_bracket(PunctuationId::RParen, start),
            '[' => self.open_bracket(PunctuationId::LBracket, start),
            ']' => self.close_bracket(PunctuationId::RBracket, start),
            '{' => self.open_bracket(PunctuationId::LBrace, start),
            '}' => self.close_bracket(PunctuationId::RBrace, start),
            ':' => {
                if self.match_char('=') {
                    self.add_op(OperatorId::ColonEq, start);
                } else {
                    self.add_punct(PunctuationId::Colon, start);
                }
            }
            '=' => self.operator(start, OperatorId::Eq, &[('=', OperatorId::EqEq)]),
            '!' => {
                if self.match_char('=') {
                    self.add_op(OperatorId::NotEq, start);
                } else {
                    self.errors.push(SyntaxError::new(
                        "invalid syntax: unexpected '!'",
                        Span::new(start, self.current_pos),
                    ));
                }
            }
            '<' => {
                if self.match_char('<') {
                    self.operator(start, OperatorId::LShift, &[('=', OperatorId::LShiftEq)]);
                } else {
                    self.operator(start, OperatorId::Lt, &[('=', OperatorId::LtEq)]);
                }
            }
            '>' => {
                if self.match_char('>') {
                    self.operator(start, OperatorId::RShift, &[('=', OperatorId::RShiftEq)]);
                } else {
                    self.operator(start, OperatorId::Gt, &[('=', OperatorId::GtEq)]);
                }
            }
            '.' => {
                if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.scan_number(start, c);
                } else if self.peek() == Some('.') && self.peek_next() == Some('.') {
                    self.advance();
                    self.advance();
                    self.add_punct(PunctuationId::Ellipsis, start);
                } else {
                    self.add_punct(PunctuationId::Dot, start);
                }
            }

            // Strings without prefix
            '"' | '\'' => self.scan_string(start, String::new(), c),

            // Numbers
            '0'..='9' => self.scan_number(start, c),

            // Identifiers, keywords and prefixed strings
            _ if is_ident_start(c) => self.scan_identifier(start, c),

            _ => {
                self.errors.push(SyntaxError::new(
                    format!("invalid character '{}'", c),
                    Span::new(start, self.current_pos),
                ));
            }
        }
    }

    // ========================================================================
    // Operator helpers
    // ========================================================================

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn add_token(&mut self, kind: TokenKind, start: usize) {
        self.tokens.push(Token::new(kind, Span::new(start, self.current_pos)));
    }

    fn add_op(&mut self, id: OperatorId, start: usize) {
        self.add_token(TokenKind::Operator(id), start);
    }

    fn add_punct(&mut self, id: PunctuationId, start: usize) {
        self.add_token(TokenKind::Punctuation(id), start);
    }

    /// Try to match a compound operator, fallback to simple.
    fn operator(&mut self, start: usize, simple: OperatorId, compounds: &[(char, OperatorId)]) {
        for (c, id) in compounds {
            if self.match_char(*c) {
                self.add_op(*id, start);
                return;
            }
        }
        self.add_op(simple, start);
    }

    /// Emit a bracket token and track bracket depth.
    fn open_bracket(&mut self, id: PunctuationId, start: usize) {
        self.bracket_depth += 1;
        self.add_punct(id, start);
    }

    /// Emit a closing bracket token and decrement bracket depth.
    fn close_bracket(&mut self, id: PunctuationId, start: usize) {
        if self.bracket_depth == 0 {
            self.errors.push(SyntaxError::new(
                "unmatched closing bracket",
                Span::new(start, self.current_pos),
            ));
        } else {
            self.bracket_depth -= 1;
        }
        self.add_punct(id, start);
    }

    // ========================================================================
    // Identifier scanning
    // ========================================================================

    fn scan_identifier(&mut self, start: usize, first: char) {
        let mut name = String::from(first);

        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if let Some(quote) = self.peek().filter(|q| *q == '"' || *q == '\'') {
            if is_string_prefix(&name) {
                self.advance();
                self.scan_string(start, name.to_ascii_lowercase(), quote);
                return;
            }
        }

        let kind = keyword_id(&name).map(TokenKind::Keyword).unwrap_or(TokenKind::Ident(name));
        self.add_token(kind, start);
    }
}

// ============================================================================
// Helper functions
// ============================================================================

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_string_prefix(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "r" | "u" | "b" | "f" | "br" | "rb" | "fr" | "rf"
    )
}

/// Convenience function to lex a source string.
///
/// This is a shorthand for `Lexer::new(source).tokenize()`.
#[tracing::instrument(skip_all, fields(source_len = source.len()))]
pub fn lex(source: &str) -> Result<Vec<Token>, Vec<SyntaxError>> {
    Lexer::new(source).tokenize()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use candor_core::lang::keywords::KeywordId;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_keywords() {
        let tokens = kinds("def assert lambda None True");
        assert_eq!(tokens[0], TokenKind::Keyword(KeywordId::Def));
        assert_eq!(tokens[1], TokenKind::Keyword(KeywordId::Assert));
        assert_eq!(tokens[2], TokenKind::Keyword(KeywordId::Lambda));
        assert_eq!(tokens[3], TokenKind::Keyword(KeywordId::None));
        assert_eq!(tokens[4], TokenKind::Keyword(KeywordId::True));
    }

    #[test]
    fn test_operators() {
        let tokens = kinds("a ** b // c != d -> e := f <<= 1");
        assert_eq!(tokens[1], TokenKind::Operator(OperatorId::StarStar));
        assert_eq!(tokens[3], TokenKind::Operator(OperatorId::SlashSlash));
        assert_eq!(tokens[5], TokenKind::Operator(OperatorId::NotEq));
        assert_eq!(tokens[7], TokenKind::Punctuation(PunctuationId::Arrow));
        assert_eq!(tokens[9], TokenKind::Operator(OperatorId::ColonEq));
        assert_eq!(tokens[11], TokenKind::Operator(OperatorId::LShiftEq));
    }

    #[test]
    fn test_final_line_gets_newline() {
        let tokens = kinds("x = 1");
        assert_eq!(tokens[tokens.len() - 2], TokenKind::Newline);
        assert_eq!(tokens[tokens.len() - 1], TokenKind::Eof);
    }

    #[test]
    fn test_indentation() {
        let tokens = kinds("def foo():\n    x = 1\n    y = 2\nx = 3\n");
        let indents = tokens.iter().filter(|t| matches!(t, TokenKind::Indent)).count();
        let dedents = tokens.iter().filter(|t| matches!(t, TokenKind::Dedent)).count();
        assert_eq!(indents, 1);
        assert_eq!(dedents, 1);
    }

    #[test]
    fn test_dedents_at_eof() {
        let tokens = kinds("def foo():\n  if True:\n    assert x");
        let dedents = tokens.iter().filter(|t| matches!(t, TokenKind::Dedent)).count();
        assert_eq!(dedents, 2);
        assert_eq!(tokens.last(), Some(&TokenKind::Eof));
    }

    #[test]
    fn test_inconsistent_dedent_is_error() {
        let errors = lex("def f():\n    x = 1\n  y = 2\n").unwrap_err();
        assert!(errors[0].message.contains("unindent"));
    }

    #[test]
    fn test_blank_and_comment_lines_ignored() {
        let tokens = kinds("def f():\n\n    # note\n    return 1\n");
        let indents = tokens.iter().filter(|t| matches!(t, TokenKind::Indent)).count();
        assert_eq!(indents, 1);
    }

    #[test]
    fn test_newlines_inside_brackets() {
        let tokens = kinds("foo(\n  x,\n  y\n)");
        let newlines = tokens.iter().filter(|t| matches!(t, TokenKind::Newline)).count();
        assert_eq!(newlines, 1, "only the terminating newline");
    }

    #[test]
    fn test_backslash_continuation() {
        let tokens = kinds("x = 1 + \\\n    2\n");
        assert!(!tokens.iter().any(|t| matches!(t, TokenKind::Indent)));
    }

    #[test]
    fn test_prefixed_strings() {
        let tokens = lex(r#"r"\d" b'x' f"{a}" name"#).unwrap();
        match (&tokens[0].kind, &tokens[1].kind, &tokens[2].kind) {
            (TokenKind::Str(r), TokenKind::Str(b), TokenKind::Str(f)) => {
                assert_eq!(r.value, "\\d");
                assert!(b.is_bytes());
                assert!(f.is_fstring());
                assert_eq!(f.raw, r#"f"{a}""#);
            }
            other => panic!("unexpected tokens {other:?}"),
        }
        assert!(matches!(&tokens[3].kind, TokenKind::Ident(s) if s == "name"));
    }

    #[test]
    fn test_unicode_identifier() {
        let tokens = kinds("π = 3");
        assert!(matches!(&tokens[0], TokenKind::Ident(s) if s == "π"));
    }

    #[test]
    fn test_unmatched_closing_bracket() {
        let errors = lex(")").unwrap_err();
        assert!(errors[0].message.contains("unmatched"));
    }

    #[test]
    fn test_unclosed_bracket_at_eof() {
        let errors = lex("assert f([1, 2] == 3").unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("unclosed")));
    }

    #[test]
    fn test_ellipsis_and_dot_number() {
        let tokens = kinds("... .5");
        assert_eq!(tokens[0], TokenKind::Punctuation(PunctuationId::Ellipsis));
        assert!(matches!(&tokens[1], TokenKind::Number(n) if n.raw == ".5" && n.kind == NumberKind::Float));
    }
}
