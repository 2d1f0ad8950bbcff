//! Lexical analysis module for the Go subset accepted by shapederive.
//!
//! This module tokenizes Go source into a stream of tokens. Newlines are not
//! returned as such: following Go's automatic semicolon insertion rule, a
//! newline becomes a `Semicolon` when the previous token could end a statement
//! and is dropped otherwise.

mod token;

pub use token::Token;

use logos::Logos;

/// Position tracking for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new() -> Self {
        Position { line: 1, column: 1 }
    }

    pub fn advance(&mut self, ch: char) {
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

/// A token with its position information
#[derive(Debug, Clone, PartialEq)]
pub struct TokenWithPosition {
    pub token: Token,
    pub position: Position,
    pub span: logos::Span,
}

/// Lexer for the Go subset
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, Token>,
    position: Position,
    input: &'a str,
    last_end: usize,
    /// Whether a newline right now would insert a semicolon
    insert_semicolon: bool,
    finished: bool,
    /// Token held back while an inserted semicolon is returned first
    pending: Option<TokenWithPosition>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: Token::lexer(input),
            position: Position::new(),
            input,
            last_end: 0,
            insert_semicolon: false,
            finished: false,
            pending: None,
        }
    }

    /// Collect every token, including `Error` tokens for unrecognized input
    pub fn collect_tokens(self) -> Vec<TokenWithPosition> {
        self.collect()
    }

    fn track(&mut self, span: &logos::Span) -> Position {
        if span.start > self.last_end {
            for ch in self.input[self.last_end..span.start].chars() {
                self.position.advance(ch);
            }
        }
        let position = self.position;
        for ch in self.input[span.start..span.end].chars() {
            self.position.advance(ch);
        }
        self.last_end = span.end;
        position
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = TokenWithPosition;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(pending) = self.pending.take() {
            return Some(pending);
        }

        loop {
            let Some(result) = self.inner.next() else {
                // End of input also terminates the final statement.
                if self.insert_semicolon && !self.finished {
                    self.finished = true;
                    self.insert_semicolon = false;
                    let end = self.input.len();
                    return Some(TokenWithPosition {
                        token: Token::Semicolon,
                        position: self.position,
                        span: end..end,
                    });
                }
                return None;
            };

            let span = self.inner.span();
            // A skipped block comment spanning lines acts like a newline.
            let comment_newline = self.insert_semicolon
                && self
                    .input
                    .get(self.last_end..span.start)
                    .is_some_and(|gap| gap.contains('\n'));
            let position = self.track(&span);

            let token = match result {
                Ok(Token::Newline) => {
                    if !self.insert_semicolon {
                        continue;
                    }
                    Token::Semicolon
                }
                Ok(token) => token,
                Err(_) => Token::Error,
            };

            self.insert_semicolon = token.ends_statement();
            let current = TokenWithPosition {
                token,
                position,
                span: span.clone(),
            };

            if comment_newline && current.token != Token::Semicolon {
                self.pending = Some(current);
                return Some(TokenWithPosition {
                    token: Token::Semicolon,
                    position,
                    span: span.start..span.start,
                });
            }
            return Some(current);
        }
    }
}

/// Debug helper: render a token stream as text
pub fn format_tokens(tokens: &[TokenWithPosition]) -> String {
    tokens
        .iter()
        .map(|t| format!("{:?} @ {:?}", t.token, t.span))
        .collect::<Vec<_>>()
        .join("\n")
}
