//! Random-access token buffer with one-token lookahead, single-level
//! mark/restore, and a line-offset table for error messages.

use crate::token::{Keyword, Op, Token, TokenKind};
use crate::Lexer;
use prism_ast::{Diagnostic, DiagnosticKind};

pub struct TokenStream {
    tokens: Vec<Token>,
    pos: usize,
    mark: Option<usize>,
    source: String,
    line_offsets: Vec<usize>,
}

impl TokenStream {
    /// Lex `source` into a stream. `tokens` should come from the pool's
    /// token-vector recycler; it is cleared first.
    pub fn lex_into(source: &str, mut tokens: Vec<Token>) -> Self {
        tokens.clear();
        Lexer::new(source).run(&mut tokens);
        let mut line_offsets = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_offsets.push(i + 1);
            }
        }
        Self {
            tokens,
            pos: 0,
            mark: None,
            source: source.to_owned(),
            line_offsets,
        }
    }

    pub fn lex(source: &str) -> Self {
        Self::lex_into(source, Vec::new())
    }

    /// Hand the token vector back for pooling once parsing is done.
    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }

    pub fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    /// O(1) lookahead; positions past the end return the EOF sentinel.
    pub fn peek_at(&self, offset: usize) -> &Token {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    pub fn at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    pub fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    pub fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    pub fn check_op(&self, op: Op) -> bool {
        self.check(TokenKind::Op(op))
    }

    pub fn check_kw(&self, kw: Keyword) -> bool {
        self.check(TokenKind::Kw(kw))
    }

    /// Consume the next token when it matches.
    pub fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn eat_op(&mut self, op: Op) -> bool {
        self.eat(TokenKind::Op(op))
    }

    pub fn eat_kw(&mut self, kw: Keyword) -> bool {
        self.eat(TokenKind::Kw(kw))
    }

    /// Consume the next token when it matches any of `kinds`.
    pub fn eat_any(&mut self, kinds: &[TokenKind]) -> Option<Token> {
        if kinds.contains(&self.peek().kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Consume an expected token or produce a syntax diagnostic at the
    /// offending token's position.
    pub fn consume(&mut self, kind: TokenKind, what: &str) -> Result<Token, Diagnostic> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        let found = self.peek();
        Err(Diagnostic::error(
            DiagnosticKind::Syntax,
            found.span(),
            format!("expected {what}, found `{}`", found.text()),
        ))
    }

    pub fn consume_op(&mut self, op: Op) -> Result<Token, Diagnostic> {
        self.consume(TokenKind::Op(op), &format!("`{}`", op.text()))
    }

    /// Cursor index, for progress checks during error recovery.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Single-level backtracking: `mark` then either `reset` or drop it.
    pub fn mark(&mut self) {
        self.mark = Some(self.pos);
    }

    pub fn reset(&mut self) {
        if let Some(m) = self.mark.take() {
            self.pos = m;
        }
    }

    pub fn clear_mark(&mut self) {
        self.mark = None;
    }

    /// 1-based source line text, for error messages.
    pub fn source_line(&self, line: u32) -> Option<&str> {
        let idx = (line as usize).checked_sub(1)?;
        let start = *self.line_offsets.get(idx)?;
        let end = self
            .line_offsets
            .get(idx + 1)
            .map(|next| next - 1)
            .unwrap_or(self.source.len());
        self.source.get(start..end).map(|s| s.trim_end_matches('\r'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_ast::BaseType;

    #[test]
    fn peek_and_advance() {
        let mut s = TokenStream::lex("vec2 a;");
        assert_eq!(s.peek().kind, TokenKind::Type(BaseType::Vec2));
        assert_eq!(s.peek_at(1).kind, TokenKind::Ident);
        s.advance();
        assert_eq!(s.peek().kind, TokenKind::Ident);
    }

    #[test]
    fn peek_past_end_yields_eof() {
        let s = TokenStream::lex("x");
        assert_eq!(s.peek_at(10).kind, TokenKind::Eof);
    }

    #[test]
    fn consume_reports_expected() {
        let mut s = TokenStream::lex("x x");
        s.advance();
        let err = s.consume_op(Op::Semicolon).unwrap_err();
        assert!(err.message.contains("`;`"));
        assert_eq!(err.kind, DiagnosticKind::Syntax);
        assert_eq!((err.line, err.column), (1, 3));
    }

    #[test]
    fn mark_reset_backtracks_once() {
        let mut s = TokenStream::lex("a b c");
        s.mark();
        s.advance();
        s.advance();
        s.reset();
        assert_eq!(s.peek().lexeme, "a");
        // A second reset without a new mark is a no-op.
        s.advance();
        s.reset();
        assert_eq!(s.peek().lexeme, "b");
    }

    #[test]
    fn source_line_recovery() {
        let s = TokenStream::lex("first line\nsecond line\nthird");
        assert_eq!(s.source_line(1), Some("first line"));
        assert_eq!(s.source_line(2), Some("second line"));
        assert_eq!(s.source_line(3), Some("third"));
        assert_eq!(s.source_line(4), None);
        assert_eq!(s.source_line(0), None);
    }
}
