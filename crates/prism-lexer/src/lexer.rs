//! The scanner. ASCII classification goes through precomputed boolean
//! tables; non-ASCII falls back to `char` queries so identifiers with
//! Unicode letters still lex (the parser decides whether to accept them).

use crate::token::{Directive, Keyword, Op, Token, TokenKind, is_builtin_name};
use prism_ast::BaseType;
use tracing::trace;

const fn build_table(kind: u8) -> [bool; 128] {
    let mut t = [false; 128];
    let mut c = 0usize;
    while c < 128 {
        let b = c as u8;
        t[c] = match kind {
            // identifier start
            0 => b == b'_' || b.is_ascii_alphabetic(),
            // identifier continuation
            1 => b == b'_' || b.is_ascii_alphanumeric(),
            // digit
            2 => b.is_ascii_digit(),
            // hex digit
            3 => b.is_ascii_hexdigit(),
            // whitespace
            4 => b == b' ' || b == b'\t' || b == b'\r' || b == b'\n',
            _ => false,
        };
        c += 1;
    }
    t
}

static IDENT_START: [bool; 128] = build_table(0);
static IDENT_CONT: [bool; 128] = build_table(1);
static DIGIT: [bool; 128] = build_table(2);
static HEX_DIGIT: [bool; 128] = build_table(3);
static WHITESPACE: [bool; 128] = build_table(4);

#[inline]
fn is_ident_start(b: u8) -> bool {
    b < 128 && IDENT_START[b as usize]
}

#[inline]
fn is_ident_cont(b: u8) -> bool {
    b < 128 && IDENT_CONT[b as usize]
}

#[inline]
fn is_digit(b: u8) -> bool {
    b < 128 && DIGIT[b as usize]
}

#[inline]
fn is_hex_digit(b: u8) -> bool {
    b < 128 && HEX_DIGIT[b as usize]
}

#[inline]
fn is_space(b: u8) -> bool {
    b < 128 && WHITESPACE[b as usize]
}

pub struct Lexer<'s> {
    src: &'s str,
    bytes: &'s [u8],
    pos: usize,
    line: u32,
    column: u32,
}

impl<'s> Lexer<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            src: source,
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Lex the whole input into `out`. Always terminates with an EOF
    /// sentinel; unrecognized bytes become `Error` tokens and scanning
    /// continues.
    pub fn run(mut self, out: &mut Vec<Token>) {
        loop {
            let token = self.next_token();
            let done = token.kind == TokenKind::Eof;
            out.push(token);
            if done {
                break;
            }
        }
        trace!(target: "lexer", tokens = out.len(), lines = self.line, "lex_complete");
    }

    fn peek(&self) -> u8 {
        *self.bytes.get(self.pos).unwrap_or(&0)
    }

    fn peek_at(&self, offset: usize) -> u8 {
        *self.bytes.get(self.pos + offset).unwrap_or(&0)
    }

    fn bump(&mut self) -> u8 {
        let b = self.peek();
        if b == 0 {
            return 0;
        }
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        b
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn skip_trivia(&mut self) {
        loop {
            let b = self.peek();
            if is_space(b) {
                self.bump();
                continue;
            }
            if b == b'/' && self.peek_at(1) == b'/' {
                while !self.at_end() && self.peek() != b'\n' {
                    self.bump();
                }
                continue;
            }
            if b == b'/' && self.peek_at(1) == b'*' {
                self.bump();
                self.bump();
                // Unterminated block comments consume to end of input.
                while !self.at_end() && !(self.peek() == b'*' && self.peek_at(1) == b'/') {
                    self.bump();
                }
                if !self.at_end() {
                    self.bump();
                    self.bump();
                }
                continue;
            }
            break;
        }
    }

    fn next_token(&mut self) -> Token {
        self.skip_trivia();
        let (line, column) = (self.line, self.column);
        if self.at_end() {
            return Token::new(TokenKind::Eof, "", line, column);
        }
        let b = self.peek();
        if b == b'#' {
            return self.directive(line, column);
        }
        if is_ident_start(b) || (b >= 128 && self.current_char_is_alphabetic()) {
            return self.identifier(line, column);
        }
        if is_digit(b) || (b == b'.' && is_digit(self.peek_at(1))) {
            return self.number(line, column);
        }
        if let Some(op) = self.operator() {
            return Token::new(TokenKind::Op(op), "", line, column);
        }
        // Consume the whole character so the cursor stays on a UTF-8
        // boundary, then keep scanning.
        let bad = self.src[self.pos..].chars().next().unwrap_or('\u{FFFD}');
        for _ in 0..bad.len_utf8() {
            self.bump();
        }
        Token::new(TokenKind::Error, bad.to_string(), line, column)
    }

    fn current_char_is_alphabetic(&self) -> bool {
        self.src[self.pos..]
            .chars()
            .next()
            .is_some_and(|c| c.is_alphabetic())
    }

    fn identifier(&mut self, line: u32, column: u32) -> Token {
        let start = self.pos;
        while !self.at_end() {
            let b = self.peek();
            if is_ident_cont(b) {
                self.bump();
            } else if b >= 128 {
                let c = self.src[self.pos..].chars().next().unwrap_or('\0');
                if c.is_alphanumeric() {
                    for _ in 0..c.len_utf8() {
                        self.bump();
                    }
                } else {
                    break;
                }
            } else {
                break;
            }
        }
        let word = &self.src[start..self.pos];
        match word {
            "true" => return Token::new(TokenKind::BoolLit(true), "", line, column),
            "false" => return Token::new(TokenKind::BoolLit(false), "", line, column),
            _ => {}
        }
        if let Some(kw) = Keyword::from_word(word) {
            return Token::new(TokenKind::Kw(kw), "", line, column);
        }
        if let Some(base) = BaseType::from_keyword(word) {
            return Token::new(TokenKind::Type(base), "", line, column);
        }
        if is_builtin_name(word) {
            return Token::new(TokenKind::Builtin, word, line, column);
        }
        Token::new(TokenKind::Ident, word, line, column)
    }

    fn number(&mut self, line: u32, column: u32) -> Token {
        let start = self.pos;
        let mut is_float = false;
        if self.peek() == b'0' && matches!(self.peek_at(1), b'x' | b'X') {
            self.bump();
            self.bump();
            while is_hex_digit(self.peek()) {
                self.bump();
            }
            if matches!(self.peek(), b'u' | b'U') {
                self.bump();
                return Token::new(TokenKind::UintLit, &self.src[start..self.pos], line, column);
            }
            return Token::new(TokenKind::IntLit, &self.src[start..self.pos], line, column);
        }
        while is_digit(self.peek()) {
            self.bump();
        }
        if self.peek() == b'.' {
            is_float = true;
            self.bump();
            while is_digit(self.peek()) {
                self.bump();
            }
        }
        if matches!(self.peek(), b'e' | b'E') {
            let mut lookahead = 1;
            if matches!(self.peek_at(1), b'+' | b'-') {
                lookahead = 2;
            }
            if is_digit(self.peek_at(lookahead)) {
                is_float = true;
                for _ in 0..lookahead {
                    self.bump();
                }
                while is_digit(self.peek()) {
                    self.bump();
                }
            }
        }
        // Suffixes decide the literal category.
        if matches!(self.peek(), b'l' | b'L') && matches!(self.peek_at(1), b'f' | b'F') {
            self.bump();
            self.bump();
            return Token::new(TokenKind::DoubleLit, &self.src[start..self.pos], line, column);
        }
        if matches!(self.peek(), b'f' | b'F') {
            self.bump();
            return Token::new(TokenKind::FloatLit, &self.src[start..self.pos], line, column);
        }
        if !is_float && matches!(self.peek(), b'u' | b'U') {
            self.bump();
            return Token::new(TokenKind::UintLit, &self.src[start..self.pos], line, column);
        }
        let kind = if is_float {
            TokenKind::FloatLit
        } else {
            TokenKind::IntLit
        };
        Token::new(kind, &self.src[start..self.pos], line, column)
    }

    /// Longest-match operator recognition.
    fn operator(&mut self) -> Option<Op> {
        let b = self.peek();
        let b1 = self.peek_at(1);
        let b2 = self.peek_at(2);
        let (op, len) = match (b, b1, b2) {
            (b'<', b'<', b'=') => (Op::ShlAssign, 3),
            (b'>', b'>', b'=') => (Op::ShrAssign, 3),
            (b'<', b'<', _) => (Op::Shl, 2),
            (b'>', b'>', _) => (Op::Shr, 2),
            (b'<', b'=', _) => (Op::Le, 2),
            (b'>', b'=', _) => (Op::Ge, 2),
            (b'=', b'=', _) => (Op::EqEq, 2),
            (b'!', b'=', _) => (Op::NotEq, 2),
            (b'&', b'&', _) => (Op::AndAnd, 2),
            (b'|', b'|', _) => (Op::OrOr, 2),
            (b'^', b'^', _) => (Op::XorXor, 2),
            (b'+', b'+', _) => (Op::PlusPlus, 2),
            (b'-', b'-', _) => (Op::MinusMinus, 2),
            (b'+', b'=', _) => (Op::PlusAssign, 2),
            (b'-', b'=', _) => (Op::MinusAssign, 2),
            (b'*', b'=', _) => (Op::StarAssign, 2),
            (b'/', b'=', _) => (Op::SlashAssign, 2),
            (b'%', b'=', _) => (Op::PercentAssign, 2),
            (b'&', b'=', _) => (Op::AmpAssign, 2),
            (b'|', b'=', _) => (Op::PipeAssign, 2),
            (b'^', b'=', _) => (Op::CaretAssign, 2),
            (b'+', ..) => (Op::Plus, 1),
            (b'-', ..) => (Op::Minus, 1),
            (b'*', ..) => (Op::Star, 1),
            (b'/', ..) => (Op::Slash, 1),
            (b'%', ..) => (Op::Percent, 1),
            (b'=', ..) => (Op::Assign, 1),
            (b'<', ..) => (Op::Lt, 1),
            (b'>', ..) => (Op::Gt, 1),
            (b'!', ..) => (Op::Bang, 1),
            (b'&', ..) => (Op::Amp, 1),
            (b'|', ..) => (Op::Pipe, 1),
            (b'^', ..) => (Op::Caret, 1),
            (b'~', ..) => (Op::Tilde, 1),
            (b'?', ..) => (Op::Question, 1),
            (b':', ..) => (Op::Colon, 1),
            (b';', ..) => (Op::Semicolon, 1),
            (b',', ..) => (Op::Comma, 1),
            (b'.', ..) => (Op::Dot, 1),
            (b'(', ..) => (Op::LParen, 1),
            (b')', ..) => (Op::RParen, 1),
            (b'[', ..) => (Op::LBracket, 1),
            (b']', ..) => (Op::RBracket, 1),
            (b'{', ..) => (Op::LBrace, 1),
            (b'}', ..) => (Op::RBrace, 1),
            _ => return None,
        };
        for _ in 0..len {
            self.bump();
        }
        Some(op)
    }

    fn directive(&mut self, line: u32, column: u32) -> Token {
        self.bump(); // '#'
        while matches!(self.peek(), b' ' | b'\t') {
            self.bump();
        }
        let word_start = self.pos;
        while is_ident_cont(self.peek()) {
            self.bump();
        }
        let word = self.src[word_start..self.pos].to_owned();
        let Some(directive) = Directive::from_word(&word) else {
            return Token::new(TokenKind::Error, format!("#{word}"), line, column);
        };
        if !directive.captures_line() {
            return Token::new(TokenKind::Directive(directive), "", line, column);
        }
        // Capture the rest of the logical line, honoring `\`-newline.
        let mut rest = String::new();
        loop {
            let b = self.peek();
            if b == 0 || b == b'\n' {
                break;
            }
            if b == b'\\' && self.peek_at(1) == b'\n' {
                self.bump();
                self.bump();
                rest.push(' ');
                continue;
            }
            if b == b'\\' && self.peek_at(1) == b'\r' && self.peek_at(2) == b'\n' {
                self.bump();
                self.bump();
                self.bump();
                rest.push(' ');
                continue;
            }
            rest.push(self.bump() as char);
        }
        Token::new(
            TokenKind::Directive(directive),
            rest.trim().to_owned(),
            line,
            column,
        )
    }
}

/// Convenience entry point: lex `source` into a fresh vector.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut out = Vec::with_capacity(source.len() / 4 + 8);
    Lexer::new(source).run(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn simple_declaration() {
        let toks = tokenize("uniform vec4 color;");
        assert_eq!(toks[0].kind, TokenKind::Kw(Keyword::Uniform));
        assert_eq!(toks[1].kind, TokenKind::Type(BaseType::Vec4));
        assert_eq!(toks[2].kind, TokenKind::Ident);
        assert_eq!(toks[2].lexeme, "color");
        assert_eq!(toks[3].kind, TokenKind::Op(Op::Semicolon));
        assert_eq!(toks[4].kind, TokenKind::Eof);
    }

    #[test]
    fn positions_are_one_based() {
        let toks = tokenize("a\n  b");
        assert_eq!((toks[0].line, toks[0].column), (1, 1));
        assert_eq!((toks[1].line, toks[1].column), (2, 3));
    }

    #[test]
    fn comments_advance_positions() {
        let toks = tokenize("/* one\ntwo */ x // trailing\ny");
        assert_eq!((toks[0].line, toks[0].column), (2, 8));
        assert_eq!(toks[0].lexeme, "x");
        assert_eq!((toks[1].line, toks[1].column), (3, 1));
    }

    #[test]
    fn unterminated_block_comment_hits_eof() {
        let toks = tokenize("x /* never closed");
        assert_eq!(toks.len(), 2);
        assert_eq!(toks[1].kind, TokenKind::Eof);
    }

    #[test]
    fn longest_match_operators() {
        assert_eq!(
            kinds("<<= << <= <")[..4],
            [
                TokenKind::Op(Op::ShlAssign),
                TokenKind::Op(Op::Shl),
                TokenKind::Op(Op::Le),
                TokenKind::Op(Op::Lt),
            ]
        );
        assert_eq!(
            kinds("^^ ^= ^")[..3],
            [
                TokenKind::Op(Op::XorXor),
                TokenKind::Op(Op::CaretAssign),
                TokenKind::Op(Op::Caret),
            ]
        );
    }

    #[test]
    fn numeric_literal_categories() {
        assert_eq!(kinds("1")[0], TokenKind::IntLit);
        assert_eq!(kinds("1u")[0], TokenKind::UintLit);
        assert_eq!(kinds("0x1F")[0], TokenKind::IntLit);
        assert_eq!(kinds("0xFFu")[0], TokenKind::UintLit);
        assert_eq!(kinds("017")[0], TokenKind::IntLit);
        assert_eq!(kinds("1.0")[0], TokenKind::FloatLit);
        assert_eq!(kinds(".5")[0], TokenKind::FloatLit);
        assert_eq!(kinds("1e4")[0], TokenKind::FloatLit);
        assert_eq!(kinds("1.5e-3")[0], TokenKind::FloatLit);
        assert_eq!(kinds("2f")[0], TokenKind::FloatLit);
        assert_eq!(kinds("2.0lf")[0], TokenKind::DoubleLit);
    }

    #[test]
    fn float_dot_vs_member_access() {
        let toks = tokenize("v.xy");
        assert_eq!(toks[0].kind, TokenKind::Ident);
        assert_eq!(toks[1].kind, TokenKind::Op(Op::Dot));
        assert_eq!(toks[2].kind, TokenKind::Ident);
        assert_eq!(toks[2].lexeme, "xy");
    }

    #[test]
    fn version_directive_captures_line() {
        let toks = tokenize("#version 330 core\nvoid");
        assert_eq!(toks[0].kind, TokenKind::Directive(Directive::Version));
        assert_eq!(toks[0].lexeme, "330 core");
        assert_eq!(toks[1].kind, TokenKind::Type(BaseType::Void));
    }

    #[test]
    fn define_honors_continuation() {
        let toks = tokenize("#define FOO a \\\n b\nnext");
        assert_eq!(toks[0].kind, TokenKind::Directive(Directive::Define));
        assert_eq!(toks[0].lexeme, "FOO a  b");
        assert_eq!(toks[1].lexeme, "next");
    }

    #[test]
    fn ifdef_args_pass_through() {
        let toks = tokenize("#ifdef FOO\n#endif");
        assert_eq!(toks[0].kind, TokenKind::Directive(Directive::Ifdef));
        assert_eq!(toks[1].kind, TokenKind::Ident);
        assert_eq!(toks[1].lexeme, "FOO");
        assert_eq!(toks[2].kind, TokenKind::Directive(Directive::Endif));
    }

    #[test]
    fn builtins_and_keywords() {
        let toks = tokenize("gl_FragColor gl_Position myVar flat");
        assert_eq!(toks[0].kind, TokenKind::Builtin);
        assert_eq!(toks[1].kind, TokenKind::Builtin);
        assert_eq!(toks[2].kind, TokenKind::Ident);
        assert_eq!(toks[3].kind, TokenKind::Kw(Keyword::Flat));
    }

    #[test]
    fn bool_literals() {
        assert_eq!(kinds("true false"), vec![
            TokenKind::BoolLit(true),
            TokenKind::BoolLit(false),
            TokenKind::Eof,
        ]);
    }

    #[test]
    fn error_token_keeps_scanning() {
        let toks = tokenize("a @ b");
        assert_eq!(toks[0].kind, TokenKind::Ident);
        assert_eq!(toks[1].kind, TokenKind::Error);
        assert_eq!(toks[1].lexeme, "@");
        assert_eq!(toks[2].kind, TokenKind::Ident);
    }

    #[test]
    fn unicode_identifier_fallback() {
        let toks = tokenize("couleur_été = 1;");
        assert_eq!(toks[0].kind, TokenKind::Ident);
        assert_eq!(toks[0].lexeme, "couleur_été");
    }
}
