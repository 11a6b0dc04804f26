//! Pratt precedence climbing for expressions, plus the parse-time constant
//! folding that array sizes and layout values require.

use crate::Parser;
use prism_ast::builtins::is_builtin_function;
use prism_ast::{
    BinaryOp, Diagnostic, DiagnosticKind, Expr, ExprKind, Span, SymbolKind, UnaryOp,
};
use prism_lexer::{Op, TokenKind};

/// Minimum precedence including the comma operator.
const PREC_COMMA: u8 = 1;
/// Minimum precedence for assignment contexts (argument lists, initializers).
const PREC_ASSIGN: u8 = 2;
/// Minimum precedence excluding assignment (array sizes, case labels).
const PREC_COND: u8 = 3;
const PREC_TERNARY: u8 = 3;

fn binary_op_of(kind: TokenKind) -> Option<BinaryOp> {
    let TokenKind::Op(op) = kind else { return None };
    Some(match op {
        Op::Comma => BinaryOp::Comma,
        Op::Assign => BinaryOp::Assign,
        Op::PlusAssign => BinaryOp::AddAssign,
        Op::MinusAssign => BinaryOp::SubAssign,
        Op::StarAssign => BinaryOp::MulAssign,
        Op::SlashAssign => BinaryOp::DivAssign,
        Op::PercentAssign => BinaryOp::ModAssign,
        Op::ShlAssign => BinaryOp::ShlAssign,
        Op::ShrAssign => BinaryOp::ShrAssign,
        Op::AmpAssign => BinaryOp::AndAssign,
        Op::CaretAssign => BinaryOp::XorAssign,
        Op::PipeAssign => BinaryOp::OrAssign,
        Op::OrOr => BinaryOp::LogicalOr,
        Op::XorXor => BinaryOp::LogicalXor,
        Op::AndAnd => BinaryOp::LogicalAnd,
        Op::Pipe => BinaryOp::BitOr,
        Op::Caret => BinaryOp::BitXor,
        Op::Amp => BinaryOp::BitAnd,
        Op::EqEq => BinaryOp::Eq,
        Op::NotEq => BinaryOp::Ne,
        Op::Lt => BinaryOp::Lt,
        Op::Gt => BinaryOp::Gt,
        Op::Le => BinaryOp::Le,
        Op::Ge => BinaryOp::Ge,
        Op::Shl => BinaryOp::Shl,
        Op::Shr => BinaryOp::Shr,
        Op::Plus => BinaryOp::Add,
        Op::Minus => BinaryOp::Sub,
        Op::Star => BinaryOp::Mul,
        Op::Slash => BinaryOp::Div,
        Op::Percent => BinaryOp::Mod,
        _ => return None,
    })
}

fn is_swizzle_selector(member: &str) -> bool {
    !member.is_empty()
        && member.len() <= 4
        && (member.chars().all(|c| "xyzw".contains(c))
            || member.chars().all(|c| "rgba".contains(c))
            || member.chars().all(|c| "stpq".contains(c)))
}

impl Parser {
    /// Full expression, comma operator included.
    pub(crate) fn parse_expression(&mut self) -> Expr {
        self.parse_binary(PREC_COMMA)
    }

    /// Assignment expression (no top-level comma): arguments, initializers.
    pub(crate) fn parse_assignment(&mut self) -> Expr {
        self.parse_binary(PREC_ASSIGN)
    }

    /// Conditional expression (no assignment): array sizes, case labels,
    /// layout values.
    pub(crate) fn parse_conditional(&mut self) -> Expr {
        self.parse_binary(PREC_COND)
    }

    fn parse_binary(&mut self, min_prec: u8) -> Expr {
        let mut lhs = self.parse_unary();
        loop {
            if min_prec <= PREC_TERNARY && self.stream.check_op(Op::Question) {
                let span = lhs.span;
                self.stream.advance();
                let then_expr = self.parse_assignment();
                self.expect_op(Op::Colon);
                // Right-associative: the else arm re-enters at ternary level.
                let else_expr = self.parse_binary(PREC_TERNARY);
                lhs = Expr::new(
                    ExprKind::Ternary {
                        cond: Box::new(lhs),
                        then_expr: Box::new(then_expr),
                        else_expr: Box::new(else_expr),
                    },
                    span,
                );
                continue;
            }
            let Some(op) = binary_op_of(self.stream.peek().kind) else {
                break;
            };
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            self.stream.advance();
            let rhs = if op.is_right_associative() {
                self.parse_binary(prec)
            } else {
                self.parse_binary(prec + 1)
            };
            if op.is_assignment() {
                if let ExprKind::Ident(name) = &lhs.kind {
                    self.shader.symbols.note_use(name, true);
                }
            }
            let span = lhs.span;
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        lhs
    }

    fn parse_unary(&mut self) -> Expr {
        let span = self.stream.peek().span();
        let op = match self.stream.peek().kind {
            TokenKind::Op(Op::Plus) => Some(UnaryOp::Plus),
            TokenKind::Op(Op::Minus) => Some(UnaryOp::Neg),
            TokenKind::Op(Op::Bang) => Some(UnaryOp::Not),
            TokenKind::Op(Op::Tilde) => Some(UnaryOp::BitNot),
            TokenKind::Op(Op::PlusPlus) => Some(UnaryOp::Inc),
            TokenKind::Op(Op::MinusMinus) => Some(UnaryOp::Dec),
            _ => None,
        };
        if let Some(op) = op {
            self.stream.advance();
            let operand = self.parse_unary();
            return Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                    prefix: true,
                },
                span,
            );
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Expr {
        let mut expr = self.parse_primary();
        loop {
            let span = expr.span;
            match self.stream.peek().kind {
                TokenKind::Op(Op::Dot) => {
                    self.stream.advance();
                    let token = self.stream.peek().clone();
                    let member = match token.kind {
                        TokenKind::Ident | TokenKind::Builtin => {
                            self.stream.advance();
                            token.lexeme
                        }
                        // `sample`, `buffer` etc. are keywords but legal
                        // member names in older shaders.
                        TokenKind::Kw(kw) => {
                            self.stream.advance();
                            kw.text().to_owned()
                        }
                        _ => {
                            self.syntax_error_here("expected member name after `.`");
                            return expr;
                        }
                    };
                    // `.length()` is a method call, not a member access.
                    if member == "length" && self.stream.check_op(Op::LParen) {
                        self.stream.advance();
                        self.expect_op(Op::RParen);
                        expr = Expr::new(
                            ExprKind::Call {
                                name: "length".to_owned(),
                                args: vec![expr],
                                is_constructor: false,
                                is_builtin: true,
                            },
                            span,
                        );
                        continue;
                    }
                    let is_swizzle = is_swizzle_selector(&member);
                    expr = Expr::new(
                        ExprKind::Member {
                            object: Box::new(expr),
                            member,
                            is_swizzle,
                        },
                        span,
                    );
                }
                TokenKind::Op(Op::LBracket) => {
                    self.stream.advance();
                    let index = self.parse_assignment();
                    self.expect_op(Op::RBracket);
                    expr = Expr::new(
                        ExprKind::Index {
                            base: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    );
                }
                TokenKind::Op(Op::PlusPlus) => {
                    self.stream.advance();
                    expr = Expr::new(
                        ExprKind::Unary {
                            op: UnaryOp::Inc,
                            operand: Box::new(expr),
                            prefix: false,
                        },
                        span,
                    );
                }
                TokenKind::Op(Op::MinusMinus) => {
                    self.stream.advance();
                    expr = Expr::new(
                        ExprKind::Unary {
                            op: UnaryOp::Dec,
                            operand: Box::new(expr),
                            prefix: false,
                        },
                        span,
                    );
                }
                _ => break,
            }
        }
        expr
    }

    fn parse_primary(&mut self) -> Expr {
        let token = self.stream.peek().clone();
        let span = token.span();
        match token.kind {
            TokenKind::IntLit => {
                self.stream.advance();
                let value = token.int_value().unwrap_or_else(|| {
                    self.error(Diagnostic::error(
                        DiagnosticKind::Syntax,
                        span,
                        format!("integer literal `{}` out of range", token.lexeme),
                    ));
                    0
                });
                Expr::int(value, span)
            }
            TokenKind::UintLit => {
                self.stream.advance();
                let value = token.uint_value().unwrap_or(0);
                Expr::new(ExprKind::UintLit(value), span)
            }
            TokenKind::FloatLit => {
                self.stream.advance();
                Expr::float(token.float_value().unwrap_or(0.0), span)
            }
            TokenKind::DoubleLit => {
                self.stream.advance();
                Expr::new(ExprKind::DoubleLit(token.float_value().unwrap_or(0.0)), span)
            }
            TokenKind::BoolLit(b) => {
                self.stream.advance();
                Expr::bool(b, span)
            }
            // Built-in identifiers never resolve to user symbols.
            TokenKind::Builtin => {
                self.stream.advance();
                Expr::ident(token.lexeme, span)
            }
            TokenKind::Ident => {
                if self.stream.peek_at(1).kind == TokenKind::Op(Op::LParen) {
                    return self.parse_call(span);
                }
                self.stream.advance();
                if self.shader.symbols.lookup(&token.lexeme).is_none() {
                    self.error(Diagnostic::error(
                        DiagnosticKind::UndefinedSymbol,
                        span,
                        format!("`{}` is not declared", token.lexeme),
                    ));
                } else {
                    self.shader.symbols.note_use(&token.lexeme, false);
                }
                Expr::ident(token.lexeme, span)
            }
            TokenKind::Type(base) => {
                self.stream.advance();
                // Constructor; the array form `float[2](...)` keeps only the
                // element type name.
                self.parse_array_dims();
                let name = base.keyword().unwrap_or("").to_owned();
                if !self.stream.check_op(Op::LParen) {
                    self.syntax_error_here(format!("expected `(` after type `{name}`"));
                    return Expr::int(0, span);
                }
                self.stream.advance();
                let args = self.parse_call_args();
                Expr::new(
                    ExprKind::Call {
                        name,
                        args,
                        is_constructor: true,
                        is_builtin: false,
                    },
                    span,
                )
            }
            TokenKind::Op(Op::LParen) => {
                self.stream.advance();
                let inner = self.parse_expression();
                self.expect_op(Op::RParen);
                // Grouping is not represented; the emitter re-derives
                // parentheses from precedence.
                inner
            }
            TokenKind::Op(Op::LBrace) => {
                self.stream.advance();
                let mut items = Vec::new();
                if !self.stream.check_op(Op::RBrace) {
                    loop {
                        items.push(self.parse_initializer());
                        if !self.stream.eat_op(Op::Comma) {
                            break;
                        }
                    }
                }
                self.expect_op(Op::RBrace);
                Expr::new(ExprKind::InitList(items), span)
            }
            _ => {
                self.syntax_error_here(format!("expected expression, found `{}`", token.text()));
                self.stream.advance();
                Expr::int(0, span)
            }
        }
    }

    /// `name ( args )` where name is a user function, struct constructor or
    /// built-in.
    fn parse_call(&mut self, span: Span) -> Expr {
        let name = self.stream.advance().lexeme;
        self.stream.advance(); // `(`
        let args = self.parse_call_args();
        let is_constructor = matches!(
            self.shader.symbols.lookup(&name),
            Some(sym) if sym.kind == SymbolKind::Struct
        );
        let is_builtin = !is_constructor && is_builtin_function(&name);
        if !is_constructor && !is_builtin {
            match self.shader.symbols.lookup(&name) {
                Some(_) => self.shader.symbols.note_use(&name, false),
                None => {
                    // Functions may be linked in from another compilation
                    // unit, so an unknown callee is only a warning.
                    self.warn(
                        DiagnosticKind::UndefinedSymbol,
                        span,
                        format!("call to undeclared function `{name}`"),
                    );
                }
            }
        }
        Expr::new(
            ExprKind::Call {
                name,
                args,
                is_constructor,
                is_builtin,
            },
            span,
        )
    }

    fn parse_call_args(&mut self) -> Vec<Expr> {
        let mut args = Vec::new();
        if self.stream.eat_op(Op::RParen) {
            return args;
        }
        loop {
            args.push(self.parse_assignment());
            if !self.stream.eat_op(Op::Comma) {
                break;
            }
        }
        self.expect_op(Op::RParen);
        args
    }

    /// Initializer: assignment expression or `{ ... }` aggregate.
    pub(crate) fn parse_initializer(&mut self) -> Expr {
        if self.stream.check_op(Op::LBrace) {
            return self.parse_primary();
        }
        self.parse_assignment()
    }

    /// Integer constant folding over already parsed subtrees, exactly as
    /// much as array sizes and layout values need. Division by zero refuses
    /// to fold.
    pub(crate) fn fold_const_int(&self, expr: &Expr) -> Option<i64> {
        match &expr.kind {
            ExprKind::IntLit(v) => Some(*v),
            ExprKind::UintLit(v) => i64::try_from(*v).ok(),
            ExprKind::Unary {
                op,
                operand,
                prefix: true,
            } => {
                let v = self.fold_const_int(operand)?;
                match op {
                    UnaryOp::Plus => Some(v),
                    UnaryOp::Neg => v.checked_neg(),
                    UnaryOp::BitNot => Some(!v),
                    _ => None,
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let a = self.fold_const_int(lhs)?;
                let b = self.fold_const_int(rhs)?;
                match op {
                    BinaryOp::Add => a.checked_add(b),
                    BinaryOp::Sub => a.checked_sub(b),
                    BinaryOp::Mul => a.checked_mul(b),
                    BinaryOp::Div => a.checked_div(b),
                    BinaryOp::Mod => a.checked_rem(b),
                    BinaryOp::Shl => u32::try_from(b).ok().and_then(|s| a.checked_shl(s)),
                    BinaryOp::Shr => u32::try_from(b).ok().and_then(|s| a.checked_shr(s)),
                    BinaryOp::BitAnd => Some(a & b),
                    BinaryOp::BitOr => Some(a | b),
                    BinaryOp::BitXor => Some(a ^ b),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}
