//! AST to canonical GLSL text.
//!
//! Formatting rules: four-space indentation, one declaration per line, `{`
//! on the same line as its construct, `else` on the same line as the
//! preceding `}`, empty bodies as `{}`. The version directive comes first,
//! then extensions (deduplicated), then precision declarations, then
//! everything else in declaration order. Emission cannot fail.

use prism_ast::{
    BinaryOp, BlockDecl, Decl, DeclKind, Expr, ExprKind, FunctionDecl, LayoutRecord,
    POSTFIX_PRECEDENCE, Qualifiers, QualifierFlags, Shader, Stmt, StmtKind, StructDecl,
    StructMember, Type, UNARY_PRECEDENCE, UnaryOp, VarDecl,
};
use prism_pool::Pool;
use tracing::trace;

/// Emit `shader` as source text.
pub fn emit(shader: &Shader) -> String {
    let mut emitter = Emitter::new(String::new());
    emitter.emit_shader(shader);
    emitter.finish()
}

/// Emit using a scratch buffer from `pool`; callers release the returned
/// string back to the pool when done with it.
pub fn emit_with_pool(shader: &Shader, pool: &Pool) -> String {
    let mut emitter = Emitter::new(pool.acquire_scratch());
    emitter.emit_shader(shader);
    emitter.finish()
}

struct Emitter {
    out: String,
    indent: usize,
}

impl Emitter {
    fn new(buffer: String) -> Self {
        Self {
            out: buffer,
            indent: 0,
        }
    }

    fn finish(self) -> String {
        self.out
    }

    fn push(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn newline(&mut self) {
        self.out.push('\n');
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
    }

    // ---------------------------------------------------------------------
    // Shader
    // ---------------------------------------------------------------------

    fn emit_shader(&mut self, shader: &Shader) {
        self.push("#version ");
        self.push(&shader.version.code().to_string());
        if shader.version.has_profile() {
            let profile = shader.profile.as_deref().unwrap_or("core");
            self.push(" ");
            self.push(profile);
        }
        self.out.push('\n');

        // Extensions: explicit declarations first, then the set the rewrite
        // engine collected, with duplicates dropped.
        let mut seen = Vec::new();
        for decl in &shader.decls {
            if let DeclKind::Extension { name, behavior } = &decl.kind {
                if !seen.iter().any(|s| s == name) {
                    seen.push(name.clone());
                    self.push(&format!("#extension {name} : {behavior}\n"));
                }
            }
        }
        for name in &shader.required_extensions {
            if !seen.iter().any(|s| s == name) {
                seen.push(name.clone());
                self.push(&format!("#extension {name} : require\n"));
            }
        }

        for decl in &shader.decls {
            if let DeclKind::Precision { precision, ty } = &decl.kind {
                if let Some(kw) = precision.keyword() {
                    self.push(&format!("precision {kw} {};\n", ty.display_name()));
                }
            }
        }

        for decl in &shader.decls {
            match &decl.kind {
                DeclKind::Extension { .. } | DeclKind::Precision { .. } => {}
                _ => self.emit_decl(decl),
            }
        }
        trace!(target: "emitter", bytes = self.out.len(), "emit_complete");
    }

    fn emit_decl(&mut self, decl: &Decl) {
        match &decl.kind {
            DeclKind::Extension { .. } | DeclKind::Precision { .. } => {}
            DeclKind::Variable(var) => {
                if var.name.is_empty() {
                    // Bare qualifier declaration (`layout(...) in;`).
                    self.emit_qualifiers(&var.ty.qualifiers);
                    self.trim_trailing_space();
                    self.push(";\n");
                    return;
                }
                self.emit_var_decl(var);
                self.push(";\n");
            }
            DeclKind::Struct(s) => self.emit_struct(s),
            DeclKind::Block(b) => self.emit_block_decl(b),
            DeclKind::Function(f) => self.emit_function(f),
        }
    }

    fn trim_trailing_space(&mut self) {
        while self.out.ends_with(' ') {
            self.out.pop();
        }
    }

    // ---------------------------------------------------------------------
    // Types and qualifiers
    // ---------------------------------------------------------------------

    fn emit_layout(&mut self, layout: &LayoutRecord) {
        let entries = layout.entries();
        if entries.is_empty() {
            return;
        }
        self.push("layout(");
        for (i, (key, value)) in entries.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.push(key);
            if let Some(v) = value {
                self.push(" = ");
                self.push(&v.to_string());
            }
        }
        self.push(") ");
    }

    /// Fixed qualifier order: invariant, precise, layout, auxiliary,
    /// interpolation, storage, precision, memory.
    fn emit_qualifiers(&mut self, q: &Qualifiers) {
        if q.flags.contains(QualifierFlags::INVARIANT) {
            self.push("invariant ");
        }
        if q.flags.contains(QualifierFlags::PRECISE) {
            self.push("precise ");
        }
        if let Some(layout) = q.layout() {
            self.emit_layout(layout);
        }
        if q.flags.contains(QualifierFlags::CENTROID) {
            self.push("centroid ");
        }
        if q.flags.contains(QualifierFlags::SAMPLE) {
            self.push("sample ");
        }
        if q.flags.contains(QualifierFlags::PATCH) {
            self.push("patch ");
        }
        if let Some(kw) = q.interpolation.keyword() {
            self.push(kw);
            self.push(" ");
        }
        if let Some(kw) = q.storage.keyword() {
            self.push(kw);
            self.push(" ");
        }
        if let Some(kw) = q.precision.keyword() {
            self.push(kw);
            self.push(" ");
        }
        for (flag, kw) in [
            (QualifierFlags::COHERENT, "coherent"),
            (QualifierFlags::VOLATILE, "volatile"),
            (QualifierFlags::RESTRICT, "restrict"),
            (QualifierFlags::READONLY, "readonly"),
            (QualifierFlags::WRITEONLY, "writeonly"),
        ] {
            if q.flags.contains(flag) {
                self.push(kw);
                self.push(" ");
            }
        }
    }

    fn emit_type(&mut self, ty: &Type) {
        self.emit_qualifiers(&ty.qualifiers);
        self.push(ty.display_name());
        self.emit_array_dims(&ty.array_dims);
    }

    fn emit_array_dims(&mut self, dims: &[i32]) {
        for dim in dims {
            if *dim < 0 {
                self.push("[]");
            } else {
                self.push(&format!("[{dim}]"));
            }
        }
    }

    fn emit_var_decl(&mut self, var: &VarDecl) {
        self.emit_type(&var.ty);
        self.push(" ");
        self.push(&var.name);
        self.emit_array_dims(&var.name_array_dims);
        if let Some(init) = &var.init {
            self.push(" = ");
            self.emit_expr(init, 2);
        }
    }

    // ---------------------------------------------------------------------
    // Declarations
    // ---------------------------------------------------------------------

    fn emit_member(&mut self, member: &StructMember) {
        self.emit_type(&member.ty);
        self.push(" ");
        self.push(&member.name);
        self.emit_array_dims(&member.array_dims);
        self.push(";");
    }

    fn emit_struct(&mut self, s: &StructDecl) {
        self.push("struct ");
        self.push(&s.name);
        self.push(" {");
        self.indent += 1;
        for member in &s.members {
            self.newline();
            self.emit_member(member);
        }
        self.indent -= 1;
        self.newline();
        self.push("}");
        if let Some(instance) = &s.instance {
            self.push(" ");
            self.push(&instance.name);
            self.emit_array_dims(&instance.name_array_dims);
        }
        self.push(";\n");
    }

    fn emit_block_decl(&mut self, b: &BlockDecl) {
        self.emit_qualifiers(&b.qualifiers);
        self.push(&b.block_name);
        self.push(" {");
        self.indent += 1;
        for member in &b.members {
            self.newline();
            self.emit_member(member);
        }
        self.indent -= 1;
        self.newline();
        self.push("}");
        if let Some(instance) = &b.instance_name {
            self.push(" ");
            self.push(instance);
            self.emit_array_dims(&b.array_dims);
        }
        self.push(";\n");
    }

    fn emit_function(&mut self, f: &FunctionDecl) {
        self.emit_type(&f.return_type);
        self.push(" ");
        self.push(&f.name);
        self.push("(");
        if f.params.is_empty() {
            self.push("void");
        }
        for (i, param) in f.params.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            if let Some(kw) = param.storage.keyword() {
                // `in` is the default and stays implicit on parameters.
                if param.storage != prism_ast::StorageQualifier::In {
                    self.push(kw);
                    self.push(" ");
                }
            }
            self.push(param.ty.display_name());
            self.emit_array_dims(&param.ty.array_dims);
            if let Some(name) = &param.name {
                self.push(" ");
                self.push(name);
            }
        }
        self.push(")");
        match &f.body {
            Some(body) => {
                self.push(" ");
                self.emit_stmt_as_block(body);
                self.push("\n");
            }
            None => self.push(";\n"),
        }
    }

    // ---------------------------------------------------------------------
    // Statements
    // ---------------------------------------------------------------------

    /// Emit a statement that is structurally expected to be a block,
    /// wrapping a bare statement in braces.
    fn emit_stmt_as_block(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Block(stmts) => self.emit_block_body(stmts),
            _ => {
                self.push("{");
                self.indent += 1;
                self.newline();
                self.emit_stmt(stmt);
                self.indent -= 1;
                self.newline();
                self.push("}");
            }
        }
    }

    fn emit_block_body(&mut self, stmts: &[Stmt]) {
        if stmts.is_empty() {
            self.push("{}");
            return;
        }
        self.push("{");
        self.indent += 1;
        for stmt in stmts {
            // Case labels sit half-outdented relative to their body.
            self.newline();
            self.emit_stmt(stmt);
        }
        self.indent -= 1;
        self.newline();
        self.push("}");
    }

    fn emit_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Block(stmts) => self.emit_block_body(stmts),
            StmtKind::Expr(expr) => {
                self.emit_expr(expr, 1);
                self.push(";");
            }
            StmtKind::Decl(vars) => {
                for (i, var) in vars.iter().enumerate() {
                    if i > 0 {
                        self.newline();
                    }
                    self.emit_var_decl(var);
                    self.push(";");
                }
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.push("if (");
                self.emit_expr(cond, 1);
                self.push(") ");
                self.emit_stmt_as_block(then_branch);
                if let Some(else_branch) = else_branch {
                    self.push(" else ");
                    // `else if` chains stay flat.
                    if matches!(else_branch.kind, StmtKind::If { .. }) {
                        self.emit_stmt(else_branch);
                    } else {
                        self.emit_stmt_as_block(else_branch);
                    }
                }
            }
            StmtKind::For {
                init,
                cond,
                step,
                body,
            } => {
                self.push("for (");
                match init {
                    Some(init) => self.emit_for_init(init),
                    None => self.push(";"),
                }
                self.push(" ");
                if let Some(cond) = cond {
                    self.emit_expr(cond, 1);
                }
                self.push("; ");
                if let Some(step) = step {
                    self.emit_expr(step, 1);
                }
                self.push(") ");
                self.emit_stmt_as_block(body);
            }
            StmtKind::While { cond, body } => {
                self.push("while (");
                self.emit_expr(cond, 1);
                self.push(") ");
                self.emit_stmt_as_block(body);
            }
            StmtKind::DoWhile { body, cond } => {
                self.push("do ");
                self.emit_stmt_as_block(body);
                self.push(" while (");
                self.emit_expr(cond, 1);
                self.push(");");
            }
            StmtKind::Switch { subject, body } => {
                self.push("switch (");
                self.emit_expr(subject, 1);
                self.push(") ");
                self.emit_block_body(body);
            }
            StmtKind::Case { label } => match label {
                Some(label) => {
                    self.push("case ");
                    self.emit_expr(label, 3);
                    self.push(":");
                }
                None => self.push("default:"),
            },
            StmtKind::Return(value) => {
                self.push("return");
                if let Some(value) = value {
                    self.push(" ");
                    self.emit_expr(value, 1);
                }
                self.push(";");
            }
            StmtKind::Break => self.push("break;"),
            StmtKind::Continue => self.push("continue;"),
            StmtKind::Discard => self.push("discard;"),
            StmtKind::Empty => self.push(";"),
        }
    }

    /// `for`-initializers print declarator lists inline:
    /// `for (int i = 0, j = 1; ...)`.
    fn emit_for_init(&mut self, init: &Stmt) {
        match &init.kind {
            StmtKind::Decl(vars) => {
                for (i, var) in vars.iter().enumerate() {
                    if i == 0 {
                        self.emit_var_decl(var);
                    } else {
                        self.push(", ");
                        self.push(&var.name);
                        self.emit_array_dims(&var.name_array_dims);
                        if let Some(init) = &var.init {
                            self.push(" = ");
                            self.emit_expr(init, 2);
                        }
                    }
                }
                self.push(";");
            }
            StmtKind::Expr(expr) => {
                self.emit_expr(expr, 1);
                self.push(";");
            }
            _ => self.push(";"),
        }
    }

    // ---------------------------------------------------------------------
    // Expressions
    // ---------------------------------------------------------------------

    fn prec_of(expr: &Expr) -> u8 {
        match &expr.kind {
            ExprKind::Binary { op, .. } => op.precedence(),
            ExprKind::Ternary { .. } => 3,
            ExprKind::Unary { prefix: true, .. } => UNARY_PRECEDENCE,
            _ => POSTFIX_PRECEDENCE,
        }
    }

    /// Emit with the minimum parentheses preserving precedence and
    /// associativity: a child is parenthesized when its own precedence is
    /// below the parent's threshold.
    fn emit_expr(&mut self, expr: &Expr, min_prec: u8) {
        let own = Self::prec_of(expr);
        let parens = own < min_prec;
        if parens {
            self.push("(");
        }
        self.emit_expr_inner(expr);
        if parens {
            self.push(")");
        }
    }

    fn emit_expr_inner(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::IntLit(v) => self.push(&v.to_string()),
            ExprKind::UintLit(v) => self.push(&format!("{v}u")),
            ExprKind::FloatLit(v) => {
                let text = render_float(*v);
                self.push(&text);
            }
            ExprKind::DoubleLit(v) => {
                if v.is_finite() {
                    let mut text = render_float(*v);
                    text.push_str("lf");
                    self.push(&text);
                } else {
                    self.push(&render_float(*v));
                }
            }
            ExprKind::BoolLit(b) => self.push(if *b { "true" } else { "false" }),
            ExprKind::Ident(name) => self.push(name),
            ExprKind::Binary { op, lhs, rhs } => {
                let prec = op.precedence();
                let (lmin, rmin) = if op.is_right_associative() {
                    (prec + 1, prec)
                } else {
                    (prec, prec + 1)
                };
                self.emit_expr(lhs, lmin);
                if *op == BinaryOp::Comma {
                    self.push(", ");
                } else {
                    self.push(" ");
                    self.push(op.symbol());
                    self.push(" ");
                }
                self.emit_expr(rhs, rmin);
            }
            ExprKind::Unary {
                op,
                operand,
                prefix,
            } => {
                if *prefix {
                    self.push(op.symbol());
                    // `-(-x)` must not re-lex as `--x`.
                    if needs_sign_gap(*op, operand) {
                        self.push(" ");
                    }
                    self.emit_expr(operand, UNARY_PRECEDENCE);
                } else {
                    self.emit_expr(operand, POSTFIX_PRECEDENCE);
                    self.push(op.symbol());
                }
            }
            ExprKind::Ternary {
                cond,
                then_expr,
                else_expr,
            } => {
                self.emit_expr(cond, 4);
                self.push(" ? ");
                self.emit_expr(then_expr, 3);
                self.push(" : ");
                self.emit_expr(else_expr, 3);
            }
            ExprKind::Call { name, args, .. } => {
                self.push(name);
                self.push("(");
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.emit_expr(arg, 2);
                }
                self.push(")");
            }
            ExprKind::Member { object, member, .. } => {
                self.emit_expr(object, POSTFIX_PRECEDENCE);
                self.push(".");
                self.push(member);
            }
            ExprKind::Index { base, index } => {
                self.emit_expr(base, POSTFIX_PRECEDENCE);
                self.push("[");
                self.emit_expr(index, 2);
                self.push("]");
            }
            ExprKind::InitList(items) => {
                self.push("{");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.emit_expr(item, 2);
                }
                self.push("}");
            }
        }
    }
}

fn needs_sign_gap(op: UnaryOp, operand: &Expr) -> bool {
    let ExprKind::Unary {
        op: inner,
        prefix: true,
        ..
    } = &operand.kind
    else {
        return false;
    };
    matches!(
        (op, inner),
        (UnaryOp::Neg, UnaryOp::Neg | UnaryOp::Dec)
            | (UnaryOp::Plus, UnaryOp::Plus | UnaryOp::Inc)
    )
}

/// Floats always carry a decimal point; NaN and the infinities render as
/// portable division forms since GLSL has no literals for them.
fn render_float(v: f64) -> String {
    if v.is_nan() {
        return "(0.0/0.0)".to_owned();
    }
    if v.is_infinite() {
        return if v > 0.0 {
            "(1.0/0.0)".to_owned()
        } else {
            "(-1.0/0.0)".to_owned()
        };
    }
    let mut s = format!("{v}");
    if !s.contains('.') && !s.contains('e') && !s.contains('E') {
        s.push_str(".0");
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_ast::Span;

    fn expr_text(expr: &Expr) -> String {
        let mut e = Emitter::new(String::new());
        e.emit_expr(expr, 1);
        e.finish()
    }

    fn bin(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::new(
            ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            Span::default(),
        )
    }

    fn ident(name: &str) -> Expr {
        Expr::ident(name, Span::default())
    }

    #[test]
    fn float_rendering() {
        assert_eq!(render_float(1.0), "1.0");
        assert_eq!(render_float(0.5), "0.5");
        assert_eq!(render_float(-2.0), "-2.0");
        assert_eq!(render_float(f64::NAN), "(0.0/0.0)");
        assert_eq!(render_float(f64::INFINITY), "(1.0/0.0)");
        assert_eq!(render_float(f64::NEG_INFINITY), "(-1.0/0.0)");
    }

    #[test]
    fn minimal_parens_for_precedence() {
        // (a + b) * c needs parens; a + b * c does not.
        let sum = bin(BinaryOp::Add, ident("a"), ident("b"));
        let product = bin(BinaryOp::Mul, sum, ident("c"));
        assert_eq!(expr_text(&product), "(a + b) * c");

        let product2 = bin(BinaryOp::Mul, ident("b"), ident("c"));
        let sum2 = bin(BinaryOp::Add, ident("a"), product2);
        assert_eq!(expr_text(&sum2), "a + b * c");
    }

    #[test]
    fn associativity_breaking_side_gets_parens() {
        // a - (b - c) keeps parens; (a - b) - c drops them.
        let inner = bin(BinaryOp::Sub, ident("b"), ident("c"));
        let outer = bin(BinaryOp::Sub, ident("a"), inner);
        assert_eq!(expr_text(&outer), "a - (b - c)");

        let inner2 = bin(BinaryOp::Sub, ident("a"), ident("b"));
        let outer2 = bin(BinaryOp::Sub, inner2, ident("c"));
        assert_eq!(expr_text(&outer2), "a - b - c");
    }

    #[test]
    fn double_negation_keeps_a_gap() {
        let inner = Expr::new(
            ExprKind::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(ident("x")),
                prefix: true,
            },
            Span::default(),
        );
        let outer = Expr::new(
            ExprKind::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(inner),
                prefix: true,
            },
            Span::default(),
        );
        assert_eq!(expr_text(&outer), "- -x");
    }

    #[test]
    fn uint_suffix() {
        let e = Expr::new(ExprKind::UintLit(7), Span::default());
        assert_eq!(expr_text(&e), "7u");
    }
}
