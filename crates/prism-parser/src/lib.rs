//! Recursive-descent GLSL parser with a Pratt precedence climber for
//! expressions (in `expr`).
//!
//! One-token lookahead suffices except at declaration/expression-statement
//! ambiguities, where a type-start followed by an identifier classifies the
//! statement as a declaration. Errors never abort: each diagnostic is
//! recorded at the offending token and the parser synchronizes to the next
//! statement boundary, so a compile with errors still yields a recovered
//! AST for the later pipeline stages.

mod expr;

use prism_ast::{
    BlockDecl, Decl, DeclKind, Diagnostic, DiagnosticKind, FunctionDecl, InterpolationQualifier,
    Param, PrecisionQualifier, Qualifiers, QualifierFlags, Shader, Span, Stmt, StmtKind,
    StorageQualifier, StructDecl, StructMember, Symbol, SymbolKind, Type, VarDecl,
};
use prism_catalog::{Stage, Version, detect_version};
pub use prism_lexer::Token;
use prism_lexer::{Directive, Keyword, Op, TokenKind, TokenStream};
use smallvec::SmallVec;
use tracing::debug;

pub struct ParseOutcome {
    pub shader: Shader,
    pub diagnostics: Vec<Diagnostic>,
    /// The spent token buffer, handed back so callers can return it to
    /// their pool; tokens only live for the duration of the parse.
    pub tokens: Vec<Token>,
}

impl ParseOutcome {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_error())
    }
}

/// Parse `source`, detecting the version from the directive / vocabulary.
pub fn parse_source(source: &str, stage: Stage) -> ParseOutcome {
    parse_with_version(source, stage, detect_version(source))
}

/// Parse with a caller-supplied source version (the `#version` directive in
/// the text still wins when present).
pub fn parse_with_version(source: &str, stage: Stage, version: Version) -> ParseOutcome {
    let stream = TokenStream::lex(source);
    Parser::new(stream, stage, version).run()
}

pub struct Parser {
    stream: TokenStream,
    stage: Stage,
    shader: Shader,
    diagnostics: Vec<Diagnostic>,
    loop_depth: u32,
    switch_depth: u32,
}

impl Parser {
    pub fn new(stream: TokenStream, stage: Stage, version: Version) -> Self {
        Self {
            stream,
            stage,
            shader: Shader::new(version, stage),
            diagnostics: Vec::new(),
            loop_depth: 0,
            switch_depth: 0,
        }
    }

    pub fn run(mut self) -> ParseOutcome {
        while !self.stream.at_end() {
            let before = self.stream.position();
            self.parse_top_level();
            if self.stream.position() == before {
                // A top-level production that consumed nothing: step over
                // the offender so the loop always makes progress.
                self.stream.advance();
            }
        }
        debug!(
            target: "parser",
            decls = self.shader.decls.len(),
            diagnostics = self.diagnostics.len(),
            stage = self.shader.stage.name(),
            "parse_complete"
        );
        ParseOutcome {
            shader: self.shader,
            diagnostics: self.diagnostics,
            tokens: self.stream.into_tokens(),
        }
    }

    // ---------------------------------------------------------------------
    // Diagnostics and recovery
    // ---------------------------------------------------------------------

    pub(crate) fn error(&mut self, diag: Diagnostic) {
        self.diagnostics.push(diag);
    }

    pub(crate) fn warn(&mut self, kind: DiagnosticKind, span: Span, message: impl Into<String>) {
        self.diagnostics
            .push(Diagnostic::warning(kind, span, message));
    }

    pub(crate) fn syntax_error_here(&mut self, message: impl Into<String>) {
        let span = self.stream.peek().span();
        self.diagnostics
            .push(Diagnostic::error(DiagnosticKind::Syntax, span, message));
    }

    /// `true` on success; on mismatch records the diagnostic and leaves the
    /// stream untouched.
    pub(crate) fn expect_op(&mut self, op: Op) -> bool {
        match self.stream.consume_op(op) {
            Ok(_) => true,
            Err(diag) => {
                self.diagnostics.push(diag);
                false
            }
        }
    }

    /// Skip to the next statement boundary: past a `;`, or up to a token
    /// that can begin a statement or declaration, or a closing brace.
    fn synchronize(&mut self) {
        while !self.stream.at_end() {
            if self.stream.eat_op(Op::Semicolon) {
                return;
            }
            match self.stream.peek().kind {
                TokenKind::Op(Op::RBrace) => return,
                TokenKind::Kw(
                    Keyword::If
                    | Keyword::For
                    | Keyword::While
                    | Keyword::Do
                    | Keyword::Switch
                    | Keyword::Return
                    | Keyword::Break
                    | Keyword::Continue
                    | Keyword::Discard
                    | Keyword::Struct
                    | Keyword::Uniform
                    | Keyword::In
                    | Keyword::Out
                    | Keyword::Layout,
                )
                | TokenKind::Type(_) => return,
                _ => {
                    self.stream.advance();
                }
            }
        }
    }

    // ---------------------------------------------------------------------
    // Top level
    // ---------------------------------------------------------------------

    fn parse_top_level(&mut self) {
        let token = self.stream.peek().clone();
        match token.kind {
            TokenKind::Directive(Directive::Version) => {
                self.stream.advance();
                self.apply_version_directive(&token);
            }
            TokenKind::Directive(Directive::Extension) => {
                self.stream.advance();
                self.push_extension_decl(&token);
            }
            TokenKind::Directive(d) => {
                self.stream.advance();
                self.skip_directive_line(&token);
                if !matches!(d, Directive::Pragma | Directive::Line | Directive::Define) {
                    self.warn(
                        DiagnosticKind::UnsupportedFeature,
                        token.span(),
                        format!(
                            "preprocessor directive `#{}` is not translated; run the preprocessor first",
                            d.text()
                        ),
                    );
                }
            }
            TokenKind::Kw(Keyword::Precision) => self.parse_precision_decl(),
            TokenKind::Error => {
                self.stream.advance();
                self.error(Diagnostic::error(
                    DiagnosticKind::Syntax,
                    token.span(),
                    format!("unrecognized character `{}`", token.lexeme),
                ));
            }
            TokenKind::Eof => {}
            _ => self.parse_declaration(),
        }
    }

    fn apply_version_directive(&mut self, token: &Token) {
        let mut words = token.lexeme.split_whitespace();
        let Some(number) = words.next().and_then(|w| w.parse::<u16>().ok()) else {
            self.error(Diagnostic::error(
                DiagnosticKind::Syntax,
                token.span(),
                format!("malformed #version directive `{}`", token.lexeme),
            ));
            return;
        };
        match Version::from_code(number).or_else(|| Version::nearest_at_most(number)) {
            Some(v) => self.shader.version = v,
            None => {
                self.error(Diagnostic::error(
                    DiagnosticKind::VersionMismatch,
                    token.span(),
                    format!("unknown GLSL version {number}"),
                ));
            }
        }
        self.shader.profile = words.next().map(str::to_owned);
    }

    fn push_extension_decl(&mut self, token: &Token) {
        let (name, behavior) = match token.lexeme.split_once(':') {
            Some((n, b)) => (n.trim().to_owned(), b.trim().to_owned()),
            None => (token.lexeme.trim().to_owned(), "enable".to_owned()),
        };
        self.shader.decls.push(Decl::new(
            DeclKind::Extension { name, behavior },
            token.span(),
        ));
    }

    /// Non-capturing directives pass their arguments through as ordinary
    /// tokens; discard everything left on the directive's source line.
    fn skip_directive_line(&mut self, directive: &Token) {
        while !self.stream.at_end() && self.stream.peek().line == directive.line {
            self.stream.advance();
        }
    }

    fn parse_precision_decl(&mut self) {
        let span = self.stream.peek().span();
        self.stream.advance(); // `precision`
        let precision = match self.stream.peek().kind {
            TokenKind::Kw(Keyword::HighP) => PrecisionQualifier::HighP,
            TokenKind::Kw(Keyword::MediumP) => PrecisionQualifier::MediumP,
            TokenKind::Kw(Keyword::LowP) => PrecisionQualifier::LowP,
            _ => {
                self.syntax_error_here("expected precision qualifier after `precision`");
                self.synchronize();
                return;
            }
        };
        self.stream.advance();
        let ty = match self.stream.peek().kind {
            TokenKind::Type(base) => {
                self.stream.advance();
                Type::simple(base)
            }
            _ => {
                self.syntax_error_here("expected type in precision declaration");
                self.synchronize();
                return;
            }
        };
        self.expect_op(Op::Semicolon);
        self.shader
            .decls
            .push(Decl::new(DeclKind::Precision { precision, ty }, span));
    }

    // ---------------------------------------------------------------------
    // Qualifiers
    // ---------------------------------------------------------------------

    pub(crate) fn parse_qualifiers(&mut self) -> Qualifiers {
        let mut q = Qualifiers::default();
        loop {
            let TokenKind::Kw(kw) = self.stream.peek().kind else {
                break;
            };
            match kw {
                Keyword::Layout => {
                    self.stream.advance();
                    self.parse_layout_into(&mut q);
                }
                Keyword::Const => self.set_storage(&mut q, StorageQualifier::Const),
                Keyword::In => self.set_storage(&mut q, StorageQualifier::In),
                Keyword::Out => self.set_storage(&mut q, StorageQualifier::Out),
                Keyword::InOut => self.set_storage(&mut q, StorageQualifier::InOut),
                Keyword::Uniform => self.set_storage(&mut q, StorageQualifier::Uniform),
                Keyword::Buffer => self.set_storage(&mut q, StorageQualifier::Buffer),
                Keyword::Shared => self.set_storage(&mut q, StorageQualifier::Shared),
                Keyword::Attribute => self.set_storage(&mut q, StorageQualifier::Attribute),
                Keyword::Varying => self.set_storage(&mut q, StorageQualifier::Varying),
                Keyword::Flat => self.set_interp(&mut q, InterpolationQualifier::Flat),
                Keyword::Smooth => self.set_interp(&mut q, InterpolationQualifier::Smooth),
                Keyword::NoPerspective => {
                    self.set_interp(&mut q, InterpolationQualifier::NoPerspective)
                }
                Keyword::HighP => self.set_precision(&mut q, PrecisionQualifier::HighP),
                Keyword::MediumP => self.set_precision(&mut q, PrecisionQualifier::MediumP),
                Keyword::LowP => self.set_precision(&mut q, PrecisionQualifier::LowP),
                Keyword::Centroid => self.set_flag(&mut q, QualifierFlags::CENTROID),
                Keyword::Sample => self.set_flag(&mut q, QualifierFlags::SAMPLE),
                Keyword::Patch => self.set_flag(&mut q, QualifierFlags::PATCH),
                Keyword::Invariant => self.set_flag(&mut q, QualifierFlags::INVARIANT),
                Keyword::Precise => self.set_flag(&mut q, QualifierFlags::PRECISE),
                Keyword::Coherent => self.set_flag(&mut q, QualifierFlags::COHERENT),
                Keyword::Volatile => self.set_flag(&mut q, QualifierFlags::VOLATILE),
                Keyword::Restrict => self.set_flag(&mut q, QualifierFlags::RESTRICT),
                Keyword::ReadOnly => self.set_flag(&mut q, QualifierFlags::READONLY),
                Keyword::WriteOnly => self.set_flag(&mut q, QualifierFlags::WRITEONLY),
                Keyword::Subroutine => {
                    let span = self.stream.peek().span();
                    self.stream.advance();
                    self.warn(
                        DiagnosticKind::UnsupportedFeature,
                        span,
                        "subroutine qualifiers are ignored",
                    );
                }
                _ => break,
            }
        }
        q
    }

    fn set_storage(&mut self, q: &mut Qualifiers, storage: StorageQualifier) {
        self.stream.advance();
        q.storage = storage;
    }

    fn set_interp(&mut self, q: &mut Qualifiers, interp: InterpolationQualifier) {
        self.stream.advance();
        q.interpolation = interp;
    }

    fn set_precision(&mut self, q: &mut Qualifiers, precision: PrecisionQualifier) {
        self.stream.advance();
        q.precision = precision;
    }

    fn set_flag(&mut self, q: &mut Qualifiers, flag: QualifierFlags) {
        self.stream.advance();
        q.flags |= flag;
    }

    fn parse_layout_into(&mut self, q: &mut Qualifiers) {
        if !self.expect_op(Op::LParen) {
            return;
        }
        loop {
            let token = self.stream.peek().clone();
            let key = match token.kind {
                TokenKind::Ident | TokenKind::Kw(_) | TokenKind::Type(_) => {
                    self.stream.advance();
                    token.text().to_owned()
                }
                _ => {
                    self.syntax_error_here("expected layout qualifier name");
                    break;
                }
            };
            let mut value = None;
            if self.stream.eat_op(Op::Assign) {
                let expr = self.parse_conditional();
                match self.fold_const_int(&expr) {
                    Some(v) if (i32::MIN as i64..=i32::MAX as i64).contains(&v) => {
                        value = Some(v as i32);
                    }
                    _ => {
                        self.error(Diagnostic::error(
                            DiagnosticKind::Syntax,
                            expr.span,
                            format!("layout value for `{key}` must be a constant integer"),
                        ));
                    }
                }
            }
            q.layout_mut().set(&key, value);
            if !self.stream.eat_op(Op::Comma) {
                break;
            }
        }
        self.expect_op(Op::RParen);
    }

    // ---------------------------------------------------------------------
    // Declarations
    // ---------------------------------------------------------------------

    fn is_known_struct(&self, name: &str) -> bool {
        matches!(
            self.shader.symbols.lookup(name),
            Some(sym) if sym.kind == SymbolKind::Struct
        )
    }

    /// A top-level declaration: qualifiers, then interface block / struct /
    /// function / variable list.
    fn parse_declaration(&mut self) {
        let span = self.stream.peek().span();
        let q = self.parse_qualifiers();

        // Bare qualifier declaration, e.g. `layout(local_size_x = 8) in;`.
        if self.stream.check_op(Op::Semicolon) {
            self.stream.advance();
            if q.is_default() {
                self.warn(
                    DiagnosticKind::Syntax,
                    span,
                    "empty declaration has no effect",
                );
                return;
            }
            self.shader.decls.push(Decl::new(
                DeclKind::Variable(VarDecl {
                    ty: Type::default().with_qualifiers(q),
                    name: String::new(),
                    name_array_dims: SmallVec::new(),
                    init: None,
                }),
                span,
            ));
            return;
        }

        // Interface block: storage-qualified identifier followed by `{`.
        if matches!(
            q.storage,
            StorageQualifier::Uniform
                | StorageQualifier::Buffer
                | StorageQualifier::In
                | StorageQualifier::Out
        ) && self.stream.check(TokenKind::Ident)
            && self.stream.peek_at(1).kind == TokenKind::Op(Op::LBrace)
        {
            self.parse_interface_block(q, span);
            return;
        }

        if self.stream.check_kw(Keyword::Struct) {
            self.parse_struct_decl(q, span);
            return;
        }

        let Some(ty) = self.parse_type_specifier(q) else {
            self.syntax_error_here("expected type in declaration");
            self.synchronize();
            return;
        };

        // Function: `return-type name ( ... )`.
        if self.stream.check(TokenKind::Ident)
            && self.stream.peek_at(1).kind == TokenKind::Op(Op::LParen)
        {
            self.parse_function(ty, span);
            return;
        }

        let vars = self.parse_declarator_list(ty);
        for var in vars {
            self.shader
                .decls
                .push(Decl::new(DeclKind::Variable(var), span));
        }
    }

    /// Type specifier after qualifiers: a type keyword or a known struct
    /// name, then optional type-attached array dimensions.
    pub(crate) fn parse_type_specifier(&mut self, q: Qualifiers) -> Option<Type> {
        let mut ty = match self.stream.peek().kind {
            TokenKind::Type(base) => {
                self.stream.advance();
                Type::simple(base)
            }
            TokenKind::Ident => {
                let name = self.stream.peek().lexeme.clone();
                if !self.is_known_struct(&name) {
                    return None;
                }
                self.stream.advance();
                Type::named_struct(name)
            }
            _ => return None,
        };
        ty.qualifiers = q;
        ty.array_dims = self.parse_array_dims();
        Some(ty)
    }

    /// `[`-prefixed dimension list. Sizes must fold to positive constants;
    /// anything else records a diagnostic and yields -1 (unsized).
    pub(crate) fn parse_array_dims(&mut self) -> SmallVec<[i32; 2]> {
        let mut dims = SmallVec::new();
        while self.stream.eat_op(Op::LBracket) {
            if self.stream.eat_op(Op::RBracket) {
                dims.push(-1);
                continue;
            }
            let expr = self.parse_conditional();
            match self.fold_const_int(&expr) {
                Some(v) if v >= 1 && v <= i32::MAX as i64 => dims.push(v as i32),
                Some(v) => {
                    self.error(Diagnostic::error(
                        DiagnosticKind::Type,
                        expr.span,
                        format!("array size must be at least 1, got {v}"),
                    ));
                    dims.push(-1);
                }
                None => {
                    self.error(Diagnostic::error(
                        DiagnosticKind::Type,
                        expr.span,
                        "array size must be a constant integer expression",
                    ));
                    dims.push(-1);
                }
            }
            self.expect_op(Op::RBracket);
        }
        dims
    }

    /// `name [dims] [= init] (, name ...)* ;` — shared by globals and local
    /// declaration statements. Registers one symbol per declarator.
    pub(crate) fn parse_declarator_list(&mut self, ty: Type) -> Vec<VarDecl> {
        let mut vars = Vec::new();
        loop {
            let token = self.stream.peek().clone();
            let token_span = token.span();
            let name = match token.kind {
                TokenKind::Ident => {
                    self.stream.advance();
                    token.lexeme
                }
                TokenKind::Builtin => {
                    self.stream.advance();
                    self.error(Diagnostic::error(
                        DiagnosticKind::Redefinition,
                        token.span(),
                        format!("cannot redeclare built-in `{}`", token.lexeme),
                    ));
                    token.lexeme
                }
                _ => {
                    self.syntax_error_here("expected declarator name");
                    self.synchronize();
                    return vars;
                }
            };
            let name_array_dims = self.parse_array_dims();
            let init = if self.stream.eat_op(Op::Assign) {
                Some(self.parse_initializer())
            } else {
                None
            };
            self.declare_symbol(Symbol::new(
                name.clone(),
                SymbolKind::Variable,
                ty.clone(),
                token_span,
            ));
            vars.push(VarDecl {
                ty: ty.clone(),
                name,
                name_array_dims,
                init,
            });
            if !self.stream.eat_op(Op::Comma) {
                break;
            }
        }
        if !self.expect_op(Op::Semicolon) {
            self.synchronize();
        }
        vars
    }

    pub(crate) fn declare_symbol(&mut self, symbol: Symbol) {
        let name = symbol.name.clone();
        let span = symbol.declared_at;
        if let Err(previous) = self.shader.symbols.declare(symbol) {
            self.error(Diagnostic::error(
                DiagnosticKind::Redefinition,
                span,
                format!("`{name}` already declared at {previous}"),
            ));
        }
    }

    fn parse_struct_decl(&mut self, q: Qualifiers, span: Span) {
        self.stream.advance(); // `struct`
        let name = match self.stream.consume(TokenKind::Ident, "struct name") {
            Ok(t) => t.lexeme,
            Err(diag) => {
                self.error(diag);
                self.synchronize();
                return;
            }
        };
        if !self.expect_op(Op::LBrace) {
            self.synchronize();
            return;
        }
        let members = self.parse_member_list();
        self.declare_symbol(Symbol::new(
            name.clone(),
            SymbolKind::Struct,
            Type::named_struct(name.clone()),
            span,
        ));
        // Optional instance declarator.
        let instance = if self.stream.check(TokenKind::Ident) {
            let token = self.stream.advance();
            let dims = self.parse_array_dims();
            let ty = Type::named_struct(name.clone()).with_qualifiers(q);
            self.declare_symbol(Symbol::new(
                token.lexeme.clone(),
                SymbolKind::Variable,
                ty.clone(),
                token.span(),
            ));
            Some(VarDecl {
                ty,
                name: token.lexeme,
                name_array_dims: dims,
                init: None,
            })
        } else {
            None
        };
        self.expect_op(Op::Semicolon);
        self.shader.decls.push(Decl::new(
            DeclKind::Struct(StructDecl {
                name,
                members,
                instance,
            }),
            span,
        ));
    }

    fn parse_interface_block(&mut self, q: Qualifiers, span: Span) {
        let block_name = self.stream.advance().lexeme;
        self.stream.advance(); // `{`
        let members = self.parse_member_list();
        let mut instance_name = None;
        let mut array_dims = SmallVec::new();
        if self.stream.check(TokenKind::Ident) {
            let token = self.stream.advance();
            array_dims = self.parse_array_dims();
            let mut ty = Type::named_struct(block_name.clone()).with_qualifiers(q.clone());
            ty.base = prism_ast::BaseType::InterfaceBlock;
            self.declare_symbol(Symbol::new(
                token.lexeme.clone(),
                SymbolKind::InterfaceBlock,
                ty,
                token.span(),
            ));
            instance_name = Some(token.lexeme);
        } else {
            // Anonymous block: members join the global scope.
            for member in &members {
                self.declare_symbol(Symbol::new(
                    member.name.clone(),
                    SymbolKind::Variable,
                    member.ty.clone(),
                    member.span,
                ));
            }
        }
        self.expect_op(Op::Semicolon);
        self.shader.decls.push(Decl::new(
            DeclKind::Block(BlockDecl {
                qualifiers: q,
                block_name,
                instance_name,
                array_dims,
                members,
            }),
            span,
        ));
    }

    /// Members up to the closing `}` (consumed).
    fn parse_member_list(&mut self) -> Vec<StructMember> {
        let mut members = Vec::new();
        while !self.stream.check_op(Op::RBrace) && !self.stream.at_end() {
            let before = self.stream.position();
            let q = self.parse_qualifiers();
            let Some(ty) = self.parse_type_specifier(q) else {
                self.syntax_error_here("expected member type");
                self.synchronize();
                if self.stream.position() == before {
                    self.stream.advance();
                }
                continue;
            };
            loop {
                let token = match self.stream.consume(TokenKind::Ident, "member name") {
                    Ok(t) => t,
                    Err(diag) => {
                        self.error(diag);
                        self.synchronize();
                        break;
                    }
                };
                let dims = self.parse_array_dims();
                let token_span = token.span();
                members.push(StructMember {
                    ty: ty.clone(),
                    name: token.lexeme,
                    array_dims: dims,
                    span: token_span,
                });
                if !self.stream.eat_op(Op::Comma) {
                    break;
                }
            }
            self.expect_op(Op::Semicolon);
        }
        self.expect_op(Op::RBrace);
        members
    }

    fn parse_function(&mut self, return_type: Type, span: Span) {
        let name = self.stream.advance().lexeme;
        self.stream.advance(); // `(`
        let params = self.parse_params();
        // Visible before the body so prototypes and calls resolve.
        self.declare_function_symbol(&name, &return_type, span);
        if self.stream.eat_op(Op::Semicolon) {
            self.shader.decls.push(Decl::new(
                DeclKind::Function(FunctionDecl {
                    return_type,
                    name,
                    params,
                    body: None,
                    is_prototype: true,
                }),
                span,
            ));
            return;
        }
        if !self.stream.check_op(Op::LBrace) {
            self.syntax_error_here("expected function body or `;`");
            self.synchronize();
            return;
        }
        self.shader.symbols.push_scope();
        for param in &params {
            if let Some(pname) = &param.name {
                self.declare_symbol(Symbol::new(
                    pname.clone(),
                    SymbolKind::Parameter,
                    param.ty.clone(),
                    param.span,
                ));
            }
        }
        let body = self.parse_block();
        self.shader.symbols.pop_scope();
        self.shader.decls.push(Decl::new(
            DeclKind::Function(FunctionDecl {
                return_type,
                name,
                params,
                body: Some(body),
                is_prototype: false,
            }),
            span,
        ));
    }

    fn declare_function_symbol(&mut self, name: &str, return_type: &Type, span: Span) {
        // Prototype-then-definition is not a redefinition; only record the
        // first sighting.
        if self
            .shader
            .symbols
            .lookup_local(name)
            .is_none_or(|sym| sym.kind != SymbolKind::Function)
        {
            self.declare_symbol(Symbol::new(
                name,
                SymbolKind::Function,
                return_type.clone(),
                span,
            ));
        }
    }

    fn parse_params(&mut self) -> Vec<Param> {
        let mut params = Vec::new();
        if self.stream.eat_op(Op::RParen) {
            return params;
        }
        // `(void)`
        if self.stream.check(TokenKind::Type(prism_ast::BaseType::Void))
            && self.stream.peek_at(1).kind == TokenKind::Op(Op::RParen)
        {
            self.stream.advance();
            self.stream.advance();
            return params;
        }
        loop {
            let span = self.stream.peek().span();
            let q = self.parse_qualifiers();
            let storage = q.storage;
            let Some(mut ty) = self.parse_type_specifier(q) else {
                self.syntax_error_here("expected parameter type");
                self.synchronize();
                return params;
            };
            let name = if self.stream.check(TokenKind::Ident) {
                let token = self.stream.advance();
                let dims = self.parse_array_dims();
                ty.array_dims.extend(dims);
                Some(token.lexeme)
            } else {
                None
            };
            params.push(Param {
                ty,
                name,
                storage,
                span,
            });
            if !self.stream.eat_op(Op::Comma) {
                break;
            }
        }
        self.expect_op(Op::RParen);
        params
    }

    // ---------------------------------------------------------------------
    // Statements
    // ---------------------------------------------------------------------

    /// `{ ... }` with its own lexical scope.
    pub(crate) fn parse_block(&mut self) -> Stmt {
        let span = self.stream.peek().span();
        self.expect_op(Op::LBrace);
        self.shader.symbols.push_scope();
        let mut stmts = Vec::new();
        while !self.stream.check_op(Op::RBrace) && !self.stream.at_end() {
            let before = self.stream.position();
            stmts.push(self.parse_statement());
            if self.stream.position() == before {
                self.stream.advance();
            }
        }
        self.expect_op(Op::RBrace);
        self.shader.symbols.pop_scope();
        Stmt::block(stmts, span)
    }

    fn starts_declaration(&self) -> bool {
        match self.stream.peek().kind {
            TokenKind::Kw(
                Keyword::Const
                | Keyword::In
                | Keyword::Out
                | Keyword::InOut
                | Keyword::Uniform
                | Keyword::Buffer
                | Keyword::Shared
                | Keyword::Attribute
                | Keyword::Varying
                | Keyword::Flat
                | Keyword::Smooth
                | Keyword::NoPerspective
                | Keyword::HighP
                | Keyword::MediumP
                | Keyword::LowP
                | Keyword::Layout
                | Keyword::Centroid
                | Keyword::Sample
                | Keyword::Patch
                | Keyword::Invariant
                | Keyword::Precise
                | Keyword::Coherent
                | Keyword::Volatile
                | Keyword::Restrict
                | Keyword::ReadOnly
                | Keyword::WriteOnly
                | Keyword::Struct,
            ) => true,
            // Two-token lookahead: a type-start followed by an identifier.
            TokenKind::Type(_) => self.stream.peek_at(1).kind == TokenKind::Ident,
            TokenKind::Ident => {
                self.is_known_struct(&self.stream.peek().lexeme)
                    && self.stream.peek_at(1).kind == TokenKind::Ident
            }
            _ => false,
        }
    }

    pub(crate) fn parse_statement(&mut self) -> Stmt {
        let span = self.stream.peek().span();
        match self.stream.peek().kind {
            TokenKind::Op(Op::LBrace) => self.parse_block(),
            TokenKind::Op(Op::Semicolon) => {
                self.stream.advance();
                Stmt::empty(span)
            }
            TokenKind::Kw(Keyword::If) => self.parse_if(span),
            TokenKind::Kw(Keyword::For) => self.parse_for(span),
            TokenKind::Kw(Keyword::While) => self.parse_while(span),
            TokenKind::Kw(Keyword::Do) => self.parse_do_while(span),
            TokenKind::Kw(Keyword::Switch) => self.parse_switch(span),
            TokenKind::Kw(Keyword::Case) => {
                self.stream.advance();
                if self.switch_depth == 0 {
                    self.warn(
                        DiagnosticKind::Syntax,
                        span,
                        "`case` label outside a switch statement",
                    );
                }
                let label = self.parse_conditional();
                self.expect_op(Op::Colon);
                Stmt::new(StmtKind::Case { label: Some(label) }, span)
            }
            TokenKind::Kw(Keyword::Default) => {
                self.stream.advance();
                self.expect_op(Op::Colon);
                Stmt::new(StmtKind::Case { label: None }, span)
            }
            TokenKind::Kw(Keyword::Return) => {
                self.stream.advance();
                let value = if self.stream.check_op(Op::Semicolon) {
                    None
                } else {
                    Some(self.parse_expression())
                };
                self.expect_op(Op::Semicolon);
                Stmt::new(StmtKind::Return(value), span)
            }
            TokenKind::Kw(Keyword::Break) => {
                self.stream.advance();
                if self.loop_depth == 0 && self.switch_depth == 0 {
                    self.warn(
                        DiagnosticKind::Syntax,
                        span,
                        "`break` outside a loop or switch",
                    );
                }
                self.expect_op(Op::Semicolon);
                Stmt::new(StmtKind::Break, span)
            }
            TokenKind::Kw(Keyword::Continue) => {
                self.stream.advance();
                if self.loop_depth == 0 {
                    self.warn(DiagnosticKind::Syntax, span, "`continue` outside a loop");
                }
                self.expect_op(Op::Semicolon);
                Stmt::new(StmtKind::Continue, span)
            }
            TokenKind::Kw(Keyword::Discard) => {
                self.stream.advance();
                if self.stage != Stage::Fragment {
                    self.warn(
                        DiagnosticKind::Syntax,
                        span,
                        format!("`discard` has no effect in a {} shader", self.stage),
                    );
                }
                self.expect_op(Op::Semicolon);
                Stmt::new(StmtKind::Discard, span)
            }
            _ if self.starts_declaration() => self.parse_decl_statement(span),
            _ => {
                let expr = self.parse_expression();
                if !self.expect_op(Op::Semicolon) {
                    self.synchronize();
                }
                Stmt::new(StmtKind::Expr(expr), span)
            }
        }
    }

    fn parse_decl_statement(&mut self, span: Span) -> Stmt {
        let q = self.parse_qualifiers();
        if self.stream.check_kw(Keyword::Struct) {
            // Local struct declarations are rare but legal.
            self.parse_struct_decl(q, span);
            return Stmt::empty(span);
        }
        let Some(ty) = self.parse_type_specifier(q) else {
            self.syntax_error_here("expected type in declaration");
            self.synchronize();
            return Stmt::empty(span);
        };
        let vars = self.parse_declarator_list(ty);
        Stmt::new(StmtKind::Decl(vars), span)
    }

    fn parse_if(&mut self, span: Span) -> Stmt {
        self.stream.advance();
        self.expect_op(Op::LParen);
        let cond = self.parse_expression();
        self.expect_op(Op::RParen);
        let then_branch = Box::new(self.parse_statement());
        let else_branch = if self.stream.eat_kw(Keyword::Else) {
            Some(Box::new(self.parse_statement()))
        } else {
            None
        };
        Stmt::new(
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            },
            span,
        )
    }

    fn parse_for(&mut self, span: Span) -> Stmt {
        self.stream.advance();
        self.expect_op(Op::LParen);
        self.shader.symbols.push_scope();
        let init = if self.stream.eat_op(Op::Semicolon) {
            None
        } else if self.starts_declaration() {
            let init_span = self.stream.peek().span();
            Some(Box::new(self.parse_decl_statement(init_span)))
        } else {
            let expr = self.parse_expression();
            self.expect_op(Op::Semicolon);
            Some(Box::new(Stmt::new(StmtKind::Expr(expr), span)))
        };
        let cond = if self.stream.check_op(Op::Semicolon) {
            None
        } else {
            Some(self.parse_expression())
        };
        self.expect_op(Op::Semicolon);
        let step = if self.stream.check_op(Op::RParen) {
            None
        } else {
            Some(self.parse_expression())
        };
        self.expect_op(Op::RParen);
        self.loop_depth += 1;
        let body = Box::new(self.parse_statement());
        self.loop_depth -= 1;
        self.shader.symbols.pop_scope();
        Stmt::new(
            StmtKind::For {
                init,
                cond,
                step,
                body,
            },
            span,
        )
    }

    fn parse_while(&mut self, span: Span) -> Stmt {
        self.stream.advance();
        self.expect_op(Op::LParen);
        let cond = self.parse_expression();
        self.expect_op(Op::RParen);
        self.loop_depth += 1;
        let body = Box::new(self.parse_statement());
        self.loop_depth -= 1;
        Stmt::new(StmtKind::While { cond, body }, span)
    }

    fn parse_do_while(&mut self, span: Span) -> Stmt {
        self.stream.advance();
        self.loop_depth += 1;
        let body = Box::new(self.parse_statement());
        self.loop_depth -= 1;
        if !self.stream.eat_kw(Keyword::While) {
            self.syntax_error_here("expected `while` after do-block");
            self.synchronize();
            return *body;
        }
        self.expect_op(Op::LParen);
        let cond = self.parse_expression();
        self.expect_op(Op::RParen);
        self.expect_op(Op::Semicolon);
        Stmt::new(StmtKind::DoWhile { body, cond }, span)
    }

    fn parse_switch(&mut self, span: Span) -> Stmt {
        self.stream.advance();
        self.expect_op(Op::LParen);
        let subject = self.parse_expression();
        self.expect_op(Op::RParen);
        self.expect_op(Op::LBrace);
        self.shader.symbols.push_scope();
        self.switch_depth += 1;
        let mut body = Vec::new();
        while !self.stream.check_op(Op::RBrace) && !self.stream.at_end() {
            let before = self.stream.position();
            body.push(self.parse_statement());
            if self.stream.position() == before {
                self.stream.advance();
            }
        }
        self.switch_depth -= 1;
        self.shader.symbols.pop_scope();
        self.expect_op(Op::RBrace);
        Stmt::new(StmtKind::Switch { subject, body }, span)
    }
}
