//! Shader data model: scalar/vector/matrix/sampler types, qualifier records,
//! the tagged AST, lexical symbol table, and diagnostics.
//!
//! Nodes use a shared header (`span` + optimizer flags) around a tagged
//! `kind`; children are owned (`Box`/`Vec`), so tree passes replace a node by
//! assigning through the parent-held slot they already borrow mutably.

mod ast;
pub mod builtins;
mod diag;
mod qualifiers;
mod symbols;
mod types;

pub use ast::{
    BinaryOp, BlockDecl, Decl, DeclKind, Expr, ExprKind, FunctionDecl, POSTFIX_PRECEDENCE, Param,
    Shader, Stmt, StmtKind, StructDecl, StructMember, UNARY_PRECEDENCE, UnaryOp, VarDecl,
};
pub use diag::{Diagnostic, DiagnosticKind, Severity};
pub use qualifiers::{
    DepthHint, InterpolationQualifier, LayoutPacking, LayoutRecord, MatrixLayout,
    PrecisionQualifier, Qualifiers, QualifierFlags, StorageQualifier,
};
pub use symbols::{Symbol, SymbolKind, SymbolTable};
pub use types::{BaseType, SamplerDim, Type};

use bitflags::bitflags;
use std::fmt;

/// 1-based source position of a node's first token. Diagnostics refer to the
/// original source, so spans survive every rewrite unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

bitflags! {
    /// Optimizer bookkeeping bits carried by every node header.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct NodeFlags: u8 {
        const CONSTANT    = 1 << 0;
        const PURE        = 1 << 1;
        const SIDE_EFFECT = 1 << 2;
        const DEAD        = 1 << 3;
        const VISITED     = 1 << 4;
        const MODIFIED    = 1 << 5;
    }
}
