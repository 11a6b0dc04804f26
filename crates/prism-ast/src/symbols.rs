//! Nested lexical scopes. Rebuilt per compile; only the global scope
//! survives on the shader root once parsing finishes.

use crate::types::Type;
use crate::Span;
use ahash::AHashMap;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Function,
    Struct,
    InterfaceBlock,
    Parameter,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: Type,
    pub scope_depth: u32,
    pub declared_at: Span,
    pub use_count: u32,
    pub read: bool,
    pub written: bool,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind, ty: Type, declared_at: Span) -> Self {
        Self {
            name: name.into(),
            kind,
            ty,
            scope_depth: 0,
            declared_at,
            use_count: 0,
            read: false,
            written: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Scope {
    symbols: AHashMap<String, Symbol>,
}

/// A stack of scopes: global at the bottom, then function, then blocks.
/// Lookup walks outward; local-only lookup checks the innermost scope.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    /// Depth of the innermost scope; the global scope is 0.
    pub fn depth(&self) -> u32 {
        (self.scopes.len() - 1) as u32
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
        trace!(target: "symbols", depth = self.depth(), "scope_push");
    }

    /// Popping never removes the global scope.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
            trace!(target: "symbols", depth = self.depth(), "scope_pop");
        }
    }

    /// Declare into the innermost scope. Returns the span of the previous
    /// declaration when the name is already taken there (shadowing across
    /// scopes is fine; two siblings are not).
    pub fn declare(&mut self, mut symbol: Symbol) -> Result<(), Span> {
        symbol.scope_depth = self.depth();
        let scope = self
            .scopes
            .last_mut()
            .expect("table always has a global scope");
        if let Some(existing) = scope.symbols.get(&symbol.name) {
            return Err(existing.declared_at);
        }
        scope.symbols.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    /// Walk scopes inner-to-outer.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.symbols.get(name))
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.symbols.get_mut(name))
    }

    /// Innermost scope only.
    pub fn lookup_local(&self, name: &str) -> Option<&Symbol> {
        self.scopes
            .last()
            .and_then(|scope| scope.symbols.get(name))
    }

    /// Iterate the global scope (the only one that persists after parse).
    pub fn globals(&self) -> impl Iterator<Item = &Symbol> {
        self.scopes[0].symbols.values()
    }

    pub fn note_use(&mut self, name: &str, written: bool) {
        if let Some(sym) = self.lookup_mut(name) {
            sym.use_count += 1;
            if written {
                sym.written = true;
            } else {
                sym.read = true;
            }
        }
    }
}
