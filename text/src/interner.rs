//! String interning for `Node::kind` and other symbolic tags.
//!
//! spec.md §3 calls a node's `type` "symbolic tag, string-interned". A grammar's set
//! of kinds is small and fixed at construction time, so a process-wide interner keyed
//! by a `rustc_hash::FxHashMap` (the teacher's `flat_ast::FlatAst` uses the same map
//! for its `NodeId` index) is enough; we don't need generational GC of symbols since
//! nothing is ever removed.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::Arc;

/// An interned symbolic tag. Cheap to copy and compare (a `u32` index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

struct Interner {
    strings: Vec<Arc<str>>,
    lookup: rustc_hash::FxHashMap<Arc<str>, Symbol>,
}

impl Interner {
    fn new() -> Self {
        Self {
            strings: Vec::new(),
            lookup: rustc_hash::FxHashMap::default(),
        }
    }

    fn intern(&mut self, s: &str) -> Symbol {
        if let Some(&sym) = self.lookup.get(s) {
            return sym;
        }
        let arc: Arc<str> = Arc::from(s);
        let sym = Symbol(self.strings.len() as u32);
        self.strings.push(arc.clone());
        self.lookup.insert(arc, sym);
        sym
    }

    fn resolve(&self, sym: Symbol) -> Arc<str> {
        self.strings[sym.0 as usize].clone()
    }
}

static INTERNER: Lazy<RwLock<Interner>> = Lazy::new(|| RwLock::new(Interner::new()));

impl Symbol {
    /// Intern `s`, returning the (possibly pre-existing) symbol for it.
    pub fn intern(s: &str) -> Self {
        INTERNER.write().intern(s)
    }

    /// Resolve back to the original string.
    pub fn as_str(&self) -> Arc<str> {
        INTERNER.read().resolve(*self)
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
