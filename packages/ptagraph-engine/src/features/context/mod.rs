//! Context Abstraction
//!
//! Interned contexts (bounded sequences of context elements) and the
//! selector that produces callee and heap contexts from the configured
//! sensitivity policy. Every policy fixes a finite element set, which
//! guarantees termination of the solver.

mod selector;

pub use selector::{ContextSelector, RecvInfo};

use smallvec::SmallVec;

use crate::features::heap::ObjId;
use crate::ir::{CallSiteId, TypeId};
use crate::shared::{Indexer, MapIndexer};

/// Dense id of an interned context. Id 0 is always the empty context.
pub type ContextId = u32;

/// One element of a context, depending on the policy in force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextElem {
    CallSite(CallSiteId),
    Obj(ObjId),
    Type(TypeId),
}

type Elems = SmallVec<[ContextElem; 4]>;

/// Intern table for contexts.
#[derive(Debug)]
pub struct ContextManager {
    contexts: MapIndexer<Elems>,
}

impl Default for ContextManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextManager {
    pub fn new() -> Self {
        let mut contexts = MapIndexer::new();
        contexts.get_index(&Elems::new());
        Self { contexts }
    }

    /// The empty context.
    pub fn empty(&self) -> ContextId {
        0
    }

    pub fn elements(&self, ctx: ContextId) -> &[ContextElem] {
        self.contexts.object_of(ctx)
    }

    /// Number of interned contexts (at least 1: the empty context).
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Append `elem` to `base`, keeping only the last `k` elements.
    pub fn append_limited(&mut self, base: ContextId, elem: ContextElem, k: u8) -> ContextId {
        if k == 0 {
            return self.empty();
        }
        let mut elems: Elems = self.elements(base).into();
        elems.push(elem);
        while elems.len() > k as usize {
            elems.remove(0);
        }
        self.contexts.get_index(&elems)
    }

    /// Keep only the last `k` elements of `ctx`.
    pub fn truncate_last(&mut self, ctx: ContextId, k: u8) -> ContextId {
        let elems = self.elements(ctx);
        if elems.len() <= k as usize {
            return ctx;
        }
        let keep: Elems = elems[elems.len() - k as usize..].into();
        self.contexts.get_index(&keep)
    }
}
