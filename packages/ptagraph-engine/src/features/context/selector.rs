//! Context selection policies.
//!
//! For a caller context, call site, receiver object (absent for static
//! calls) and callee, produce the callee context; symmetrically produce
//! heap contexts for allocations. Heap contexts truncate the allocator
//! context to `k - 1` elements (the standard k-limit heap abstraction).

use crate::config::ContextPolicy;
use crate::features::heap::ObjId;
use crate::ir::{CallSiteId, TypeId};

use super::{ContextElem, ContextId, ContextManager};

/// Receiver information for context selection at an instance call.
#[derive(Debug, Clone, Copy)]
pub struct RecvInfo {
    /// Heap context of the receiver object.
    pub heap_ctx: ContextId,
    pub obj: ObjId,
    /// Runtime type of the receiver object.
    pub ty: TypeId,
}

#[derive(Debug, Clone, Copy)]
pub struct ContextSelector {
    policy: ContextPolicy,
}

impl ContextSelector {
    pub fn new(policy: ContextPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ContextPolicy {
        self.policy
    }

    /// Callee context for a call from `caller_ctx` at `site`.
    pub fn select_call(
        &self,
        cm: &mut ContextManager,
        caller_ctx: ContextId,
        site: CallSiteId,
        recv: Option<RecvInfo>,
    ) -> ContextId {
        match self.policy {
            ContextPolicy::Insensitive => cm.empty(),
            ContextPolicy::CallSite(k) => {
                cm.append_limited(caller_ctx, ContextElem::CallSite(site), k)
            }
            ContextPolicy::Object(k) => match recv {
                Some(r) => cm.append_limited(r.heap_ctx, ContextElem::Obj(r.obj), k),
                // Static calls inherit the caller context.
                None => caller_ctx,
            },
            ContextPolicy::Type(k) => match recv {
                Some(r) => cm.append_limited(r.heap_ctx, ContextElem::Type(r.ty), k),
                None => caller_ctx,
            },
            ContextPolicy::Hybrid => match recv {
                Some(r) => cm.append_limited(r.heap_ctx, ContextElem::Obj(r.obj), 1),
                None => cm.append_limited(caller_ctx, ContextElem::CallSite(site), 1),
            },
        }
    }

    /// Heap context for an allocation executed under `alloc_ctx`.
    pub fn select_heap(&self, cm: &mut ContextManager, alloc_ctx: ContextId) -> ContextId {
        let depth = self.policy.depth();
        if depth == 0 {
            return cm.empty();
        }
        cm.truncate_last(alloc_ctx, depth - 1)
    }
}
