//! CS element manager.
//!
//! Intern tables for all context-qualified entities. Every accessor is
//! idempotent: equal keys yield the same dense id, and the id doubles as
//! the bitset index of the element. The manager uniquely owns the interned
//! values; the rest of the engine passes ids around.

use crate::features::context::ContextId;
use crate::features::heap::ObjId;
use crate::ir::{CallSiteId, FieldId, MethodId, VarId};
use crate::shared::{Indexer, MapIndexer};

use super::element::{
    CSCallSite, CSCallSiteId, CSMethod, CSMethodId, CSObj, CSObjId, Pointer, PointerId,
};

#[derive(Debug, Default)]
pub struct CSManager {
    cs_objs: MapIndexer<CSObj>,
    pointers: MapIndexer<Pointer>,
    cs_call_sites: MapIndexer<CSCallSite>,
    cs_methods: MapIndexer<CSMethod>,
}

impl CSManager {
    pub fn new() -> Self {
        Self::default()
    }

    // ────────────────────────────────────────────────────────────────────
    // CS objects
    // ────────────────────────────────────────────────────────────────────

    pub fn get_cs_obj(&mut self, ctx: ContextId, obj: ObjId) -> CSObjId {
        self.cs_objs.get_index(&CSObj { ctx, obj })
    }

    pub fn cs_obj(&self, id: CSObjId) -> CSObj {
        *self.cs_objs.object_of(id)
    }

    pub fn cs_objs_len(&self) -> usize {
        self.cs_objs.len()
    }

    // ────────────────────────────────────────────────────────────────────
    // Pointers
    // ────────────────────────────────────────────────────────────────────

    pub fn get_var_ptr(&mut self, ctx: ContextId, var: VarId) -> PointerId {
        self.pointers.get_index(&Pointer::Var { ctx, var })
    }

    pub fn get_static_field_ptr(&mut self, field: FieldId) -> PointerId {
        self.pointers.get_index(&Pointer::StaticField { field })
    }

    pub fn get_instance_field_ptr(&mut self, base: CSObjId, field: FieldId) -> PointerId {
        self.pointers
            .get_index(&Pointer::InstanceField { base, field })
    }

    pub fn get_array_index_ptr(&mut self, base: CSObjId) -> PointerId {
        self.pointers.get_index(&Pointer::ArrayIndex { base })
    }

    pub fn pointer(&self, id: PointerId) -> Pointer {
        *self.pointers.object_of(id)
    }

    pub fn pointers_len(&self) -> usize {
        self.pointers.len()
    }

    /// All interned pointers in id order.
    pub fn iter_pointers(&self) -> impl Iterator<Item = (PointerId, Pointer)> + '_ {
        self.pointers
            .iter()
            .enumerate()
            .map(|(i, p)| (i as PointerId, *p))
    }

    // ────────────────────────────────────────────────────────────────────
    // CS call sites / methods
    // ────────────────────────────────────────────────────────────────────

    pub fn get_cs_call_site(&mut self, ctx: ContextId, site: CallSiteId) -> CSCallSiteId {
        self.cs_call_sites.get_index(&CSCallSite { ctx, site })
    }

    pub fn cs_call_site(&self, id: CSCallSiteId) -> CSCallSite {
        *self.cs_call_sites.object_of(id)
    }

    pub fn get_cs_method(&mut self, ctx: ContextId, method: MethodId) -> CSMethodId {
        self.cs_methods.get_index(&CSMethod { ctx, method })
    }

    pub fn cs_method(&self, id: CSMethodId) -> CSMethod {
        *self.cs_methods.object_of(id)
    }

    pub fn cs_methods_len(&self) -> usize {
        self.cs_methods.len()
    }
}
