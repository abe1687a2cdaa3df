//! Context-qualified elements.
//!
//! Plain value types; identity comes from interning in the
//! [`super::CSManager`]. Pointers form a discriminated union rather than a
//! class hierarchy; the `kind` is the variant.

use crate::features::context::ContextId;
use crate::features::heap::ObjId;
use crate::ir::{CallSiteId, FieldId, MethodId, VarId};

/// Dense id of an interned context-qualified object.
pub type CSObjId = u32;
/// Dense id of an interned pointer.
pub type PointerId = u32;
/// Dense id of an interned context-qualified call site.
pub type CSCallSiteId = u32;
/// Dense id of an interned context-qualified method.
pub type CSMethodId = u32;

/// Context-qualified abstract object: `(heapContext, Obj)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CSObj {
    pub ctx: ContextId,
    pub obj: ObjId,
}

/// A source or sink of pointer flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pointer {
    /// Local variable under a context.
    Var { ctx: ContextId, var: VarId },
    /// Static field; context-free.
    StaticField { field: FieldId },
    /// Instance field of a context-qualified object.
    InstanceField { base: CSObjId, field: FieldId },
    /// Array contents of a context-qualified object. Keyed by the array
    /// object alone; length is not part of the identity.
    ArrayIndex { base: CSObjId },
}

impl Pointer {
    pub fn as_var(&self) -> Option<(ContextId, VarId)> {
        match *self {
            Pointer::Var { ctx, var } => Some((ctx, var)),
            _ => None,
        }
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Pointer::Var { .. })
    }
}

/// Context-qualified call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CSCallSite {
    pub ctx: ContextId,
    pub site: CallSiteId,
}

/// Context-qualified method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CSMethod {
    pub ctx: ContextId,
    pub method: MethodId,
}
