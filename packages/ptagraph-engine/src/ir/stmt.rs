//! Three-Address Statements
//!
//! The statement union the solver translates. One variant per pointer-
//! relevant operation; arithmetic and control flow never reach the engine
//! (the IR front end lowers them away before hand-off).

use super::classes::{ClassId, FieldId, SubsigId, VarId};
use super::types::TypeId;

/// Global id of an allocation site (a `New` statement).
pub type SiteId = u32;
/// Global id of a call site (an `Invoke` statement).
pub type CallSiteId = u32;

/// Unresolved method reference: declared owner + subsignature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodRef {
    pub owner: ClassId,
    pub subsig: SubsigId,
}

/// How an invoke dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvokeKind {
    Static,
    Virtual,
    Interface,
    /// Constructor, private, or super call; bypasses override resolution.
    Special,
    /// `invokedynamic`; resolved by the invokedynamic plugin via the
    /// bootstrap target handle.
    Dynamic,
}

#[derive(Debug, Clone)]
pub struct Invoke {
    pub kind: InvokeKind,
    pub method_ref: MethodRef,
    pub recv: Option<VarId>,
    pub args: Vec<VarId>,
    pub result: Option<VarId>,
    pub site: CallSiteId,
    /// Bootstrap target handle for `Dynamic` invokes.
    pub handle: Option<MethodRef>,
}

#[derive(Debug, Clone)]
pub enum AllocKind {
    Object {
        ty: TypeId,
    },
    /// `new T[l1][l2]...`; `ty` is the (outermost) array type and `lengths`
    /// the dimension lengths present in the source, `None` when unknown.
    /// A length of zero is a perfectly valid allocation and must not be
    /// short-circuited.
    Array {
        ty: TypeId,
        lengths: Vec<Option<u64>>,
    },
}

impl AllocKind {
    pub fn ty(&self) -> TypeId {
        match self {
            AllocKind::Object { ty } | AllocKind::Array { ty, .. } => *ty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    /// String constant; folded to one shared object per value.
    Str(String),
    /// Class literal `T.class`; folded to one shared object per type.
    Class(TypeId),
    /// Numeric constant; primitives carry no pointer information.
    Int(i64),
}

#[derive(Debug, Clone)]
pub enum Stmt {
    New {
        lhs: VarId,
        alloc: AllocKind,
        site: SiteId,
    },
    AssignLiteral {
        lhs: VarId,
        literal: Literal,
    },
    Copy {
        lhs: VarId,
        rhs: VarId,
    },
    Cast {
        lhs: VarId,
        rhs: VarId,
        ty: TypeId,
    },
    LoadStatic {
        lhs: VarId,
        field: FieldId,
    },
    StoreStatic {
        field: FieldId,
        rhs: VarId,
    },
    LoadField {
        lhs: VarId,
        base: VarId,
        field: FieldId,
    },
    StoreField {
        base: VarId,
        field: FieldId,
        rhs: VarId,
    },
    LoadArray {
        lhs: VarId,
        base: VarId,
    },
    StoreArray {
        base: VarId,
        rhs: VarId,
    },
    Invoke(Invoke),
    Return {
        value: Option<VarId>,
    },
}

impl Stmt {
    pub fn as_invoke(&self) -> Option<&Invoke> {
        match self {
            Stmt::Invoke(invoke) => Some(invoke),
            _ => None,
        }
    }
}
