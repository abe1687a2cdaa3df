//! Intermediate representation consumed by the engine.
//!
//! The IR is a per-method sequence of three-address statements over a class
//! hierarchy; construction from class files is an external concern. The
//! [`ProgramBuilder`] is both the front-end hand-off and the test fixture
//! API.

pub mod classes;
pub mod program;
pub mod stmt;
pub mod types;

pub use classes::{
    names, ClassData, ClassId, FieldData, FieldId, MethodData, MethodId, SubsigId, Subsignature,
    VarData, VarId,
};
pub use program::{BodyBuilder, Program, ProgramBuilder};
pub use stmt::{AllocKind, CallSiteId, Invoke, InvokeKind, Literal, MethodRef, SiteId, Stmt};
pub use types::{TypeData, TypeId, TypeKind, TypeStore};
