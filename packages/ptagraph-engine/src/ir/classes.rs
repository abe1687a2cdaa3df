//! Classes, Fields, Methods
//!
//! Dense-id tables for the class hierarchy the engine consumes. The tables
//! are immutable after [`crate::ir::ProgramBuilder::build`]; method
//! resolution and subtype queries over them live on [`crate::ir::Program`].

use super::types::TypeId;

pub type ClassId = u32;
pub type FieldId = u32;
pub type MethodId = u32;
pub type SubsigId = u32;
pub type VarId = u32;

/// Well-known class names the engine recognizes.
pub mod names {
    pub const OBJECT: &str = "java.lang.Object";
    pub const STRING: &str = "java.lang.String";
    pub const CLASS: &str = "java.lang.Class";
    pub const METHOD_TYPE: &str = "java.lang.invoke.MethodType";
    pub const REFLECT_METHOD: &str = "java.lang.reflect.Method";
    pub const STRING_BUILDER: &str = "java.lang.StringBuilder";
    pub const STRING_BUFFER: &str = "java.lang.StringBuffer";
    pub const THROWABLE: &str = "java.lang.Throwable";

    pub const CLINIT: &str = "<clinit>";
    pub const INIT: &str = "<init>";
}

#[derive(Debug, Clone)]
pub struct ClassData {
    pub name: String,
    pub ty: TypeId,
    pub superclass: Option<ClassId>,
    pub interfaces: Vec<ClassId>,
    pub is_interface: bool,
    /// Application classes (vs. library); `only-app` restricts reachability
    /// to these.
    pub is_application: bool,
    pub fields: Vec<FieldId>,
    /// Declared methods keyed by subsignature, in declaration order.
    pub methods: Vec<(SubsigId, MethodId)>,
    pub clinit: Option<MethodId>,
}

impl ClassData {
    pub fn declared_method(&self, subsig: SubsigId) -> Option<MethodId> {
        self.methods
            .iter()
            .find(|(s, _)| *s == subsig)
            .map(|(_, m)| *m)
    }
}

#[derive(Debug, Clone)]
pub struct FieldData {
    pub class: ClassId,
    pub name: String,
    pub ty: TypeId,
    pub is_static: bool,
}

/// Method subsignature: name + parameter types + return type, interned.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subsignature {
    pub name: String,
    pub params: Vec<TypeId>,
    pub ret: TypeId,
}

#[derive(Debug, Clone)]
pub struct MethodData {
    pub class: ClassId,
    pub subsig: SubsigId,
    pub is_static: bool,
    pub is_abstract: bool,
    /// Parameter variables, in order.
    pub params: Vec<VarId>,
    /// Receiver variable; `None` for static methods.
    pub this_var: Option<VarId>,
    /// Variables returned by `Return` statements of the body.
    pub ret_vars: Vec<VarId>,
    pub body: Option<Vec<super::stmt::Stmt>>,
}

#[derive(Debug, Clone)]
pub struct VarData {
    pub method: MethodId,
    pub name: String,
    pub ty: TypeId,
}
