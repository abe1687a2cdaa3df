//! Heap model: interning of abstract objects.
//!
//! Deterministic and idempotent: equal keys always yield the same `ObjId`.
//! Merge policies trade precision for size by collapsing designated
//! allocations into per-type summary objects.

use rustc_hash::FxHashMap;

use crate::config::AnalysisOptions;
use crate::ir::{names, CallSiteId, Program, SiteId, TypeId};

use super::{MethodTypeDesc, ObjData, ObjId, ObjKind};

#[derive(Debug)]
pub struct HeapModel {
    objs: Vec<ObjData>,
    interned: FxHashMap<ObjData, ObjId>,
    merge_string_objects: bool,
    merge_string_builders: bool,
    merge_exception_objects: bool,
}

impl HeapModel {
    pub fn new(options: &AnalysisOptions) -> Self {
        Self {
            objs: Vec::new(),
            interned: FxHashMap::default(),
            merge_string_objects: options.merge_string_objects,
            merge_string_builders: options.merge_string_builders,
            merge_exception_objects: options.merge_exception_objects,
        }
    }

    pub fn obj(&self, id: ObjId) -> &ObjData {
        &self.objs[id as usize]
    }

    pub fn len(&self) -> usize {
        self.objs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjId, &ObjData)> {
        self.objs.iter().enumerate().map(|(i, o)| (i as ObjId, o))
    }

    fn intern(&mut self, data: ObjData) -> ObjId {
        if let Some(&id) = self.interned.get(&data) {
            return id;
        }
        let id = self.objs.len() as ObjId;
        self.objs.push(data.clone());
        self.interned.insert(data, id);
        id
    }

    /// Object for a `New` statement. Subject to the merge policies.
    pub fn alloc_obj(&mut self, program: &Program, site: SiteId, ty: TypeId) -> ObjId {
        if self.should_merge(program, ty) {
            return self.intern(ObjData {
                kind: ObjKind::Merged,
                ty,
            });
        }
        self.intern(ObjData {
            kind: ObjKind::Alloc { site },
            ty,
        })
    }

    fn should_merge(&self, program: &Program, ty: TypeId) -> bool {
        let Some(class) = program.types.class_of(ty) else {
            return false;
        };
        if self.merge_string_builders {
            let name = &program.class(class).name;
            if name == names::STRING_BUILDER || name == names::STRING_BUFFER {
                return true;
            }
        }
        if self.merge_exception_objects {
            if let Some(throwable) = program.class_by_name(names::THROWABLE) {
                if program.is_subclass_of(class, throwable) {
                    return true;
                }
            }
        }
        false
    }

    /// One object per string constant value (or one merged string object).
    pub fn string_const_obj(&mut self, program: &Program, value: &str) -> Option<ObjId> {
        let ty = program.types.by_name(names::STRING)?;
        if self.merge_string_objects {
            return Some(self.intern(ObjData {
                kind: ObjKind::Merged,
                ty,
            }));
        }
        Some(self.intern(ObjData {
            kind: ObjKind::StringConst {
                value: value.to_string(),
            },
            ty,
        }))
    }

    /// One object per referenced type.
    pub fn class_literal_obj(&mut self, program: &Program, referent: TypeId) -> Option<ObjId> {
        let ty = program.types.by_name(names::CLASS)?;
        Some(self.intern(ObjData {
            kind: ObjKind::ClassLiteral { referent },
            ty,
        }))
    }

    /// One object per `(returnType, paramTypes)` tuple.
    pub fn method_type_obj(&mut self, program: &Program, desc: MethodTypeDesc) -> Option<ObjId> {
        let ty = program.types.by_name(names::METHOD_TYPE)?;
        Some(self.intern(ObjData {
            kind: ObjKind::MethodType { desc },
            ty,
        }))
    }

    /// Mock object for a reflective instantiation.
    pub fn reflective_obj(&mut self, site: CallSiteId, ty: TypeId) -> ObjId {
        self.intern(ObjData {
            kind: ObjKind::Reflective { site },
            ty,
        })
    }

    /// Mock object carrying taint from a source call.
    pub fn taint_obj(&mut self, source: CallSiteId, ty: TypeId) -> ObjId {
        self.intern(ObjData {
            kind: ObjKind::Taint { source },
            ty,
        })
    }
}
