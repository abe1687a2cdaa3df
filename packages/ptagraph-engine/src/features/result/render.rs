//! Textual forms of analysis elements.
//!
//! One fixed rendering used by dumps, comparison mode and logs. The
//! ` -> ` separator of the dump format must never appear inside these
//! strings.

use crate::features::context::{ContextElem, ContextId, ContextManager};
use crate::features::cs::{CSManager, CSMethodId, CSObjId, Pointer, PointerId, PointsToSet};
use crate::features::heap::{HeapModel, ObjId, ObjKind};
use crate::features::pfg::PointerFlowGraph;
use crate::ir::Program;

#[derive(Clone, Copy)]
pub struct Render<'a> {
    pub program: &'a Program,
    pub heap: &'a HeapModel,
    pub ctxs: &'a ContextManager,
    pub csm: &'a CSManager,
    pub pfg: &'a PointerFlowGraph,
}

impl Render<'_> {
    pub fn context(&self, ctx: ContextId) -> String {
        let elems = self.ctxs.elements(ctx);
        if elems.is_empty() {
            return "[]".to_string();
        }
        let parts: Vec<String> = elems
            .iter()
            .map(|elem| match *elem {
                ContextElem::CallSite(site) => self.program.call_site_string(site),
                ContextElem::Obj(obj) => self.obj(obj),
                ContextElem::Type(ty) => self.program.types.name(ty).to_string(),
            })
            .collect();
        format!("[{}]", parts.join(","))
    }

    pub fn obj(&self, obj: ObjId) -> String {
        let data = self.heap.obj(obj);
        let ty = self.program.types.name(data.ty);
        match &data.kind {
            ObjKind::Alloc { site } => {
                format!("new {} in {}", ty, self.program.alloc_site_string(*site))
            }
            ObjKind::Merged => format!("merged {}", ty),
            ObjKind::StringConst { value } => format!("\"{}\"", value),
            ObjKind::ClassLiteral { referent } => {
                format!("class {}", self.program.types.name(*referent))
            }
            ObjKind::MethodType { desc } => {
                let params: Vec<&str> = desc
                    .params
                    .iter()
                    .map(|&p| self.program.types.name(p))
                    .collect();
                format!("({}){}", params.join(","), self.program.types.name(desc.ret))
            }
            ObjKind::Reflective { site } => {
                format!("reflective new {} at {}", ty, self.program.call_site_string(*site))
            }
            ObjKind::Taint { source } => {
                format!("taint[{}]", self.program.call_site_string(*source))
            }
        }
    }

    pub fn cs_obj(&self, id: CSObjId) -> String {
        let cs_obj = self.csm.cs_obj(id);
        format!("{}:{}", self.context(cs_obj.ctx), self.obj(cs_obj.obj))
    }

    pub fn pointer(&self, id: PointerId) -> String {
        match self.csm.pointer(id) {
            Pointer::Var { ctx, var } => {
                let data = self.program.var(var);
                format!(
                    "{}:{}/{}",
                    self.context(ctx),
                    self.program.method_signature(data.method),
                    data.name
                )
            }
            Pointer::StaticField { field } => self.program.field_signature(field),
            Pointer::InstanceField { base, field } => {
                format!("{}.{}", self.cs_obj(base), self.program.field(field).name)
            }
            Pointer::ArrayIndex { base } => format!("{}[*]", self.cs_obj(base)),
        }
    }

    pub fn cs_method(&self, id: CSMethodId) -> String {
        let m = self.csm.cs_method(id);
        format!(
            "{}:{}",
            self.context(m.ctx),
            self.program.method_signature(m.method)
        )
    }

    /// `[obj1,obj2,...]` in index order.
    pub fn pts(&self, pts: &PointsToSet) -> String {
        let objs: Vec<String> = pts.iter().map(|o| self.cs_obj(o)).collect();
        format!("[{}]", objs.join(","))
    }

    pub fn pts_of(&self, pointer: PointerId) -> String {
        match self.pfg.pts(pointer) {
            Some(pts) => self.pts(pts),
            None => "[]".to_string(),
        }
    }
}
