//! Analysis Result
//!
//! Read-only view over everything the solver computed: pointers and their
//! points-to sets, the context-sensitive call graph and its
//! context-insensitive projection, and named sub-results deposited by
//! plug-ins (`"Taint"` yields the detected taint flows).

mod render;

pub use render::Render;

use std::any::Any;

use rustc_hash::FxHashMap;

use crate::features::callgraph::{CallGraph, CSCallGraph};
use crate::features::context::ContextManager;
use crate::features::cs::{CSManager, Pointer, PointerId, PointsToSet};
use crate::features::heap::{HeapModel, ObjId};
use crate::features::pfg::PointerFlowGraph;
use crate::features::solver::SolverStats;
use crate::ir::{MethodId, Program, VarId};

pub struct PointerAnalysisResult {
    heap: HeapModel,
    ctxs: ContextManager,
    csm: CSManager,
    pfg: PointerFlowGraph,
    cs_call_graph: CSCallGraph,
    call_graph: CallGraph,
    named: FxHashMap<String, Box<dyn Any>>,
    stats: SolverStats,
    empty_pts: PointsToSet,
}

impl std::fmt::Debug for PointerAnalysisResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointerAnalysisResult")
            .field("heap", &self.heap)
            .field("ctxs", &self.ctxs)
            .field("csm", &self.csm)
            .field("pfg", &self.pfg)
            .field("cs_call_graph", &self.cs_call_graph)
            .field("call_graph", &self.call_graph)
            .field("named_keys", &self.named.keys().collect::<Vec<_>>())
            .field("stats", &self.stats)
            .field("empty_pts", &self.empty_pts)
            .finish()
    }
}

impl PointerAnalysisResult {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        heap: HeapModel,
        ctxs: ContextManager,
        csm: CSManager,
        pfg: PointerFlowGraph,
        cs_call_graph: CSCallGraph,
        call_graph: CallGraph,
        named: FxHashMap<String, Box<dyn Any>>,
        stats: SolverStats,
    ) -> Self {
        Self {
            heap,
            ctxs,
            csm,
            pfg,
            cs_call_graph,
            call_graph,
            named,
            stats,
            empty_pts: PointsToSet::new(),
        }
    }

    pub fn heap(&self) -> &HeapModel {
        &self.heap
    }

    pub fn csm(&self) -> &CSManager {
        &self.csm
    }

    pub fn cs_call_graph(&self) -> &CSCallGraph {
        &self.cs_call_graph
    }

    /// Context-insensitive projection of the call graph.
    pub fn call_graph(&self) -> &CallGraph {
        &self.call_graph
    }

    pub fn stats(&self) -> &SolverStats {
        &self.stats
    }

    pub fn pfg(&self) -> &PointerFlowGraph {
        &self.pfg
    }

    pub fn render<'a>(&'a self, program: &'a Program) -> Render<'a> {
        Render {
            program,
            heap: &self.heap,
            ctxs: &self.ctxs,
            csm: &self.csm,
            pfg: &self.pfg,
        }
    }

    pub fn pts_of(&self, pointer: PointerId) -> &PointsToSet {
        self.pfg.pts(pointer).unwrap_or(&self.empty_pts)
    }

    fn pointers_matching(&self, pred: impl Fn(&Pointer) -> bool) -> Vec<PointerId> {
        self.csm
            .iter_pointers()
            .filter(|(_, p)| pred(p))
            .map(|(id, _)| id)
            .collect()
    }

    /// All context-qualified variable pointers, in id order.
    pub fn cs_var_pointers(&self) -> Vec<PointerId> {
        self.pointers_matching(|p| matches!(p, Pointer::Var { .. }))
    }

    pub fn static_field_pointers(&self) -> Vec<PointerId> {
        self.pointers_matching(|p| matches!(p, Pointer::StaticField { .. }))
    }

    pub fn instance_field_pointers(&self) -> Vec<PointerId> {
        self.pointers_matching(|p| matches!(p, Pointer::InstanceField { .. }))
    }

    pub fn array_index_pointers(&self) -> Vec<PointerId> {
        self.pointers_matching(|p| matches!(p, Pointer::ArrayIndex { .. }))
    }

    /// Distinct variables that have at least one context-qualified pointer,
    /// in variable-id order.
    pub fn vars(&self) -> Vec<VarId> {
        let mut vars: Vec<VarId> = self
            .csm
            .iter_pointers()
            .filter_map(|(_, p)| p.as_var().map(|(_, v)| v))
            .collect();
        vars.sort_unstable();
        vars.dedup();
        vars
    }

    /// Context-collapsed points-to set of a variable, in object-id order.
    pub fn points_to_of_var(&self, var: VarId) -> Vec<ObjId> {
        let mut objs: Vec<ObjId> = self
            .csm
            .iter_pointers()
            .filter(|(_, p)| matches!(p, Pointer::Var { var: v, .. } if *v == var))
            .flat_map(|(id, _)| self.pts_of(id).iter().collect::<Vec<_>>())
            .map(|cs_obj| self.csm.cs_obj(cs_obj).obj)
            .collect();
        objs.sort_unstable();
        objs.dedup();
        objs
    }

    /// Reachable methods of the context-insensitive call graph, in
    /// discovery order.
    pub fn reachable_methods(&self) -> &[MethodId] {
        self.call_graph.methods()
    }

    /// A named sub-result deposited by a plug-in.
    pub fn named_result<T: 'static>(&self, key: &str) -> Option<&T> {
        self.named.get(key).and_then(|v| v.downcast_ref())
    }

    /// Keys of all named sub-results, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.named.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn ctxs(&self) -> &ContextManager {
        &self.ctxs
    }
}
