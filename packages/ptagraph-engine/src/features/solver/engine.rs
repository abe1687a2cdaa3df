//! The solver core and its driving loop.
//!
//! `SolverCore` owns every analysis structure (heap model, contexts, CS
//! elements, pointer-flow graph, call graph, worklist) for the duration of
//! the run; plug-ins receive `&mut SolverCore` and mutate only through its
//! APIs, which keep the worklist discipline intact. `Solver` adds the
//! plug-in registry on top and drives the fixed point.
//!
//! Per-pop order: (1) add delta, (2) propagate along out-edges, (3) derive
//! field/array/call work from variable deltas, (4) notify plug-ins.
//! Call-graph events raised inside (3) or by plug-in callbacks are drained
//! after (4), so plug-in side effects become visible on the next iteration.

use std::any::Any;
use std::collections::VecDeque;
use std::time::Instant;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info, warn};

use crate::config::AnalysisOptions;
use crate::errors::{AnalysisError, Result};
use crate::features::callgraph::{CallEdge, CallGraph, CallKind, CSCallGraph};
use crate::features::context::{ContextId, ContextManager, ContextSelector, RecvInfo};
use crate::features::cs::{CSManager, CSMethodId, CSObjId, Pointer, PointerId, PointsToSet};
use crate::features::heap::HeapModel;
use crate::features::pfg::{FlowEdge, FlowKind, PointerFlowGraph};
use crate::features::plugins::{
    default_plugins, validate_plugin_descriptors, Plugin, ResultProcessor,
};
use crate::features::result::{PointerAnalysisResult, Render};
use crate::ir::{
    AllocKind, CallSiteId, ClassId, FieldId, Invoke, InvokeKind, Literal, MethodId, Program,
    SiteId, Stmt, TypeId, VarId,
};

use super::{CancellationToken, SolverStats};

/// Deferred statement work for one method, indexed by base/receiver
/// variable. Built once per method, shared across contexts.
#[derive(Debug, Default)]
struct StmtIndex {
    field_loads: FxHashMap<VarId, Vec<(VarId, FieldId)>>,
    field_stores: FxHashMap<VarId, Vec<(FieldId, VarId)>>,
    array_loads: FxHashMap<VarId, Vec<VarId>>,
    array_stores: FxHashMap<VarId, Vec<VarId>>,
    recv_invokes: FxHashMap<VarId, Vec<Invoke>>,
}

/// Lifecycle events delivered to plug-ins between iterations.
#[derive(Debug, Clone, Copy)]
enum Event {
    NewMethod(CSMethodId),
    NewCallEdge(CallEdge),
}

pub struct SolverCore<'p> {
    program: &'p Program,
    options: AnalysisOptions,
    heap: HeapModel,
    ctxs: ContextManager,
    selector: ContextSelector,
    csm: CSManager,
    pfg: PointerFlowGraph,
    cg: CSCallGraph,
    worklist: VecDeque<(PointerId, PointsToSet)>,
    events: VecDeque<Event>,
    initialized_classes: FxHashSet<ClassId>,
    stmt_indexes: FxHashMap<MethodId, StmtIndex>,
    body_warned: FxHashSet<MethodId>,
    named_results: FxHashMap<String, Box<dyn Any>>,
    cancel: CancellationToken,
    stats: SolverStats,
    empty_pts: PointsToSet,
}

impl<'p> SolverCore<'p> {
    fn new(program: &'p Program, options: AnalysisOptions) -> Self {
        let cancel = CancellationToken::new(options.time_limit);
        let heap = HeapModel::new(&options);
        let selector = ContextSelector::new(options.cs);
        Self {
            program,
            options,
            heap,
            ctxs: ContextManager::new(),
            selector,
            csm: CSManager::new(),
            pfg: PointerFlowGraph::new(),
            cg: CSCallGraph::new(),
            worklist: VecDeque::new(),
            events: VecDeque::new(),
            initialized_classes: FxHashSet::default(),
            stmt_indexes: FxHashMap::default(),
            body_warned: FxHashSet::default(),
            named_results: FxHashMap::default(),
            cancel,
            stats: SolverStats::default(),
            empty_pts: PointsToSet::new(),
        }
    }

    // ────────────────────────────────────────────────────────────────────
    // Read access
    // ────────────────────────────────────────────────────────────────────

    pub fn program(&self) -> &'p Program {
        self.program
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    pub fn heap(&self) -> &HeapModel {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut HeapModel {
        &mut self.heap
    }

    pub fn ctxs(&self) -> &ContextManager {
        &self.ctxs
    }

    pub fn selector(&self) -> ContextSelector {
        self.selector
    }

    /// Select a callee context through the configured policy (plug-in
    /// entry point for synthesized calls).
    pub fn select_call_context(
        &mut self,
        caller_ctx: ContextId,
        site: CallSiteId,
        recv: Option<RecvInfo>,
    ) -> ContextId {
        self.selector
            .select_call(&mut self.ctxs, caller_ctx, site, recv)
    }

    pub fn csm(&self) -> &CSManager {
        &self.csm
    }

    pub fn csm_mut(&mut self) -> &mut CSManager {
        &mut self.csm
    }

    pub fn pfg(&self) -> &PointerFlowGraph {
        &self.pfg
    }

    pub fn call_graph(&self) -> &CSCallGraph {
        &self.cg
    }

    pub fn stats(&self) -> &SolverStats {
        &self.stats
    }

    pub fn pts_of(&self, pointer: PointerId) -> &PointsToSet {
        self.pfg.pts(pointer).unwrap_or(&self.empty_pts)
    }

    pub fn render(&self) -> Render<'_> {
        Render {
            program: self.program,
            heap: &self.heap,
            ctxs: &self.ctxs,
            csm: &self.csm,
            pfg: &self.pfg,
        }
    }

    /// Deposit a named sub-result (e.g. `"Taint"`).
    pub fn store_named_result(&mut self, key: &str, value: Box<dyn Any>) {
        self.named_results.insert(key.to_string(), value);
    }

    pub fn named_result<T: 'static>(&self, key: &str) -> Option<&T> {
        self.named_results.get(key).and_then(|v| v.downcast_ref())
    }

    // ────────────────────────────────────────────────────────────────────
    // Mutation APIs (worklist discipline)
    // ────────────────────────────────────────────────────────────────────

    /// Schedule objects for a pointer.
    pub fn add_points_to(&mut self, pointer: PointerId, pts: PointsToSet) {
        if !pts.is_empty() {
            self.worklist.push_back((pointer, pts));
        }
    }

    /// Schedule objects for a context-qualified variable.
    pub fn add_var_points_to(&mut self, ctx: ContextId, var: VarId, pts: PointsToSet) {
        let pointer = self.csm.get_var_ptr(ctx, var);
        self.add_points_to(pointer, pts);
    }

    /// Add a pointer-flow edge; retroactively propagates the source's
    /// current set (filtered) into the target. Duplicates are no-ops.
    pub fn add_pfg_edge(
        &mut self,
        src: PointerId,
        dst: PointerId,
        kind: FlowKind,
        filter: Option<TypeId>,
    ) {
        let edge = FlowEdge {
            kind,
            target: dst,
            filter,
        };
        if !self.pfg.add_edge(src, edge) {
            return;
        }
        let snapshot = match self.pfg.pts(src) {
            Some(pts) if !pts.is_empty() => pts.clone(),
            _ => return,
        };
        let filtered = self.filtered(&snapshot, filter);
        self.add_points_to(dst, filtered);
    }

    /// Record a call edge; on first sight links arguments and returns
    /// (except for `Other` edges, whose creator wires them) and makes the
    /// callee reachable.
    pub fn add_call_edge(&mut self, edge: CallEdge) {
        if !self.cg.add_edge(edge) {
            return;
        }
        self.events.push_back(Event::NewCallEdge(edge));
        if edge.kind != CallKind::Other {
            self.link_call(edge);
        }
        self.mark_reachable(edge.callee);
    }

    /// Make a CS method reachable and translate its statements (first time
    /// only).
    pub fn mark_reachable(&mut self, cs_method: CSMethodId) {
        if !self.cg.add_reachable(cs_method) {
            return;
        }
        self.events.push_back(Event::NewMethod(cs_method));
        let target = self.csm.cs_method(cs_method);
        let data = self.program.method(target.method);
        if data.body.is_none() {
            if self.body_warned.insert(target.method) {
                warn!(
                    method = %self.program.method_signature(target.method),
                    "method has no IR; treated as an empty body"
                );
            }
            return;
        }
        if self.options.only_app && !self.program.class(data.class).is_application {
            if self.body_warned.insert(target.method) {
                debug!(
                    method = %self.program.method_signature(target.method),
                    "skipping non-application method body (only-app)"
                );
            }
            return;
        }
        let program = self.program;
        self.stmt_indexes
            .entry(target.method)
            .or_insert_with(|| Self::build_stmt_index(program, target.method));
        self.process_stmts(target.ctx, target.method);
    }

    /// Trigger `<clinit>` of `class` (and its ancestors) once: on
    /// instantiation, static member access, or static invocation.
    pub fn initialize_class(&mut self, class: ClassId) {
        if !self.initialized_classes.insert(class) {
            return;
        }
        if let Some(sup) = self.program.class(class).superclass {
            self.initialize_class(sup);
        }
        if let Some(clinit) = self.program.class(class).clinit {
            let empty = self.ctxs.empty();
            let cs = self.csm.get_cs_method(empty, clinit);
            self.mark_reachable(cs);
        }
    }

    // ────────────────────────────────────────────────────────────────────
    // Internals
    // ────────────────────────────────────────────────────────────────────

    fn build_stmt_index(program: &Program, method: MethodId) -> StmtIndex {
        let mut index = StmtIndex::default();
        let body = program.method(method).body.as_deref().unwrap_or(&[]);
        for stmt in body {
            match stmt {
                Stmt::LoadField { lhs, base, field } => {
                    index.field_loads.entry(*base).or_default().push((*lhs, *field));
                }
                Stmt::StoreField { base, field, rhs } => {
                    index.field_stores.entry(*base).or_default().push((*field, *rhs));
                }
                Stmt::LoadArray { lhs, base } => {
                    index.array_loads.entry(*base).or_default().push(*lhs);
                }
                Stmt::StoreArray { base, rhs } => {
                    index.array_stores.entry(*base).or_default().push(*rhs);
                }
                Stmt::Invoke(invoke) => {
                    if let Some(recv) = invoke.recv {
                        if invoke.kind != InvokeKind::Static {
                            index
                                .recv_invokes
                                .entry(recv)
                                .or_default()
                                .push(invoke.clone());
                        }
                    }
                }
                _ => {}
            }
        }
        index
    }

    /// Translate the statements of a newly reachable method under `ctx`.
    fn process_stmts(&mut self, ctx: ContextId, method: MethodId) {
        let program = self.program;
        let body = match program.method(method).body.as_ref() {
            Some(body) => body,
            None => return,
        };
        for stmt in body {
            match stmt {
                Stmt::New { lhs, alloc, site } => {
                    self.process_new(ctx, *lhs, alloc, *site);
                }
                Stmt::AssignLiteral { lhs, literal } => {
                    self.process_literal(ctx, *lhs, literal);
                }
                Stmt::Copy { lhs, rhs } => {
                    let src = self.csm.get_var_ptr(ctx, *rhs);
                    let dst = self.csm.get_var_ptr(ctx, *lhs);
                    let filter = Some(program.var(*lhs).ty);
                    self.add_pfg_edge(src, dst, FlowKind::LocalAssign, filter);
                }
                Stmt::Cast { lhs, rhs, ty } => {
                    let src = self.csm.get_var_ptr(ctx, *rhs);
                    let dst = self.csm.get_var_ptr(ctx, *lhs);
                    self.add_pfg_edge(src, dst, FlowKind::Cast, Some(*ty));
                }
                Stmt::LoadStatic { lhs, field } => {
                    self.initialize_class(program.field(*field).class);
                    let src = self.csm.get_static_field_ptr(*field);
                    let dst = self.csm.get_var_ptr(ctx, *lhs);
                    self.add_pfg_edge(src, dst, FlowKind::StaticLoad, None);
                }
                Stmt::StoreStatic { field, rhs } => {
                    self.initialize_class(program.field(*field).class);
                    let src = self.csm.get_var_ptr(ctx, *rhs);
                    let dst = self.csm.get_static_field_ptr(*field);
                    let filter = Some(program.field(*field).ty);
                    self.add_pfg_edge(src, dst, FlowKind::StaticStore, filter);
                }
                // Deferred until the base variable's points-to set grows.
                Stmt::LoadField { .. }
                | Stmt::StoreField { .. }
                | Stmt::LoadArray { .. }
                | Stmt::StoreArray { .. } => {}
                Stmt::Invoke(invoke) => {
                    if invoke.kind == InvokeKind::Static {
                        self.process_static_call(ctx, invoke);
                    }
                    // Instance calls dispatch on the receiver's objects;
                    // dynamic invokes belong to the invokedynamic plugin.
                }
                Stmt::Return { .. } => {}
            }
        }
    }

    fn process_new(&mut self, ctx: ContextId, lhs: VarId, alloc: &AllocKind, site: SiteId) {
        let program = self.program;
        let ty = alloc.ty();
        let obj = self.heap.alloc_obj(program, site, ty);
        let hctx = self.selector.select_heap(&mut self.ctxs, ctx);
        let cs_obj = self.csm.get_cs_obj(hctx, obj);
        let lhs_ptr = self.csm.get_var_ptr(ctx, lhs);
        self.add_points_to(lhs_ptr, PointsToSet::singleton(cs_obj));

        match alloc {
            AllocKind::Object { ty } => {
                if let Some(class) = program.types.class_of(*ty) {
                    self.initialize_class(class);
                }
            }
            AllocKind::Array { ty, lengths } => {
                // Chain inner allocations of a multi-dimensional array
                // through the array-index pointers. Zero lengths still
                // yield live array-index pointers.
                let mut outer = cs_obj;
                let mut current_ty = *ty;
                for _ in 1..lengths.len() {
                    let Some(elem_ty) = program.types.element_of(current_ty) else {
                        break;
                    };
                    if !program.types.is_array(elem_ty) {
                        break;
                    }
                    let inner_obj = self.heap.alloc_obj(program, site, elem_ty);
                    let inner = self.csm.get_cs_obj(hctx, inner_obj);
                    let arr_ptr = self.csm.get_array_index_ptr(outer);
                    self.add_points_to(arr_ptr, PointsToSet::singleton(inner));
                    outer = inner;
                    current_ty = elem_ty;
                }
            }
        }
    }

    fn process_literal(&mut self, ctx: ContextId, lhs: VarId, literal: &Literal) {
        let program = self.program;
        let obj = match literal {
            Literal::Str(value) => self.heap.string_const_obj(program, value),
            Literal::Class(ty) => self.heap.class_literal_obj(program, *ty),
            Literal::Int(_) => None,
        };
        if let Some(obj) = obj {
            let hctx = self.ctxs.empty();
            let cs_obj = self.csm.get_cs_obj(hctx, obj);
            let ptr = self.csm.get_var_ptr(ctx, lhs);
            self.add_points_to(ptr, PointsToSet::singleton(cs_obj));
        }
    }

    fn process_static_call(&mut self, ctx: ContextId, invoke: &Invoke) {
        let Some(callee) = self.program.resolve_ref(invoke.method_ref) else {
            debug!(
                site = %self.program.call_site_string(invoke.site),
                "failed to resolve static call"
            );
            return;
        };
        self.initialize_class(self.program.method(callee).class);
        let cs_site = self.csm.get_cs_call_site(ctx, invoke.site);
        let callee_ctx = self
            .selector
            .select_call(&mut self.ctxs, ctx, invoke.site, None);
        let cs_callee = self.csm.get_cs_method(callee_ctx, callee);
        self.add_call_edge(CallEdge {
            call_site: cs_site,
            callee: cs_callee,
            kind: CallKind::Static,
        });
    }

    /// Wire arguments to parameters and returns to the result variable.
    fn link_call(&mut self, edge: CallEdge) {
        let program = self.program;
        let cs = self.csm.cs_call_site(edge.call_site);
        let callee = self.csm.cs_method(edge.callee);
        let invoke = program.invoke_at(cs.site).clone();
        let data = program.method(callee.method);

        for (i, &arg) in invoke.args.iter().enumerate() {
            if let Some(&param) = data.params.get(i) {
                let src = self.csm.get_var_ptr(cs.ctx, arg);
                let dst = self.csm.get_var_ptr(callee.ctx, param);
                let filter = Some(program.var(param).ty);
                self.add_pfg_edge(src, dst, FlowKind::Parameter, filter);
            }
        }
        if let Some(result) = invoke.result {
            let dst = self.csm.get_var_ptr(cs.ctx, result);
            let filter = Some(program.var(result).ty);
            for &ret_var in &data.ret_vars {
                let src = self.csm.get_var_ptr(callee.ctx, ret_var);
                self.add_pfg_edge(src, dst, FlowKind::Return, filter);
            }
        }
    }

    /// Derived work when a variable's points-to set grows: instance
    /// field/array accesses with this base, and calls with this receiver.
    fn process_var_delta(&mut self, ctx: ContextId, var: VarId, delta: &PointsToSet) {
        let program = self.program;
        let method = program.var(var).method;
        let Some(index) = self.stmt_indexes.get(&method) else {
            return;
        };
        let field_loads = index.field_loads.get(&var).cloned().unwrap_or_default();
        let field_stores = index.field_stores.get(&var).cloned().unwrap_or_default();
        let array_loads = index.array_loads.get(&var).cloned().unwrap_or_default();
        let array_stores = index.array_stores.get(&var).cloned().unwrap_or_default();
        let invokes = index.recv_invokes.get(&var).cloned().unwrap_or_default();

        for cs_obj in delta.iter() {
            for &(lhs, field) in &field_loads {
                let src = self.csm.get_instance_field_ptr(cs_obj, field);
                let dst = self.csm.get_var_ptr(ctx, lhs);
                self.add_pfg_edge(src, dst, FlowKind::InstanceLoad, None);
            }
            for &(field, rhs) in &field_stores {
                let src = self.csm.get_var_ptr(ctx, rhs);
                let dst = self.csm.get_instance_field_ptr(cs_obj, field);
                let filter = Some(program.field(field).ty);
                self.add_pfg_edge(src, dst, FlowKind::InstanceStore, filter);
            }

            let obj_ty = self.heap.obj(self.csm.cs_obj(cs_obj).obj).ty;
            if let Some(elem_ty) = program.types.element_of(obj_ty) {
                for &lhs in &array_loads {
                    let src = self.csm.get_array_index_ptr(cs_obj);
                    let dst = self.csm.get_var_ptr(ctx, lhs);
                    self.add_pfg_edge(src, dst, FlowKind::ArrayLoad, None);
                }
                for &rhs in &array_stores {
                    let src = self.csm.get_var_ptr(ctx, rhs);
                    let dst = self.csm.get_array_index_ptr(cs_obj);
                    self.add_pfg_edge(src, dst, FlowKind::ArrayStore, Some(elem_ty));
                }
            }

            for invoke in &invokes {
                self.process_instance_call(ctx, invoke, cs_obj);
            }
        }
    }

    fn process_instance_call(&mut self, ctx: ContextId, invoke: &Invoke, recv: CSObjId) {
        let program = self.program;
        let cs_obj = self.csm.cs_obj(recv);
        let obj_ty = self.heap.obj(cs_obj.obj).ty;

        let callee = match invoke.kind {
            // Super/constructor/private calls bypass override resolution.
            InvokeKind::Special => program.resolve_ref(invoke.method_ref),
            _ => {
                // Array receivers dispatch on Object.
                let class = program
                    .types
                    .class_of(obj_ty)
                    .unwrap_or(program.object_class());
                program.dispatch(class, invoke.method_ref.subsig)
            }
        };
        let Some(callee) = callee else {
            // Technically unsound: the call is dropped for this object.
            debug!(
                site = %program.call_site_string(invoke.site),
                recv_type = %program.types.name(obj_ty),
                "no dispatch target; dropping call for this object"
            );
            return;
        };

        let recv_info = RecvInfo {
            heap_ctx: cs_obj.ctx,
            obj: cs_obj.obj,
            ty: obj_ty,
        };
        let callee_ctx =
            self.selector
                .select_call(&mut self.ctxs, ctx, invoke.site, Some(recv_info));
        let cs_site = self.csm.get_cs_call_site(ctx, invoke.site);
        let cs_callee = self.csm.get_cs_method(callee_ctx, callee);

        // Pass the receiver object to the callee's `this`.
        if let Some(this_var) = program.method(callee).this_var {
            let this_ptr = self.csm.get_var_ptr(callee_ctx, this_var);
            self.add_points_to(this_ptr, PointsToSet::singleton(recv));
        }
        self.add_call_edge(CallEdge {
            call_site: cs_site,
            callee: cs_callee,
            kind: invoke.kind.into(),
        });
    }

    /// Keep only objects whose runtime type is assignable to `filter`.
    fn filtered(&self, pts: &PointsToSet, filter: Option<TypeId>) -> PointsToSet {
        match filter {
            None => pts.clone(),
            Some(target) => pts
                .iter()
                .filter(|&o| {
                    let ty = self.heap.obj(self.csm.cs_obj(o).obj).ty;
                    self.program.is_assignable(target, ty)
                })
                .collect(),
        }
    }

    /// One worklist pop: add the delta, propagate along edges, return the
    /// actually-new objects.
    fn propagate_and_flow(&mut self, pointer: PointerId, delta: &PointsToSet) -> PointsToSet {
        let diff = self.pfg.propagate(pointer, delta);
        if diff.is_empty() {
            return diff;
        }
        self.stats.propagations += 1;
        let edges = self.pfg.out_edges(pointer).to_vec();
        for edge in edges {
            let filtered = self.filtered(&diff, edge.filter);
            self.add_points_to(edge.target, filtered);
        }
        diff
    }

    fn mark_entry(&mut self, entry: MethodId) {
        self.initialize_class(self.program.method(entry).class);
        let empty = self.ctxs.empty();
        let cs = self.csm.get_cs_method(empty, entry);
        self.mark_reachable(cs);
    }

    fn into_result(self) -> PointerAnalysisResult {
        let call_graph: CallGraph = self.cg.project(&self.csm);
        PointerAnalysisResult::new(
            self.heap,
            self.ctxs,
            self.csm,
            self.pfg,
            self.cg,
            call_graph,
            self.named_results,
            self.stats,
        )
    }
}

/// The pointer analysis: solver core plus registered plug-ins.
pub struct Solver<'p> {
    core: SolverCore<'p>,
    plugins: Vec<Box<dyn Plugin>>,
}

impl<'p> Solver<'p> {
    /// Create a solver with the built-in plug-ins configured from the
    /// options (the result processor is always appended last).
    pub fn new(program: &'p Program, options: AnalysisOptions) -> Self {
        let plugins = default_plugins(&options);
        Self {
            core: SolverCore::new(program, options),
            plugins,
        }
    }

    /// Register an additional plug-in; runs after the built-ins.
    pub fn register_plugin(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    /// A handle for cooperative cancellation from outside the loop.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.core.cancel.clone()
    }

    /// Run to the fixed point and build the result.
    pub fn solve(mut self) -> Result<PointerAnalysisResult> {
        let start = Instant::now();
        validate_plugin_descriptors(&self.core.options)?;
        self.plugins.push(Box::new(ResultProcessor::new()));

        for i in 0..self.plugins.len() {
            let plugin = &mut self.plugins[i];
            plugin
                .on_start(&mut self.core)
                .map_err(|e| wrap_plugin_error(plugin.name(), e))?;
        }

        let entries = self.core.program.entry_points().to_vec();
        for entry in entries {
            self.core.mark_entry(entry);
        }
        self.dispatch_events()?;

        while let Some((pointer, delta)) = self.core.worklist.pop_front() {
            if self.core.cancel.is_cancelled() {
                self.core.stats.cancelled = true;
                info!("analysis cancelled; result is partial");
                break;
            }
            self.core.stats.pops += 1;
            let diff = self.core.propagate_and_flow(pointer, &delta);
            if diff.is_empty() {
                continue;
            }
            if let Pointer::Var { ctx, var } = self.core.csm.pointer(pointer) {
                self.core.process_var_delta(ctx, var, &diff);
                for i in 0..self.plugins.len() {
                    let plugin = &mut self.plugins[i];
                    plugin
                        .handle_new_points_to(&mut self.core, pointer, &diff)
                        .map_err(|e| wrap_plugin_error(plugin.name(), e))?;
                }
            }
            self.dispatch_events()?;
        }

        self.core.stats.duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        for i in 0..self.plugins.len() {
            let plugin = &mut self.plugins[i];
            plugin
                .on_finish(&mut self.core)
                .map_err(|e| wrap_plugin_error(plugin.name(), e))?;
        }
        Ok(self.core.into_result())
    }

    fn dispatch_events(&mut self) -> Result<()> {
        while let Some(event) = self.core.events.pop_front() {
            for i in 0..self.plugins.len() {
                let plugin = &mut self.plugins[i];
                let outcome = match event {
                    Event::NewMethod(m) => plugin.handle_new_method(&mut self.core, m),
                    Event::NewCallEdge(edge) => plugin.handle_new_call_edge(&mut self.core, &edge),
                };
                outcome.map_err(|e| wrap_plugin_error(plugin.name(), e))?;
            }
        }
        Ok(())
    }
}

/// Comparison mismatches keep their own error kind (and exit code); every
/// other plug-in failure is wrapped with the plug-in identity.
fn wrap_plugin_error(plugin: &'static str, error: AnalysisError) -> AnalysisError {
    match error {
        e @ AnalysisError::ComparisonMismatch(_) => e,
        other => AnalysisError::in_plugin(plugin, other),
    }
}
