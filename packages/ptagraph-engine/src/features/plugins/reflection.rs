//! Pattern-based reflection modelling.
//!
//! - `Class.forName(name)` folds string constants to class literals (and
//!   triggers class initialization).
//! - `c.newInstance()` materializes a mock allocation per (call site,
//!   class) pair and invokes the nullary constructor.
//! - `Method.invoke(..)` is logged at debug level and skipped.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::errors::Result;
use crate::features::callgraph::{CallEdge, CallKind};
use crate::features::context::{ContextId, RecvInfo};
use crate::features::cs::{CSMethodId, PointerId, PointsToSet};
use crate::features::solver::SolverCore;
use crate::ir::{names, CallSiteId, Invoke, InvokeKind, MethodId, SubsigId, Subsignature, VarId};

use super::Plugin;

#[derive(Default)]
pub struct ReflectionPlugin {
    for_name: Option<MethodId>,
    new_instance_subsig: Option<SubsigId>,
    invoke_subsig: Option<SubsigId>,
    /// Argument of `forName` -> invokes it feeds.
    forname_vars: FxHashMap<VarId, Vec<Invoke>>,
    /// Receiver of `newInstance` -> invokes it feeds.
    newinst_vars: FxHashMap<VarId, Vec<Invoke>>,
    logged_invoke_sites: FxHashSet<CallSiteId>,
}

impl ReflectionPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    fn process_for_name(solver: &mut SolverCore<'_>, ctx: ContextId, invoke: &Invoke, delta: &PointsToSet) {
        let Some(result) = invoke.result else { return };
        let program = solver.program();
        let mut out = PointsToSet::new();
        for cs_obj in delta.iter() {
            let obj = solver.csm().cs_obj(cs_obj).obj;
            let Some(class_name) = solver.heap().obj(obj).as_string_const().map(str::to_string)
            else {
                continue;
            };
            let Some(class) = program.class_by_name(&class_name) else {
                debug!(class = %class_name, "forName of unknown class");
                continue;
            };
            solver.initialize_class(class);
            let ty = program.class(class).ty;
            if let Some(lit) = solver.heap_mut().class_literal_obj(program, ty) {
                let empty = solver.ctxs().empty();
                out.add(solver.csm_mut().get_cs_obj(empty, lit));
            }
        }
        if !out.is_empty() {
            solver.add_var_points_to(ctx, result, out);
        }
    }

    fn process_new_instance(
        solver: &mut SolverCore<'_>,
        ctx: ContextId,
        invoke: &Invoke,
        delta: &PointsToSet,
    ) {
        let Some(result) = invoke.result else { return };
        let program = solver.program();
        let mut out = PointsToSet::new();
        for cs_obj in delta.iter() {
            let obj = solver.csm().cs_obj(cs_obj).obj;
            let Some(referent) = solver.heap().obj(obj).as_class_literal() else {
                continue;
            };
            let Some(class) = program.types.class_of(referent) else {
                continue;
            };
            let mock = solver.heap_mut().reflective_obj(invoke.site, referent);
            let empty = solver.ctxs().empty();
            let cs_mock = solver.csm_mut().get_cs_obj(empty, mock);
            out.add(cs_mock);

            // Invoke the nullary constructor on the mock object.
            let ctor = program
                .types
                .by_name("void")
                .and_then(|void_ty| {
                    program.subsig_id(&Subsignature {
                        name: names::INIT.to_string(),
                        params: vec![],
                        ret: void_ty,
                    })
                })
                .and_then(|subsig| program.dispatch(class, subsig));
            let Some(ctor) = ctor else { continue };
            let recv = RecvInfo {
                heap_ctx: empty,
                obj: mock,
                ty: referent,
            };
            let callee_ctx = solver.select_call_context(ctx, invoke.site, Some(recv));
            let cs_site = solver.csm_mut().get_cs_call_site(ctx, invoke.site);
            let cs_ctor = solver.csm_mut().get_cs_method(callee_ctx, ctor);
            if let Some(this_var) = program.method(ctor).this_var {
                let this_ptr = solver.csm_mut().get_var_ptr(callee_ctx, this_var);
                solver.add_points_to(this_ptr, PointsToSet::singleton(cs_mock));
            }
            solver.add_call_edge(CallEdge {
                call_site: cs_site,
                callee: cs_ctor,
                kind: CallKind::Other,
            });
        }
        if !out.is_empty() {
            solver.add_var_points_to(ctx, result, out);
        }
    }
}

impl Plugin for ReflectionPlugin {
    fn name(&self) -> &'static str {
        "reflection"
    }

    fn on_start(&mut self, solver: &mut SolverCore<'_>) -> Result<()> {
        let program = solver.program();
        let class_class = program.class_by_name(names::CLASS);
        let class_ty = program.types.by_name(names::CLASS);
        let string_ty = program.types.by_name(names::STRING);
        let object_ty = program.class(program.object_class()).ty;

        if let (Some(class_class), Some(class_ty), Some(string_ty)) =
            (class_class, class_ty, string_ty)
        {
            self.for_name = program
                .subsig_id(&Subsignature {
                    name: "forName".to_string(),
                    params: vec![string_ty],
                    ret: class_ty,
                })
                .and_then(|s| program.class(class_class).declared_method(s));
        }
        self.new_instance_subsig = program.subsig_id(&Subsignature {
            name: "newInstance".to_string(),
            params: vec![],
            ret: object_ty,
        });
        if let Some(obj_array) = program.types.by_name(&format!("{}[]", names::OBJECT)) {
            self.invoke_subsig = program.subsig_id(&Subsignature {
                name: "invoke".to_string(),
                params: vec![object_ty, obj_array],
                ret: object_ty,
            });
        }
        Ok(())
    }

    fn handle_new_method(&mut self, solver: &mut SolverCore<'_>, method: CSMethodId) -> Result<()> {
        let program = solver.program();
        let target = solver.csm().cs_method(method);
        let Some(body) = program.method(target.method).body.as_ref() else {
            return Ok(());
        };
        let class_class = program.class_by_name(names::CLASS);
        let method_class = program.class_by_name(names::REFLECT_METHOD);
        for stmt in body {
            let Some(invoke) = stmt.as_invoke() else { continue };
            match invoke.kind {
                InvokeKind::Static => {
                    if self.for_name.is_some()
                        && program.resolve_ref(invoke.method_ref) == self.for_name
                    {
                        if let Some(&arg0) = invoke.args.first() {
                            self.forname_vars.entry(arg0).or_default().push(invoke.clone());
                        }
                    }
                }
                InvokeKind::Virtual | InvokeKind::Interface => {
                    if Some(invoke.method_ref.subsig) == self.new_instance_subsig
                        && Some(invoke.method_ref.owner) == class_class
                    {
                        if let Some(recv) = invoke.recv {
                            self.newinst_vars.entry(recv).or_default().push(invoke.clone());
                        }
                    } else if Some(invoke.method_ref.subsig) == self.invoke_subsig
                        && Some(invoke.method_ref.owner) == method_class
                        && self.logged_invoke_sites.insert(invoke.site)
                    {
                        debug!(
                            site = %program.call_site_string(invoke.site),
                            "Method.invoke is not modelled; call skipped"
                        );
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn handle_new_points_to(
        &mut self,
        solver: &mut SolverCore<'_>,
        pointer: PointerId,
        delta: &PointsToSet,
    ) -> Result<()> {
        let Some((ctx, var)) = solver.csm().pointer(pointer).as_var() else {
            return Ok(());
        };
        if let Some(invokes) = self.forname_vars.get(&var).cloned() {
            for invoke in invokes {
                Self::process_for_name(solver, ctx, &invoke, delta);
            }
        }
        if let Some(invokes) = self.newinst_vars.get(&var).cloned() {
            for invoke in invokes {
                Self::process_new_instance(solver, ctx, &invoke, delta);
            }
        }
        Ok(())
    }
}
