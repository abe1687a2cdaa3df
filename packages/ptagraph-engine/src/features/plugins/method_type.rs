//! MethodType constant folding.
//!
//! Folds `MethodType.methodType(..)` calls into method-type constant
//! objects when the arguments point to class-literal / method-type
//! constants, emitting the folded object into the call's result variable.
//! Three overloads are modelled:
//! - `methodType(Class)`: return type only
//! - `methodType(Class, Class)`: return type + one parameter
//! - `methodType(Class, MethodType)`: return type + parameters of an
//!   existing method type

use rustc_hash::FxHashMap;

use crate::errors::Result;
use crate::features::context::ContextId;
use crate::features::cs::{CSMethodId, CSObjId, PointerId, PointsToSet};
use crate::features::heap::MethodTypeDesc;
use crate::features::solver::SolverCore;
use crate::ir::{names, Invoke, InvokeKind, MethodId, Subsignature, TypeId, VarId};

use super::Plugin;

#[derive(Default)]
pub struct MethodTypePlugin {
    mt0: Option<MethodId>,
    mt1: Option<MethodId>,
    mt_mt: Option<MethodId>,
    /// Argument variable -> methodType invokes it feeds.
    mt_vars: FxHashMap<VarId, Vec<Invoke>>,
}

impl MethodTypePlugin {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_target(&self, method: MethodId) -> bool {
        [self.mt0, self.mt1, self.mt_mt].contains(&Some(method))
    }

    fn class_literal_of(solver: &SolverCore<'_>, cs_obj: CSObjId) -> Option<TypeId> {
        let obj = solver.csm().cs_obj(cs_obj).obj;
        solver.heap().obj(obj).as_class_literal()
    }

    fn method_type_of(solver: &SolverCore<'_>, cs_obj: CSObjId) -> Option<MethodTypeDesc> {
        let obj = solver.csm().cs_obj(cs_obj).obj;
        solver.heap().obj(obj).as_method_type().cloned()
    }

    fn emit(
        solver: &mut SolverCore<'_>,
        ctx: ContextId,
        result: VarId,
        descs: Vec<MethodTypeDesc>,
    ) {
        let program = solver.program();
        let mut out = PointsToSet::new();
        for desc in descs {
            if let Some(obj) = solver.heap_mut().method_type_obj(program, desc) {
                let empty = solver.ctxs().empty();
                let cs_obj = solver.csm_mut().get_cs_obj(empty, obj);
                out.add(cs_obj);
            }
        }
        if !out.is_empty() {
            solver.add_var_points_to(ctx, result, out);
        }
    }

    fn fold_ret_only(solver: &mut SolverCore<'_>, ctx: ContextId, invoke: &Invoke, delta: &PointsToSet) {
        let Some(result) = invoke.result else { return };
        let descs = delta
            .iter()
            .filter_map(|o| Self::class_literal_of(solver, o))
            .map(|ret| MethodTypeDesc { params: vec![], ret })
            .collect();
        Self::emit(solver, ctx, result, descs);
    }

    fn fold_ret_param(
        solver: &mut SolverCore<'_>,
        ctx: ContextId,
        var: VarId,
        invoke: &Invoke,
        delta: &PointsToSet,
    ) {
        let Some(result) = invoke.result else { return };
        let (arg0, arg1) = (invoke.args[0], invoke.args[1]);
        let (ret_objs, param_objs) = Self::split_pts(solver, ctx, var, arg0, arg1, delta);

        let mut descs = Vec::new();
        for ret_obj in ret_objs.iter() {
            for param_obj in param_objs.iter() {
                let (Some(ret), Some(param)) = (
                    Self::class_literal_of(solver, ret_obj),
                    Self::class_literal_of(solver, param_obj),
                ) else {
                    continue;
                };
                descs.push(MethodTypeDesc {
                    params: vec![param],
                    ret,
                });
            }
        }
        Self::emit(solver, ctx, result, descs);
    }

    fn fold_ret_mt(
        solver: &mut SolverCore<'_>,
        ctx: ContextId,
        var: VarId,
        invoke: &Invoke,
        delta: &PointsToSet,
    ) {
        let Some(result) = invoke.result else { return };
        let (arg0, arg1) = (invoke.args[0], invoke.args[1]);
        let (ret_objs, mt_objs) = Self::split_pts(solver, ctx, var, arg0, arg1, delta);

        let mut descs = Vec::new();
        for ret_obj in ret_objs.iter() {
            for mt_obj in mt_objs.iter() {
                let (Some(ret), Some(mt)) = (
                    Self::class_literal_of(solver, ret_obj),
                    Self::method_type_of(solver, mt_obj),
                ) else {
                    continue;
                };
                descs.push(MethodTypeDesc {
                    params: mt.params,
                    ret,
                });
            }
        }
        Self::emit(solver, ctx, result, descs);
    }

    /// `delta` belongs to whichever of the two arguments equals `var`; the
    /// other side uses its full current points-to set.
    fn split_pts(
        solver: &mut SolverCore<'_>,
        ctx: ContextId,
        var: VarId,
        arg0: VarId,
        arg1: VarId,
        delta: &PointsToSet,
    ) -> (PointsToSet, PointsToSet) {
        if var == arg0 {
            let ptr = solver.csm_mut().get_var_ptr(ctx, arg1);
            (delta.clone(), solver.pts_of(ptr).clone())
        } else {
            let ptr = solver.csm_mut().get_var_ptr(ctx, arg0);
            (solver.pts_of(ptr).clone(), delta.clone())
        }
    }
}

impl Plugin for MethodTypePlugin {
    fn name(&self) -> &'static str {
        "method-type"
    }

    fn on_start(&mut self, solver: &mut SolverCore<'_>) -> Result<()> {
        let program = solver.program();
        let Some(mt_class) = program.class_by_name(names::METHOD_TYPE) else {
            return Ok(());
        };
        let (Some(mt_ty), Some(class_ty)) = (
            program.types.by_name(names::METHOD_TYPE),
            program.types.by_name(names::CLASS),
        ) else {
            return Ok(());
        };
        let lookup = |params: Vec<TypeId>| -> Option<MethodId> {
            let subsig = program.subsig_id(&Subsignature {
                name: "methodType".to_string(),
                params,
                ret: mt_ty,
            })?;
            program.class(mt_class).declared_method(subsig)
        };
        self.mt0 = lookup(vec![class_ty]);
        self.mt1 = lookup(vec![class_ty, class_ty]);
        self.mt_mt = lookup(vec![class_ty, mt_ty]);
        Ok(())
    }

    fn handle_new_method(&mut self, solver: &mut SolverCore<'_>, method: CSMethodId) -> Result<()> {
        if self.mt0.is_none() && self.mt1.is_none() && self.mt_mt.is_none() {
            return Ok(());
        }
        let program = solver.program();
        let target = solver.csm().cs_method(method);
        let Some(body) = program.method(target.method).body.as_ref() else {
            return Ok(());
        };
        for stmt in body {
            let Some(invoke) = stmt.as_invoke() else { continue };
            if invoke.kind != InvokeKind::Static {
                continue;
            }
            let Some(resolved) = program.resolve_ref(invoke.method_ref) else {
                continue;
            };
            if self.is_target(resolved) {
                for &arg in &invoke.args {
                    self.mt_vars.entry(arg).or_default().push(invoke.clone());
                }
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
        let Some(invokes) = self.mt_vars.get(&var).cloned() else {
            return Ok(());
        };
        for invoke in invokes {
            let Some(resolved) = solver.program().resolve_ref(invoke.method_ref) else {
                continue;
            };
            if Some(resolved) == self.mt0 {
                Self::fold_ret_only(solver, ctx, &invoke, delta);
            } else if Some(resolved) == self.mt1 && invoke.args.len() == 2 {
                Self::fold_ret_param(solver, ctx, var, &invoke, delta);
            } else if Some(resolved) == self.mt_mt && invoke.args.len() == 2 {
                Self::fold_ret_mt(solver, ctx, var, &invoke, delta);
            }
        }
        Ok(())
    }
}
