//! Invokedynamic modelling.
//!
//! Resolves the bootstrap target handle of each `invokedynamic` site to a
//! concrete method and synthesizes a call edge to it (kind `Other`, the
//! bootstrap-method edge). Arguments bind positionally; for instance
//! handles the first argument binds the receiver slot.

use tracing::debug;

use crate::errors::Result;
use crate::features::callgraph::{CallEdge, CallKind};
use crate::features::context::ContextId;
use crate::features::cs::CSMethodId;
use crate::features::pfg::FlowKind;
use crate::features::solver::SolverCore;
use crate::ir::{Invoke, InvokeKind};

use super::Plugin;

#[derive(Default)]
pub struct InvokeDynamicPlugin;

impl InvokeDynamicPlugin {
    pub fn new() -> Self {
        Self
    }

    fn process_indy(solver: &mut SolverCore<'_>, ctx: ContextId, invoke: &Invoke) {
        let program = solver.program();
        let Some(handle) = invoke.handle else { return };
        let Some(target) = program.resolve_ref(handle) else {
            debug!(
                site = %program.call_site_string(invoke.site),
                "unresolved bootstrap handle"
            );
            return;
        };

        // Bootstrap edges keep the caller context.
        let cs_site = solver.csm_mut().get_cs_call_site(ctx, invoke.site);
        let cs_callee = solver.csm_mut().get_cs_method(ctx, target);
        solver.add_call_edge(CallEdge {
            call_site: cs_site,
            callee: cs_callee,
            kind: CallKind::Other,
        });

        // `Other` edges are wired by their creator: bind the receiver slot
        // for instance handles, then the remaining arguments positionally.
        let data = program.method(target);
        let shift = usize::from(!data.is_static);
        if !data.is_static {
            if let (Some(this_var), Some(&arg0)) = (data.this_var, invoke.args.first()) {
                let src = solver.csm_mut().get_var_ptr(ctx, arg0);
                let dst = solver.csm_mut().get_var_ptr(ctx, this_var);
                let filter = Some(program.var(this_var).ty);
                solver.add_pfg_edge(src, dst, FlowKind::Parameter, filter);
            }
        }
        for (i, &arg) in invoke.args.iter().enumerate().skip(shift) {
            if let Some(&param) = data.params.get(i - shift) {
                let src = solver.csm_mut().get_var_ptr(ctx, arg);
                let dst = solver.csm_mut().get_var_ptr(ctx, param);
                let filter = Some(program.var(param).ty);
                solver.add_pfg_edge(src, dst, FlowKind::Parameter, filter);
            }
        }
        if let Some(result) = invoke.result {
            let dst = solver.csm_mut().get_var_ptr(ctx, result);
            let filter = Some(program.var(result).ty);
            for &ret_var in &data.ret_vars {
                let src = solver.csm_mut().get_var_ptr(ctx, ret_var);
                solver.add_pfg_edge(src, dst, FlowKind::Return, filter);
            }
        }
    }
}

impl Plugin for InvokeDynamicPlugin {
    fn name(&self) -> &'static str {
        "invokedynamic"
    }

    fn handle_new_method(&mut self, solver: &mut SolverCore<'_>, method: CSMethodId) -> Result<()> {
        let program = solver.program();
        let target = solver.csm().cs_method(method);
        let Some(body) = program.method(target.method).body.as_ref() else {
            return Ok(());
        };
        let indy_invokes: Vec<Invoke> = body
            .iter()
            .filter_map(|s| s.as_invoke())
            .filter(|i| i.kind == InvokeKind::Dynamic)
            .cloned()
            .collect();
        for invoke in indy_invokes {
            Self::process_indy(solver, target.ctx, &invoke);
        }
        Ok(())
    }
}
