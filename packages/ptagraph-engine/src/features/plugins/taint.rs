//! Taint tracking.
//!
//! Sources and sinks come from a JSON specification resolved against full
//! method signatures. A source call materializes a taint object into its
//! result variable; taint objects then ride the pointer-flow graph like any
//! other object. On finish, sink arguments are inspected for taint objects
//! and each (source, sink, index) chain becomes a [`TaintFlow`].

use std::path::Path;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::{AnalysisError, Result};
use crate::features::callgraph::CallEdge;
use crate::features::cs::CSCallSiteId;
use crate::features::heap::ObjKind;
use crate::features::solver::SolverCore;
use crate::ir::{CallSiteId, MethodId, Program};

use super::Plugin;

/// Key under which taint flows are stored in the result.
pub const TAINT_RESULT_KEY: &str = "Taint";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaintSourceSpec {
    /// Full method signature, e.g. `<Source: java.lang.Object taint()>`.
    pub method: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaintSinkSpec {
    pub method: String,
    /// Index of the sensitive argument.
    pub index: usize,
}

/// Source/sink specification loaded from the `taint-config` file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaintConfig {
    #[serde(default)]
    pub sources: Vec<TaintSourceSpec>,
    #[serde(default)]
    pub sinks: Vec<TaintSinkSpec>,
}

impl TaintConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AnalysisError::config(format!("cannot read taint config {}: {e}", path.display()))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            AnalysisError::config(format!("malformed taint config {}: {e}", path.display()))
        })
    }
}

/// A detected source-to-sink chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaintFlow {
    pub source: CallSiteId,
    pub sink: CallSiteId,
    pub index: usize,
}

impl TaintFlow {
    /// `TaintFlow{<source> -> <sink>/<index>}`, the fixed comparison form.
    pub fn render(&self, program: &Program) -> String {
        format!(
            "TaintFlow{{{} -> {}/{}}}",
            program.call_site_string(self.source),
            program.call_site_string(self.sink),
            self.index
        )
    }
}

#[derive(Default)]
pub struct TaintPlugin {
    sources: FxHashSet<MethodId>,
    sinks: FxHashMap<MethodId, Vec<usize>>,
    sink_calls: Vec<(CSCallSiteId, usize)>,
    seen_sink_calls: FxHashSet<(CSCallSiteId, usize)>,
}

impl TaintPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    fn resolve_signature(program: &Program, signature: &str) -> Option<MethodId> {
        (0..program.methods_len() as MethodId)
            .find(|&m| program.method_signature(m) == signature)
    }
}

impl Plugin for TaintPlugin {
    fn name(&self) -> &'static str {
        "taint"
    }

    fn on_start(&mut self, solver: &mut SolverCore<'_>) -> Result<()> {
        let Some(path) = solver.options().taint_config.clone() else {
            return Ok(());
        };
        let config = TaintConfig::load(&path)?;
        let program = solver.program();
        for source in &config.sources {
            match Self::resolve_signature(program, &source.method) {
                Some(m) => {
                    self.sources.insert(m);
                }
                None => warn!(method = %source.method, "unresolved taint source; ignored"),
            }
        }
        for sink in &config.sinks {
            match Self::resolve_signature(program, &sink.method) {
                Some(m) => self.sinks.entry(m).or_default().push(sink.index),
                None => warn!(method = %sink.method, "unresolved taint sink; ignored"),
            }
        }
        Ok(())
    }

    fn handle_new_call_edge(&mut self, solver: &mut SolverCore<'_>, edge: &CallEdge) -> Result<()> {
        let program = solver.program();
        let callee = solver.csm().cs_method(edge.callee).method;
        let cs = solver.csm().cs_call_site(edge.call_site);

        if self.sources.contains(&callee) {
            let invoke = program.invoke_at(cs.site);
            if let Some(result) = invoke.result {
                let ret_ty = program.subsig(program.method(callee).subsig).ret;
                let taint = solver.heap_mut().taint_obj(cs.site, ret_ty);
                let empty = solver.ctxs().empty();
                let cs_taint = solver.csm_mut().get_cs_obj(empty, taint);
                solver.add_var_points_to(cs.ctx, result, [cs_taint].into_iter().collect());
            }
        }
        if let Some(indexes) = self.sinks.get(&callee).cloned() {
            for index in indexes {
                if self.seen_sink_calls.insert((edge.call_site, index)) {
                    self.sink_calls.push((edge.call_site, index));
                }
            }
        }
        Ok(())
    }

    fn on_finish(&mut self, solver: &mut SolverCore<'_>) -> Result<()> {
        let program = solver.program();
        let mut flows: Vec<TaintFlow> = Vec::new();
        for &(cs_site, index) in &self.sink_calls {
            let cs = solver.csm().cs_call_site(cs_site);
            let invoke = program.invoke_at(cs.site);
            let Some(&arg) = invoke.args.get(index) else {
                continue;
            };
            let arg_ptr = solver.csm_mut().get_var_ptr(cs.ctx, arg);
            for cs_obj in solver.pts_of(arg_ptr).clone().iter() {
                let obj = solver.csm().cs_obj(cs_obj).obj;
                if let ObjKind::Taint { source } = &solver.heap().obj(obj).kind {
                    flows.push(TaintFlow {
                        source: *source,
                        sink: cs.site,
                        index,
                    });
                }
            }
        }
        flows.sort_unstable();
        flows.dedup();
        info!(flows = flows.len(), "taint analysis finished");
        solver.store_named_result(TAINT_RESULT_KEY, Box::new(flows));
        Ok(())
    }
}
