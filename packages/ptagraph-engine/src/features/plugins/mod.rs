//! Plug-in Framework
//!
//! Ordered handlers that observe solver lifecycle events and may extend the
//! analysis through the solver-core APIs (add edges, inject objects, mark
//! methods reachable). Plug-ins run synchronously inside the solver loop in
//! registration order; their side effects become visible on the next
//! iteration. A plug-in must not mutate points-to sets except through the
//! solver APIs, which enforce the worklist discipline.

mod invokedynamic;
mod method_type;
mod reflection;
mod result_processor;
mod taint;

pub use invokedynamic::InvokeDynamicPlugin;
pub use method_type::MethodTypePlugin;
pub use reflection::ReflectionPlugin;
pub use result_processor::ResultProcessor;
pub use taint::{TaintConfig, TaintFlow, TaintPlugin};

use crate::config::AnalysisOptions;
use crate::errors::Result;
use crate::features::callgraph::CallEdge;
use crate::features::cs::{CSMethodId, PointerId, PointsToSet};
use crate::features::solver::SolverCore;

/// A solver extension. All callbacks default to no-ops; errors abort the
/// analysis, wrapped with the plug-in identity.
pub trait Plugin {
    fn name(&self) -> &'static str;

    fn on_start(&mut self, _solver: &mut SolverCore<'_>) -> Result<()> {
        Ok(())
    }

    fn on_finish(&mut self, _solver: &mut SolverCore<'_>) -> Result<()> {
        Ok(())
    }

    /// A CS method became reachable and its statements were translated.
    fn handle_new_method(&mut self, _solver: &mut SolverCore<'_>, _method: CSMethodId) -> Result<()> {
        Ok(())
    }

    /// A variable pointer received new objects (`delta` is exactly the new
    /// part).
    fn handle_new_points_to(
        &mut self,
        _solver: &mut SolverCore<'_>,
        _pointer: PointerId,
        _delta: &PointsToSet,
    ) -> Result<()> {
        Ok(())
    }

    /// A call edge was recorded for the first time.
    fn handle_new_call_edge(&mut self, _solver: &mut SolverCore<'_>, _edge: &CallEdge) -> Result<()> {
        Ok(())
    }
}

/// Descriptors of the built-in plug-ins (the `plugins` option is checked
/// against these).
pub const BUILTIN_PLUGIN_NAMES: [&str; 5] = [
    "method-type",
    "invokedynamic",
    "reflection",
    "taint",
    "result-processor",
];

/// The built-in plug-ins for a run, in registration order. The result
/// processor is appended separately so it always runs last.
pub fn default_plugins(options: &AnalysisOptions) -> Vec<Box<dyn Plugin>> {
    let mut plugins: Vec<Box<dyn Plugin>> = vec![
        Box::new(MethodTypePlugin::new()),
        Box::new(InvokeDynamicPlugin::new()),
        Box::new(ReflectionPlugin::new()),
    ];
    if options.taint_config.is_some() || options.plugins.iter().any(|p| p == "taint") {
        plugins.push(Box::new(TaintPlugin::new()));
    }
    plugins
}

/// Validate the `plugins` option. Descriptors name built-ins; anything the
/// engine cannot instantiate is a configuration error (embedders register
/// their own plug-ins through `Solver::register_plugin`).
pub fn validate_plugin_descriptors(options: &AnalysisOptions) -> crate::errors::Result<()> {
    for descriptor in &options.plugins {
        if !BUILTIN_PLUGIN_NAMES.contains(&descriptor.as_str()) {
            return Err(crate::errors::AnalysisError::config(format!(
                "unknown plugin descriptor: {descriptor}"
            )));
        }
    }
    Ok(())
}
