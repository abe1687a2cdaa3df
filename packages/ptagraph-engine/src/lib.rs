/*
 * ptagraph-engine: whole-program pointer analysis
 *
 * Feature-first layout:
 * - shared/    : dense indexing, hybrid bit set
 * - ir/        : the three-address IR the engine consumes
 * - features/  : heap -> context -> cs -> pfg -> solver -> plugins -> result
 * - config/    : analysis options
 *
 * The solver is a single-threaded deterministic worklist loop; all
 * structures grow monotonically, so the fixed point always terminates.
 */

pub mod config;
pub mod errors;
pub mod features;
pub mod ir;
pub mod shared;

pub use config::{AnalysisOptions, ContextPolicy};
pub use errors::{AnalysisError, Mismatch, Result};
pub use features::callgraph::{CallEdge, CallGraph, CallKind, CSCallGraph};
pub use features::context::{ContextElem, ContextId, ContextManager, ContextSelector, RecvInfo};
pub use features::cs::{
    CSCallSite, CSCallSiteId, CSManager, CSMethod, CSMethodId, CSObj, CSObjId, Pointer, PointerId,
    PointsToSet,
};
pub use features::heap::{HeapModel, MethodTypeDesc, ObjData, ObjId, ObjKind};
pub use features::icfg::{GlobalStmt, Icfg, IcfgEdge};
pub use features::pfg::{FlowEdge, FlowKind, PointerFlowGraph};
pub use features::plugins::{Plugin, TaintConfig, TaintFlow};
pub use features::result::{PointerAnalysisResult, Render};
pub use features::solver::{CancellationToken, Solver, SolverCore, SolverStats};
pub use ir::{Program, ProgramBuilder};
