//! Analysis features, leaves first: heap abstraction, contexts, CS
//! elements, the pointer-flow graph, call graphs, the solver, plug-ins,
//! the ICFG view, and the result surface.

pub mod callgraph;
pub mod context;
pub mod cs;
pub mod heap;
pub mod icfg;
pub mod pfg;
pub mod plugins;
pub mod result;
pub mod solver;
