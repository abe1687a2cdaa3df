//! Pointer-Flow Graph
//!
//! Directed graph over interned pointers. Each node owns its points-to set
//! and its outgoing edge list; edges optionally carry a type filter that
//! restricts which objects propagate across them. Edges are added as the
//! solver derives them and never removed; duplicates are rejected.

use rustc_hash::FxHashSet;

use crate::features::cs::{PointerId, PointsToSet};
use crate::ir::TypeId;

/// Edge kinds and their propagation semantics (filters are checked against
/// the runtime type of each propagated object).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowKind {
    LocalAssign,
    Cast,
    StaticLoad,
    StaticStore,
    InstanceLoad,
    InstanceStore,
    ArrayLoad,
    ArrayStore,
    Parameter,
    Return,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowEdge {
    pub kind: FlowKind,
    pub target: PointerId,
    pub filter: Option<TypeId>,
}

#[derive(Debug, Default)]
struct Node {
    pts: PointsToSet,
    edges: Vec<FlowEdge>,
    edge_keys: FxHashSet<(PointerId, FlowKind)>,
}

#[derive(Debug, Default)]
pub struct PointerFlowGraph {
    nodes: Vec<Node>,
    edge_count: usize,
}

impl PointerFlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure(&mut self, pointer: PointerId) -> &mut Node {
        let idx = pointer as usize;
        if self.nodes.len() <= idx {
            self.nodes.resize_with(idx + 1, Node::default);
        }
        &mut self.nodes[idx]
    }

    /// Add an edge `src -> edge.target`. Returns false for duplicates
    /// (same target and kind).
    pub fn add_edge(&mut self, src: PointerId, edge: FlowEdge) -> bool {
        self.ensure(edge.target);
        let node = self.ensure(src);
        if !node.edge_keys.insert((edge.target, edge.kind)) {
            return false;
        }
        node.edges.push(edge);
        self.edge_count += 1;
        true
    }

    pub fn pts(&self, pointer: PointerId) -> Option<&PointsToSet> {
        self.nodes.get(pointer as usize).map(|n| &n.pts)
    }

    /// Union `delta` into the pointer's set, returning the actually new
    /// objects.
    pub fn propagate(&mut self, pointer: PointerId, delta: &PointsToSet) -> PointsToSet {
        self.ensure(pointer).pts.add_all_diff(delta)
    }

    pub fn out_edges(&self, pointer: PointerId) -> &[FlowEdge] {
        self.nodes
            .get(pointer as usize)
            .map(|n| n.edges.as_slice())
            .unwrap_or(&[])
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Total number of points-to entries over a set of pointers.
    pub fn pts_size_of(&self, pointers: impl Iterator<Item = PointerId>) -> usize {
        pointers
            .filter_map(|p| self.pts(p))
            .map(|pts| pts.len())
            .sum()
    }
}
