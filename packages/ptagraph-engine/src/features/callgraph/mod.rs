//! Call Graphs
//!
//! The context-sensitive call graph is maintained on the fly by the solver:
//! nodes are reachable CS methods, edges context-qualified call edges. A
//! projection collapses contexts into the context-insensitive view exposed
//! by the result.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::features::cs::{CSCallSiteId, CSManager, CSMethodId};
use crate::ir::{CallSiteId, InvokeKind, MethodId};

/// How a call edge dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    Static,
    Virtual,
    Special,
    Interface,
    /// Synthesized edges (bootstrap methods, reflective constructor calls).
    Other,
}

impl From<InvokeKind> for CallKind {
    fn from(kind: InvokeKind) -> Self {
        match kind {
            InvokeKind::Static => CallKind::Static,
            InvokeKind::Virtual => CallKind::Virtual,
            InvokeKind::Interface => CallKind::Interface,
            InvokeKind::Special => CallKind::Special,
            InvokeKind::Dynamic => CallKind::Other,
        }
    }
}

/// One context-sensitive call edge. Idempotent: added once per
/// (call site, callee) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallEdge {
    pub call_site: CSCallSiteId,
    pub callee: CSMethodId,
    pub kind: CallKind,
}

#[derive(Debug, Default)]
pub struct CSCallGraph {
    edges: Vec<CallEdge>,
    edge_set: FxHashSet<(CSCallSiteId, CSMethodId)>,
    callees: FxHashMap<CSCallSiteId, Vec<CSMethodId>>,
    reachable: Vec<CSMethodId>,
    reachable_set: FxHashSet<CSMethodId>,
}

impl CSCallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the edge was new.
    pub fn add_edge(&mut self, edge: CallEdge) -> bool {
        if !self.edge_set.insert((edge.call_site, edge.callee)) {
            return false;
        }
        self.callees
            .entry(edge.call_site)
            .or_default()
            .push(edge.callee);
        self.edges.push(edge);
        true
    }

    /// Returns true if the method was not reachable before.
    pub fn add_reachable(&mut self, method: CSMethodId) -> bool {
        if !self.reachable_set.insert(method) {
            return false;
        }
        self.reachable.push(method);
        true
    }

    pub fn is_reachable(&self, method: CSMethodId) -> bool {
        self.reachable_set.contains(&method)
    }

    /// Reachable CS methods in discovery order.
    pub fn reachable_methods(&self) -> &[CSMethodId] {
        &self.reachable
    }

    pub fn edges(&self) -> &[CallEdge] {
        &self.edges
    }

    pub fn callees_of(&self, call_site: CSCallSiteId) -> &[CSMethodId] {
        self.callees
            .get(&call_site)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Collapse contexts into a context-insensitive call graph.
    pub fn project(&self, csm: &CSManager) -> CallGraph {
        let mut ci = CallGraph::default();
        for &m in &self.reachable {
            ci.add_method(csm.cs_method(m).method);
        }
        for edge in &self.edges {
            let site = csm.cs_call_site(edge.call_site).site;
            let callee = csm.cs_method(edge.callee).method;
            ci.add_edge(site, callee, edge.kind);
        }
        ci
    }
}

/// Context-insensitive call graph (projection of the CS graph).
#[derive(Debug, Default)]
pub struct CallGraph {
    methods: Vec<MethodId>,
    method_set: FxHashSet<MethodId>,
    edges: Vec<(CallSiteId, MethodId, CallKind)>,
    edge_set: FxHashSet<(CallSiteId, MethodId)>,
    callees: FxHashMap<CallSiteId, Vec<MethodId>>,
}

impl CallGraph {
    pub fn add_method(&mut self, method: MethodId) -> bool {
        if !self.method_set.insert(method) {
            return false;
        }
        self.methods.push(method);
        true
    }

    pub fn add_edge(&mut self, site: CallSiteId, callee: MethodId, kind: CallKind) -> bool {
        if !self.edge_set.insert((site, callee)) {
            return false;
        }
        self.callees.entry(site).or_default().push(callee);
        self.edges.push((site, callee, kind));
        true
    }

    pub fn contains_method(&self, method: MethodId) -> bool {
        self.method_set.contains(&method)
    }

    pub fn methods(&self) -> &[MethodId] {
        &self.methods
    }

    pub fn edges(&self) -> &[(CallSiteId, MethodId, CallKind)] {
        &self.edges
    }

    pub fn callees_of(&self, site: CallSiteId) -> &[MethodId] {
        self.callees.get(&site).map(Vec::as_slice).unwrap_or(&[])
    }
}
