//! Interprocedural CFG view.
//!
//! Built over the context-insensitive call graph after analysis. Method
//! bodies are linear three-address sequences, so intraprocedural edges form
//! the successor chain; call sites additionally get call edges to callee
//! entries, return edges from callee exits (carrying the callee's return
//! variables), and a call-to-return edge for values that bypass the callee.
//! The synthetic exit of a method is the index one past its last statement.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::warn;

use crate::features::callgraph::CallGraph;
use crate::ir::{MethodId, Program, Stmt, VarId};

/// A statement position: (method, index). Index `body.len()` is the
/// synthetic exit node.
pub type GlobalStmt = (MethodId, u32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IcfgEdge {
    /// Intraprocedural fall-through.
    Normal { src: GlobalStmt, dst: GlobalStmt },
    /// Skips the callee at a call site (for values untouched by the call).
    CallToReturn { src: GlobalStmt, dst: GlobalStmt },
    /// Call site to callee entry.
    Call {
        call_site: GlobalStmt,
        entry: GlobalStmt,
        callee: MethodId,
    },
    /// Callee exit back to the return site, carrying the callee's return
    /// variables.
    Return {
        exit: GlobalStmt,
        ret_site: GlobalStmt,
        call_site: GlobalStmt,
        ret_vars: Vec<VarId>,
    },
}

impl IcfgEdge {
    pub fn source(&self) -> GlobalStmt {
        match self {
            IcfgEdge::Normal { src, .. } | IcfgEdge::CallToReturn { src, .. } => *src,
            IcfgEdge::Call { call_site, .. } => *call_site,
            IcfgEdge::Return { exit, .. } => *exit,
        }
    }

    pub fn target(&self) -> GlobalStmt {
        match self {
            IcfgEdge::Normal { dst, .. } | IcfgEdge::CallToReturn { dst, .. } => *dst,
            IcfgEdge::Call { entry, .. } => *entry,
            IcfgEdge::Return { ret_site, .. } => *ret_site,
        }
    }
}

#[derive(Debug, Default)]
pub struct Icfg {
    nodes: Vec<GlobalStmt>,
    node_set: FxHashSet<GlobalStmt>,
    in_edges: FxHashMap<GlobalStmt, Vec<IcfgEdge>>,
    out_edges: FxHashMap<GlobalStmt, Vec<IcfgEdge>>,
}

impl Icfg {
    pub fn entry_of(method: MethodId) -> GlobalStmt {
        (method, 0)
    }

    pub fn exit_of(program: &Program, method: MethodId) -> GlobalStmt {
        let len = program
            .method(method)
            .body
            .as_ref()
            .map(|b| b.len() as u32)
            .unwrap_or(0);
        (method, len)
    }

    pub fn build(program: &Program, call_graph: &CallGraph) -> Self {
        let mut icfg = Icfg::default();
        for &method in call_graph.methods() {
            let Some(body) = program.method(method).body.as_ref() else {
                continue;
            };
            for idx in 0..=body.len() as u32 {
                icfg.add_node((method, idx));
            }
            for (idx, stmt) in body.iter().enumerate() {
                let src = (method, idx as u32);
                let dst = (method, idx as u32 + 1);
                match stmt {
                    Stmt::Invoke(invoke) => {
                        icfg.add_edge(IcfgEdge::CallToReturn { src, dst });
                        for &callee in call_graph.callees_of(invoke.site) {
                            if program.method(callee).body.is_none() {
                                warn!(
                                    method = %program.method_signature(callee),
                                    "callee body is absent; no ICFG edges"
                                );
                                continue;
                            }
                            icfg.add_edge(IcfgEdge::Call {
                                call_site: src,
                                entry: Self::entry_of(callee),
                                callee,
                            });
                            icfg.add_edge(IcfgEdge::Return {
                                exit: Self::exit_of(program, callee),
                                ret_site: dst,
                                call_site: src,
                                ret_vars: program.method(callee).ret_vars.clone(),
                            });
                        }
                    }
                    _ => icfg.add_edge(IcfgEdge::Normal { src, dst }),
                }
            }
        }
        icfg
    }

    fn add_node(&mut self, node: GlobalStmt) {
        if self.node_set.insert(node) {
            self.nodes.push(node);
        }
    }

    fn add_edge(&mut self, edge: IcfgEdge) {
        self.add_node(edge.source());
        self.add_node(edge.target());
        self.out_edges
            .entry(edge.source())
            .or_default()
            .push(edge.clone());
        self.in_edges.entry(edge.target()).or_default().push(edge);
    }

    pub fn has_node(&self, node: GlobalStmt) -> bool {
        self.node_set.contains(&node)
    }

    pub fn nodes(&self) -> &[GlobalStmt] {
        &self.nodes
    }

    pub fn out_edges_of(&self, node: GlobalStmt) -> &[IcfgEdge] {
        self.out_edges.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn in_edges_of(&self, node: GlobalStmt) -> &[IcfgEdge] {
        self.in_edges.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn succs_of(&self, node: GlobalStmt) -> Vec<GlobalStmt> {
        let mut succs: Vec<GlobalStmt> =
            self.out_edges_of(node).iter().map(IcfgEdge::target).collect();
        succs.sort_unstable();
        succs.dedup();
        succs
    }

    pub fn preds_of(&self, node: GlobalStmt) -> Vec<GlobalStmt> {
        let mut preds: Vec<GlobalStmt> =
            self.in_edges_of(node).iter().map(IcfgEdge::source).collect();
        preds.sort_unstable();
        preds.dedup();
        preds
    }

    pub fn is_call_site(&self, program: &Program, node: GlobalStmt) -> bool {
        program
            .method(node.0)
            .body
            .as_ref()
            .and_then(|b| b.get(node.1 as usize))
            .is_some_and(|s| matches!(s, Stmt::Invoke(_)))
    }
}
