//! Whole-run invariants: determinism, propagation closure, cancellation.

mod common;

use common::{box_fixture, solve};
use ptagraph_engine::{AnalysisOptions, PointerAnalysisResult, Program, Solver};

fn fingerprint(program: &Program, result: &PointerAnalysisResult) -> Vec<String> {
    let render = result.render(program);
    let mut lines: Vec<String> = result
        .csm()
        .iter_pointers()
        .map(|(id, _)| format!("{} => {}", render.pointer(id), render.pts_of(id)))
        .collect();
    lines.sort_unstable();
    lines
}

#[test]
fn test_two_runs_are_identical() {
    let fixture = box_fixture();
    let first = solve(&fixture.program, AnalysisOptions::with_cs("2-obj").unwrap());
    let second = solve(&fixture.program, AnalysisOptions::with_cs("2-obj").unwrap());
    assert_eq!(
        fingerprint(&fixture.program, &first),
        fingerprint(&fixture.program, &second)
    );
}

/// After termination every edge is saturated: the (filtered) source set is
/// contained in the target set.
#[test]
fn test_closure_under_propagation() {
    let fixture = box_fixture();
    for cs in ["ci", "1-obj", "2-call"] {
        let result = solve(&fixture.program, AnalysisOptions::with_cs(cs).unwrap());
        let program = &fixture.program;
        for (src, _) in result.csm().iter_pointers() {
            let src_pts = result.pts_of(src);
            for edge in result.pfg().out_edges(src) {
                let dst_pts = result.pts_of(edge.target);
                for obj in src_pts.iter() {
                    let passes = match edge.filter {
                        None => true,
                        Some(filter) => {
                            let ty = result.heap().obj(result.csm().cs_obj(obj).obj).ty;
                            program.is_assignable(filter, ty)
                        }
                    };
                    if passes {
                        assert!(
                            dst_pts.contains(obj),
                            "unsaturated edge under {cs}: {:?}",
                            edge.kind
                        );
                    }
                }
            }
        }
    }
}

/// Every call edge's callee is reachable in the CS call graph.
#[test]
fn test_call_edges_imply_reachability() {
    let fixture = box_fixture();
    let result = solve(&fixture.program, AnalysisOptions::with_cs("1-obj").unwrap());
    for edge in result.cs_call_graph().edges() {
        assert!(result.cs_call_graph().is_reachable(edge.callee));
    }
}

#[test]
fn test_cancellation_yields_partial_result() {
    let fixture = box_fixture();
    let solver = Solver::new(&fixture.program, AnalysisOptions::default());
    solver.cancellation_token().cancel();
    let result = solver.solve().expect("cancellation must not fail");
    assert!(result.stats().cancelled);
    // entries were still marked; no propagation happened
    assert!(!result.reachable_methods().is_empty());
    assert!(result.points_to_of_var(fixture.r1).is_empty());
}

#[test]
fn test_only_app_skips_library_bodies() {
    let fixture = box_fixture();
    // Box and Main are application classes; with only-app nothing changes
    let baseline = solve(&fixture.program, AnalysisOptions::default());
    let restricted = solve(
        &fixture.program,
        AnalysisOptions {
            only_app: true,
            ..AnalysisOptions::default()
        },
    );
    assert_eq!(
        fingerprint(&fixture.program, &baseline),
        fingerprint(&fixture.program, &restricted)
    );
}
