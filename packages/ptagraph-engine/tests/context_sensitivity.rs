//! Context-sensitivity policies and their precision.

mod common;

use common::{alloc_objs_of_type, box_fixture, solve};
use ptagraph_engine::ir::{names, ProgramBuilder, VarId};
use ptagraph_engine::{AnalysisOptions, Program};

fn pts_len(result: &ptagraph_engine::PointerAnalysisResult, var: VarId) -> usize {
    result.points_to_of_var(var).len()
}

#[test]
fn test_one_object_separates_receivers() {
    let fixture = box_fixture();

    let ci = solve(&fixture.program, AnalysisOptions::default());
    assert_eq!(pts_len(&ci, fixture.r1), 2);

    let obj = solve(&fixture.program, AnalysisOptions::with_cs("1-obj").unwrap());
    let r1 = obj.points_to_of_var(fixture.r1);
    let r2 = obj.points_to_of_var(fixture.r2);
    assert_eq!(r1.len(), 1);
    assert_eq!(r2.len(), 1);
    assert_ne!(r1, r2);
}

#[test]
fn test_type_sensitivity_merges_same_class_receivers() {
    let fixture = box_fixture();
    // both receivers are Box: 1-type cannot tell them apart
    let result = solve(&fixture.program, AnalysisOptions::with_cs("1-type").unwrap());
    assert_eq!(pts_len(&result, fixture.r1), 2);
    assert_eq!(pts_len(&result, fixture.r2), 2);
}

#[test]
fn test_hybrid_behaves_like_one_object_on_instance_calls() {
    let fixture = box_fixture();
    let result = solve(&fixture.program, AnalysisOptions::with_cs("hybrid").unwrap());
    assert_eq!(pts_len(&result, fixture.r1), 1);
    assert_eq!(pts_len(&result, fixture.r2), 1);
}

/// Identity function called through a wrapper:
///
/// ```text
/// static Object id(Object x)   { return x; }
/// static Object wrap(Object x) { return id(x); }
/// main: a = wrap(new A()); b = wrap(new B());
/// ```
///
/// Both outer calls funnel through the single `id` call site inside `wrap`,
/// so 1-call merges them while 2-call keeps them apart.
fn wrapper_program() -> (Program, VarId, VarId) {
    let mut b = ProgramBuilder::new();
    let object = b.class_by_name(names::OBJECT).unwrap();
    let object_ty = b.class_type(object);
    let void = b.primitive("void");
    let a_class = b.add_class("A", None, true);
    let a_ty = b.class_type(a_class);
    let b_class = b.add_class("B", None, true);
    let b_ty = b.class_type(b_class);

    let util = b.add_class("Util", None, true);
    let id = b.add_method(util, "id", &[object_ty], object_ty, true);
    {
        let mut body = b.body(id);
        let x = body.param("x", object_ty);
        body.ret(Some(x));
        body.finish();
    }
    let id_ref = b.method_ref(util, "id", &[object_ty], object_ty);
    let wrap = b.add_method(util, "wrap", &[object_ty], object_ty, true);
    {
        let mut body = b.body(wrap);
        let x = body.param("x", object_ty);
        let r = body.var("r", object_ty);
        body.invoke_static(id_ref, &[x], Some(r));
        body.ret(Some(r));
        body.finish();
    }

    let wrap_ref = b.method_ref(util, "wrap", &[object_ty], object_ty);
    let main_class = b.add_class("Main", None, true);
    let main = b.add_method(main_class, "main", &[], void, true);
    let (ra, rb);
    {
        let mut body = b.body(main);
        let oa = body.var("oa", a_ty);
        let ob = body.var("ob", b_ty);
        ra = body.var("ra", object_ty);
        rb = body.var("rb", object_ty);
        body.new_object(oa, a_ty);
        body.new_object(ob, b_ty);
        body.invoke_static(wrap_ref, &[oa], Some(ra));
        body.invoke_static(wrap_ref, &[ob], Some(rb));
        body.ret(None);
        body.finish();
    }
    b.add_entry_point(main);
    (b.build(), ra, rb)
}

#[test]
fn test_one_call_merges_through_wrapper() {
    let (program, ra, rb) = wrapper_program();
    let result = solve(&program, AnalysisOptions::with_cs("1-call").unwrap());
    assert_eq!(pts_len(&result, ra), 2);
    assert_eq!(pts_len(&result, rb), 2);
}

#[test]
fn test_two_call_separates_through_wrapper() {
    let (program, ra, rb) = wrapper_program();
    let result = solve(&program, AnalysisOptions::with_cs("2-call").unwrap());
    let ra_pts = result.points_to_of_var(ra);
    let rb_pts = result.points_to_of_var(rb);
    assert_eq!(ra_pts.len(), 1);
    assert_eq!(rb_pts.len(), 1);
    assert_ne!(ra_pts, rb_pts);
}

#[test]
fn test_cs_reachable_collapses_in_projection() {
    let fixture = box_fixture();
    let result = solve(&fixture.program, AnalysisOptions::with_cs("1-obj").unwrap());

    // Box.set is reachable under two receiver contexts, once in the
    // projection.
    let cs_sets = result
        .cs_call_graph()
        .reachable_methods()
        .iter()
        .filter(|&&m| result.csm().cs_method(m).method == fixture.set)
        .count();
    assert_eq!(cs_sets, 2);
    let ci_sets = result
        .reachable_methods()
        .iter()
        .filter(|&&m| m == fixture.set)
        .count();
    assert_eq!(ci_sets, 1);
}

#[test]
fn test_policies_agree_on_total_heap() {
    let fixture = box_fixture();
    for cs in ["ci", "1-call", "2-call", "1-obj", "2-obj", "1-type", "2-type"] {
        let result = solve(&fixture.program, AnalysisOptions::with_cs(cs).unwrap());
        // allocation-site objects are policy-independent
        let r1 = result.points_to_of_var(fixture.r1);
        assert!(
            !alloc_objs_of_type(&result, &r1, fixture.o1_ty).is_empty(),
            "policy {cs} lost the stored object"
        );
    }
}
