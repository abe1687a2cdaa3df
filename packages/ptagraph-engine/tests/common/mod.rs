//! Shared fixtures for the integration suites.
#![allow(dead_code)] // each suite uses a different slice of the fixtures

use ptagraph_engine::ir::{names, ClassId, MethodId, Program, ProgramBuilder, TypeId, VarId};
use ptagraph_engine::{AnalysisOptions, ObjId, ObjKind, PointerAnalysisResult, Solver};

/// Run the analysis over a finished program.
pub fn solve(program: &Program, options: AnalysisOptions) -> PointerAnalysisResult {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    Solver::new(program, options).solve().expect("analysis failed")
}

/// Allocation-site objects of the given class type in a points-to set.
pub fn alloc_objs_of_type(
    result: &PointerAnalysisResult,
    objs: &[ObjId],
    ty: TypeId,
) -> Vec<ObjId> {
    objs.iter()
        .copied()
        .filter(|&o| {
            let data = result.heap().obj(o);
            matches!(data.kind, ObjKind::Alloc { .. }) && data.ty == ty
        })
        .collect()
}

/// The classic container/box fixture:
///
/// ```text
/// class Box { Object f; void set(Object v) { this.f = v; } Object get() { return this.f; } }
/// class Main {
///     static void main() {
///         Box b1 = new Box(); Box b2 = new Box();
///         Object o1 = new Object(); Object o2 = new Object();
///         b1.set(o1); b2.set(o2);
///         Object r1 = b1.get(); Object r2 = b2.get();
///     }
/// }
/// ```
pub struct BoxFixture {
    pub program: Program,
    pub main: MethodId,
    pub box_class: ClassId,
    pub set: MethodId,
    pub get: MethodId,
    pub r1: VarId,
    pub r2: VarId,
    pub o1_ty: TypeId,
}

pub fn box_fixture() -> BoxFixture {
    let mut b = ProgramBuilder::new();
    let object = b.class_by_name(names::OBJECT).unwrap();
    let object_ty = b.class_type(object);
    let void = b.primitive("void");

    let box_class = b.add_class("Box", None, true);
    let box_ty = b.class_type(box_class);
    let f = b.add_field(box_class, "f", object_ty, false);

    let set = b.add_method(box_class, "set", &[object_ty], void, false);
    {
        let mut body = b.body(set);
        let this = body.this();
        let v = body.param("v", object_ty);
        body.store_field(this, f, v);
        body.ret(None);
        body.finish();
    }

    let get = b.add_method(box_class, "get", &[], object_ty, false);
    {
        let mut body = b.body(get);
        let this = body.this();
        let out = body.var("out", object_ty);
        body.load_field(out, this, f);
        body.ret(Some(out));
        body.finish();
    }

    let main_class = b.add_class("Main", None, true);
    let main = b.add_method(main_class, "main", &[], void, true);
    let set_ref = b.method_ref(box_class, "set", &[object_ty], void);
    let get_ref = b.method_ref(box_class, "get", &[], object_ty);
    let (r1, r2);
    {
        let mut body = b.body(main);
        let b1 = body.var("b1", box_ty);
        let b2 = body.var("b2", box_ty);
        let o1 = body.var("o1", object_ty);
        let o2 = body.var("o2", object_ty);
        r1 = body.var("r1", object_ty);
        r2 = body.var("r2", object_ty);
        body.new_object(b1, box_ty);
        body.new_object(b2, box_ty);
        body.new_object(o1, object_ty);
        body.new_object(o2, object_ty);
        body.invoke_virtual(b1, set_ref, &[o1], None);
        body.invoke_virtual(b2, set_ref, &[o2], None);
        body.invoke_virtual(b1, get_ref, &[], Some(r1));
        body.invoke_virtual(b2, get_ref, &[], Some(r2));
        body.ret(None);
        body.finish();
    }
    b.add_entry_point(main);

    BoxFixture {
        program: b.build(),
        main,
        box_class,
        set,
        get,
        r1,
        r2,
        o1_ty: object_ty,
    }
}
