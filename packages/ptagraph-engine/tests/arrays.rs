//! Array semantics: index-insensitive aliasing, zero-sized allocations,
//! multi-dimensional chains.

mod common;

use common::{alloc_objs_of_type, solve};
use ptagraph_engine::ir::{names, Program, ProgramBuilder, TypeId, VarId};
use ptagraph_engine::AnalysisOptions;

/// The zero-sized-array container scenario:
///
/// ```text
/// class Container {
///     static A[] EMPTY;           // = new A[0] in <clinit>
///     A[] data;                   // = EMPTY in <init>
///     void setObj(A a) { data = new A[4]; data[i] = a; }
///     A getObj()       { return data[i]; }
/// }
/// main: ct1.setObj(o1); ct2.setObj(o2); res1 = ct1.getObj(); res2 = ct2.getObj();
/// ```
fn container_program() -> (Program, VarId, VarId, TypeId) {
    let mut b = ProgramBuilder::new();
    let void = b.primitive("void");
    let a_class = b.add_class("A", None, true);
    let a_ty = b.class_type(a_class);
    let a_arr_ty = b.array_of(a_ty);

    let container = b.add_class("Container", None, true);
    let container_ty = b.class_type(container);
    let empty_field = b.add_field(container, "EMPTY", a_arr_ty, true);
    let data_field = b.add_field(container, "data", a_arr_ty, false);

    let clinit = b.add_method(container, names::CLINIT, &[], void, true);
    {
        let mut body = b.body(clinit);
        let e = body.var("e", a_arr_ty);
        body.new_array(e, a_ty, &[Some(0)]);
        body.store_static(empty_field, e);
        body.ret(None);
        body.finish();
    }

    let init = b.add_method(container, names::INIT, &[], void, false);
    {
        let mut body = b.body(init);
        let this = body.this();
        let e = body.var("e", a_arr_ty);
        body.load_static(e, empty_field);
        body.store_field(this, data_field, e);
        body.ret(None);
        body.finish();
    }

    let set_obj = b.add_method(container, "setObj", &[a_ty], void, false);
    {
        let mut body = b.body(set_obj);
        let this = body.this();
        let a = body.param("a", a_ty);
        let fresh = body.var("fresh", a_arr_ty);
        let d = body.var("d", a_arr_ty);
        body.new_array(fresh, a_ty, &[Some(4)]);
        body.store_field(this, data_field, fresh);
        body.load_field(d, this, data_field);
        body.store_array(d, a);
        body.ret(None);
        body.finish();
    }

    let get_obj = b.add_method(container, "getObj", &[], a_ty, false);
    {
        let mut body = b.body(get_obj);
        let this = body.this();
        let d = body.var("d", a_arr_ty);
        let out = body.var("out", a_ty);
        body.load_field(d, this, data_field);
        body.load_array(out, d);
        body.ret(Some(out));
        body.finish();
    }

    let init_ref = b.method_ref(container, names::INIT, &[], void);
    let set_ref = b.method_ref(container, "setObj", &[a_ty], void);
    let get_ref = b.method_ref(container, "getObj", &[], a_ty);
    let main_class = b.add_class("Main", None, true);
    let main = b.add_method(main_class, "main", &[], void, true);
    let (res1, res2);
    {
        let mut body = b.body(main);
        let o1 = body.var("o1", a_ty);
        let o2 = body.var("o2", a_ty);
        let ct1 = body.var("ct1", container_ty);
        let ct2 = body.var("ct2", container_ty);
        res1 = body.var("res1", a_ty);
        res2 = body.var("res2", a_ty);
        body.new_object(o1, a_ty);
        body.new_object(o2, a_ty);
        body.new_object(ct1, container_ty);
        body.invoke_special(ct1, init_ref, &[], None);
        body.new_object(ct2, container_ty);
        body.invoke_special(ct2, init_ref, &[], None);
        body.invoke_virtual(ct1, set_ref, &[o1], None);
        body.invoke_virtual(ct2, set_ref, &[o2], None);
        body.invoke_virtual(ct1, get_ref, &[], Some(res1));
        body.invoke_virtual(ct2, get_ref, &[], Some(res2));
        body.ret(None);
        body.finish();
    }
    b.add_entry_point(main);
    (b.build(), res1, res2, a_ty)
}

/// Arrays are index-insensitive and the analysis is flow-insensitive, so
/// both containers observe both stored objects, under context
/// insensitivity and under 1-object alike.
#[test]
fn test_zero_sized_array_aliasing_ci() {
    let (program, res1, res2, a_ty) = container_program();
    let result = solve(&program, AnalysisOptions::default());
    let r1 = result.points_to_of_var(res1);
    let r2 = result.points_to_of_var(res2);
    assert_eq!(alloc_objs_of_type(&result, &r1, a_ty).len(), 2);
    assert_eq!(alloc_objs_of_type(&result, &r2, a_ty).len(), 2);
}

#[test]
fn test_zero_sized_array_aliasing_one_object() {
    let (program, res1, res2, a_ty) = container_program();
    let result = solve(&program, AnalysisOptions::with_cs("1-obj").unwrap());
    let r1 = result.points_to_of_var(res1);
    let r2 = result.points_to_of_var(res2);
    assert_eq!(alloc_objs_of_type(&result, &r1, a_ty).len(), 2);
    assert_eq!(alloc_objs_of_type(&result, &r2, a_ty).len(), 2);
}

/// A zero-length allocation still yields a live, queryable array-index
/// pointer.
#[test]
fn test_zero_length_array_index_pointer_exists() {
    let mut b = ProgramBuilder::new();
    let void = b.primitive("void");
    let a_class = b.add_class("A", None, true);
    let a_ty = b.class_type(a_class);
    let a_arr_ty = b.array_of(a_ty);

    let main_class = b.add_class("Main", None, true);
    let main = b.add_method(main_class, "main", &[], void, true);
    let out;
    {
        let mut body = b.body(main);
        let e = body.var("e", a_arr_ty);
        let v = body.var("v", a_ty);
        out = body.var("out", a_ty);
        body.new_array(e, a_ty, &[Some(0)]);
        body.new_object(v, a_ty);
        body.store_array(e, v);
        body.load_array(out, e);
        body.ret(None);
        body.finish();
    }
    b.add_entry_point(main);
    let program = b.build();

    let result = solve(&program, AnalysisOptions::default());
    assert_eq!(result.array_index_pointers().len(), 1);
    assert_eq!(result.points_to_of_var(out).len(), 1);
}

#[test]
fn test_multi_dimensional_array_chains() {
    let mut b = ProgramBuilder::new();
    let void = b.primitive("void");
    let a_class = b.add_class("A", None, true);
    let a_ty = b.class_type(a_class);
    let a_arr_ty = b.array_of(a_ty);
    let a_arr2_ty = b.array_of(a_arr_ty);

    let main_class = b.add_class("Main", None, true);
    let main = b.add_method(main_class, "main", &[], void, true);
    let (inner, elem);
    {
        let mut body = b.body(main);
        let grid = body.var("grid", a_arr2_ty);
        inner = body.var("inner", a_arr_ty);
        elem = body.var("elem", a_ty);
        body.new_array(grid, a_ty, &[Some(2), Some(3)]);
        body.load_array(inner, grid);
        body.load_array(elem, inner);
        body.ret(None);
        body.finish();
    }
    b.add_entry_point(main);
    let program = b.build();

    let result = solve(&program, AnalysisOptions::default());
    // grid[*] yields the inner array object; inner[*] holds nothing yet
    assert_eq!(result.points_to_of_var(inner).len(), 1);
    assert!(result.points_to_of_var(elem).is_empty());
}

#[test]
fn test_array_store_filters_by_component_type() {
    let mut b = ProgramBuilder::new();
    let object = b.class_by_name(names::OBJECT).unwrap();
    let object_ty = b.class_type(object);
    let void = b.primitive("void");
    let a_class = b.add_class("A", None, true);
    let a_ty = b.class_type(a_class);
    let a_arr_ty = b.array_of(a_ty);

    let main_class = b.add_class("Main", None, true);
    let main = b.add_method(main_class, "main", &[], void, true);
    let out;
    {
        let mut body = b.body(main);
        let arr = body.var("arr", a_arr_ty);
        let x = body.var("x", object_ty);
        out = body.var("out", a_ty);
        body.new_array(arr, a_ty, &[None]);
        // x holds a plain Object: not assignable into A[]
        body.new_object(x, object_ty);
        body.store_array(arr, x);
        body.load_array(out, arr);
        body.ret(None);
        body.finish();
    }
    b.add_entry_point(main);
    let program = b.build();

    let result = solve(&program, AnalysisOptions::default());
    assert!(result.points_to_of_var(out).is_empty());
}
