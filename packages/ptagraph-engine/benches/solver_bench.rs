//! Solver throughput over synthetic call chains.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ptagraph_engine::ir::{names, Program, ProgramBuilder};
use ptagraph_engine::{AnalysisOptions, Solver};

/// A chain of `depth` box-like classes, each storing into the next:
/// stresses field propagation and virtual dispatch.
fn chain_program(depth: usize) -> Program {
    let mut b = ProgramBuilder::new();
    let object = b.class_by_name(names::OBJECT).unwrap();
    let object_ty = b.class_type(object);
    let void = b.primitive("void");

    let mut refs = Vec::new();
    for i in 0..depth {
        let class = b.add_class(&format!("Node{i}"), None, true);
        let class_ty = b.class_type(class);
        let f = b.add_field(class, "next", object_ty, false);
        let set = b.add_method(class, "set", &[object_ty], void, false);
        {
            let mut body = b.body(set);
            let this = body.this();
            let v = body.param("v", object_ty);
            body.store_field(this, f, v);
            body.ret(None);
            body.finish();
        }
        let get = b.add_method(class, "get", &[], object_ty, false);
        {
            let mut body = b.body(get);
            let this = body.this();
            let out = body.var("out", object_ty);
            body.load_field(out, this, f);
            body.ret(Some(out));
            body.finish();
        }
        let set_ref = b.method_ref(class, "set", &[object_ty], void);
        let get_ref = b.method_ref(class, "get", &[], object_ty);
        refs.push((class_ty, set_ref, get_ref));
    }

    let main_class = b.add_class("Main", None, true);
    let main = b.add_method(main_class, "main", &[], void, true);
    {
        let mut body = b.body(main);
        let seed = body.var("seed", object_ty);
        body.new_object(seed, object_ty);
        let mut prev = seed;
        for (i, &(class_ty, set_ref, get_ref)) in refs.iter().enumerate() {
            let node = body.var(&format!("n{i}"), class_ty);
            body.new_object(node, class_ty);
            body.invoke_virtual(node, set_ref, &[prev], None);
            let out = body.var(&format!("o{i}"), object_ty);
            body.invoke_virtual(node, get_ref, &[], Some(out));
            prev = out;
        }
        body.ret(None);
        body.finish();
    }
    b.add_entry_point(main);
    b.build()
}

fn bench_solver(c: &mut Criterion) {
    let mut group = c.benchmark_group("solver");
    for depth in [16, 64, 256] {
        let program = chain_program(depth);
        for cs in ["ci", "2-obj"] {
            group.bench_with_input(
                BenchmarkId::new(cs, depth),
                &program,
                |bencher, program| {
                    bencher.iter(|| {
                        let options = AnalysisOptions::with_cs(cs).unwrap();
                        let result = Solver::new(program, options).solve().unwrap();
                        black_box(result.reachable_methods().len())
                    });
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_solver);
criterion_main!(benches);
