//! Result processing: statistics, dumps, and comparison mode.
//!
//! Dump format, per pointer class: a `Points-to sets of all <desc>` header,
//! one `<pointer> -> [<obj>,...]` line per pointer sorted by textual form,
//! then a blank line. The ` -> ` separator never occurs inside pointer
//! forms. With taint enabled the dump ends with a
//! `Detected N taint flow(s):` section.
//!
//! Comparison mode re-reads such a file and reports a structured mismatch
//! list; absent sides render as `null`.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use rustc_hash::FxHashMap;
use tracing::{error, info};

use crate::errors::{AnalysisError, Mismatch, Result};
use crate::features::cs::{Pointer, PointerId};
use crate::features::heap::ObjId;
use crate::features::result::Render;
use crate::features::solver::SolverCore;
use crate::ir::VarId;

use super::taint::{TaintFlow, TAINT_RESULT_KEY};
use super::Plugin;

pub const RESULTS_FILE: &str = "pta-results.txt";
pub const CI_RESULTS_FILE: &str = "pta-ci-results.txt";

const HEADER: &str = "Points-to sets of all ";
/// Separator between pointer and points-to set.
const SEP: &str = " -> ";

#[derive(Default)]
pub struct ResultProcessor;

impl ResultProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Plugin for ResultProcessor {
    fn name(&self) -> &'static str {
        "result-processor"
    }

    fn on_finish(&mut self, solver: &mut SolverCore<'_>) -> Result<()> {
        log_statistics(solver);

        let options = solver.options().clone();
        let taint_enabled = options.taint_config.is_some();
        if options.dump {
            let path = options.output_dir.join(RESULTS_FILE);
            let content = render_dump(solver, taint_enabled);
            if let Err(e) = fs::write(&path, content) {
                error!(path = %path.display(), "failed to write dump: {e}");
            } else {
                info!(path = %path.display(), "dumped points-to sets (with contexts)");
            }
        }
        if options.dump_ci {
            let path = options.output_dir.join(CI_RESULTS_FILE);
            if let Err(e) = fs::write(&path, render_ci_dump(solver)) {
                error!(path = %path.display(), "failed to write dump: {e}");
            } else {
                info!(path = %path.display(), "dumped points-to sets (without contexts)");
            }
        }
        if let Some(expected) = &options.expected_file {
            if taint_enabled {
                compare_taint_flows(solver, expected)?;
            } else {
                compare_points_to(solver, expected)?;
            }
        }
        Ok(())
    }
}

fn pointers_by_class(solver: &SolverCore<'_>) -> [(Vec<PointerId>, &'static str); 4] {
    let mut vars = Vec::new();
    let mut statics = Vec::new();
    let mut fields = Vec::new();
    let mut arrays = Vec::new();
    for (id, pointer) in solver.csm().iter_pointers() {
        match pointer {
            Pointer::Var { .. } => vars.push(id),
            Pointer::StaticField { .. } => statics.push(id),
            Pointer::InstanceField { .. } => fields.push(id),
            Pointer::ArrayIndex { .. } => arrays.push(id),
        }
    }
    [
        (vars, "variables"),
        (statics, "static fields"),
        (fields, "instance fields"),
        (arrays, "array indexes"),
    ]
}

fn log_statistics(solver: &SolverCore<'_>) {
    let [(vars, _), (statics, _), (fields, _), (arrays, _)] = pointers_by_class(solver);

    // Context-insensitive views collapse contexts.
    let mut ci_vars: FxHashMap<VarId, Vec<ObjId>> = FxHashMap::default();
    for &p in &vars {
        if let Pointer::Var { var, .. } = solver.csm().pointer(p) {
            let objs = ci_vars.entry(var).or_default();
            for cs_obj in solver.pts_of(p).iter() {
                objs.push(solver.csm().cs_obj(cs_obj).obj);
            }
        }
    }
    let vpt_insens: usize = ci_vars
        .values()
        .map(|objs| {
            let mut objs = objs.clone();
            objs.sort_unstable();
            objs.dedup();
            objs.len()
        })
        .sum();
    let sum_pts = |pointers: &[PointerId]| -> usize {
        pointers.iter().map(|&p| solver.pts_of(p).len()).sum()
    };
    let ci_cg = solver.call_graph().project(solver.csm());

    info!("-------------- Pointer analysis statistics: --------------");
    info!(
        "{:<30}{} (insens) / {} (sens)",
        "#var pointers:",
        ci_vars.len(),
        vars.len()
    );
    info!(
        "{:<30}{} (insens) / {} (sens)",
        "#objects:",
        solver.heap().len(),
        solver.csm().cs_objs_len()
    );
    info!(
        "{:<30}{} (insens) / {} (sens)",
        "#var points-to:",
        vpt_insens,
        sum_pts(&vars)
    );
    info!("{:<30}{} (sens)", "#static field points-to:", sum_pts(&statics));
    info!("{:<30}{} (sens)", "#instance field points-to:", sum_pts(&fields));
    info!("{:<30}{} (sens)", "#array points-to:", sum_pts(&arrays));
    info!(
        "{:<30}{} (insens) / {} (sens)",
        "#reachable methods:",
        ci_cg.methods().len(),
        solver.call_graph().reachable_methods().len()
    );
    info!(
        "{:<30}{} (insens) / {} (sens)",
        "#call graph edges:",
        ci_cg.edges().len(),
        solver.call_graph().edges().len()
    );
    info!("----------------------------------------");
}

fn dump_pointers(out: &mut String, render: &Render<'_>, pointers: &[PointerId], desc: &str) {
    let _ = writeln!(out, "{HEADER}{desc}");
    let mut lines: Vec<(String, PointerId)> = pointers
        .iter()
        .map(|&p| (render.pointer(p), p))
        .collect();
    lines.sort_by(|a, b| a.0.cmp(&b.0));
    for (text, p) in lines {
        let _ = writeln!(out, "{}{}{}", text, SEP, render.pts_of(p));
    }
    let _ = writeln!(out);
}

fn render_dump(solver: &SolverCore<'_>, taint_enabled: bool) -> String {
    let render = solver.render();
    let mut out = String::new();
    for (pointers, desc) in pointers_by_class(solver) {
        dump_pointers(&mut out, &render, &pointers, desc);
    }
    if taint_enabled {
        let flows = solver
            .named_result::<Vec<TaintFlow>>(TAINT_RESULT_KEY)
            .cloned()
            .unwrap_or_default();
        let _ = writeln!(out, "Detected {} taint flow(s):", flows.len());
        for flow in &flows {
            let _ = writeln!(out, "{}", flow.render(render.program));
        }
        let _ = writeln!(out);
    }
    out
}

/// Context-collapsed dump: per variable, its merged points-to set.
fn render_ci_dump(solver: &SolverCore<'_>) -> String {
    let render = solver.render();
    let mut by_var: FxHashMap<VarId, Vec<ObjId>> = FxHashMap::default();
    for (id, pointer) in solver.csm().iter_pointers() {
        if let Pointer::Var { var, .. } = pointer {
            let objs = by_var.entry(var).or_default();
            for cs_obj in solver.pts_of(id).iter() {
                objs.push(solver.csm().cs_obj(cs_obj).obj);
            }
        }
    }
    let program = render.program;
    let mut entries: Vec<(String, Vec<ObjId>)> = by_var
        .into_iter()
        .map(|(var, mut objs)| {
            objs.sort_unstable();
            objs.dedup();
            let data = program.var(var);
            let text = format!("{}/{}", program.method_signature(data.method), data.name);
            (text, objs)
        })
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let mut out = String::new();
    for (text, objs) in entries {
        if objs.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{}:", text);
        for obj in objs {
            let _ = writeln!(out, "    {}", render.obj(obj));
        }
    }
    out
}

fn compare_points_to(solver: &SolverCore<'_>, expected: &Path) -> Result<()> {
    info!(path = %expected.display(), "comparing points-to set");
    let text = fs::read_to_string(expected).map_err(|e| {
        AnalysisError::config(format!(
            "failed to read points-to set from {}: {e}",
            expected.display()
        ))
    })?;
    let mut expected_sets: FxHashMap<String, String> = FxHashMap::default();
    let mut expected_order: Vec<String> = Vec::new();
    for line in text.lines() {
        if let Some((pointer, set)) = line.split_once(SEP) {
            if !expected_sets.contains_key(pointer) {
                expected_order.push(pointer.to_string());
            }
            expected_sets.insert(pointer.to_string(), set.to_string());
        }
    }

    let render = solver.render();
    let mut given: Vec<(String, PointerId)> = pointers_by_class(solver)
        .iter()
        .flat_map(|(pointers, _)| pointers.iter().map(|&p| (render.pointer(p), p)))
        .collect();
    given.sort_by(|a, b| a.0.cmp(&b.0));

    let mut mismatches = Vec::new();
    for (text, p) in &given {
        let given_set = render.pts_of(*p);
        if expected_sets.get(text) != Some(&given_set) {
            mismatches.push(Mismatch {
                pointer: text.clone(),
                expected: expected_sets.get(text).cloned(),
                given: Some(given_set),
            });
        }
    }
    let given_keys: FxHashMap<&str, ()> = given.iter().map(|(t, _)| (t.as_str(), ())).collect();
    for pointer in &expected_order {
        if !given_keys.contains_key(pointer.as_str()) {
            mismatches.push(Mismatch {
                pointer: pointer.clone(),
                expected: expected_sets.get(pointer).cloned(),
                given: None,
            });
        }
    }
    if mismatches.is_empty() {
        Ok(())
    } else {
        Err(AnalysisError::ComparisonMismatch(mismatches))
    }
}

fn compare_taint_flows(solver: &SolverCore<'_>, expected: &Path) -> Result<()> {
    info!(path = %expected.display(), "comparing taint flows");
    let text = fs::read_to_string(expected).map_err(|e| {
        AnalysisError::config(format!(
            "failed to read taint flows from {}: {e}",
            expected.display()
        ))
    })?;
    let expected_flows: Vec<&str> = text
        .lines()
        .filter(|l| l.starts_with("TaintFlow{") && l.contains(SEP))
        .collect();

    let program = solver.render().program;
    let given_flows: Vec<String> = solver
        .named_result::<Vec<TaintFlow>>(TAINT_RESULT_KEY)
        .map(|flows| flows.iter().map(|f| f.render(program)).collect())
        .unwrap_or_default();

    let mut mismatches = Vec::new();
    for flow in &given_flows {
        if !expected_flows.contains(&flow.as_str()) {
            mismatches.push(Mismatch {
                pointer: flow.clone(),
                expected: None,
                given: Some(flow.clone()),
            });
        }
    }
    for flow in &expected_flows {
        if !given_flows.iter().any(|g| g == flow) {
            mismatches.push(Mismatch {
                pointer: flow.to_string(),
                expected: Some(flow.to_string()),
                given: None,
            });
        }
    }
    if mismatches.is_empty() {
        Ok(())
    } else {
        Err(AnalysisError::ComparisonMismatch(mismatches))
    }
}
