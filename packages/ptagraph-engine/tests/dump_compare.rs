//! Dump format and comparison mode.

mod common;

use std::fs;

use common::{box_fixture, solve};
use ptagraph_engine::{AnalysisError, AnalysisOptions, Solver};

const SEP: &str = " -> ";

#[test]
fn test_dump_has_sorted_sections() {
    let fixture = box_fixture();
    let out_dir = tempfile::tempdir().unwrap();
    let options = AnalysisOptions {
        dump: true,
        dump_ci: true,
        output_dir: out_dir.path().to_path_buf(),
        ..AnalysisOptions::default()
    };
    solve(&fixture.program, options);

    let text = fs::read_to_string(out_dir.path().join("pta-results.txt")).unwrap();
    for header in [
        "Points-to sets of all variables",
        "Points-to sets of all static fields",
        "Points-to sets of all instance fields",
        "Points-to sets of all array indexes",
    ] {
        assert!(text.contains(header), "missing section: {header}");
    }

    // lines within each section are sorted by pointer textual form
    let mut section_lines: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.contains(SEP) {
            section_lines.push(line.split_once(SEP).unwrap().0);
        } else {
            let mut sorted = section_lines.clone();
            sorted.sort_unstable();
            assert_eq!(section_lines, sorted);
            section_lines.clear();
        }
    }

    // the separator never occurs inside pointer forms
    for line in text.lines() {
        if line.contains(SEP) {
            assert_eq!(line.matches(SEP).count(), 1, "ambiguous line: {line}");
        }
    }

    let ci_text = fs::read_to_string(out_dir.path().join("pta-ci-results.txt")).unwrap();
    assert!(ci_text.contains("/r1:"));
}

#[test]
fn test_dump_then_compare_round_trips() {
    let fixture = box_fixture();
    let out_dir = tempfile::tempdir().unwrap();
    let options = AnalysisOptions {
        dump: true,
        output_dir: out_dir.path().to_path_buf(),
        ..AnalysisOptions::default()
    };
    solve(&fixture.program, options);

    let compare = AnalysisOptions {
        expected_file: Some(out_dir.path().join("pta-results.txt")),
        ..AnalysisOptions::default()
    };
    let outcome = Solver::new(&fixture.program, compare).solve();
    assert!(outcome.is_ok(), "round trip produced mismatches");
}

/// Removing one line from the expected file yields exactly one mismatch
/// with `expected: null`.
#[test]
fn test_one_missing_line_is_one_mismatch() {
    let fixture = box_fixture();
    let out_dir = tempfile::tempdir().unwrap();
    let options = AnalysisOptions {
        dump: true,
        output_dir: out_dir.path().to_path_buf(),
        ..AnalysisOptions::default()
    };
    solve(&fixture.program, options);

    let path = out_dir.path().join("pta-results.txt");
    let text = fs::read_to_string(&path).unwrap();
    let victim = text
        .lines()
        .find(|l| l.contains(SEP))
        .expect("no pointer lines in dump")
        .to_string();
    let trimmed: String = text
        .lines()
        .filter(|l| *l != victim)
        .map(|l| format!("{l}\n"))
        .collect();
    fs::write(&path, trimmed).unwrap();

    let compare = AnalysisOptions {
        expected_file: Some(path),
        ..AnalysisOptions::default()
    };
    let err = Solver::new(&fixture.program, compare).solve().unwrap_err();
    match err {
        AnalysisError::ComparisonMismatch(mismatches) => {
            assert_eq!(mismatches.len(), 1);
            let mismatch = &mismatches[0];
            assert_eq!(mismatch.pointer, victim.split_once(SEP).unwrap().0);
            assert_eq!(mismatch.expected, None);
            assert!(mismatch.given.is_some());
            assert!(mismatch.to_string().contains("expected: null"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_altered_set_is_reported_with_both_sides() {
    let fixture = box_fixture();
    let out_dir = tempfile::tempdir().unwrap();
    let options = AnalysisOptions {
        dump: true,
        output_dir: out_dir.path().to_path_buf(),
        ..AnalysisOptions::default()
    };
    solve(&fixture.program, options);

    let path = out_dir.path().join("pta-results.txt");
    let text = fs::read_to_string(&path).unwrap();
    // corrupt the first non-empty points-to set
    let altered = text.replacen("[[]", "[[bogus]", 1);
    assert_ne!(text, altered, "expected a context-qualified object to alter");
    fs::write(&path, altered).unwrap();

    let compare = AnalysisOptions {
        expected_file: Some(path),
        ..AnalysisOptions::default()
    };
    let err = Solver::new(&fixture.program, compare).solve().unwrap_err();
    match err {
        AnalysisError::ComparisonMismatch(mismatches) => {
            assert!(!mismatches.is_empty());
            assert!(mismatches.iter().all(|m| m.given.is_some()));
            assert!(mismatches.iter().any(|m| m.expected.is_some()));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unknown_cs_option_is_config_error() {
    let err = AnalysisOptions::with_cs("9-cfa").unwrap_err();
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_unknown_plugin_descriptor_is_config_error() {
    let fixture = box_fixture();
    let options = AnalysisOptions {
        plugins: vec!["points-to-profiler".to_string()],
        ..AnalysisOptions::default()
    };
    let err = Solver::new(&fixture.program, options).solve().unwrap_err();
    assert_eq!(err.exit_code(), 2);
    assert!(err.to_string().contains("points-to-profiler"));
}
