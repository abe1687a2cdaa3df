//! Analysis Options
//!
//! Typed options for one analysis run. The recognized string forms mirror
//! the CLI surface (`cs=2-obj`, `merge-string-objects`, ...); parsing errors
//! are configuration errors and fatal at start-up.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::AnalysisError;

/// Context-sensitivity policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContextPolicy {
    /// Context-insensitive baseline.
    Insensitive,
    /// k-limiting call-site sensitivity.
    CallSite(u8),
    /// k-limiting object sensitivity.
    Object(u8),
    /// k-limiting type sensitivity.
    Type(u8),
    /// Object contexts for instance calls, call-site contexts for static
    /// calls, k = 1 each.
    Hybrid,
}

impl Default for ContextPolicy {
    fn default() -> Self {
        ContextPolicy::Insensitive
    }
}

impl ContextPolicy {
    /// Parse the `cs` option value: `ci`, `k-call`, `k-obj`, `k-type`
    /// (k ∈ 1..=9) or `hybrid`.
    pub fn parse(value: &str) -> Result<Self, AnalysisError> {
        if value == "ci" {
            return Ok(ContextPolicy::Insensitive);
        }
        if value == "hybrid" {
            return Ok(ContextPolicy::Hybrid);
        }
        if let Some((k, kind)) = value.split_once('-') {
            if let Ok(k) = k.parse::<u8>() {
                if (1..=9).contains(&k) {
                    match kind {
                        "call" => return Ok(ContextPolicy::CallSite(k)),
                        "obj" => return Ok(ContextPolicy::Object(k)),
                        "type" => return Ok(ContextPolicy::Type(k)),
                        _ => {}
                    }
                }
            }
        }
        Err(AnalysisError::Config(format!(
            "unknown context-sensitivity policy: {value}"
        )))
    }

    /// Context depth limit of this policy.
    pub fn depth(&self) -> u8 {
        match self {
            ContextPolicy::Insensitive => 0,
            ContextPolicy::CallSite(k) | ContextPolicy::Object(k) | ContextPolicy::Type(k) => *k,
            ContextPolicy::Hybrid => 1,
        }
    }
}

/// Options for one pointer-analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub cs: ContextPolicy,
    /// Restrict reachability to application classes.
    pub only_app: bool,
    /// Merge all string constants into one object.
    pub merge_string_objects: bool,
    /// Merge string-builder allocations by type.
    pub merge_string_builders: bool,
    /// Merge exception allocations by type.
    pub merge_exception_objects: bool,
    /// Dump context-sensitive points-to sets.
    pub dump: bool,
    /// Dump context-insensitive variable points-to sets.
    pub dump_ci: bool,
    /// Directory dump files are written to.
    pub output_dir: PathBuf,
    /// Compare the result against a previously dumped file.
    pub expected_file: Option<PathBuf>,
    /// Taint source/sink specification; enables the taint plugin.
    pub taint_config: Option<PathBuf>,
    /// Additional plug-in descriptors. Built-in names are validated at
    /// start-up; embedder plug-ins are registered through
    /// `Solver::register_plugin` instead.
    pub plugins: Vec<String>,
    /// Wall-clock limit in seconds; 0 disables the limit.
    pub time_limit: u64,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            cs: ContextPolicy::Insensitive,
            only_app: false,
            merge_string_objects: false,
            merge_string_builders: false,
            merge_exception_objects: false,
            dump: false,
            dump_ci: false,
            output_dir: PathBuf::from("."),
            expected_file: None,
            taint_config: None,
            plugins: Vec::new(),
            time_limit: 0,
        }
    }
}

impl AnalysisOptions {
    pub fn with_cs(value: &str) -> Result<Self, AnalysisError> {
        Ok(Self {
            cs: ContextPolicy::parse(value)?,
            ..Self::default()
        })
    }
}
