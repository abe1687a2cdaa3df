//! Error types for the analysis engine.

use thiserror::Error;

/// One comparison mismatch: a pointer whose given points-to set differs from
/// the expected file. `None` renders as `null` (absent side).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub pointer: String,
    pub expected: Option<String>,
    pub given: Option<String>,
}

impl std::fmt::Display for Mismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, expected: {}, given: {}",
            self.pointer,
            self.expected.as_deref().unwrap_or("null"),
            self.given.as_deref().unwrap_or("null")
        )
    }
}

fn join_mismatches(mismatches: &[Mismatch]) -> String {
    mismatches
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Main error type of the engine.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Missing class, unknown option value; fatal at start-up.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A plug-in callback failed; wrapped with the plug-in identity.
    #[error("plugin {plugin} failed: {source}")]
    Plugin {
        plugin: &'static str,
        #[source]
        source: Box<AnalysisError>,
    },

    /// Comparison mode found differences.
    #[error("mismatches of points-to set\n{}", join_mismatches(.0))]
    ComparisonMismatch(Vec<Mismatch>),

    #[error("internal inconsistency: {0}")]
    Internal(String),
}

impl AnalysisError {
    pub fn config(msg: impl Into<String>) -> Self {
        AnalysisError::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AnalysisError::Internal(msg.into())
    }

    pub fn in_plugin(plugin: &'static str, source: AnalysisError) -> Self {
        AnalysisError::Plugin {
            plugin,
            source: Box::new(source),
        }
    }

    /// Process exit code for this error: 1 analysis mismatch,
    /// 2 configuration error, 3 internal inconsistency.
    pub fn exit_code(&self) -> i32 {
        match self {
            AnalysisError::ComparisonMismatch(_) => 1,
            AnalysisError::Config(_) | AnalysisError::Io(_) => 2,
            AnalysisError::Plugin { source, .. } => source.exit_code().max(3),
            AnalysisError::Internal(_) => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_renders_null_sides() {
        let m = Mismatch {
            pointer: "p".to_string(),
            expected: None,
            given: Some("[o1]".to_string()),
        };
        assert_eq!(m.to_string(), "p, expected: null, given: [o1]");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(AnalysisError::config("x").exit_code(), 2);
        assert_eq!(AnalysisError::internal("x").exit_code(), 3);
        assert_eq!(
            AnalysisError::ComparisonMismatch(Vec::new()).exit_code(),
            1
        );
        let wrapped = AnalysisError::in_plugin("taint", AnalysisError::config("bad file"));
        assert_eq!(wrapped.exit_code(), 3);
    }
}
