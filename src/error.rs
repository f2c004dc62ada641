use std::fmt;

use thiserror::Error;

use crate::data::model::TableError;

// ---------------------------------------------------------------------------
// Stage – where in a dataset pipeline an error was raised
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Clean,
    Encode,
    Target,
    Split,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Clean => "clean",
            Stage::Encode => "encode",
            Stage::Target => "target",
            Stage::Split => "split",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// PrepError
// ---------------------------------------------------------------------------

/// Every failure a dataset pipeline can report. All of them abort the run for
/// that dataset.
#[derive(Error, Debug)]
pub enum PrepError {
    #[error("failed to load '{source_name}': {cause:#}")]
    Load {
        source_name: String,
        cause: anyhow::Error,
    },

    #[error("[{stage}] column '{column}' not found")]
    Schema { stage: Stage, column: String },

    #[error("[target] column '{column}': {reason}")]
    Target { column: String, reason: String },

    #[error("[split] {reason}")]
    Split { reason: String },

    #[error("invalid configuration: {reason}")]
    Config { reason: String },

    #[error(transparent)]
    Table(#[from] TableError),
}

impl PrepError {
    pub fn schema(stage: Stage, column: impl Into<String>) -> Self {
        PrepError::Schema {
            stage,
            column: column.into(),
        }
    }

    pub fn target(column: impl Into<String>, reason: impl Into<String>) -> Self {
        PrepError::Target {
            column: column.into(),
            reason: reason.into(),
        }
    }

    pub fn split(reason: impl Into<String>) -> Self {
        PrepError::Split {
            reason: reason.into(),
        }
    }

    /// The stage this error belongs to.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PrepError::Load { .. } => Some(Stage::Load),
            PrepError::Schema { stage, .. } => Some(*stage),
            PrepError::Target { .. } => Some(Stage::Target),
            PrepError::Split { .. } => Some(Stage::Split),
            PrepError::Config { .. } | PrepError::Table(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PrepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_names_stage_and_column() {
        let err = PrepError::schema(Stage::Clean, "unitid");
        assert_eq!(err.to_string(), "[clean] column 'unitid' not found");
        assert_eq!(err.stage(), Some(Stage::Clean));
    }

    #[test]
    fn load_error_includes_cause_chain() {
        let cause = anyhow::anyhow!("no such file").context("opening CSV");
        let err = PrepError::Load {
            source_name: "missing.csv".into(),
            cause,
        };
        let msg = err.to_string();
        assert!(msg.contains("missing.csv"));
        assert!(msg.contains("opening CSV"));
        assert!(msg.contains("no such file"));
    }
}
