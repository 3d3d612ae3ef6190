//! Error types for code generation

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::model::Uid;

/// Malformed preserved-region markers in one text
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum PreserveError {
    #[error("line {line}: BEGIN '{tag}' inside open region '{open}'")]
    NestedBegin {
        line: usize,
        tag: String,
        open: String,
    },

    #[error("line {line}: END '{tag}' without a matching BEGIN")]
    UnmatchedEnd { line: usize, tag: String },

    #[error("line {line}: END '{tag}' closes region '{open}'")]
    MismatchedEnd {
        line: usize,
        tag: String,
        open: String,
    },

    #[error("line {line}: region '{tag}' is never closed")]
    Unterminated { line: usize, tag: String },

    #[error("line {line}: region '{tag}' appears more than once")]
    DuplicateTag { line: usize, tag: String },
}

impl PreserveError {
    pub fn tag(&self) -> &str {
        match self {
            Self::NestedBegin { tag, .. }
            | Self::UnmatchedEnd { tag, .. }
            | Self::MismatchedEnd { tag, .. }
            | Self::Unterminated { tag, .. }
            | Self::DuplicateTag { tag, .. } => tag,
        }
    }
}

/// Failure to produce one artifact (or the output directory)
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Malformed markers in {path}: {source}")]
    MalformedMarkers {
        path: PathBuf,
        #[source]
        source: PreserveError,
    },

    #[error("Generated scaffolding for {file} has malformed markers: {source}")]
    Scaffold {
        file: String,
        #[source]
        source: PreserveError,
    },

    #[error("{file} would be generated for more than one component ({})", join_uids(.components))]
    NameCollision { file: String, components: Vec<Uid> },

    #[error("'{0}' is not a plain file name")]
    InvalidFileName(String),

    #[error("Formatting failed: {0}")]
    Format(#[from] std::fmt::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn join_uids(uids: &[Uid]) -> String {
    uids.iter().map(Uid::as_str).collect::<Vec<_>>().join(", ")
}

impl GenerateError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
