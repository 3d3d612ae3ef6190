//! Error types for descriptor loading and workspace edits

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading one descriptor file
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("Descriptor not found: {0}")]
    NotFound(PathBuf),

    #[error("I/O error reading {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Malformed descriptor {path}: {message}")]
    Malformed { path: PathBuf, message: String },

    #[error("Descriptor {0} has no top-level name")]
    MissingName(PathBuf),

    #[error("Include error: circular module reference {}", format_chain(.0))]
    CyclicModuleReference(Vec<PathBuf>),

    #[error("Include error: maximum depth ({0}) exceeded")]
    IncludeDepthExceeded(usize),
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Errors from editing or saving a multi-module workspace
#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Unknown module: {0}")]
    UnknownModule(String),

    #[error("Module '{0}' already exists")]
    ModuleExists(String),

    #[error("Module '{0}' is not loaded")]
    ModuleNotLoaded(String),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
