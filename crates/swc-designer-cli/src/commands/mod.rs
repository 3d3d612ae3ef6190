//! CLI Command Implementations

pub mod check;
pub mod example;
pub mod find;
pub mod generate;
pub mod modules;

use std::path::Path;

use anyhow::Context;
use swc_designer_core::project::{ProjectSnapshot, Workspace};

/// Open a master descriptor (or single-file project)
pub fn open_workspace(path: &Path) -> anyhow::Result<Workspace> {
    Workspace::open(path).with_context(|| format!("opening project {}", path.display()))
}

/// Print load errors and merge issues; returns how many there were
pub fn print_problems(snapshot: &ProjectSnapshot) -> usize {
    for failure in snapshot.load_errors.iter() {
        println!("error[load] {}: {}", failure.module, failure.error);
    }
    for issue in snapshot.issues.iter() {
        println!("warning[{}] {}", issue.code(), issue);
    }
    snapshot.load_errors.len() + snapshot.issues.len()
}

/// Fail in `--strict` mode when the build had problems
pub fn enforce_strict(strict: bool, problems: usize) -> anyhow::Result<()> {
    if strict && problems > 0 {
        anyhow::bail!("{problems} problem(s) found (--strict)");
    }
    Ok(())
}
