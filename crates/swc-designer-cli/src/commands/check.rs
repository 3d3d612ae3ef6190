//! `swc-designer check` subcommand

use std::path::PathBuf;

use clap::Args;

use super::{enforce_strict, open_workspace, print_problems};

/// Load and merge a project, printing load errors and merge issues
#[derive(Debug, Args)]
pub struct CheckCommand {
    /// Master descriptor (or single-file project)
    pub master: PathBuf,

    /// Exit with an error when any issue is found
    #[arg(long)]
    pub strict: bool,
}

impl CheckCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let workspace = open_workspace(&self.master)?;
        let snapshot = workspace.build();
        let problems = print_problems(&snapshot);

        let project = &snapshot.project;
        println!(
            "{}: {} modules, {} elements, {} degraded, {} problem(s)",
            project.name(),
            workspace.master().modules.len(),
            project.element_count(),
            project.degraded_count(),
            problems
        );

        enforce_strict(self.strict, problems)
    }
}
