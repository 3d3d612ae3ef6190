//! `swc-designer find` subcommand

use std::path::PathBuf;

use clap::Args;

use super::open_workspace;

/// Show the kind and owning module of an element
#[derive(Debug, Args)]
pub struct FindCommand {
    /// Master descriptor (or single-file project)
    pub master: PathBuf,

    /// Element UID
    pub uid: String,
}

impl FindCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let workspace = open_workspace(&self.master)?;
        let snapshot = workspace.build();
        let project = &snapshot.project;

        let Some(element) = project.element(&self.uid) else {
            anyhow::bail!("no element with UID '{}' in the merged project", self.uid);
        };

        let owner = project
            .owner(&self.uid)
            .map(|o| o.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!("{} '{}' ({})", element.kind(), element.name(), element.uid());
        println!("declared in {owner}");
        if let Some(reason) = project.degradation(&self.uid) {
            println!("excluded from generation: {reason:?}");
        }
        Ok(())
    }
}
