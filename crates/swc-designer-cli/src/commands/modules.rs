//! `swc-designer modules` subcommand

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use super::open_workspace;

/// List the modules of a project, or enable/disable one
#[derive(Debug, Args)]
pub struct ModulesCommand {
    /// Master descriptor
    pub master: PathBuf,

    /// Enable the named module and save the master
    #[arg(long, value_name = "NAME", conflicts_with = "disable")]
    pub enable: Option<String>,

    /// Disable the named module and save the master
    #[arg(long, value_name = "NAME")]
    pub disable: Option<String>,
}

impl ModulesCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let mut workspace = open_workspace(&self.master)?;

        let toggle = match (self.enable, self.disable) {
            (Some(name), _) => Some((name, true)),
            (None, Some(name)) => Some((name, false)),
            (None, None) => None,
        };
        if let Some((name, enabled)) = toggle {
            if workspace.is_single_file() {
                anyhow::bail!("a single-file project has no module list to edit");
            }
            workspace.set_module_enabled(&name, enabled)?;
            workspace
                .save_master()
                .with_context(|| format!("saving {}", workspace.master_path().display()))?;
        }

        for (reference, entry) in workspace.modules() {
            let state = match entry.map(|e| &e.state) {
                Some(Ok(loaded)) => format!("{} elements", loaded.resolved.element_count()),
                Some(Err(e)) => format!("not loaded: {e}"),
                None => "not loaded".to_string(),
            };
            println!(
                "[{}] {:<24} {:<32} {}",
                if reference.enabled { "x" } else { " " },
                reference.name,
                reference.path,
                state
            );
        }
        Ok(())
    }
}
