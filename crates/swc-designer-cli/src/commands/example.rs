//! `swc-designer example` subcommand

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use swc_designer_core::project::create_example_workspace;

/// Write the example multi-module project into a directory
#[derive(Debug, Args)]
pub struct ExampleCommand {
    /// Target directory (created if missing)
    pub dir: PathBuf,
}

impl ExampleCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let master = create_example_workspace(&self.dir)
            .with_context(|| format!("writing example project to {}", self.dir.display()))?;
        println!("Example project written: {}", master.display());
        Ok(())
    }
}
