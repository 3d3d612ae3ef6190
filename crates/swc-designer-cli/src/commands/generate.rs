//! `swc-designer generate` subcommand
//!
//! ```text
//! swc-designer generate master.yaml              # into generator.output_dir
//! swc-designer generate master.yaml -o out/      # custom output directory
//! swc-designer generate master.yaml --dry-run    # report, don't write
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use swc_designer_core::codegen::{CodeGenerator, WriteStatus};

use super::{enforce_strict, open_workspace, print_problems};

/// Generate C skeletons for every generation-eligible component
#[derive(Debug, Args)]
pub struct GenerateCommand {
    /// Master descriptor (or single-file project)
    pub master: PathBuf,

    /// Output directory (defaults to the project's generator.output_dir)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Reconcile against existing files and report, without writing
    #[arg(long)]
    pub dry_run: bool,

    /// Refuse to generate when the project has issues
    #[arg(long)]
    pub strict: bool,
}

impl GenerateCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let workspace = open_workspace(&self.master)?;
        let snapshot = workspace.build();
        let problems = print_problems(&snapshot);
        enforce_strict(self.strict, problems)?;

        let out_dir = self.output.unwrap_or_else(|| workspace.output_dir());
        tracing::debug!("Output directory: {}", out_dir.display());
        let generator = CodeGenerator::new(workspace.settings().clone());
        let result = if self.dry_run {
            generator.dry_run(&snapshot.project, &out_dir)
        } else {
            generator.generate(&snapshot.project, &out_dir)
        };
        let report = result.with_context(|| format!("generating into {}", out_dir.display()))?;

        for artifact in report.artifacts.iter() {
            let label = match artifact.status {
                WriteStatus::Created => "created",
                WriteStatus::Updated => "updated",
                WriteStatus::Unchanged => "unchanged",
            };
            println!("{:>9} {}", label, artifact.path.display());
            for orphan in artifact.orphans.iter() {
                match &artifact.sidecar {
                    Some(sidecar) => println!(
                        "          orphaned section '{}' saved to {}",
                        orphan.tag,
                        sidecar.display()
                    ),
                    None => println!("          orphaned section '{}':\n{}", orphan.tag, orphan.body),
                }
            }
        }
        for retired in report.retired.iter() {
            let label = if retired.removed { "retired" } else { "stale" };
            match &retired.replaced_by {
                Some(next) => println!("{:>9} {} (now {})", label, retired.path.display(), next),
                None => println!("{:>9} {}", label, retired.path.display()),
            }
            for orphan in retired.orphans.iter() {
                match &retired.sidecar {
                    Some(sidecar) => println!(
                        "          orphaned section '{}' saved to {}",
                        orphan.tag,
                        sidecar.display()
                    ),
                    None => println!("          orphaned section '{}' left in place", orphan.tag),
                }
            }
        }
        for uid in report.skipped_components.iter() {
            println!("  skipped component {uid} (degraded)");
        }
        for failure in report.failures.iter() {
            println!("   failed {}: {}", failure.file_name, failure.error);
        }

        let counts = report.counts();
        println!(
            "{}{} created, {} updated, {} unchanged, {} retired, {} failed",
            if report.dry_run { "(dry run) " } else { "" },
            counts.created,
            counts.updated,
            counts.unchanged,
            counts.retired,
            counts.failed
        );

        if !report.is_success() {
            anyhow::bail!("{} artifact(s) could not be generated", counts.failed);
        }
        Ok(())
    }
}
