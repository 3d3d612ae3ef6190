//! C Code Generation
//!
//! Generates C skeletons from a [`UnifiedProject`]:
//!
//! | Artifact        | Content                                          |
//! |-----------------|--------------------------------------------------|
//! | `Std_Types.h`   | platform types, `Std_ReturnType`                 |
//! | `Rte_Type.h`    | implementation/application types, interfaces     |
//! | `<Swc>.h`       | runnable prototypes, server entry points         |
//! | `<Swc>.c`       | one stub per runnable and server operation       |
//! | `Rte_<Swc>.h`   | `Rte_Read`/`Rte_Write`/`Rte_Call` declarations   |
//!
//! Only generation-eligible elements are emitted. Hand-written code between
//! `USER CODE` markers is carried over by [`preserve::reconcile`], including
//! from the old files of a renamed component. Files of components that are
//! gone are retired, their user code reported as orphans.

mod c_types;
mod error;
pub mod preserve;
mod render;
mod stale;
mod writer;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Serialize;

pub use error::{GenerateError, PreserveError};
pub use render::{server_entry_name, tags, Artifact, ArtifactKind, Renderer, GENERATED_BY};
pub use stale::RetiredArtifact;
pub use writer::{sidecar_path, write_artifact, ArtifactOutcome, WriteOptions, WriteStatus};

use crate::model::Uid;
use crate::project::{GeneratorSettings, UnifiedProject};
use stale::{find_stale, retire, StaleFile};
use writer::write_artifact_over;

/// An artifact that could not be produced
#[derive(Debug)]
pub struct ArtifactFailure {
    pub file_name: String,
    pub error: GenerateError,
}

/// Outcome of one generation run
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub output_dir: PathBuf,
    pub dry_run: bool,
    pub artifacts: Vec<ArtifactOutcome>,
    /// Files of earlier runs that no component generates anymore
    pub retired: Vec<RetiredArtifact>,
    pub failures: Vec<ArtifactFailure>,
    /// Components left out because they are degraded
    pub skipped_components: Vec<Uid>,
}

/// Per-status counts, for summaries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportCounts {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub retired: usize,
    pub orphaned_sections: usize,
    pub failed: usize,
}

impl GenerationReport {
    pub fn counts(&self) -> ReportCounts {
        let mut counts = ReportCounts {
            retired: self.retired.len(),
            failed: self.failures.len(),
            ..ReportCounts::default()
        };
        for artifact in self.artifacts.iter() {
            match artifact.status {
                WriteStatus::Created => counts.created += 1,
                WriteStatus::Updated => counts.updated += 1,
                WriteStatus::Unchanged => counts.unchanged += 1,
            }
            counts.orphaned_sections += artifact.orphans.len();
        }
        counts.orphaned_sections += self.retired.iter().map(|r| r.orphans.len()).sum::<usize>();
        counts
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn artifact(&self, file_name: &str) -> Option<&ArtifactOutcome> {
        self.artifacts
            .iter()
            .find(|a| a.path.file_name().and_then(|n| n.to_str()) == Some(file_name))
    }

    pub fn retired_file(&self, file_name: &str) -> Option<&RetiredArtifact> {
        self.retired
            .iter()
            .find(|r| r.path.file_name().and_then(|n| n.to_str()) == Some(file_name))
    }
}

/// Drop artifacts that would share a file (or leave the output directory)
/// and report them. Returns the components that lost an artifact.
fn reject_unwritable(
    artifacts: &mut Vec<Artifact>,
    failures: &mut Vec<ArtifactFailure>,
) -> HashSet<Uid> {
    let mut owners: HashMap<&str, Vec<Option<&Uid>>> = HashMap::new();
    for artifact in artifacts.iter() {
        owners
            .entry(artifact.file_name.as_str())
            .or_default()
            .push(artifact.component.as_ref());
    }

    let mut rejected: HashSet<String> = HashSet::new();
    let mut lost = HashSet::new();
    for artifact in artifacts.iter() {
        let name = artifact.file_name.as_str();
        let sharing = &owners[name];
        let error = if sharing.len() > 1 {
            GenerateError::NameCollision {
                file: name.to_string(),
                components: sharing.iter().flatten().map(|uid| (*uid).clone()).collect(),
            }
        } else if Path::new(name).file_name().and_then(|n| n.to_str()) != Some(name) {
            GenerateError::InvalidFileName(name.to_string())
        } else {
            continue;
        };

        lost.extend(artifact.component.clone());
        if rejected.insert(name.to_string()) {
            tracing::warn!("Not generating {}: {}", name, error);
            failures.push(ArtifactFailure {
                file_name: name.to_string(),
                error,
            });
        }
    }

    artifacts.retain(|a| !rejected.contains(&a.file_name));
    lost
}

/// Code generator
#[derive(Debug, Clone, Default)]
pub struct CodeGenerator {
    settings: GeneratorSettings,
}

impl CodeGenerator {
    pub fn new(settings: GeneratorSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// Render every artifact without touching the file system
    pub fn render(&self, project: &UnifiedProject) -> Result<Vec<Artifact>, GenerateError> {
        Ok(Renderer::new(project, &self.settings).render_all()?)
    }

    /// Generate into `out_dir`.
    ///
    /// Only a failure to create or list `out_dir` is an error; a failing
    /// artifact is recorded in the report and the others are still written.
    pub fn generate(
        &self,
        project: &UnifiedProject,
        out_dir: &Path,
    ) -> Result<GenerationReport, GenerateError> {
        self.run(project, out_dir, false)
    }

    /// Render and reconcile against `out_dir`, reporting what `generate`
    /// would do
    pub fn dry_run(
        &self,
        project: &UnifiedProject,
        out_dir: &Path,
    ) -> Result<GenerationReport, GenerateError> {
        self.run(project, out_dir, true)
    }

    /// Component a stale file was generated for, if still in the project
    fn stale_owner(project: &UnifiedProject, file: &StaleFile) -> Option<Uid> {
        file.tagged_component().or_else(|| {
            let name = file.kind.component_name(&file.file_name)?;
            project
                .components()
                .iter()
                .find(|c| c.name == name)
                .map(|c| c.uid.clone())
        })
    }

    fn run(
        &self,
        project: &UnifiedProject,
        out_dir: &Path,
        dry_run: bool,
    ) -> Result<GenerationReport, GenerateError> {
        if !dry_run {
            std::fs::create_dir_all(out_dir).map_err(|e| GenerateError::io(out_dir, e))?;
        }

        let options = WriteOptions {
            orphan_sidecar: self.settings.orphan_sidecar,
            dry_run,
        };
        let mut report = GenerationReport {
            output_dir: out_dir.to_path_buf(),
            dry_run,
            skipped_components: project
                .components()
                .iter()
                .filter(|c| !project.is_generation_eligible(c.uid.as_str()))
                .map(|c| c.uid.clone())
                .collect(),
            ..GenerationReport::default()
        };

        for swc in project.components().iter() {
            if let Some(reason) = project.degradation(swc.uid.as_str()) {
                tracing::debug!("Skipping component '{}': {:?}", swc.name, reason);
            }
        }

        let mut artifacts = self.render(project)?;
        let current: HashSet<&str> = artifacts.iter().map(|a| a.file_name.as_str()).collect();
        let stale = find_stale(out_dir, &current, &mut report.failures)?;
        let blocked = reject_unwritable(&mut artifacts, &mut report.failures);

        // Stale files of renamed components feed their new artifacts
        let mut handover: HashMap<usize, &StaleFile> = HashMap::new();
        let mut leftover = Vec::new();
        for file in stale.iter() {
            let owner = Self::stale_owner(project, file);
            if let Some(uid) = &owner {
                let skipped = project.component(uid.as_str()).is_some()
                    && !project.is_generation_eligible(uid.as_str());
                if skipped || blocked.contains(uid) {
                    tracing::debug!("Keeping {} of component '{}'", file.path.display(), uid);
                    continue;
                }
                let successor = artifacts
                    .iter()
                    .position(|a| a.kind == file.kind && a.component.as_ref() == Some(uid))
                    .filter(|index| !handover.contains_key(index))
                    .filter(|&index| !out_dir.join(&artifacts[index].file_name).exists());
                if let Some(index) = successor {
                    handover.insert(index, file);
                    continue;
                }
            }
            leftover.push(file);
        }

        for (index, artifact) in artifacts.iter().enumerate() {
            let previous = handover.get(&index).copied();
            let source = previous.map(|f| (f.path.as_path(), f.content.as_str()));
            match write_artifact_over(out_dir, artifact, source, options) {
                Ok(outcome) => {
                    report.artifacts.push(outcome);
                    if let Some(old) = previous {
                        tracing::info!("{} continues as {}", old.file_name, artifact.file_name);
                        match retire(old, Some(artifact.file_name.clone()), Vec::new(), options) {
                            Ok(retired) => report.retired.push(retired),
                            Err(error) => report.failures.push(ArtifactFailure {
                                file_name: old.file_name.clone(),
                                error,
                            }),
                        }
                    }
                }
                Err(error) => {
                    tracing::warn!("Failed to generate {}: {}", artifact.file_name, error);
                    report.failures.push(ArtifactFailure {
                        file_name: artifact.file_name.clone(),
                        error,
                    });
                }
            }
        }

        for file in leftover {
            match retire(file, None, file.filled_regions(), options) {
                Ok(retired) => report.retired.push(retired),
                Err(error) => report.failures.push(ArtifactFailure {
                    file_name: file.file_name.clone(),
                    error,
                }),
            }
        }

        let counts = report.counts();
        tracing::info!(
            "Generated into {}: {} created, {} updated, {} unchanged, {} retired, {} failed",
            out_dir.display(),
            counts.created,
            counts.updated,
            counts.unchanged,
            counts.retired,
            counts.failed
        );
        Ok(report)
    }
}
