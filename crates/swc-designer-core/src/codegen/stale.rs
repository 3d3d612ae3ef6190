//! Artifacts left behind by earlier runs
//!
//! A component that was removed or renamed leaves its old files in the
//! output directory. Their preserved regions are either carried into the
//! renamed component's new artifact or reported as orphans, and the old
//! file is retired.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::error::GenerateError;
use super::preserve::{regions, Region};
use super::render::{tags, ArtifactKind, GENERATED_BY};
use super::writer::{append_orphans, sidecar_path, WriteOptions};
use super::ArtifactFailure;
use crate::model::Uid;

/// A generated file no artifact of the current run writes to
#[derive(Debug, Clone)]
pub(crate) struct StaleFile {
    pub path: PathBuf,
    pub file_name: String,
    pub kind: ArtifactKind,
    pub content: String,
    pub regions: Vec<Region>,
}

impl StaleFile {
    /// Component named by the file's `includes:`/`declarations:` region
    pub fn tagged_component(&self) -> Option<Uid> {
        self.regions.iter().find_map(|r| tags::component_of(&r.tag))
    }

    pub fn filled_regions(&self) -> Vec<Region> {
        self.regions
            .iter()
            .filter(|r| !r.body.trim().is_empty())
            .cloned()
            .collect()
    }
}

/// A stale file taken out of the output directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetiredArtifact {
    pub path: PathBuf,
    /// Artifact that took over its preserved regions
    pub replaced_by: Option<String>,
    /// Non-empty regions nothing took over
    pub orphans: Vec<Region>,
    /// Sidecar the orphans were appended to, if any
    pub sidecar: Option<PathBuf>,
    /// `false` in dry runs, and when orphans had no sidecar to go to
    pub removed: bool,
}

fn is_generated(content: &str) -> bool {
    content
        .lines()
        .take(12)
        .any(|line| line.contains(GENERATED_BY))
}

/// Generated per-component files in `dir` whose names are not in `current`.
///
/// A file that cannot be read or has malformed markers is recorded in
/// `failures` and left alone.
pub(crate) fn find_stale(
    dir: &Path,
    current: &HashSet<&str>,
    failures: &mut Vec<ArtifactFailure>,
) -> Result<Vec<StaleFile>, GenerateError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(GenerateError::io(dir, e)),
    };

    let mut stale = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| GenerateError::io(dir, e))?.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string)
        else {
            continue;
        };
        if current.contains(file_name.as_str()) || !path.is_file() {
            continue;
        }
        let Some(kind) = ArtifactKind::of_file_name(&file_name) else {
            continue;
        };
        if kind == ArtifactKind::Shared {
            continue;
        }

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::InvalidData => continue,
            Err(e) => {
                failures.push(ArtifactFailure {
                    file_name,
                    error: GenerateError::io(&path, e),
                });
                continue;
            }
        };
        if !is_generated(&content) {
            continue;
        }

        match regions(&content) {
            Ok(regions) => stale.push(StaleFile {
                path,
                file_name,
                kind,
                content,
                regions,
            }),
            Err(source) => {
                tracing::warn!("Leaving {} untouched: {}", path.display(), source);
                failures.push(ArtifactFailure {
                    file_name,
                    error: GenerateError::MalformedMarkers { path, source },
                });
            }
        }
    }

    stale.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(stale)
}

/// Take `file` out of the output directory.
///
/// `orphans` go to the sidecar first; without a sidecar, a file that still
/// holds orphans stays where it is.
pub(crate) fn retire(
    file: &StaleFile,
    replaced_by: Option<String>,
    orphans: Vec<Region>,
    options: WriteOptions,
) -> Result<RetiredArtifact, GenerateError> {
    for orphan in orphans.iter() {
        tracing::warn!(
            "Preserved section '{}' in {} has no owner anymore",
            orphan.tag,
            file.path.display()
        );
    }

    let mut sidecar = None;
    let mut removed = false;
    if !options.dry_run {
        if options.orphan_sidecar && !orphans.is_empty() {
            let target = sidecar_path(&file.path);
            append_orphans(&target, &orphans).map_err(|e| GenerateError::io(&target, e))?;
            sidecar = Some(target);
        }
        if orphans.is_empty() || sidecar.is_some() {
            fs::remove_file(&file.path).map_err(|e| GenerateError::io(&file.path, e))?;
            removed = true;
            tracing::info!("Retired {}", file.path.display());
        }
    }

    Ok(RetiredArtifact {
        path: file.path.clone(),
        replaced_by,
        orphans,
        sidecar,
        removed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENERATED: &str = "/**\n * Generated by SWC Designer from project 'P'.\n */\n";

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_only_generated_component_files_are_stale() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Swc_Old.c", GENERATED);
        write(dir.path(), "Swc_Now.c", GENERATED);
        write(dir.path(), "Rte_Type.h", GENERATED);
        write(dir.path(), "handwritten.c", "int main(void) { return 0; }\n");
        write(dir.path(), "notes.txt", GENERATED);

        let current = HashSet::from(["Swc_Now.c"]);
        let mut failures = Vec::new();
        let stale = find_stale(dir.path(), &current, &mut failures).unwrap();

        let names: Vec<_> = stale.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["Swc_Old.c"]);
        assert!(failures.is_empty());
    }

    #[test]
    fn test_malformed_stale_file_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "Swc_Old.c",
            &format!("{GENERATED}/* USER CODE BEGIN includes:c1 */\n"),
        );

        let mut failures = Vec::new();
        let stale = find_stale(dir.path(), &HashSet::new(), &mut failures).unwrap();
        assert!(stale.is_empty());
        assert_eq!(failures.len(), 1);
        assert!(dir.path().join("Swc_Old.c").exists());
    }

    #[test]
    fn test_retire_keeps_file_without_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let content =
            format!("{GENERATED}/* USER CODE BEGIN runnable:r1 */\nkeep();\n/* USER CODE END runnable:r1 */\n");
        write(dir.path(), "Swc_Old.c", &content);
        let stale = find_stale(dir.path(), &HashSet::new(), &mut Vec::new()).unwrap();
        let file = &stale[0];

        let options = WriteOptions {
            orphan_sidecar: false,
            dry_run: false,
        };
        let retired = retire(file, None, file.filled_regions(), options).unwrap();
        assert_eq!(retired.orphans.len(), 1);
        assert!(!retired.removed);
        assert!(file.path.exists());
    }
}
