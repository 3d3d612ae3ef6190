//! Artifact writer
//!
//! Reconciles one rendered artifact with the file already on disk and
//! replaces it atomically. A file whose markers are malformed is left
//! untouched.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;

use super::error::GenerateError;
use super::preserve::{reconcile, regions, Region};
use super::render::Artifact;
use crate::atomic::write_atomic;

/// What happened to one artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteStatus {
    Created,
    Updated,
    Unchanged,
}

/// Result of writing one artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactOutcome {
    pub path: PathBuf,
    pub status: WriteStatus,
    /// Regions carried over from the previous file
    pub preserved: usize,
    /// Regions of the previous file that no longer have an owner
    pub orphans: Vec<Region>,
    /// Sidecar the orphans were appended to, if any
    pub sidecar: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    pub orphan_sidecar: bool,
    /// Reconcile and report, but write nothing
    pub dry_run: bool,
}

fn read_existing(path: &Path) -> Result<Option<String>, GenerateError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(GenerateError::io(path, e)),
    }
}

/// `<artifact>.orphaned`
pub fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".orphaned");
    PathBuf::from(name)
}

pub(crate) fn append_orphans(path: &Path, orphans: &[Region]) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let stamp = Utc::now().to_rfc3339();
    for orphan in orphans {
        writeln!(file, "/* Orphaned USER CODE '{}' ({}) */", orphan.tag, stamp)?;
        file.write_all(orphan.body.as_bytes())?;
        if !orphan.body.ends_with('\n') {
            writeln!(file)?;
        }
        writeln!(file)?;
    }
    file.sync_all()
}

/// Write `artifact` into `dir`, preserving user code from the existing file
pub fn write_artifact(
    dir: &Path,
    artifact: &Artifact,
    options: WriteOptions,
) -> Result<ArtifactOutcome, GenerateError> {
    write_artifact_over(dir, artifact, None, options)
}

/// Like [`write_artifact`], taking preserved regions from `previous` when
/// the artifact has no file yet (a renamed component's old file)
pub(crate) fn write_artifact_over(
    dir: &Path,
    artifact: &Artifact,
    previous: Option<(&Path, &str)>,
    options: WriteOptions,
) -> Result<ArtifactOutcome, GenerateError> {
    let path = dir.join(&artifact.file_name);

    regions(&artifact.content).map_err(|source| GenerateError::Scaffold {
        file: artifact.file_name.clone(),
        source,
    })?;

    let existing = read_existing(&path)?;
    let (source_path, source_text) = match (existing.as_deref(), previous) {
        (None, Some((old_path, old_text))) => (old_path.to_path_buf(), Some(old_text)),
        (text, _) => (path.clone(), text),
    };
    let reconciled = reconcile(&artifact.content, source_text).map_err(|source| {
        GenerateError::MalformedMarkers {
            path: source_path,
            source,
        }
    })?;

    let status = match existing.as_deref() {
        None => WriteStatus::Created,
        Some(old) if old == reconciled.text => WriteStatus::Unchanged,
        Some(_) => WriteStatus::Updated,
    };

    for orphan in reconciled.orphans.iter() {
        tracing::warn!(
            "Preserved section '{}' in {} has no owner anymore",
            orphan.tag,
            path.display()
        );
    }

    let mut sidecar = None;
    if !options.dry_run {
        // Orphans go to disk before the file that held them is replaced
        if options.orphan_sidecar && !reconciled.orphans.is_empty() {
            let target = sidecar_path(&path);
            append_orphans(&target, &reconciled.orphans)
                .map_err(|e| GenerateError::io(&target, e))?;
            sidecar = Some(target);
        }
        if status != WriteStatus::Unchanged {
            write_atomic(&path, &reconciled.text).map_err(|e| GenerateError::io(&path, e))?;
        }
    }

    tracing::debug!("{:?}: {}", status, path.display());

    Ok(ArtifactOutcome {
        path,
        status,
        preserved: reconciled.preserved,
        orphans: reconciled.orphans,
        sidecar,
    })
}
