//! Multi-module workspace
//!
//! Holds the master descriptor and every listed module as loaded from disk.
//! Edits replace whole module descriptors; [`Workspace::build`] recomputes
//! the unified project from scratch every time.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::descriptor::{DescriptorFormat, GeneratorSettings, MasterProject, ModuleDescriptor, ModuleReference};
use super::error::{LoadError, WorkspaceError};
use super::issues::MergeIssue;
use super::loader::{load_master, load_module, resolve_module, LoadedModule, MasterFile};
use super::merge::{merge, ModuleSlot};
use super::unified::UnifiedProject;
use crate::atomic::write_atomic;

/// A listed module that could not be loaded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleLoadFailure {
    pub module: String,
    pub path: PathBuf,
    #[serde(serialize_with = "serialize_display")]
    pub error: LoadError,
}

fn serialize_display<S: serde::Serializer>(error: &LoadError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(error)
}

/// One consistent build of the project
#[derive(Debug, Clone)]
pub struct ProjectSnapshot {
    pub project: UnifiedProject,
    pub issues: Vec<MergeIssue>,
    /// Enabled modules that failed to load (they contribute nothing)
    pub load_errors: Vec<ModuleLoadFailure>,
    pub built_at: DateTime<Utc>,
}

impl ProjectSnapshot {
    /// True when the build produced no issues and no load errors
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty() && self.load_errors.is_empty()
    }
}

/// A module slot of the workspace
#[derive(Debug, Clone)]
pub struct ModuleEntry {
    /// Absolute location of the module file
    pub path: PathBuf,
    /// The loaded module, or why it could not be loaded
    pub state: Result<LoadedModule, LoadError>,
    dirty: bool,
}

impl ModuleEntry {
    fn load(path: PathBuf) -> Self {
        let state = load_module(&path);
        Self {
            path,
            state,
            dirty: false,
        }
    }

    pub fn loaded(&self) -> Option<&LoadedModule> {
        self.state.as_ref().ok()
    }

    /// True when the in-memory descriptor differs from the file
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// Master descriptor plus every listed module
#[derive(Debug, Clone)]
pub struct Workspace {
    master: MasterFile,
    modules: HashMap<String, ModuleEntry>,
    master_dirty: bool,
}

impl Workspace {
    /// Open a master descriptor (or a single-file project) and load every
    /// listed module independently.
    ///
    /// Only a failure to read the master itself is an error; module failures
    /// are kept per module and reported by [`build`](Self::build).
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        let master = load_master(path)?;
        let mut modules = HashMap::new();

        for reference in master.master.modules.iter() {
            let entry = ModuleEntry::load(master.module_path(reference));
            if let Err(e) = &entry.state {
                if reference.enabled {
                    tracing::warn!("Failed to load module '{}': {}", reference.name, e);
                } else {
                    tracing::debug!("Disabled module '{}' not loaded: {}", reference.name, e);
                }
            }
            modules.insert(reference.name.clone(), entry);
        }

        tracing::info!(
            "Opened project '{}' from {} ({} modules)",
            master.master.name,
            path.display(),
            modules.len()
        );

        Ok(Self {
            master,
            modules,
            master_dirty: false,
        })
    }

    pub fn master(&self) -> &MasterProject {
        &self.master.master
    }

    pub fn master_path(&self) -> &Path {
        &self.master.path
    }

    /// True when the project is a single module file without a master
    pub fn is_single_file(&self) -> bool {
        self.master.implicit
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.master.master.generator
    }

    /// Generation output directory, resolved against the master file
    pub fn output_dir(&self) -> PathBuf {
        self.master.base_dir().join(&self.settings().output_dir)
    }

    /// Listed modules in master order
    pub fn modules(&self) -> impl Iterator<Item = (&ModuleReference, Option<&ModuleEntry>)> {
        self.master
            .master
            .modules
            .iter()
            .map(|r| (r, self.modules.get(&r.name)))
    }

    pub fn module(&self, name: &str) -> Option<&ModuleEntry> {
        self.modules.get(name)
    }

    /// Merge the current module state into a fresh snapshot
    pub fn build(&self) -> ProjectSnapshot {
        let mut slots = Vec::new();
        let mut load_errors = Vec::new();

        for reference in self.master.master.modules.iter() {
            let Some(entry) = self.modules.get(&reference.name) else {
                continue;
            };
            match &entry.state {
                Ok(loaded) => slots.push(ModuleSlot {
                    name: &reference.name,
                    enabled: reference.enabled,
                    descriptor: &loaded.resolved,
                }),
                Err(error) if reference.enabled => load_errors.push(ModuleLoadFailure {
                    module: reference.name.clone(),
                    path: entry.path.clone(),
                    error: error.clone(),
                }),
                Err(_) => {}
            }
        }

        let outcome = merge(&self.master.master, &slots);
        ProjectSnapshot {
            project: outcome.project,
            issues: outcome.issues,
            load_errors,
            built_at: Utc::now(),
        }
    }

    fn reference_mut(&mut self, name: &str) -> Result<&mut ModuleReference, WorkspaceError> {
        self.master
            .master
            .module_mut(name)
            .ok_or_else(|| WorkspaceError::UnknownModule(name.to_string()))
    }

    fn entry_mut(&mut self, name: &str) -> Result<&mut ModuleEntry, WorkspaceError> {
        self.modules
            .get_mut(name)
            .ok_or_else(|| WorkspaceError::UnknownModule(name.to_string()))
    }

    /// Enable or disable a listed module
    pub fn set_module_enabled(&mut self, name: &str, enabled: bool) -> Result<(), WorkspaceError> {
        let reference = self.reference_mut(name)?;
        if reference.enabled != enabled {
            reference.enabled = enabled;
            self.master_dirty = true;
            tracing::info!(
                "Module '{}' {}",
                name,
                if enabled { "enabled" } else { "disabled" }
            );
        }
        Ok(())
    }

    /// Append a new module to the master list.
    ///
    /// `rel_path` is relative to the master file. Nothing is written until
    /// [`save_all`](Self::save_all) (or `save_module` + `save_master`).
    /// A descriptor that would not load back (no name, broken includes) is
    /// rejected and the workspace is left as it was.
    pub fn add_module(
        &mut self,
        descriptor: ModuleDescriptor,
        rel_path: &str,
    ) -> Result<(), WorkspaceError> {
        let mut reference = ModuleReference::new(rel_path, descriptor.name.clone());
        reference.normalize();
        if self.master.master.module(&reference.name).is_some() {
            return Err(WorkspaceError::ModuleExists(reference.name));
        }

        let path = self.master.module_path(&reference);
        let format = DescriptorFormat::from_path(&path);
        let state = resolve_module(&path, format, descriptor)?;

        let name = reference.name.clone();
        self.master.master.modules.push(reference);
        self.modules.insert(
            name,
            ModuleEntry {
                path,
                state: Ok(state),
                dirty: true,
            },
        );
        self.master_dirty = true;
        Ok(())
    }

    /// Drop a module from the master list, optionally deleting its file
    pub fn remove_module(
        &mut self,
        name: &str,
        delete_file: bool,
    ) -> Result<ModuleReference, WorkspaceError> {
        let index = self
            .master
            .master
            .modules
            .iter()
            .position(|r| r.name == name)
            .ok_or_else(|| WorkspaceError::UnknownModule(name.to_string()))?;

        let reference = self.master.master.modules.remove(index);
        let entry = self.modules.remove(name);
        self.master_dirty = true;

        if let (true, Some(entry)) = (delete_file, entry) {
            match std::fs::remove_file(&entry.path) {
                Ok(()) => tracing::info!("Deleted module file {}", entry.path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(reference)
    }

    /// Replace the content of a module (an edit)
    pub fn replace_module(
        &mut self,
        name: &str,
        descriptor: ModuleDescriptor,
    ) -> Result<(), WorkspaceError> {
        let entry = self.entry_mut(name)?;
        let format = entry
            .loaded()
            .map(|m| m.format)
            .unwrap_or_else(|| DescriptorFormat::from_path(&entry.path));
        entry.state = resolve_module(&entry.path, format, descriptor);
        entry.dirty = true;
        match &entry.state {
            Ok(_) => Ok(()),
            Err(e) => Err(e.clone().into()),
        }
    }

    /// Re-read a module from disk, discarding unsaved edits
    pub fn reload_module(&mut self, name: &str) -> Result<(), WorkspaceError> {
        let entry = self.entry_mut(name)?;
        *entry = ModuleEntry::load(entry.path.clone());
        match &entry.state {
            Ok(_) => Ok(()),
            Err(e) => Err(e.clone().into()),
        }
    }

    /// Write one module back to its file, in the format it was loaded from
    pub fn save_module(&mut self, name: &str) -> Result<(), WorkspaceError> {
        let entry = self.entry_mut(name)?;
        let loaded = entry
            .state
            .as_ref()
            .map_err(|_| WorkspaceError::ModuleNotLoaded(name.to_string()))?;

        let content = loaded
            .format
            .render(&loaded.descriptor)
            .map_err(WorkspaceError::Serialize)?;
        write_atomic(&entry.path, &content)?;
        entry.dirty = false;
        tracing::debug!("Saved module '{}' to {}", name, entry.path.display());
        Ok(())
    }

    /// Write the master descriptor.
    ///
    /// A single-file project has no separate master; its module list cannot
    /// change on disk, so this is a no-op there.
    pub fn save_master(&mut self) -> Result<(), WorkspaceError> {
        if self.master.implicit {
            tracing::debug!("Single-file project: no master descriptor to save");
            self.master_dirty = false;
            return Ok(());
        }

        let content = self
            .master
            .format
            .render(&self.master.master)
            .map_err(WorkspaceError::Serialize)?;
        write_atomic(&self.master.path, &content)?;
        self.master_dirty = false;
        tracing::debug!("Saved master descriptor {}", self.master.path.display());
        Ok(())
    }

    /// Save the master and every module with unsaved edits
    pub fn save_all(&mut self) -> Result<(), WorkspaceError> {
        let dirty: Vec<String> = self
            .master
            .master
            .modules
            .iter()
            .filter(|r| self.modules.get(&r.name).is_some_and(|e| e.dirty))
            .map(|r| r.name.clone())
            .collect();
        for name in dirty {
            self.save_module(&name)?;
        }
        if self.master_dirty {
            self.save_master()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CompuMethod, Uid};

    fn compu(uid: &str) -> CompuMethod {
        CompuMethod {
            uid: Uid::new(uid),
            name: format!("CM_{uid}"),
            factor: 1.0,
            offset: 0.0,
            unit: String::new(),
            description: String::new(),
        }
    }

    fn write_master(dir: &Path) -> PathBuf {
        std::fs::write(
            dir.join("a.yaml"),
            "name: A\ncompu_methods:\n  - uid: cm1\n    name: CM_A\n",
        )
        .unwrap();
        let master = dir.join("master.yaml");
        std::fs::write(
            &master,
            "name: P\nmodules:\n  - path: a.yaml\n  - path: missing.yaml\n",
        )
        .unwrap();
        master
    }

    #[test]
    fn test_missing_module_does_not_block_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::open(&write_master(dir.path())).unwrap();
        let snapshot = workspace.build();

        assert_eq!(snapshot.load_errors.len(), 1);
        assert_eq!(snapshot.load_errors[0].module, "missing");
        assert!(snapshot.project.contains("cm1"));
        assert!(!snapshot.is_clean());
    }

    #[test]
    fn test_disabled_missing_module_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let mut workspace = Workspace::open(&write_master(dir.path())).unwrap();
        workspace.set_module_enabled("missing", false).unwrap();
        assert!(workspace.build().is_clean());
    }

    #[test]
    fn test_add_and_save_module() {
        let dir = tempfile::tempdir().unwrap();
        let master_path = write_master(dir.path());
        let mut workspace = Workspace::open(&master_path).unwrap();

        let mut module = ModuleDescriptor::new("B");
        module.compu_methods.push(compu("cm2"));
        workspace.add_module(module, "modules/b.json").unwrap();
        assert!(matches!(
            workspace.add_module(ModuleDescriptor::new("B"), "other.yaml"),
            Err(WorkspaceError::ModuleExists(_))
        ));
        workspace.save_all().unwrap();

        let saved = std::fs::read_to_string(dir.path().join("modules/b.json")).unwrap();
        assert!(saved.trim_start().starts_with('{'));

        let reopened = Workspace::open(&master_path).unwrap();
        let snapshot = reopened.build();
        assert_eq!(snapshot.project.find_element_module("cm2"), Some("B"));
    }

    #[test]
    fn test_add_module_without_name_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut workspace = Workspace::open(&write_master(dir.path())).unwrap();

        let err = workspace
            .add_module(ModuleDescriptor::new(""), "c.yaml")
            .unwrap_err();
        assert!(matches!(err, WorkspaceError::Load(LoadError::MissingName(_))));
        assert_eq!(workspace.modules().count(), 2);
        assert!(workspace.module("c").is_none());
        assert!(workspace.module("").is_none());
    }

    #[test]
    fn test_added_module_is_merged_and_saved() {
        let dir = tempfile::tempdir().unwrap();
        let master_path = write_master(dir.path());
        let mut workspace = Workspace::open(&master_path).unwrap();

        let mut module = ModuleDescriptor::new("Extra");
        module.compu_methods.push(compu("cm3"));
        workspace.add_module(module, "extra.yaml").unwrap();
        assert_eq!(
            workspace.build().project.find_element_module("cm3"),
            Some("Extra")
        );

        workspace.save_all().unwrap();
        assert!(dir.path().join("extra.yaml").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_save_module_keeps_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let mut workspace = Workspace::open(&write_master(dir.path())).unwrap();
        let path = dir.path().join("a.yaml");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        workspace.save_module("a").unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_replace_then_reload_discards_edit() {
        let dir = tempfile::tempdir().unwrap();
        let mut workspace = Workspace::open(&write_master(dir.path())).unwrap();

        let mut edited = ModuleDescriptor::new("A");
        edited.compu_methods.push(compu("cm9"));
        workspace.replace_module("a", edited).unwrap();
        assert!(workspace.build().project.contains("cm9"));

        workspace.reload_module("a").unwrap();
        let snapshot = workspace.build();
        assert!(snapshot.project.contains("cm1"));
        assert!(!snapshot.project.contains("cm9"));
    }

    #[test]
    fn test_unknown_module() {
        let dir = tempfile::tempdir().unwrap();
        let mut workspace = Workspace::open(&write_master(dir.path())).unwrap();
        assert!(matches!(
            workspace.set_module_enabled("nope", false),
            Err(WorkspaceError::UnknownModule(_))
        ));
    }
}
