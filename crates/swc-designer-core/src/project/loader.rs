//! Descriptor loader
//!
//! Reads one descriptor file at a time. Loading a module never looks at the
//! content of any other listed module; only `includes` of the module itself
//! are followed, with circular reference detection.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::descriptor::{decode, DescriptorFormat, MasterProject, ModuleDescriptor, ModuleReference};
use super::error::LoadError;

/// Maximum depth for nested module includes
const MAX_INCLUDE_DEPTH: usize = 16;

/// A module read from disk
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedModule {
    /// File the module was read from
    pub path: PathBuf,
    /// Encoding of the file (used when saving it back)
    pub format: DescriptorFormat,
    /// The descriptor exactly as stored in `path`
    pub descriptor: ModuleDescriptor,
    /// The descriptor with all included elements appended
    pub resolved: ModuleDescriptor,
    /// Files pulled in through `includes`, in load order
    pub included_files: Vec<PathBuf>,
}

/// A master descriptor read from disk
#[derive(Debug, Clone, PartialEq)]
pub struct MasterFile {
    pub path: PathBuf,
    pub format: DescriptorFormat,
    pub master: MasterProject,
    /// True when `path` is a plain module opened as a single-file project
    pub implicit: bool,
}

impl MasterFile {
    /// Directory that module paths are relative to
    pub fn base_dir(&self) -> PathBuf {
        self.path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    /// Absolute location of a listed module
    pub fn module_path(&self, reference: &ModuleReference) -> PathBuf {
        self.base_dir().join(&reference.path)
    }
}

/// Context for include resolution
struct IncludeContext {
    /// Files currently being loaded, outermost first (for cycle reporting)
    stack: Vec<PathBuf>,
    /// Every file already loaded (canonical paths)
    seen: HashSet<PathBuf>,
    /// Included files in load order
    included: Vec<PathBuf>,
}

impl IncludeContext {
    fn new() -> Self {
        Self {
            stack: Vec::new(),
            seen: HashSet::new(),
            included: Vec::new(),
        }
    }
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Read a descriptor file into an untyped tree
fn read_descriptor(path: &Path) -> Result<(DescriptorFormat, serde_json::Value), LoadError> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
        _ => LoadError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        },
    })?;

    let format = DescriptorFormat::from_path(path);
    let value = format.parse(&content, path)?;
    if !value.is_object() {
        return Err(LoadError::Malformed {
            path: path.to_path_buf(),
            message: "top level must be a mapping".to_string(),
        });
    }
    Ok((format, value))
}

fn decode_module(value: serde_json::Value, path: &Path) -> Result<ModuleDescriptor, LoadError> {
    let module: ModuleDescriptor = decode(value, path)?;
    if module.name.trim().is_empty() {
        return Err(LoadError::MissingName(path.to_path_buf()));
    }
    Ok(module)
}

/// Load one module descriptor, following its `includes`
pub fn load_module(path: &Path) -> Result<LoadedModule, LoadError> {
    let (format, value) = read_descriptor(path)?;
    let descriptor = decode_module(value, path)?;
    resolve_module(path, format, descriptor)
}

/// Resolve the `includes` of a descriptor that belongs at `path`.
///
/// Used for descriptors that are already in memory (e.g. after an edit);
/// include paths are relative to `path`.
pub fn resolve_module(
    path: &Path,
    format: DescriptorFormat,
    descriptor: ModuleDescriptor,
) -> Result<LoadedModule, LoadError> {
    if descriptor.name.trim().is_empty() {
        return Err(LoadError::MissingName(path.to_path_buf()));
    }

    let mut ctx = IncludeContext::new();
    let key = canonical(path);
    ctx.seen.insert(key.clone());
    ctx.stack.push(key);

    let mut resolved = descriptor.clone();
    resolved.includes.clear();
    for include in descriptor.includes.iter() {
        let include_path = resolve_include(path, include);
        if let Some(included) = load_included(&include_path, &mut ctx)? {
            resolved.append(included);
        }
    }

    tracing::debug!(
        "Loaded module '{}' from {} ({} elements, {} included files)",
        resolved.name,
        path.display(),
        resolved.element_count(),
        ctx.included.len()
    );

    Ok(LoadedModule {
        path: path.to_path_buf(),
        format,
        descriptor,
        resolved,
        included_files: ctx.included,
    })
}

fn resolve_include(including: &Path, include: &str) -> PathBuf {
    let include = Path::new(include.trim());
    if include.is_absolute() {
        include.to_path_buf()
    } else {
        including
            .parent()
            .map(|dir| dir.join(include))
            .unwrap_or_else(|| include.to_path_buf())
    }
}

/// Load an included file and its own includes, flattened.
///
/// Returns `None` when the file was already pulled in through another branch.
fn load_included(
    path: &Path,
    ctx: &mut IncludeContext,
) -> Result<Option<ModuleDescriptor>, LoadError> {
    if ctx.stack.len() > MAX_INCLUDE_DEPTH {
        return Err(LoadError::IncludeDepthExceeded(MAX_INCLUDE_DEPTH));
    }

    let key = canonical(path);
    if ctx.stack.contains(&key) {
        let mut chain = ctx.stack.clone();
        chain.push(key);
        return Err(LoadError::CyclicModuleReference(chain));
    }
    if ctx.seen.contains(&key) {
        tracing::debug!("Skipping already included file {}", path.display());
        return Ok(None);
    }

    let (_, value) = read_descriptor(path)?;
    // Included files only contribute elements, so a name is optional
    let mut included: ModuleDescriptor = decode(value, path)?;
    ctx.seen.insert(key.clone());
    ctx.stack.push(key);
    ctx.included.push(path.to_path_buf());

    let nested = std::mem::take(&mut included.includes);
    for include in nested.iter() {
        let include_path = resolve_include(path, include);
        if let Some(nested_module) = load_included(&include_path, ctx)? {
            included.append(nested_module);
        }
    }

    ctx.stack.pop();
    Ok(Some(included))
}

/// Load a master descriptor.
///
/// A descriptor without a `modules` list is treated as a single-file project:
/// it becomes an implicit master listing itself as the only module.
pub fn load_master(path: &Path) -> Result<MasterFile, LoadError> {
    let (format, value) = read_descriptor(path)?;

    let is_master = value
        .as_object()
        .is_some_and(|map| map.contains_key("modules"));

    if !is_master {
        let module = decode_module(value, path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let mut master = MasterProject::new(module.name.clone());
        master.description = module.description.clone();
        master
            .modules
            .push(ModuleReference::new(file_name, module.name));
        return Ok(MasterFile {
            path: path.to_path_buf(),
            format,
            master,
            implicit: true,
        });
    }

    let mut master: MasterProject = decode(value, path)?;
    if master.name.trim().is_empty() {
        return Err(LoadError::MissingName(path.to_path_buf()));
    }

    let mut names = HashSet::new();
    for reference in master.modules.iter_mut() {
        reference.normalize();
        if !names.insert(reference.name.clone()) {
            return Err(LoadError::Malformed {
                path: path.to_path_buf(),
                message: format!("module name '{}' is listed more than once", reference.name),
            });
        }
    }

    Ok(MasterFile {
        path: path.to_path_buf(),
        format,
        master,
        implicit: false,
    })
}
