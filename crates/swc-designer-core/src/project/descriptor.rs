//! Module and master descriptors
//!
//! A module descriptor is one independently loadable file holding any subset
//! of the model collections. A master descriptor lists modules (in merge
//! order) and carries connections that may span modules.
//!
//! ```text
//! project/
//! ├── master.yaml           # name, modules, global_connections, generator
//! └── modules/
//!     ├── datatypes.yaml    # compu methods, data types, mappings
//!     ├── interfaces.yaml   # interfaces
//!     └── swc_sensor.yaml   # components (+ local connections)
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::LoadError;
use crate::model::{
    ApplicationDataType, CompuMethod, DataTypeMapping, ImplementationDataType, Interface,
    PortConnection, SoftwareComponent,
};

/// On-disk encoding of a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorFormat {
    Json,
    Yaml,
}

impl DescriptorFormat {
    /// `.json` files are JSON; everything else is read as YAML
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .as_deref()
        {
            Some("json") => Self::Json,
            _ => Self::Yaml,
        }
    }

    /// Parse descriptor text into an untyped tree
    pub fn parse(self, content: &str, path: &Path) -> Result<serde_json::Value, LoadError> {
        let parsed = match self {
            Self::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            Self::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        };
        parsed.map_err(|message| LoadError::Malformed {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Render a descriptor in this format
    pub fn render<T: Serialize>(self, value: &T) -> Result<String, String> {
        match self {
            Self::Json => serde_json::to_string_pretty(value)
                .map(|mut s| {
                    s.push('\n');
                    s
                })
                .map_err(|e| e.to_string()),
            Self::Yaml => serde_yaml::to_string(value).map_err(|e| e.to_string()),
        }
    }
}

/// Decode an untyped descriptor tree strictly into `T`
pub(crate) fn decode<T: DeserializeOwned>(
    value: serde_json::Value,
    path: &Path,
) -> Result<T, LoadError> {
    serde_json::from_value(value).map_err(|e| LoadError::Malformed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// One module file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleDescriptor {
    /// Module display name (required, non-empty)
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Other descriptor files whose elements are appended to this module,
    /// relative to this file
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compu_methods: Vec<CompuMethod>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub application_data_types: Vec<ApplicationDataType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub implementation_data_types: Vec<ImplementationDataType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_type_mappings: Vec<DataTypeMapping>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<Interface>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<SoftwareComponent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<PortConnection>,
}

impl ModuleDescriptor {
    /// Create an empty module
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Append the element collections of `other`, keeping list order
    pub fn append(&mut self, other: ModuleDescriptor) {
        self.compu_methods.extend(other.compu_methods);
        self.application_data_types
            .extend(other.application_data_types);
        self.implementation_data_types
            .extend(other.implementation_data_types);
        self.data_type_mappings.extend(other.data_type_mappings);
        self.interfaces.extend(other.interfaces);
        self.components.extend(other.components);
        self.connections.extend(other.connections);
    }

    /// Number of top-level elements
    pub fn element_count(&self) -> usize {
        self.compu_methods.len()
            + self.application_data_types.len()
            + self.implementation_data_types.len()
            + self.data_type_mappings.len()
            + self.interfaces.len()
            + self.components.len()
            + self.connections.len()
    }
}

fn default_enabled() -> bool {
    true
}

fn is_true(value: &bool) -> bool {
    *value
}

/// Entry of the master's module list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleReference {
    /// Path relative to the master descriptor
    pub path: String,

    /// Logical module name; defaults to the file stem of `path`
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default = "default_enabled", skip_serializing_if = "is_true")]
    pub enabled: bool,
}

impl ModuleReference {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            description: String::new(),
            enabled: true,
        }
    }

    /// Fill an empty name from the file stem of the path
    pub(crate) fn normalize(&mut self) {
        if self.name.is_empty() {
            self.name = Path::new(&self.path)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(&self.path)
                .to_string();
        }
    }
}

fn default_output_dir() -> String {
    "generated".to_string()
}

fn default_indent() -> usize {
    4
}

/// Code generator settings, stored in the master's `generator` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorSettings {
    /// Output directory, relative to the master descriptor
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Write orphaned preserved-region content to `<artifact>.orphaned`
    #[serde(default = "default_enabled")]
    pub orphan_sidecar: bool,

    /// Spaces per indentation level in generated C
    #[serde(default = "default_indent")]
    pub indent: usize,

    /// Extra comment line placed in every artifact header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            orphan_sidecar: true,
            indent: default_indent(),
            banner: None,
        }
    }
}

fn is_default_settings(settings: &GeneratorSettings) -> bool {
    *settings == GeneratorSettings::default()
}

/// Master project descriptor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MasterProject {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Modules in merge order; earlier modules win UID collisions
    #[serde(default)]
    pub modules: Vec<ModuleReference>,

    /// Connections that may reference elements of any enabled module
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub global_connections: Vec<PortConnection>,

    #[serde(default, skip_serializing_if = "is_default_settings")]
    pub generator: GeneratorSettings,
}

impl MasterProject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn module(&self, name: &str) -> Option<&ModuleReference> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub fn module_mut(&mut self, name: &str) -> Option<&mut ModuleReference> {
        self.modules.iter_mut().find(|m| m.name == name)
    }
}
