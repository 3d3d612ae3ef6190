//! Project Management
//!
//! Handles multi-module SWC projects: a master descriptor listing module
//! descriptors, each an independently loadable slice of the model.
//!
//! ## Project Structure
//!
//! ```text
//! [Project]/
//! ├── master.yaml           # name, modules, global_connections, generator
//! ├── modules/
//! │   ├── datatypes.yaml    # compu methods, data types, mappings
//! │   ├── interfaces.yaml
//! │   └── swc_*.yaml        # one component per module
//! └── generated/            # code generator output (default)
//! ```
//!
//! Loading is per module ([`load_module`]); [`merge`] combines the enabled
//! modules into a [`UnifiedProject`] and reports every conflict as a
//! [`MergeIssue`]. [`Workspace`] ties the two together for editing.

mod descriptor;
mod error;
mod example;
mod issues;
mod loader;
mod merge;
mod registry;
mod session;
mod unified;
mod workspace;

pub use descriptor::{
    DescriptorFormat, GeneratorSettings, MasterProject, ModuleDescriptor, ModuleReference,
};
pub use error::{LoadError, WorkspaceError};
pub use example::create_example_workspace;
pub use issues::{ConnectionFault, MergeIssue};
pub use loader::{load_master, load_module, resolve_module, LoadedModule, MasterFile};
pub use merge::{merge, MergeOutcome, ModuleSlot};
pub use registry::{DuplicateUid, ElementOwner, IdentifierRegistry, RegistryEntry};
pub use session::ProjectSession;
pub use unified::{DegradeReason, UnifiedProject};
pub use workspace::{ModuleEntry, ModuleLoadFailure, ProjectSnapshot, Workspace};
