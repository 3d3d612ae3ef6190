//! # SWC Designer Core Library
//!
//! Core functionality for modeling AUTOSAR-style software components and
//! generating C skeletons from them.

#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - The component model (data types, interfaces, components, connections)
//! - Module and master descriptor loading (YAML or JSON, with includes)
//! - Multi-module merge with UID registry and reference validation
//! - C code generation with preserved user-code regions
//!
//! ## Example
//!
//! ```rust,ignore
//! use swc_designer_core::{codegen::CodeGenerator, project::Workspace};
//!
//! // Load the master descriptor and every listed module
//! let workspace = Workspace::open("project/master.yaml".as_ref())?;
//! let snapshot = workspace.build();
//! for issue in &snapshot.issues {
//!     println!("{issue}");
//! }
//!
//! // Generate into the configured output directory
//! let generator = CodeGenerator::new(workspace.settings().clone());
//! let report = generator.generate(&snapshot.project, &workspace.output_dir())?;
//! println!("{:?}", report.counts());
//! ```

mod atomic;
pub mod codegen;
pub mod model;
pub mod project;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::codegen::{CodeGenerator, GenerationReport, WriteStatus};
    pub use crate::model::{
        ElementKind, ElementRef, Interface, Port, PortConnection, PortDirection,
        SoftwareComponent, Uid,
    };
    pub use crate::project::{
        create_example_workspace, merge, GeneratorSettings, LoadError, MasterProject, MergeIssue,
        ModuleDescriptor, ProjectSession, ProjectSnapshot, UnifiedProject, Workspace,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
