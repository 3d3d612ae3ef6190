//! Component model
//!
//! AUTOSAR-style elements used by both the project merge and the code
//! generator:
//! - CompuMethods, application and implementation data types, mappings
//! - Sender-receiver and client-server interfaces
//! - Software components with ports and runnables
//! - Port connections
//!
//! All elements carry a [`Uid`]; [`ElementRef`] gives a kind-tagged view
//! over any of them.

mod element;
mod types;
mod uid;

pub use element::{ElementKind, ElementRef};
pub use types::*;
pub use uid::Uid;
