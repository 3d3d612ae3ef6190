//! Identifier registry
//!
//! Maps every UID to the kind of element it names and the module that owns
//! it. A registry is built fresh for each merge and is never shared between
//! merges.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{ElementKind, Uid};

/// Where an element was declared
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "owner", content = "name", rename_all = "snake_case")]
pub enum ElementOwner {
    /// A listed module, by logical name
    Module(String),
    /// The master descriptor itself (global connections)
    Master,
}

impl ElementOwner {
    pub fn module_name(&self) -> Option<&str> {
        match self {
            Self::Module(name) => Some(name),
            Self::Master => None,
        }
    }
}

impl fmt::Display for ElementOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Module(name) => write!(f, "module '{name}'"),
            Self::Master => f.write_str("master descriptor"),
        }
    }
}

/// A registered UID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub kind: ElementKind,
    pub owner: ElementOwner,
}

/// Rejected registration: the UID was already taken
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateUid {
    pub uid: Uid,
    pub existing: RegistryEntry,
}

/// UID lookup table
#[derive(Debug, Default)]
pub struct IdentifierRegistry {
    entries: HashMap<Uid, RegistryEntry>,
}

impl IdentifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `uid`. The first registration wins; a second one is rejected
    /// and leaves the existing entry in place.
    pub fn register(
        &mut self,
        uid: &Uid,
        kind: ElementKind,
        owner: ElementOwner,
    ) -> Result<(), DuplicateUid> {
        if let Some(existing) = self.entries.get(uid) {
            return Err(DuplicateUid {
                uid: uid.clone(),
                existing: existing.clone(),
            });
        }
        self.entries
            .insert(uid.clone(), RegistryEntry { kind, owner });
        Ok(())
    }

    pub fn lookup(&self, uid: &str) -> Option<&RegistryEntry> {
        self.entries.get(uid)
    }

    pub fn contains(&self, uid: &str) -> bool {
        self.entries.contains_key(uid)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the registry into a UID -> owner index
    pub fn into_owners(self) -> HashMap<Uid, ElementOwner> {
        self.entries
            .into_iter()
            .map(|(uid, entry)| (uid, entry.owner))
            .collect()
    }
}
