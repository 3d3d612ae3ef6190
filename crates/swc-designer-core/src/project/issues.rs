//! Merge diagnostics
//!
//! Problems found while merging are values, not errors: a merge always
//! produces a project, and every problem is reported in the issue list.

use serde::Serialize;
use thiserror::Error;

use super::registry::ElementOwner;
use crate::model::{ElementKind, PortDirection, Uid};

/// Why a connection was rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "fault", rename_all = "snake_case")]
pub enum ConnectionFault {
    #[error("component '{uid}' does not exist")]
    MissingComponent { uid: Uid },

    #[error("port '{uid}' does not exist")]
    MissingPort { uid: Uid },

    #[error("port '{port}' is not a port of component '{component}'")]
    PortNotOnComponent { port: Uid, component: Uid },

    #[error("'{uid}' belongs to disabled module '{module}'")]
    DisabledEndpoint { uid: Uid, module: String },

    #[error("port '{port}' must have direction {expected:?}")]
    WrongDirection { port: Uid, expected: PortDirection },

    #[error("provider interface '{provider}' differs from requester interface '{requester}'")]
    InterfaceMismatch { provider: Uid, requester: Uid },

    #[error("interface '{interface}' is not available")]
    InterfaceUnavailable { interface: Uid },

    #[error("provider and requester are the same port")]
    SelfConnection,

    #[error("duplicates connection '{existing}'")]
    Duplicate { existing: Uid },
}

/// A problem found while merging modules
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum MergeIssue {
    #[error("Duplicate UID '{uid}' ({kind}): declared in {first} and again in {second}; the first declaration is kept")]
    DuplicateUid {
        uid: Uid,
        kind: ElementKind,
        first: ElementOwner,
        second: ElementOwner,
    },

    #[error("Unresolved reference: {referrer_kind} '{referrer}' field '{field}' names {expected} '{target}'{}", found_suffix(.found))]
    UnresolvedReference {
        referrer: Uid,
        referrer_kind: ElementKind,
        field: String,
        target: Uid,
        expected: ElementKind,
        found: Option<ElementKind>,
    },

    #[error("Dangling reference: {referrer_kind} '{referrer}' field '{field}' names '{target}' from disabled module '{module}'")]
    DisabledModuleReference {
        referrer: Uid,
        referrer_kind: ElementKind,
        field: String,
        target: Uid,
        module: String,
    },

    #[error("Invalid connection '{name}' ({connection}) in {owner}: {fault}")]
    InvalidConnection {
        connection: Uid,
        name: String,
        owner: ElementOwner,
        fault: ConnectionFault,
    },

    #[error("Invalid name: {kind} '{uid}' is named '{name}', which is not a C identifier")]
    InvalidName {
        uid: Uid,
        kind: ElementKind,
        name: String,
    },

    #[error("Data type mapping '{mapping}' maps application type '{app_type}' again (already mapped by '{existing}')")]
    DuplicateMapping {
        mapping: Uid,
        app_type: Uid,
        existing: Uid,
    },
}

fn found_suffix(found: &Option<ElementKind>) -> String {
    match found {
        Some(kind) => format!(", but that UID is a {kind}"),
        None => String::new(),
    }
}

impl MergeIssue {
    /// The element the issue is about
    pub fn subject(&self) -> &Uid {
        match self {
            Self::DuplicateUid { uid, .. } => uid,
            Self::UnresolvedReference { referrer, .. } => referrer,
            Self::DisabledModuleReference { referrer, .. } => referrer,
            Self::InvalidConnection { connection, .. } => connection,
            Self::InvalidName { uid, .. } => uid,
            Self::DuplicateMapping { mapping, .. } => mapping,
        }
    }

    /// Short machine-friendly issue code
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateUid { .. } => "duplicate-uid",
            Self::UnresolvedReference { .. } => "unresolved-reference",
            Self::DisabledModuleReference { .. } => "disabled-module-reference",
            Self::InvalidConnection { .. } => "invalid-connection",
            Self::InvalidName { .. } => "invalid-name",
            Self::DuplicateMapping { .. } => "duplicate-mapping",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_uid_message_names_both_modules() {
        let issue = MergeIssue::DuplicateUid {
            uid: Uid::new("dup1"),
            kind: ElementKind::Interface,
            first: ElementOwner::Module("A".into()),
            second: ElementOwner::Module("B".into()),
        };
        let message = issue.to_string();
        assert!(message.contains("module 'A'"));
        assert!(message.contains("module 'B'"));
        assert_eq!(issue.code(), "duplicate-uid");
    }

    #[test]
    fn test_unresolved_reference_mentions_found_kind() {
        let issue = MergeIssue::UnresolvedReference {
            referrer: Uid::new("p1"),
            referrer_kind: ElementKind::Port,
            field: "interface_uid".into(),
            target: Uid::new("cm1"),
            expected: ElementKind::Interface,
            found: Some(ElementKind::CompuMethod),
        };
        assert!(issue.to_string().contains("but that UID is a compu method"));
    }
}
