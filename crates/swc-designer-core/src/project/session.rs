//! Active project state
//!
//! The editing surface works against one active snapshot. A rebuild
//! publishes a complete new snapshot; readers holding the previous `Arc`
//! keep a consistent view until they ask for the current one again.

use std::sync::{Arc, OnceLock, RwLock};

use super::workspace::{ProjectSnapshot, Workspace};

/// Holder of the active [`ProjectSnapshot`]
#[derive(Debug, Default)]
pub struct ProjectSession {
    current: RwLock<Option<Arc<ProjectSnapshot>>>,
}

static GLOBAL_SESSION: OnceLock<ProjectSession> = OnceLock::new();

impl ProjectSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide session
    pub fn global() -> &'static ProjectSession {
        GLOBAL_SESSION.get_or_init(ProjectSession::new)
    }

    /// Replace the active snapshot, returning the previous one
    pub fn publish(&self, snapshot: ProjectSnapshot) -> Option<Arc<ProjectSnapshot>> {
        let snapshot = Arc::new(snapshot);
        tracing::debug!(
            "Publishing snapshot of '{}' ({} issues)",
            snapshot.project.name(),
            snapshot.issues.len()
        );
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        guard.replace(snapshot)
    }

    /// Rebuild from `workspace` and publish the result
    pub fn rebuild(&self, workspace: &Workspace) -> Arc<ProjectSnapshot> {
        let snapshot = Arc::new(workspace.build());
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(Arc::clone(&snapshot));
        snapshot
    }

    /// The active snapshot, if a project is open
    pub fn current(&self) -> Option<Arc<ProjectSnapshot>> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Close the active project
    pub fn clear(&self) -> Option<Arc<ProjectSnapshot>> {
        self.current
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{merge, MasterProject};
    use chrono::Utc;

    fn snapshot(name: &str) -> ProjectSnapshot {
        let outcome = merge(&MasterProject::new(name), &[]);
        ProjectSnapshot {
            project: outcome.project,
            issues: outcome.issues,
            load_errors: Vec::new(),
            built_at: Utc::now(),
        }
    }

    #[test]
    fn test_readers_keep_their_snapshot() {
        let session = ProjectSession::new();
        assert!(session.current().is_none());

        session.publish(snapshot("first"));
        let held = session.current().unwrap();

        let previous = session.publish(snapshot("second")).unwrap();
        assert_eq!(previous.project.name(), "first");
        assert_eq!(held.project.name(), "first");
        assert_eq!(session.current().unwrap().project.name(), "second");

        session.clear();
        assert!(session.current().is_none());
    }
}
