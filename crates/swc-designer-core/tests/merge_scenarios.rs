//! Tests for multi-module project merging

use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use swc_designer_core::model::{ElementKind, ElementRef, Uid};
use swc_designer_core::project::{
    ConnectionFault, DegradeReason, ElementOwner, MergeIssue, Workspace,
};
use tempfile::TempDir;

/// Create a descriptor file and return its path
fn create_temp_descriptor(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

const MODULE_A: &str = r#"
name: A
compu_methods:
  - uid: cm1
    name: CM_Speed
    factor: 0.01
    unit: km/h
application_data_types:
  - uid: at1
    name: VehicleSpeed_T
    compu_method_uid: cm1
    min_value: 0
    max_value: 655.35
"#;

const MODULE_B: &str = r#"
name: B
interfaces:
  - uid: if1
    name: If_Speed
    interface_type: sender_receiver
    data_elements:
      - uid: de1
        name: Speed
        app_type_uid: at1
"#;

const MODULE_C: &str = r#"
name: C
components:
  - uid: swc1
    name: Swc_Sensor
    ports:
      - uid: pp1
        name: Pp_Speed
        direction: provided
        interface_uid: if1
  - uid: swc2
    name: Swc_Monitor
    ports:
      - uid: rp1
        name: Rp_Speed
        direction: required
        interface_uid: if1
"#;

fn write_project(dir: &TempDir, b_enabled: bool) -> PathBuf {
    create_temp_descriptor(dir, "modules/a.yaml", MODULE_A);
    create_temp_descriptor(dir, "modules/b.yaml", MODULE_B);
    create_temp_descriptor(dir, "modules/c.yaml", MODULE_C);
    create_temp_descriptor(
        dir,
        "master.yaml",
        &format!(
            r#"
name: Speed Project
modules:
  - path: modules/a.yaml
    name: A
  - path: modules/b.yaml
    name: B
    enabled: {b_enabled}
  - path: modules/c.yaml
    name: C
global_connections:
  - uid: conn1
    name: Conn_Speed
    provider_swc_uid: swc1
    provider_port_uid: pp1
    requester_swc_uid: swc2
    requester_port_uid: rp1
"#
        ),
    )
}

#[test]
fn test_cross_module_references_resolve() {
    let dir = TempDir::new().unwrap();
    let workspace = Workspace::open(&write_project(&dir, true)).unwrap();
    let snapshot = workspace.build();

    assert_eq!(snapshot.issues, vec![]);
    assert!(snapshot.load_errors.is_empty());

    let project = &snapshot.project;
    let iface = project.interface("if1").expect("if1 should be merged");
    assert_eq!(iface.data_elements[0].app_type_uid, Some(Uid::new("at1")));

    match project.element("de1") {
        Some(ElementRef::DataElement(parent, de)) => {
            assert_eq!(parent.name, "If_Speed");
            assert_eq!(de.name, "Speed");
        }
        other => panic!("expected data element, got {other:?}"),
    }

    assert_eq!(project.find_element_module("cm1"), Some("A"));
    assert_eq!(project.find_element_module("if1"), Some("B"));
    assert_eq!(project.find_element_module("rp1"), Some("C"));
    // Global connections belong to the master, not to a module
    assert_eq!(project.find_element_module("conn1"), None);
    assert_eq!(project.owner("conn1"), Some(&ElementOwner::Master));

    assert!(project.is_generation_eligible("conn1"));
    assert_eq!(project.eligible_components().count(), 2);
}

#[test]
fn test_disabled_module_invalidates_connection() {
    let dir = TempDir::new().unwrap();
    let workspace = Workspace::open(&write_project(&dir, false)).unwrap();
    let snapshot = workspace.build();
    let project = &snapshot.project;

    assert!(!project.contains("if1"));
    assert!(!project.contains("de1"));

    let invalid: Vec<_> = snapshot
        .issues
        .iter()
        .filter_map(|issue| match issue {
            MergeIssue::InvalidConnection {
                connection, fault, ..
            } => Some((connection.as_str(), fault.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(
        invalid,
        vec![(
            "conn1",
            ConnectionFault::InterfaceUnavailable {
                interface: Uid::new("if1")
            }
        )]
    );

    // Both ports point into the disabled module
    let dangling: Vec<_> = snapshot
        .issues
        .iter()
        .filter_map(|issue| match issue {
            MergeIssue::DisabledModuleReference {
                referrer, module, ..
            } => Some((referrer.as_str(), module.as_str())),
            _ => None,
        })
        .collect();
    assert_eq!(dangling, vec![("pp1", "B"), ("rp1", "B")]);

    // The connection is still there for editing, just not generated
    assert!(project.contains("conn1"));
    assert!(!project.is_generation_eligible("conn1"));
    assert_eq!(project.eligible_components().count(), 0);
}

#[test]
fn test_toggling_module_rebuilds_from_scratch() {
    let dir = TempDir::new().unwrap();
    let mut workspace = Workspace::open(&write_project(&dir, true)).unwrap();
    assert!(workspace.build().is_clean());

    workspace.set_module_enabled("B", false).unwrap();
    assert!(!workspace.build().is_clean());

    workspace.set_module_enabled("B", true).unwrap();
    workspace.save_master().unwrap();

    let reopened = Workspace::open(workspace.master_path()).unwrap();
    assert!(reopened.build().is_clean());
}

#[test]
fn test_duplicate_uid_across_modules() {
    let dir = TempDir::new().unwrap();
    create_temp_descriptor(
        &dir,
        "first.yaml",
        "name: First\ncompu_methods:\n  - uid: dup1\n    name: CM_First\n",
    );
    create_temp_descriptor(
        &dir,
        "second.json",
        r#"{"name": "Second", "compu_methods": [{"uid": "dup1", "name": "CM_Second"}]}"#,
    );
    let master = create_temp_descriptor(
        &dir,
        "master.yaml",
        "name: P\nmodules:\n  - path: first.yaml\n  - path: second.json\n",
    );

    let snapshot = Workspace::open(&master).unwrap().build();
    assert_eq!(
        snapshot.issues,
        vec![MergeIssue::DuplicateUid {
            uid: Uid::new("dup1"),
            kind: ElementKind::CompuMethod,
            first: ElementOwner::Module("first".to_string()),
            second: ElementOwner::Module("second".to_string()),
        }]
    );
    assert_eq!(snapshot.project.compu_methods().len(), 1);
    assert_eq!(
        snapshot.project.compu_method("dup1").map(|c| c.name.as_str()),
        Some("CM_First")
    );
}

#[test]
fn test_self_connection_rejected() {
    let dir = TempDir::new().unwrap();
    create_temp_descriptor(&dir, "a.yaml", MODULE_A);
    create_temp_descriptor(&dir, "b.yaml", MODULE_B);
    create_temp_descriptor(
        &dir,
        "c.yaml",
        r#"
name: C
components:
  - uid: swc1
    name: Swc_Loop
    ports:
      - uid: pp1
        name: Pp_Speed
        direction: provided
        interface_uid: if1
      - uid: rp1
        name: Rp_Speed
        direction: required
        interface_uid: if1
connections:
  - uid: loop1
    name: Conn_Loop
    provider_swc_uid: swc1
    provider_port_uid: pp1
    requester_swc_uid: swc1
    requester_port_uid: pp1
"#,
    );
    let master = create_temp_descriptor(
        &dir,
        "master.yaml",
        "name: P\nmodules:\n  - path: a.yaml\n  - path: b.yaml\n  - path: c.yaml\n",
    );

    let snapshot = Workspace::open(&master).unwrap().build();
    assert_eq!(snapshot.issues.len(), 1);
    assert!(matches!(
        &snapshot.issues[0],
        MergeIssue::InvalidConnection {
            fault: ConnectionFault::SelfConnection,
            owner: ElementOwner::Module(module),
            ..
        } if module == "c"
    ));
    assert!(!snapshot.project.is_generation_eligible("loop1"));
    // The component itself is unaffected by a bad connection
    assert!(snapshot.project.is_generation_eligible("swc1"));
}

#[test]
fn test_unresolved_reference_degrades_dependents() {
    let dir = TempDir::new().unwrap();
    create_temp_descriptor(&dir, "b.yaml", MODULE_B);
    create_temp_descriptor(&dir, "c.yaml", MODULE_C);
    let master = create_temp_descriptor(
        &dir,
        "master.yaml",
        "name: P\nmodules:\n  - path: b.yaml\n  - path: c.yaml\n",
    );

    let snapshot = Workspace::open(&master).unwrap().build();
    let project = &snapshot.project;

    assert_eq!(snapshot.issues.len(), 1);
    assert!(matches!(
        &snapshot.issues[0],
        MergeIssue::UnresolvedReference { referrer, expected: ElementKind::ApplicationDataType, found: None, .. }
            if referrer.as_str() == "de1"
    ));

    // Retained for editing, excluded from generation, and so is everything
    // that depends on it
    assert!(project.contains("de1"));
    assert!(matches!(
        project.degradation("de1"),
        Some(DegradeReason::UnresolvedReference { .. })
    ));
    for uid in ["if1", "pp1", "rp1", "swc1", "swc2"] {
        assert!(
            matches!(project.degradation(uid), Some(DegradeReason::DependsOnDegraded { .. })),
            "{uid} should be degraded"
        );
    }
}

#[test]
fn test_missing_module_reported_siblings_merged() {
    let dir = TempDir::new().unwrap();
    create_temp_descriptor(&dir, "a.yaml", MODULE_A);
    let master = create_temp_descriptor(
        &dir,
        "master.yaml",
        "name: P\nmodules:\n  - path: a.yaml\n  - path: gone.yaml\n",
    );

    let snapshot = Workspace::open(&master).unwrap().build();
    assert_eq!(snapshot.load_errors.len(), 1);
    assert_eq!(snapshot.load_errors[0].module, "gone");
    assert!(snapshot.issues.is_empty());
    assert!(snapshot.project.contains("at1"));
}

#[test]
fn test_single_file_project() {
    let dir = TempDir::new().unwrap();
    let path = create_temp_descriptor(
        &dir,
        "project.yaml",
        &format!("{MODULE_A}{}", MODULE_B.replace("name: B\n", "")),
    );

    let workspace = Workspace::open(&path).unwrap();
    assert!(workspace.is_single_file());
    let snapshot = workspace.build();
    assert!(snapshot.is_clean(), "{:?}", snapshot.issues);
    assert_eq!(snapshot.project.name(), "A");
    assert_eq!(snapshot.project.find_element_module("if1"), Some("A"));
}

#[test]
fn test_merge_is_repeatable() {
    let dir = TempDir::new().unwrap();
    let workspace = Workspace::open(&write_project(&dir, false)).unwrap();
    let first = workspace.build();
    let second = workspace.build();
    assert_eq!(first.issues, second.issues);
    assert_eq!(first.project.degraded_count(), second.project.degraded_count());
}
