//! Reference resolver / merger
//!
//! Combines the enabled modules of a master project into one
//! [`UnifiedProject`]:
//! 1. Register every element in master-list order (first UID wins; later
//!    duplicates are dropped and reported)
//! 2. Resolve every reference field against the registry; unresolved
//!    referrers stay in the model but are degraded. Elements whose names
//!    are emitted as C identifiers must have valid ones
//! 3. Validate module-local and global connections
//! 4. Propagate degradation to everything that depends on a degraded element
//! 5. Record the owning module of every retained UID
//!
//! The pass is a pure function of its inputs.

use std::collections::{HashMap, HashSet};

use super::descriptor::{MasterProject, ModuleDescriptor};
use super::issues::{ConnectionFault, MergeIssue};
use super::registry::{ElementOwner, IdentifierRegistry};
use super::unified::{Collections, DegradeReason, UnifiedProject};
use crate::model::{
    ElementKind, Interface, Port, PortConnection, PortDirection, SoftwareComponent, Uid,
};

/// One module listed in the master, with its loaded content
#[derive(Debug, Clone, Copy)]
pub struct ModuleSlot<'a> {
    pub name: &'a str,
    pub enabled: bool,
    pub descriptor: &'a ModuleDescriptor,
}

/// Result of a merge: always a project, plus everything that went wrong
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    pub project: UnifiedProject,
    pub issues: Vec<MergeIssue>,
}

/// A reference field that must resolve to an element of `expected` kind
struct Reference {
    referrer: Uid,
    referrer_kind: ElementKind,
    field: &'static str,
    target: Uid,
    expected: ElementKind,
}

impl Reference {
    fn new(
        referrer: &Uid,
        referrer_kind: ElementKind,
        field: &'static str,
        target: &Uid,
        expected: ElementKind,
    ) -> Self {
        Self {
            referrer: referrer.clone(),
            referrer_kind,
            field,
            target: target.clone(),
            expected,
        }
    }
}

struct Merger {
    registry: IdentifierRegistry,
    /// UIDs declared by disabled modules (first declaration wins)
    disabled: HashMap<Uid, String>,
    collections: Collections,
    issues: Vec<MergeIssue>,
    degraded: HashMap<Uid, DegradeReason>,
}

/// Merge the modules of `master` into a unified project.
///
/// `modules` must be in master-list order; that order is the tie-break for
/// UID collisions. Disabled slots contribute nothing to the project and are
/// only used to explain references that point into them.
pub fn merge(master: &MasterProject, modules: &[ModuleSlot<'_>]) -> MergeOutcome {
    let mut merger = Merger {
        registry: IdentifierRegistry::new(),
        disabled: index_disabled(modules),
        collections: Collections::default(),
        issues: Vec::new(),
        degraded: HashMap::new(),
    };

    for slot in modules.iter().filter(|m| m.enabled) {
        merger.register_module(slot);
    }
    for connection in master.global_connections.iter() {
        merger.register_connection(connection, ElementOwner::Master);
    }

    let references = collect_references(&merger.collections);
    merger.resolve(&references);
    merger.check_names();
    merger.check_mappings();
    merger.validate_connections();
    merger.propagate(&references);

    let degraded_count = merger.degraded.len();
    let project = UnifiedProject::assemble(
        master.name.clone(),
        master.description.clone(),
        merger.collections,
        merger.registry.into_owners(),
        merger.degraded,
    );

    tracing::info!(
        "Merged project '{}': {} elements, {} degraded, {} issues",
        project.name(),
        project.element_count(),
        degraded_count,
        merger.issues.len()
    );

    MergeOutcome {
        project,
        issues: merger.issues,
    }
}

fn index_disabled(modules: &[ModuleSlot<'_>]) -> HashMap<Uid, String> {
    let mut index = HashMap::new();
    for slot in modules.iter().filter(|m| !m.enabled) {
        let d = slot.descriptor;
        let uids = d
            .compu_methods
            .iter()
            .map(|e| &e.uid)
            .chain(d.application_data_types.iter().map(|e| &e.uid))
            .chain(d.implementation_data_types.iter().map(|e| &e.uid))
            .chain(d.data_type_mappings.iter().map(|e| &e.uid))
            .chain(d.interfaces.iter().flat_map(|i| {
                std::iter::once(&i.uid)
                    .chain(i.data_elements.iter().map(|e| &e.uid))
                    .chain(i.operations.iter().map(|e| &e.uid))
            }))
            .chain(d.components.iter().flat_map(|c| {
                std::iter::once(&c.uid)
                    .chain(c.ports.iter().map(|e| &e.uid))
                    .chain(c.runnables.iter().map(|e| &e.uid))
            }))
            .chain(d.connections.iter().map(|e| &e.uid));
        for uid in uids {
            index
                .entry(uid.clone())
                .or_insert_with(|| slot.name.to_string());
        }
    }
    index
}

impl Merger {
    // =========================================================================
    // Step 1: registration
    // =========================================================================

    /// Register `uid`; on collision report it and return false
    fn claim(&mut self, uid: &Uid, kind: ElementKind, owner: &ElementOwner) -> bool {
        match self.registry.register(uid, kind, owner.clone()) {
            Ok(()) => true,
            Err(duplicate) => {
                tracing::warn!(
                    "Duplicate UID '{}' in {} (first declared in {})",
                    uid,
                    owner,
                    duplicate.existing.owner
                );
                self.issues.push(MergeIssue::DuplicateUid {
                    uid: uid.clone(),
                    kind,
                    first: duplicate.existing.owner,
                    second: owner.clone(),
                });
                false
            }
        }
    }

    fn register_module(&mut self, slot: &ModuleSlot<'_>) {
        let owner = ElementOwner::Module(slot.name.to_string());
        let d = slot.descriptor;

        for e in d.compu_methods.iter() {
            if self.claim(&e.uid, ElementKind::CompuMethod, &owner) {
                self.collections.compu_methods.push(e.clone());
            }
        }
        for e in d.application_data_types.iter() {
            if self.claim(&e.uid, ElementKind::ApplicationDataType, &owner) {
                self.collections.application_data_types.push(e.clone());
            }
        }
        for e in d.implementation_data_types.iter() {
            if self.claim(&e.uid, ElementKind::ImplementationDataType, &owner) {
                self.collections.implementation_data_types.push(e.clone());
            }
        }
        for e in d.data_type_mappings.iter() {
            if self.claim(&e.uid, ElementKind::DataTypeMapping, &owner) {
                self.collections.data_type_mappings.push(e.clone());
            }
        }
        for iface in d.interfaces.iter() {
            if let Some(iface) = self.register_interface(iface, &owner) {
                self.collections.interfaces.push(iface);
            }
        }
        for swc in d.components.iter() {
            if let Some(swc) = self.register_component(swc, &owner) {
                self.collections.components.push(swc);
            }
        }
        for connection in d.connections.iter() {
            self.register_connection(connection, owner.clone());
        }
    }

    /// Register an interface and its children; duplicate children are dropped
    fn register_interface(&mut self, iface: &Interface, owner: &ElementOwner) -> Option<Interface> {
        if !self.claim(&iface.uid, ElementKind::Interface, owner) {
            return None;
        }
        let mut retained = iface.clone();
        retained.data_elements.clear();
        retained.operations.clear();
        for de in iface.data_elements.iter() {
            if self.claim(&de.uid, ElementKind::DataElement, owner) {
                retained.data_elements.push(de.clone());
            }
        }
        for op in iface.operations.iter() {
            if self.claim(&op.uid, ElementKind::Operation, owner) {
                retained.operations.push(op.clone());
            }
        }
        Some(retained)
    }

    /// Register a component and its children; duplicate children are dropped
    fn register_component(
        &mut self,
        swc: &SoftwareComponent,
        owner: &ElementOwner,
    ) -> Option<SoftwareComponent> {
        if !self.claim(&swc.uid, ElementKind::Component, owner) {
            return None;
        }
        let mut retained = swc.clone();
        retained.ports.clear();
        retained.runnables.clear();
        for port in swc.ports.iter() {
            if self.claim(&port.uid, ElementKind::Port, owner) {
                retained.ports.push(port.clone());
            }
        }
        for runnable in swc.runnables.iter() {
            if self.claim(&runnable.uid, ElementKind::Runnable, owner) {
                retained.runnables.push(runnable.clone());
            }
        }
        Some(retained)
    }

    fn register_connection(&mut self, connection: &PortConnection, owner: ElementOwner) {
        if self.claim(&connection.uid, ElementKind::Connection, &owner) {
            self.collections.connections.push(connection.clone());
        }
    }

    // =========================================================================
    // Step 2: reference resolution
    // =========================================================================

    fn degrade(&mut self, uid: &Uid, reason: DegradeReason) {
        self.degraded.entry(uid.clone()).or_insert(reason);
    }

    fn resolve(&mut self, references: &[Reference]) {
        for r in references.iter() {
            let found = self.registry.lookup(r.target.as_str()).map(|e| e.kind);
            if found == Some(r.expected) {
                continue;
            }

            if found.is_none() {
                if let Some(module) = self.disabled.get(&r.target).cloned() {
                    self.issues.push(MergeIssue::DisabledModuleReference {
                        referrer: r.referrer.clone(),
                        referrer_kind: r.referrer_kind,
                        field: r.field.to_string(),
                        target: r.target.clone(),
                        module: module.clone(),
                    });
                    self.degrade(
                        &r.referrer,
                        DegradeReason::DisabledModule {
                            field: r.field.to_string(),
                            target: r.target.clone(),
                            module,
                        },
                    );
                    continue;
                }
            }

            self.issues.push(MergeIssue::UnresolvedReference {
                referrer: r.referrer.clone(),
                referrer_kind: r.referrer_kind,
                field: r.field.to_string(),
                target: r.target.clone(),
                expected: r.expected,
                found,
            });
            self.degrade(
                &r.referrer,
                DegradeReason::UnresolvedReference {
                    field: r.field.to_string(),
                    target: r.target.clone(),
                },
            );
        }
    }

    /// Names that become C identifiers, and component file names
    fn check_names(&mut self) {
        let c = &self.collections;
        let mut named: Vec<(Uid, ElementKind, String)> = Vec::new();
        for adt in c.application_data_types.iter() {
            named.push((adt.uid.clone(), ElementKind::ApplicationDataType, adt.name.clone()));
        }
        for idt in c.implementation_data_types.iter() {
            named.push((idt.uid.clone(), ElementKind::ImplementationDataType, idt.name.clone()));
        }
        for iface in c.interfaces.iter() {
            named.push((iface.uid.clone(), ElementKind::Interface, iface.name.clone()));
            for de in iface.data_elements.iter() {
                named.push((de.uid.clone(), ElementKind::DataElement, de.name.clone()));
            }
            for op in iface.operations.iter() {
                named.push((op.uid.clone(), ElementKind::Operation, op.name.clone()));
            }
        }
        for swc in c.components.iter() {
            named.push((swc.uid.clone(), ElementKind::Component, swc.name.clone()));
            for port in swc.ports.iter() {
                named.push((port.uid.clone(), ElementKind::Port, port.name.clone()));
            }
            for runnable in swc.runnables.iter() {
                named.push((runnable.uid.clone(), ElementKind::Runnable, runnable.name.clone()));
            }
        }

        for (uid, kind, name) in named {
            if is_c_identifier(&name) {
                continue;
            }
            self.issues.push(MergeIssue::InvalidName {
                uid: uid.clone(),
                kind,
                name: name.clone(),
            });
            self.degrade(&uid, DegradeReason::InvalidName { name });
        }
    }

    /// An application type may have only one active mapping
    fn check_mappings(&mut self) {
        let mut mapped: HashMap<Uid, Uid> = HashMap::new();
        let mappings = self.collections.data_type_mappings.clone();
        for mapping in mappings.iter() {
            if self.degraded.contains_key(&mapping.uid) {
                continue;
            }
            match mapped.get(&mapping.app_type_uid) {
                Some(existing) => {
                    self.issues.push(MergeIssue::DuplicateMapping {
                        mapping: mapping.uid.clone(),
                        app_type: mapping.app_type_uid.clone(),
                        existing: existing.clone(),
                    });
                    let existing = existing.clone();
                    self.degrade(&mapping.uid, DegradeReason::DuplicateMapping { existing });
                }
                None => {
                    mapped.insert(mapping.app_type_uid.clone(), mapping.uid.clone());
                }
            }
        }
    }

    // =========================================================================
    // Step 3: connection validation
    // =========================================================================

    fn validate_connections(&mut self) {
        let mut seen: HashMap<(Uid, Uid), Uid> = HashMap::new();
        let connections = self.collections.connections.clone();

        for connection in connections.iter() {
            let fault = self.check_connection(connection).or_else(|| {
                let key = (
                    connection.provider_port_uid.clone(),
                    connection.requester_port_uid.clone(),
                );
                match seen.get(&key) {
                    Some(existing) => Some(ConnectionFault::Duplicate {
                        existing: existing.clone(),
                    }),
                    None => {
                        seen.insert(key, connection.uid.clone());
                        None
                    }
                }
            });

            if let Some(fault) = fault {
                let owner = self
                    .registry
                    .lookup(connection.uid.as_str())
                    .map(|e| e.owner.clone())
                    .unwrap_or(ElementOwner::Master);
                tracing::warn!("Invalid connection '{}': {}", connection.label(), fault);
                self.issues.push(MergeIssue::InvalidConnection {
                    connection: connection.uid.clone(),
                    name: connection.name.clone(),
                    owner,
                    fault: fault.clone(),
                });
                self.degrade(&connection.uid, DegradeReason::InvalidConnection { fault });
            }
        }
    }

    fn missing(&self, uid: &Uid, fault: ConnectionFault) -> ConnectionFault {
        match self.disabled.get(uid) {
            Some(module) => ConnectionFault::DisabledEndpoint {
                uid: uid.clone(),
                module: module.clone(),
            },
            None => fault,
        }
    }

    fn find_component(&self, uid: &Uid) -> Result<&SoftwareComponent, ConnectionFault> {
        self.collections
            .components
            .iter()
            .find(|c| &c.uid == uid)
            .ok_or_else(|| self.missing(uid, ConnectionFault::MissingComponent { uid: uid.clone() }))
    }

    /// The port `port_uid`, which must belong to component `swc_uid`
    fn endpoint(&self, swc_uid: &Uid, port_uid: &Uid) -> Result<&Port, ConnectionFault> {
        let swc = self.find_component(swc_uid)?;
        if let Some(port) = swc.port(port_uid.as_str()) {
            return Ok(port);
        }
        if self.registry.lookup(port_uid.as_str()).map(|e| e.kind) == Some(ElementKind::Port) {
            return Err(ConnectionFault::PortNotOnComponent {
                port: port_uid.clone(),
                component: swc_uid.clone(),
            });
        }
        Err(self.missing(
            port_uid,
            ConnectionFault::MissingPort {
                uid: port_uid.clone(),
            },
        ))
    }

    fn check_connection(&self, connection: &PortConnection) -> Option<ConnectionFault> {
        if connection.provider_swc_uid == connection.requester_swc_uid
            && connection.provider_port_uid == connection.requester_port_uid
        {
            return Some(ConnectionFault::SelfConnection);
        }

        let provider = match self.endpoint(&connection.provider_swc_uid, &connection.provider_port_uid) {
            Ok(port) => port,
            Err(fault) => return Some(fault),
        };
        let requester =
            match self.endpoint(&connection.requester_swc_uid, &connection.requester_port_uid) {
                Ok(port) => port,
                Err(fault) => return Some(fault),
            };

        if provider.direction != PortDirection::Provided {
            return Some(ConnectionFault::WrongDirection {
                port: provider.uid.clone(),
                expected: PortDirection::Provided,
            });
        }
        if requester.direction != provider.direction.opposite() {
            return Some(ConnectionFault::WrongDirection {
                port: requester.uid.clone(),
                expected: PortDirection::Required,
            });
        }
        if provider.interface_uid != requester.interface_uid {
            return Some(ConnectionFault::InterfaceMismatch {
                provider: provider.interface_uid.clone(),
                requester: requester.interface_uid.clone(),
            });
        }
        if self
            .registry
            .lookup(provider.interface_uid.as_str())
            .map(|e| e.kind)
            != Some(ElementKind::Interface)
        {
            return Some(ConnectionFault::InterfaceUnavailable {
                interface: provider.interface_uid.clone(),
            });
        }
        None
    }

    // =========================================================================
    // Step 4: degradation propagation
    // =========================================================================

    fn propagate(&mut self, references: &[Reference]) {
        let mut edges: Vec<(Uid, Uid)> = references
            .iter()
            .map(|r| (r.referrer.clone(), r.target.clone()))
            .collect();
        edges.extend(containment_edges(&self.collections));

        let mut changed = true;
        while changed {
            changed = false;
            for (from, to) in edges.iter() {
                if self.degraded.contains_key(to) && !self.degraded.contains_key(from) {
                    self.degraded.insert(
                        from.clone(),
                        DegradeReason::DependsOnDegraded { target: to.clone() },
                    );
                    changed = true;
                }
            }
        }
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
fn is_c_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Every reference field of every retained element, in model order
fn collect_references(c: &Collections) -> Vec<Reference> {
    let mut refs = Vec::new();

    for adt in c.application_data_types.iter() {
        let kind = ElementKind::ApplicationDataType;
        if let Some(cm) = &adt.compu_method_uid {
            refs.push(Reference::new(&adt.uid, kind, "compu_method_uid", cm, ElementKind::CompuMethod));
        }
        if let Some(element) = &adt.element_type_uid {
            refs.push(Reference::new(&adt.uid, kind, "element_type_uid", element, kind));
        }
        for member in adt.struct_members.iter() {
            refs.push(Reference::new(&adt.uid, kind, "struct_members.type_uid", &member.type_uid, kind));
        }
    }

    for mapping in c.data_type_mappings.iter() {
        let kind = ElementKind::DataTypeMapping;
        refs.push(Reference::new(
            &mapping.uid,
            kind,
            "app_type_uid",
            &mapping.app_type_uid,
            ElementKind::ApplicationDataType,
        ));
        refs.push(Reference::new(
            &mapping.uid,
            kind,
            "impl_type_uid",
            &mapping.impl_type_uid,
            ElementKind::ImplementationDataType,
        ));
    }

    for iface in c.interfaces.iter() {
        for de in iface.data_elements.iter() {
            if let Some(app_type) = &de.app_type_uid {
                refs.push(Reference::new(
                    &de.uid,
                    ElementKind::DataElement,
                    "app_type_uid",
                    app_type,
                    ElementKind::ApplicationDataType,
                ));
            }
        }
        for op in iface.operations.iter() {
            for arg in op.arguments.iter() {
                if let Some(app_type) = &arg.app_type_uid {
                    refs.push(Reference::new(
                        &op.uid,
                        ElementKind::Operation,
                        "arguments.app_type_uid",
                        app_type,
                        ElementKind::ApplicationDataType,
                    ));
                }
            }
        }
    }

    for swc in c.components.iter() {
        for port in swc.ports.iter() {
            refs.push(Reference::new(
                &port.uid,
                ElementKind::Port,
                "interface_uid",
                &port.interface_uid,
                ElementKind::Interface,
            ));
        }
    }

    refs
}

/// Container -> child and connection -> endpoint dependencies
fn containment_edges(c: &Collections) -> Vec<(Uid, Uid)> {
    let mut edges = Vec::new();
    for iface in c.interfaces.iter() {
        for de in iface.data_elements.iter() {
            edges.push((iface.uid.clone(), de.uid.clone()));
        }
        for op in iface.operations.iter() {
            edges.push((iface.uid.clone(), op.uid.clone()));
        }
    }
    for swc in c.components.iter() {
        for port in swc.ports.iter() {
            edges.push((swc.uid.clone(), port.uid.clone()));
        }
        for runnable in swc.runnables.iter() {
            edges.push((swc.uid.clone(), runnable.uid.clone()));
        }
    }
    let known: HashSet<&Uid> = c.components.iter().map(|s| &s.uid).collect();
    for conn in c.connections.iter() {
        for swc in [&conn.provider_swc_uid, &conn.requester_swc_uid] {
            if known.contains(swc) {
                edges.push((conn.uid.clone(), swc.clone()));
            }
        }
        edges.push((conn.uid.clone(), conn.provider_port_uid.clone()));
        edges.push((conn.uid.clone(), conn.requester_port_uid.clone()));
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CompuMethod, DataElement, Runnable};

    fn compu(uid: &str, name: &str) -> CompuMethod {
        CompuMethod {
            uid: Uid::new(uid),
            name: name.to_string(),
            factor: 1.0,
            offset: 0.0,
            unit: String::new(),
            description: String::new(),
        }
    }

    fn port(uid: &str, direction: PortDirection, iface: &str) -> Port {
        Port {
            uid: Uid::new(uid),
            name: format!("P_{uid}"),
            direction,
            interface_uid: Uid::new(iface),
            description: String::new(),
        }
    }

    fn component(uid: &str, ports: Vec<Port>) -> SoftwareComponent {
        SoftwareComponent {
            uid: Uid::new(uid),
            name: format!("Swc_{uid}"),
            ports,
            runnables: vec![Runnable {
                uid: Uid::new(&format!("{uid}_run")),
                name: "Run".to_string(),
                period_ms: 10,
                description: String::new(),
            }],
            description: String::new(),
        }
    }

    fn interface(uid: &str) -> Interface {
        Interface {
            uid: Uid::new(uid),
            name: format!("If_{uid}"),
            kind: crate::model::InterfaceKind::SenderReceiver,
            data_elements: vec![DataElement {
                uid: Uid::new(&format!("{uid}_de")),
                name: "Value".to_string(),
                app_type_uid: None,
                base_type: Default::default(),
                init_value: "0".to_string(),
                description: String::new(),
            }],
            operations: Vec::new(),
            description: String::new(),
        }
    }

    fn connection(uid: &str, p: (&str, &str), r: (&str, &str)) -> PortConnection {
        PortConnection {
            uid: Uid::new(uid),
            name: uid.to_string(),
            provider_swc_uid: Uid::new(p.0),
            provider_port_uid: Uid::new(p.1),
            requester_swc_uid: Uid::new(r.0),
            requester_port_uid: Uid::new(r.1),
            description: String::new(),
        }
    }

    fn slot<'a>(name: &'a str, descriptor: &'a ModuleDescriptor) -> ModuleSlot<'a> {
        ModuleSlot {
            name,
            enabled: true,
            descriptor,
        }
    }

    #[test]
    fn test_duplicate_within_one_module_reported() {
        let mut module = ModuleDescriptor::new("A");
        module.compu_methods = vec![compu("cm1", "First"), compu("cm1", "Second")];
        let outcome = merge(&MasterProject::new("P"), &[slot("A", &module)]);

        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.project.compu_methods().len(), 1);
        assert_eq!(outcome.project.compu_methods()[0].name, "First");
    }

    #[test]
    fn test_duplicate_port_drops_only_the_port() {
        let mut a = ModuleDescriptor::new("A");
        a.interfaces = vec![interface("if1")];
        a.components = vec![component("c1", vec![port("p1", PortDirection::Provided, "if1")])];
        let mut b = ModuleDescriptor::new("B");
        b.components = vec![component("c2", vec![port("p1", PortDirection::Required, "if1")])];

        let outcome = merge(&MasterProject::new("P"), &[slot("A", &a), slot("B", &b)]);
        assert_eq!(outcome.issues.len(), 1);
        let c2 = outcome.project.component("c2").unwrap();
        assert!(c2.ports.is_empty());
        assert_eq!(outcome.project.find_element_module("p1"), Some("A"));
    }

    #[test]
    fn test_invalid_names_degrade_component() {
        let mut module = ModuleDescriptor::new("A");
        module.interfaces = vec![interface("if1")];
        let mut escaped = component("c1", vec![port("p1", PortDirection::Provided, "if1")]);
        escaped.name = "../escaped".to_string();
        let mut spaced = component("c2", vec![port("p2", PortDirection::Required, "if1")]);
        spaced.ports[0].name = "Rp Speed".to_string();
        module.components = vec![escaped, spaced, component("c3", Vec::new())];

        let outcome = merge(&MasterProject::new("P"), &[slot("A", &module)]);
        let invalid: Vec<_> = outcome
            .issues
            .iter()
            .filter_map(|issue| match issue {
                MergeIssue::InvalidName { uid, kind, .. } => Some((uid.as_str(), *kind)),
                _ => None,
            })
            .collect();
        assert_eq!(
            invalid,
            vec![("c1", ElementKind::Component), ("p2", ElementKind::Port)]
        );

        let project = &outcome.project;
        assert!(matches!(
            project.degradation("c1"),
            Some(DegradeReason::InvalidName { name }) if name == "../escaped"
        ));
        assert!(matches!(
            project.degradation("c2"),
            Some(DegradeReason::DependsOnDegraded { .. })
        ));
        assert!(project.is_generation_eligible("c3"));
    }

    #[test]
    fn test_c_identifier_rules() {
        for ok in ["Swc_A", "_private", "x1"] {
            assert!(is_c_identifier(ok), "{ok}");
        }
        for bad in ["", "1st", "../escaped", "Swc-A", "Swc A", "Ä"] {
            assert!(!is_c_identifier(bad), "{bad}");
        }
    }

    #[test]
    fn test_wrong_kind_reference_is_unresolved() {
        let mut module = ModuleDescriptor::new("A");
        module.compu_methods = vec![compu("cm1", "CM")];
        module.components = vec![component("c1", vec![port("p1", PortDirection::Provided, "cm1")])];

        let outcome = merge(&MasterProject::new("P"), &[slot("A", &module)]);
        assert!(matches!(
            &outcome.issues[0],
            MergeIssue::UnresolvedReference {
                found: Some(ElementKind::CompuMethod),
                ..
            }
        ));
        assert!(outcome.project.is_degraded("p1"));
        // The owning component depends on the port and is excluded as well
        assert!(!outcome.project.is_generation_eligible("c1"));
        assert!(outcome.project.contains("c1"));
    }

    #[test]
    fn test_direction_and_interface_rules() {
        let mut module = ModuleDescriptor::new("A");
        module.interfaces = vec![interface("if1"), interface("if2")];
        module.components = vec![
            component("c1", vec![port("p1", PortDirection::Provided, "if1")]),
            component(
                "c2",
                vec![
                    port("p2", PortDirection::Required, "if1"),
                    port("p3", PortDirection::Required, "if2"),
                    port("p4", PortDirection::Provided, "if1"),
                ],
            ),
        ];
        module.connections = vec![
            connection("ok", ("c1", "p1"), ("c2", "p2")),
            connection("mismatch", ("c1", "p1"), ("c2", "p3")),
            connection("both_provided", ("c1", "p1"), ("c2", "p4")),
            connection("dup", ("c1", "p1"), ("c2", "p2")),
            connection("wrong_owner", ("c1", "p2"), ("c2", "p2")),
        ];

        let outcome = merge(&MasterProject::new("P"), &[slot("A", &module)]);
        let faults: Vec<_> = outcome
            .issues
            .iter()
            .map(|i| match i {
                MergeIssue::InvalidConnection { connection, fault, .. } => {
                    (connection.as_str().to_string(), fault.clone())
                }
                other => panic!("unexpected issue {other:?}"),
            })
            .collect();

        assert_eq!(faults.len(), 4);
        assert!(matches!(faults[0].1, ConnectionFault::InterfaceMismatch { .. }));
        assert!(matches!(faults[1].1, ConnectionFault::WrongDirection { .. }));
        assert!(matches!(faults[2].1, ConnectionFault::Duplicate { .. }));
        assert!(matches!(faults[3].1, ConnectionFault::PortNotOnComponent { .. }));
        assert!(outcome.project.is_generation_eligible("ok"));
        assert_eq!(outcome.project.connections_for_port("p1").len(), 1);
    }

    #[test]
    fn test_duplicate_mapping_degrades_later_mapping() {
        use crate::model::{ApplicationDataType, BaseDataType, DataTypeMapping, ImplementationDataType};

        let mut module = ModuleDescriptor::new("Types");
        module.application_data_types = vec![ApplicationDataType {
            uid: Uid::new("at1"),
            name: "Speed_T".into(),
            category: Default::default(),
            compu_method_uid: None,
            min_value: None,
            max_value: None,
            init_value: "0".into(),
            array_size: None,
            element_type_uid: None,
            struct_members: Vec::new(),
            enum_literals: Vec::new(),
            description: String::new(),
        }];
        module.implementation_data_types = ["it1", "it2"]
            .iter()
            .map(|uid| ImplementationDataType {
                uid: Uid::new(*uid),
                name: format!("Impl_{uid}"),
                base_type: BaseDataType::Uint16,
                array_size: None,
                description: String::new(),
            })
            .collect();
        module.data_type_mappings = vec![
            DataTypeMapping {
                uid: Uid::new("m1"),
                app_type_uid: Uid::new("at1"),
                impl_type_uid: Uid::new("it1"),
            },
            DataTypeMapping {
                uid: Uid::new("m2"),
                app_type_uid: Uid::new("at1"),
                impl_type_uid: Uid::new("it2"),
            },
        ];

        let outcome = merge(&MasterProject::new("P"), &[slot("Types", &module)]);
        assert_eq!(outcome.issues.len(), 1);
        assert!(outcome.project.is_degraded("m2"));
        assert_eq!(
            outcome.project.impl_type_for_app_type("at1").map(|t| t.name.as_str()),
            Some("Impl_it1")
        );
    }

    #[test]
    fn test_merge_is_deterministic() {
        let mut a = ModuleDescriptor::new("A");
        a.interfaces = vec![interface("if1")];
        a.components = vec![
            component("c1", vec![port("p1", PortDirection::Provided, "missing")]),
            component("c2", vec![port("p2", PortDirection::Required, "if1")]),
        ];
        a.connections = vec![connection("x", ("c1", "p1"), ("c2", "p2"))];

        let first = merge(&MasterProject::new("P"), &[slot("A", &a)]);
        let second = merge(&MasterProject::new("P"), &[slot("A", &a)]);
        assert_eq!(first.issues, second.issues);
        assert_eq!(
            first.project.degradation("c1"),
            second.project.degradation("c1")
        );
    }
}
