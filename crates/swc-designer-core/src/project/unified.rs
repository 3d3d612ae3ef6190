//! Unified project view
//!
//! The merged, cross-module resolved model. It is built in one piece by
//! [`merge`](super::merge::merge) and is read-only afterwards; a change to any
//! module produces a new `UnifiedProject` instead of mutating this one.

use std::collections::HashMap;

use serde::Serialize;

use super::issues::ConnectionFault;
use super::registry::ElementOwner;
use crate::model::{
    ApplicationDataType, CompuMethod, DataTypeMapping, ElementKind, ElementRef,
    ImplementationDataType, Interface, Port, PortConnection, PortDirection, SoftwareComponent,
    Uid,
};

/// Why an element is excluded from code generation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DegradeReason {
    /// A reference field does not resolve to an element of the expected kind
    UnresolvedReference { field: String, target: Uid },
    /// A reference field points into a disabled module
    DisabledModule {
        field: String,
        target: Uid,
        module: String,
    },
    /// The connection breaks the port/interface rules
    InvalidConnection { fault: ConnectionFault },
    /// Another mapping for the same application type came first
    DuplicateMapping { existing: Uid },
    /// The name cannot be used as a C identifier
    InvalidName { name: String },
    /// The element refers to or contains a degraded element
    DependsOnDegraded { target: Uid },
}

/// Position of an element inside the unified collections
#[derive(Debug, Clone, Copy)]
enum Location {
    CompuMethod(usize),
    ApplicationDataType(usize),
    ImplementationDataType(usize),
    DataTypeMapping(usize),
    Interface(usize),
    DataElement(usize, usize),
    Operation(usize, usize),
    Component(usize),
    Port(usize, usize),
    Runnable(usize, usize),
    Connection(usize),
}

/// Merged, queryable project model
#[derive(Debug, Clone, Default)]
pub struct UnifiedProject {
    name: String,
    description: String,
    compu_methods: Vec<CompuMethod>,
    application_data_types: Vec<ApplicationDataType>,
    implementation_data_types: Vec<ImplementationDataType>,
    data_type_mappings: Vec<DataTypeMapping>,
    interfaces: Vec<Interface>,
    components: Vec<SoftwareComponent>,
    connections: Vec<PortConnection>,
    owners: HashMap<Uid, ElementOwner>,
    degraded: HashMap<Uid, DegradeReason>,
    index: HashMap<Uid, Location>,
}

/// Element collections handed from the merger to [`UnifiedProject::assemble`]
#[derive(Debug, Default)]
pub(crate) struct Collections {
    pub compu_methods: Vec<CompuMethod>,
    pub application_data_types: Vec<ApplicationDataType>,
    pub implementation_data_types: Vec<ImplementationDataType>,
    pub data_type_mappings: Vec<DataTypeMapping>,
    pub interfaces: Vec<Interface>,
    pub components: Vec<SoftwareComponent>,
    pub connections: Vec<PortConnection>,
}

impl UnifiedProject {
    pub(crate) fn assemble(
        name: String,
        description: String,
        collections: Collections,
        owners: HashMap<Uid, ElementOwner>,
        degraded: HashMap<Uid, DegradeReason>,
    ) -> Self {
        let mut project = Self {
            name,
            description,
            compu_methods: collections.compu_methods,
            application_data_types: collections.application_data_types,
            implementation_data_types: collections.implementation_data_types,
            data_type_mappings: collections.data_type_mappings,
            interfaces: collections.interfaces,
            components: collections.components,
            connections: collections.connections,
            owners,
            degraded,
            index: HashMap::new(),
        };
        project.build_index();
        project
    }

    fn build_index(&mut self) {
        let mut index = HashMap::new();
        for (i, e) in self.compu_methods.iter().enumerate() {
            index.insert(e.uid.clone(), Location::CompuMethod(i));
        }
        for (i, e) in self.application_data_types.iter().enumerate() {
            index.insert(e.uid.clone(), Location::ApplicationDataType(i));
        }
        for (i, e) in self.implementation_data_types.iter().enumerate() {
            index.insert(e.uid.clone(), Location::ImplementationDataType(i));
        }
        for (i, e) in self.data_type_mappings.iter().enumerate() {
            index.insert(e.uid.clone(), Location::DataTypeMapping(i));
        }
        for (i, iface) in self.interfaces.iter().enumerate() {
            index.insert(iface.uid.clone(), Location::Interface(i));
            for (j, de) in iface.data_elements.iter().enumerate() {
                index.insert(de.uid.clone(), Location::DataElement(i, j));
            }
            for (j, op) in iface.operations.iter().enumerate() {
                index.insert(op.uid.clone(), Location::Operation(i, j));
            }
        }
        for (i, swc) in self.components.iter().enumerate() {
            index.insert(swc.uid.clone(), Location::Component(i));
            for (j, port) in swc.ports.iter().enumerate() {
                index.insert(port.uid.clone(), Location::Port(i, j));
            }
            for (j, runnable) in swc.runnables.iter().enumerate() {
                index.insert(runnable.uid.clone(), Location::Runnable(i, j));
            }
        }
        for (i, e) in self.connections.iter().enumerate() {
            index.insert(e.uid.clone(), Location::Connection(i));
        }
        self.index = index;
    }

    // --- Collections ---

    /// Master project name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn compu_methods(&self) -> &[CompuMethod] {
        &self.compu_methods
    }

    pub fn application_data_types(&self) -> &[ApplicationDataType] {
        &self.application_data_types
    }

    pub fn implementation_data_types(&self) -> &[ImplementationDataType] {
        &self.implementation_data_types
    }

    pub fn data_type_mappings(&self) -> &[DataTypeMapping] {
        &self.data_type_mappings
    }

    pub fn interfaces(&self) -> &[Interface] {
        &self.interfaces
    }

    pub fn components(&self) -> &[SoftwareComponent] {
        &self.components
    }

    /// Module-local connections in module order, then global connections
    pub fn connections(&self) -> &[PortConnection] {
        &self.connections
    }

    /// Number of elements (nested ones included)
    pub fn element_count(&self) -> usize {
        self.index.len()
    }

    // --- Lookup by UID ---

    pub fn element(&self, uid: &str) -> Option<ElementRef<'_>> {
        let location = *self.index.get(uid)?;
        Some(match location {
            Location::CompuMethod(i) => ElementRef::CompuMethod(&self.compu_methods[i]),
            Location::ApplicationDataType(i) => {
                ElementRef::ApplicationDataType(&self.application_data_types[i])
            }
            Location::ImplementationDataType(i) => {
                ElementRef::ImplementationDataType(&self.implementation_data_types[i])
            }
            Location::DataTypeMapping(i) => ElementRef::DataTypeMapping(&self.data_type_mappings[i]),
            Location::Interface(i) => ElementRef::Interface(&self.interfaces[i]),
            Location::DataElement(i, j) => {
                let iface = &self.interfaces[i];
                ElementRef::DataElement(iface, &iface.data_elements[j])
            }
            Location::Operation(i, j) => {
                let iface = &self.interfaces[i];
                ElementRef::Operation(iface, &iface.operations[j])
            }
            Location::Component(i) => ElementRef::Component(&self.components[i]),
            Location::Port(i, j) => {
                let swc = &self.components[i];
                ElementRef::Port(swc, &swc.ports[j])
            }
            Location::Runnable(i, j) => {
                let swc = &self.components[i];
                ElementRef::Runnable(swc, &swc.runnables[j])
            }
            Location::Connection(i) => ElementRef::Connection(&self.connections[i]),
        })
    }

    pub fn kind_of(&self, uid: &str) -> Option<ElementKind> {
        self.element(uid).map(|e| e.kind())
    }

    pub fn contains(&self, uid: &str) -> bool {
        self.index.contains_key(uid)
    }

    pub fn compu_method(&self, uid: &str) -> Option<&CompuMethod> {
        match self.element(uid)? {
            ElementRef::CompuMethod(e) => Some(e),
            _ => None,
        }
    }

    pub fn application_data_type(&self, uid: &str) -> Option<&ApplicationDataType> {
        match self.element(uid)? {
            ElementRef::ApplicationDataType(e) => Some(e),
            _ => None,
        }
    }

    pub fn implementation_data_type(&self, uid: &str) -> Option<&ImplementationDataType> {
        match self.element(uid)? {
            ElementRef::ImplementationDataType(e) => Some(e),
            _ => None,
        }
    }

    pub fn interface(&self, uid: &str) -> Option<&Interface> {
        match self.element(uid)? {
            ElementRef::Interface(e) => Some(e),
            _ => None,
        }
    }

    pub fn component(&self, uid: &str) -> Option<&SoftwareComponent> {
        match self.element(uid)? {
            ElementRef::Component(e) => Some(e),
            _ => None,
        }
    }

    /// A port together with the component that owns it
    pub fn port(&self, uid: &str) -> Option<(&SoftwareComponent, &Port)> {
        match self.element(uid)? {
            ElementRef::Port(swc, port) => Some((swc, port)),
            _ => None,
        }
    }

    pub fn connection(&self, uid: &str) -> Option<&PortConnection> {
        match self.element(uid)? {
            ElementRef::Connection(e) => Some(e),
            _ => None,
        }
    }

    // --- Ownership ---

    /// Name of the module that declares `uid`.
    ///
    /// Returns `None` for unknown UIDs and for elements declared in the master
    /// descriptor itself (see [`owner`](Self::owner)).
    pub fn find_element_module(&self, uid: &str) -> Option<&str> {
        self.owners.get(uid).and_then(ElementOwner::module_name)
    }

    pub fn owner(&self, uid: &str) -> Option<&ElementOwner> {
        self.owners.get(uid)
    }

    // --- Generation eligibility ---

    /// True when the element exists and is not degraded
    pub fn is_generation_eligible(&self, uid: &str) -> bool {
        self.contains(uid) && !self.degraded.contains_key(uid)
    }

    pub fn is_degraded(&self, uid: &str) -> bool {
        self.degraded.contains_key(uid)
    }

    pub fn degradation(&self, uid: &str) -> Option<&DegradeReason> {
        self.degraded.get(uid)
    }

    pub fn degraded_count(&self) -> usize {
        self.degraded.len()
    }

    pub fn eligible_interfaces(&self) -> impl Iterator<Item = &Interface> {
        self.interfaces
            .iter()
            .filter(|e| self.is_generation_eligible(e.uid.as_str()))
    }

    pub fn eligible_components(&self) -> impl Iterator<Item = &SoftwareComponent> {
        self.components
            .iter()
            .filter(|e| self.is_generation_eligible(e.uid.as_str()))
    }

    pub fn eligible_connections(&self) -> impl Iterator<Item = &PortConnection> {
        self.connections
            .iter()
            .filter(|e| self.is_generation_eligible(e.uid.as_str()))
    }

    pub fn eligible_application_data_types(&self) -> impl Iterator<Item = &ApplicationDataType> {
        self.application_data_types
            .iter()
            .filter(|e| self.is_generation_eligible(e.uid.as_str()))
    }

    pub fn eligible_implementation_data_types(
        &self,
    ) -> impl Iterator<Item = &ImplementationDataType> {
        self.implementation_data_types
            .iter()
            .filter(|e| self.is_generation_eligible(e.uid.as_str()))
    }

    // --- Type and connection helpers ---

    /// Implementation type bound to an application type by its active mapping
    pub fn impl_type_for_app_type(&self, app_type_uid: &str) -> Option<&ImplementationDataType> {
        self.data_type_mappings
            .iter()
            .filter(|m| self.is_generation_eligible(m.uid.as_str()))
            .find(|m| m.app_type_uid.as_str() == app_type_uid)
            .and_then(|m| self.implementation_data_type(m.impl_type_uid.as_str()))
    }

    /// Valid connections with `port_uid` on either end
    pub fn connections_for_port(&self, port_uid: &str) -> Vec<&PortConnection> {
        self.eligible_connections()
            .filter(|c| {
                c.provider_port_uid.as_str() == port_uid
                    || c.requester_port_uid.as_str() == port_uid
            })
            .collect()
    }

    /// Required ports that could be connected to the given provided port
    pub fn compatible_ports(&self, provider_port_uid: &str) -> Vec<(&SoftwareComponent, &Port)> {
        let Some((_, provider)) = self.port(provider_port_uid) else {
            return Vec::new();
        };
        if provider.direction != PortDirection::Provided {
            return Vec::new();
        }

        self.components
            .iter()
            .flat_map(|swc| swc.ports.iter().map(move |port| (swc, port)))
            .filter(|(_, port)| {
                port.direction == PortDirection::Required
                    && port.interface_uid == provider.interface_uid
                    && port.uid != provider.uid
            })
            .collect()
    }
}
