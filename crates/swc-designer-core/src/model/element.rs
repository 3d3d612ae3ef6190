//! Tagged view over every kind of UID-carrying element

use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::{
    ApplicationDataType, CompuMethod, DataElement, DataTypeMapping, ImplementationDataType,
    Interface, Operation, Port, PortConnection, Runnable, SoftwareComponent,
};
use super::uid::Uid;

/// Discriminant of a model element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    CompuMethod,
    ApplicationDataType,
    ImplementationDataType,
    DataTypeMapping,
    Interface,
    DataElement,
    Operation,
    Component,
    Port,
    Runnable,
    Connection,
}

impl ElementKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::CompuMethod => "compu method",
            Self::ApplicationDataType => "application data type",
            Self::ImplementationDataType => "implementation data type",
            Self::DataTypeMapping => "data type mapping",
            Self::Interface => "interface",
            Self::DataElement => "data element",
            Self::Operation => "operation",
            Self::Component => "component",
            Self::Port => "port",
            Self::Runnable => "runnable",
            Self::Connection => "connection",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Borrowed reference to any element, tagged by kind
#[derive(Debug, Clone, Copy)]
pub enum ElementRef<'a> {
    CompuMethod(&'a CompuMethod),
    ApplicationDataType(&'a ApplicationDataType),
    ImplementationDataType(&'a ImplementationDataType),
    DataTypeMapping(&'a DataTypeMapping),
    Interface(&'a Interface),
    DataElement(&'a Interface, &'a DataElement),
    Operation(&'a Interface, &'a Operation),
    Component(&'a SoftwareComponent),
    Port(&'a SoftwareComponent, &'a Port),
    Runnable(&'a SoftwareComponent, &'a Runnable),
    Connection(&'a PortConnection),
}

impl<'a> ElementRef<'a> {
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::CompuMethod(_) => ElementKind::CompuMethod,
            Self::ApplicationDataType(_) => ElementKind::ApplicationDataType,
            Self::ImplementationDataType(_) => ElementKind::ImplementationDataType,
            Self::DataTypeMapping(_) => ElementKind::DataTypeMapping,
            Self::Interface(_) => ElementKind::Interface,
            Self::DataElement(..) => ElementKind::DataElement,
            Self::Operation(..) => ElementKind::Operation,
            Self::Component(_) => ElementKind::Component,
            Self::Port(..) => ElementKind::Port,
            Self::Runnable(..) => ElementKind::Runnable,
            Self::Connection(_) => ElementKind::Connection,
        }
    }

    pub fn uid(&self) -> &'a Uid {
        match self {
            Self::CompuMethod(e) => &e.uid,
            Self::ApplicationDataType(e) => &e.uid,
            Self::ImplementationDataType(e) => &e.uid,
            Self::DataTypeMapping(e) => &e.uid,
            Self::Interface(e) => &e.uid,
            Self::DataElement(_, e) => &e.uid,
            Self::Operation(_, e) => &e.uid,
            Self::Component(e) => &e.uid,
            Self::Port(_, e) => &e.uid,
            Self::Runnable(_, e) => &e.uid,
            Self::Connection(e) => &e.uid,
        }
    }

    /// Display name; mappings have none and report their UID
    pub fn name(&self) -> &'a str {
        match self {
            Self::CompuMethod(e) => &e.name,
            Self::ApplicationDataType(e) => &e.name,
            Self::ImplementationDataType(e) => &e.name,
            Self::DataTypeMapping(e) => e.uid.as_str(),
            Self::Interface(e) => &e.name,
            Self::DataElement(_, e) => &e.name,
            Self::Operation(_, e) => &e.name,
            Self::Component(e) => &e.name,
            Self::Port(_, e) => &e.name,
            Self::Runnable(_, e) => &e.name,
            Self::Connection(e) => e.label(),
        }
    }
}
