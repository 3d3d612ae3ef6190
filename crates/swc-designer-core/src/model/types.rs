//! Model element types
//!
//! Every element is decoded strictly: unknown fields and missing required
//! fields are rejected by the descriptor loader instead of being defaulted.

use serde::{Deserialize, Serialize};

use super::uid::Uid;

fn default_factor() -> f64 {
    1.0
}

fn default_init_value() -> String {
    "0".to_string()
}

fn is_default_init_value(value: &str) -> bool {
    value == "0"
}

// =============================================================================
// Enumerations
// =============================================================================

/// Direction of a component port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortDirection {
    /// Offers data or operations (sender / server)
    Provided,
    /// Consumes data or operations (receiver / client)
    Required,
}

impl PortDirection {
    /// The direction a peer port must have for a connection to be valid
    pub fn opposite(self) -> Self {
        match self {
            Self::Provided => Self::Required,
            Self::Required => Self::Provided,
        }
    }
}

/// Kind of interface contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceKind {
    /// Data exchange through data elements
    SenderReceiver,
    /// Operation invocation
    ClientServer,
}

impl InterfaceKind {
    /// Human-readable label used in generated comments
    pub fn label(self) -> &'static str {
        match self {
            Self::SenderReceiver => "sender-receiver",
            Self::ClientServer => "client-server",
        }
    }
}

/// Platform primitive types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseDataType {
    #[default]
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Boolean,
}

impl BaseDataType {
    /// Name of the matching `Std_Types.h` typedef
    pub fn c_name(self) -> &'static str {
        match self {
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Int8 => "sint8",
            Self::Int16 => "sint16",
            Self::Int32 => "sint32",
            Self::Int64 => "sint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Boolean => "boolean",
        }
    }
}

/// Category of an application data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppDataCategory {
    #[default]
    Value,
    Array,
    Structure,
    Enum,
}

/// Direction of an operation argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentDirection {
    #[default]
    In,
    Out,
    Inout,
}

// =============================================================================
// Data types
// =============================================================================

/// Linear scaling between internal and physical values.
///
/// `physical = internal * factor + offset`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompuMethod {
    pub uid: Uid,
    pub name: String,
    #[serde(default = "default_factor")]
    pub factor: f64,
    #[serde(default)]
    pub offset: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// A named member of a structure application type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StructMember {
    pub name: String,
    /// Reference to an [`ApplicationDataType`]
    pub type_uid: Uid,
}

/// A literal of an enumeration application type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnumLiteral {
    pub name: String,
    pub value: i64,
}

/// Logical (platform independent) data type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplicationDataType {
    pub uid: Uid,
    pub name: String,
    #[serde(default)]
    pub category: AppDataCategory,
    /// Reference to a [`CompuMethod`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compu_method_uid: Option<Uid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(
        default = "default_init_value",
        skip_serializing_if = "is_default_init_value"
    )]
    pub init_value: String,
    /// Element count for array types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_size: Option<u32>,
    /// Element type for array types, another [`ApplicationDataType`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_type_uid: Option<Uid>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub struct_members: Vec<StructMember>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_literals: Vec<EnumLiteral>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// Platform data type backed by a primitive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImplementationDataType {
    pub uid: Uid,
    pub name: String,
    pub base_type: BaseDataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_size: Option<u32>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// Links one application type to one implementation type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataTypeMapping {
    pub uid: Uid,
    pub app_type_uid: Uid,
    pub impl_type_uid: Uid,
}

// =============================================================================
// Interfaces
// =============================================================================

/// Data element of a sender-receiver interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataElement {
    pub uid: Uid,
    pub name: String,
    /// Reference to an [`ApplicationDataType`]; `base_type` is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_type_uid: Option<Uid>,
    #[serde(default)]
    pub base_type: BaseDataType,
    #[serde(
        default = "default_init_value",
        skip_serializing_if = "is_default_init_value"
    )]
    pub init_value: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// Argument of a client-server operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperationArgument {
    pub name: String,
    #[serde(default)]
    pub direction: ArgumentDirection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_type_uid: Option<Uid>,
    #[serde(default)]
    pub base_type: BaseDataType,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// Operation of a client-server interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Operation {
    pub uid: Uid,
    pub name: String,
    #[serde(default)]
    pub arguments: Vec<OperationArgument>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// Typed contract shared between ports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Interface {
    pub uid: Uid,
    pub name: String,
    #[serde(rename = "interface_type", alias = "kind")]
    pub kind: InterfaceKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_elements: Vec<DataElement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<Operation>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

// =============================================================================
// Components
// =============================================================================

/// Typed connection point on a component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Port {
    pub uid: Uid,
    pub name: String,
    pub direction: PortDirection,
    /// Reference to an [`Interface`]
    pub interface_uid: Uid,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// How a runnable is activated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnableTrigger {
    /// Cyclic activation with the given period in milliseconds
    Periodic(u32),
    /// Activated by an RTE event
    Event,
}

/// Executable unit of a component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Runnable {
    pub uid: Uid,
    pub name: String,
    /// Period in milliseconds; `0` means event-triggered
    #[serde(default = "default_period_ms")]
    pub period_ms: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

fn default_period_ms() -> u32 {
    10
}

impl Runnable {
    pub fn trigger(&self) -> RunnableTrigger {
        match self.period_ms {
            0 => RunnableTrigger::Event,
            period => RunnableTrigger::Periodic(period),
        }
    }
}

/// Software component (SWC)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SoftwareComponent {
    pub uid: Uid,
    pub name: String,
    #[serde(default)]
    pub ports: Vec<Port>,
    #[serde(default)]
    pub runnables: Vec<Runnable>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl SoftwareComponent {
    /// Find a port of this component by UID
    pub fn port(&self, uid: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.uid.as_str() == uid)
    }
}

/// Assembly connector between a provided and a required port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortConnection {
    pub uid: Uid,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub provider_swc_uid: Uid,
    pub provider_port_uid: Uid,
    pub requester_swc_uid: Uid,
    pub requester_port_uid: Uid,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl PortConnection {
    /// Display label: the connection name, or its UID when unnamed
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            self.uid.as_str()
        } else {
            &self.name
        }
    }
}
