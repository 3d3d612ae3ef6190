//! Example multi-module project
//!
//! ```text
//! <dir>/
//! ├── master.yaml
//! └── modules/
//!     ├── datatypes.yaml
//!     ├── interfaces.yaml
//!     ├── swc_sensor.yaml
//!     ├── swc_monitor.yaml
//!     └── swc_diag_tester.yaml
//! ```
//!
//! The sensor sends the vehicle speed to the monitor (sender-receiver); the
//! monitor serves `ReadDataById` to the diagnostic tester (client-server).

use std::path::{Path, PathBuf};

use super::descriptor::{DescriptorFormat, MasterProject, ModuleDescriptor, ModuleReference};
use super::error::WorkspaceError;
use crate::atomic::write_atomic;
use crate::model::{
    AppDataCategory, ApplicationDataType, ArgumentDirection, BaseDataType, CompuMethod,
    DataElement, DataTypeMapping, EnumLiteral, ImplementationDataType, Interface, InterfaceKind,
    Operation, OperationArgument, Port, PortConnection, PortDirection, Runnable,
    SoftwareComponent, Uid,
};

/// UIDs of the shared application types
struct Types {
    speed: Uid,
    speed_valid: Uid,
    diag_id: Uid,
    diag_status: Uid,
}

fn app_type(name: &str, category: AppDataCategory, description: &str) -> ApplicationDataType {
    ApplicationDataType {
        uid: Uid::generate(),
        name: name.to_string(),
        category,
        compu_method_uid: None,
        min_value: None,
        max_value: None,
        init_value: "0".to_string(),
        array_size: None,
        element_type_uid: None,
        struct_members: Vec::new(),
        enum_literals: Vec::new(),
        description: description.to_string(),
    }
}

fn impl_type(name: &str, base_type: BaseDataType) -> ImplementationDataType {
    ImplementationDataType {
        uid: Uid::generate(),
        name: name.to_string(),
        base_type,
        array_size: None,
        description: String::new(),
    }
}

fn data_types() -> (ModuleDescriptor, Types) {
    let mut module = ModuleDescriptor::new("DataTypes");
    module.description = "Shared data types and scaling definitions".to_string();

    let cm_speed = CompuMethod {
        uid: Uid::generate(),
        name: "CM_VehicleSpeed".to_string(),
        factor: 0.01,
        offset: 0.0,
        unit: "km/h".to_string(),
        description: String::new(),
    };

    let mut speed = app_type("VehicleSpeed_T", AppDataCategory::Value, "");
    speed.compu_method_uid = Some(cm_speed.uid.clone());
    speed.min_value = Some(0.0);
    speed.max_value = Some(65535.0);

    let mut speed_valid = app_type("SpeedValid_T", AppDataCategory::Value, "Speed validity flag");
    speed_valid.max_value = Some(1.0);

    let diag_id = app_type("DiagId_T", AppDataCategory::Value, "Diagnostic data identifier");

    let mut diag_status = app_type(
        "DiagStatus_T",
        AppDataCategory::Enum,
        "Diagnostic operation status",
    );
    diag_status.enum_literals = ["DIAG_OK", "DIAG_PENDING", "DIAG_NOT_SUPPORTED", "DIAG_ERROR"]
        .iter()
        .zip(0..)
        .map(|(name, value)| EnumLiteral {
            name: name.to_string(),
            value,
        })
        .collect();

    let uint16 = impl_type("Impl_uint16", BaseDataType::Uint16);
    let boolean = impl_type("Impl_boolean", BaseDataType::Boolean);
    let uint8 = impl_type("Impl_uint8", BaseDataType::Uint8);

    for (adt, idt) in [
        (&speed, &uint16),
        (&speed_valid, &boolean),
        (&diag_id, &uint16),
        (&diag_status, &uint8),
    ] {
        module.data_type_mappings.push(DataTypeMapping {
            uid: Uid::generate(),
            app_type_uid: adt.uid.clone(),
            impl_type_uid: idt.uid.clone(),
        });
    }

    let types = Types {
        speed: speed.uid.clone(),
        speed_valid: speed_valid.uid.clone(),
        diag_id: diag_id.uid.clone(),
        diag_status: diag_status.uid.clone(),
    };
    module.compu_methods.push(cm_speed);
    module.application_data_types = vec![speed, speed_valid, diag_id, diag_status];
    module.implementation_data_types = vec![uint16, boolean, uint8];
    (module, types)
}

fn data_element(name: &str, app_type: &Uid, base_type: BaseDataType) -> DataElement {
    DataElement {
        uid: Uid::generate(),
        name: name.to_string(),
        app_type_uid: Some(app_type.clone()),
        base_type,
        init_value: "0".to_string(),
        description: String::new(),
    }
}

fn interfaces(types: &Types) -> (ModuleDescriptor, Uid, Uid) {
    let mut module = ModuleDescriptor::new("Interfaces");
    module.description = "Shared interface definitions".to_string();

    let speed_interface = Interface {
        uid: Uid::generate(),
        name: "If_VehicleSpeed".to_string(),
        kind: InterfaceKind::SenderReceiver,
        data_elements: vec![
            data_element("VehicleSpeed", &types.speed, BaseDataType::Uint16),
            data_element("SpeedValid", &types.speed_valid, BaseDataType::Boolean),
        ],
        operations: Vec::new(),
        description: "Vehicle speed data interface".to_string(),
    };

    let diag_interface = Interface {
        uid: Uid::generate(),
        name: "If_DiagService".to_string(),
        kind: InterfaceKind::ClientServer,
        data_elements: Vec::new(),
        operations: vec![Operation {
            uid: Uid::generate(),
            name: "ReadDataById".to_string(),
            arguments: vec![
                OperationArgument {
                    name: "dataId".to_string(),
                    direction: ArgumentDirection::In,
                    app_type_uid: Some(types.diag_id.clone()),
                    base_type: BaseDataType::Uint16,
                    description: "Data identifier to read".to_string(),
                },
                OperationArgument {
                    name: "status".to_string(),
                    direction: ArgumentDirection::Out,
                    app_type_uid: Some(types.diag_status.clone()),
                    base_type: BaseDataType::Uint8,
                    description: String::new(),
                },
                OperationArgument {
                    name: "data".to_string(),
                    direction: ArgumentDirection::Inout,
                    app_type_uid: None,
                    base_type: BaseDataType::Uint8,
                    description: "Data buffer".to_string(),
                },
            ],
            description: "Read diagnostic data by ID".to_string(),
        }],
        description: "Diagnostic service interface".to_string(),
    };

    let uids = (speed_interface.uid.clone(), diag_interface.uid.clone());
    module.interfaces = vec![speed_interface, diag_interface];
    (module, uids.0, uids.1)
}

fn component_module(
    module_description: &str,
    name: &str,
    description: &str,
    ports: &[(&str, PortDirection, &Uid)],
    runnables: &[(&str, u32)],
) -> ModuleDescriptor {
    let mut module = ModuleDescriptor::new(name);
    module.description = module_description.to_string();
    module.components.push(SoftwareComponent {
        uid: Uid::generate(),
        name: name.to_string(),
        ports: ports
            .iter()
            .map(|(port, direction, interface)| Port {
                uid: Uid::generate(),
                name: port.to_string(),
                direction: *direction,
                interface_uid: (*interface).clone(),
                description: String::new(),
            })
            .collect(),
        runnables: runnables
            .iter()
            .map(|(runnable, period_ms)| Runnable {
                uid: Uid::generate(),
                name: runnable.to_string(),
                period_ms: *period_ms,
                description: String::new(),
            })
            .collect(),
        description: description.to_string(),
    });
    module
}

fn connect(
    name: &str,
    provider: (&ModuleDescriptor, usize),
    requester: (&ModuleDescriptor, usize),
    description: &str,
) -> PortConnection {
    let provider_swc = &provider.0.components[0];
    let requester_swc = &requester.0.components[0];
    PortConnection {
        uid: Uid::generate(),
        name: name.to_string(),
        provider_swc_uid: provider_swc.uid.clone(),
        provider_port_uid: provider_swc.ports[provider.1].uid.clone(),
        requester_swc_uid: requester_swc.uid.clone(),
        requester_port_uid: requester_swc.ports[requester.1].uid.clone(),
        description: description.to_string(),
    }
}

/// Write the example project into `dir` and return the master path
pub fn create_example_workspace(dir: &Path) -> Result<PathBuf, WorkspaceError> {
    let (types, type_uids) = data_types();
    let (ifaces, speed_interface, diag_interface) = interfaces(&type_uids);
    let sensor = component_module(
        "Speed sensor software component",
        "Swc_SpeedSensor",
        "Reads vehicle speed from sensor",
        &[("Pp_VehicleSpeed", PortDirection::Provided, &speed_interface)],
        &[("Run_ReadSpeed", 10)],
    );
    let monitor = component_module(
        "Speed monitoring software component",
        "Swc_SpeedMonitor",
        "Monitors vehicle speed and serves diagnostics",
        &[
            ("Rp_VehicleSpeed", PortDirection::Required, &speed_interface),
            ("Ps_DiagService", PortDirection::Provided, &diag_interface),
        ],
        &[("Run_MonitorSpeed", 20), ("Run_DiagHandler", 0)],
    );
    let tester = component_module(
        "Diagnostic tester software component",
        "Swc_DiagTester",
        "Diagnostic client",
        &[("Rc_DiagService", PortDirection::Required, &diag_interface)],
        &[("Run_DiagRequest", 100)],
    );

    let mut master = MasterProject::new("Multi-Module Automotive Project");
    master.description = "Example project split across multiple YAML files".to_string();
    master.global_connections = vec![
        connect(
            "Conn_VehicleSpeed",
            (&sensor, 0),
            (&monitor, 0),
            "Cross-module connection: Sensor -> Monitor",
        ),
        connect(
            "Conn_DiagService",
            (&monitor, 1),
            (&tester, 0),
            "Cross-module connection: Monitor serves DiagTester",
        ),
    ];

    let modules = [
        (types, "modules/datatypes.yaml"),
        (ifaces, "modules/interfaces.yaml"),
        (sensor, "modules/swc_sensor.yaml"),
        (monitor, "modules/swc_monitor.yaml"),
        (tester, "modules/swc_diag_tester.yaml"),
    ];

    let format = DescriptorFormat::Yaml;
    for (module, rel_path) in modules.iter() {
        let content = format.render(module).map_err(WorkspaceError::Serialize)?;
        write_atomic(&dir.join(rel_path), &content)?;

        let mut reference = ModuleReference::new(*rel_path, module.name.clone());
        reference.description = module.description.clone();
        master.modules.push(reference);
    }

    let master_path = dir.join("master.yaml");
    let content = format.render(&master).map_err(WorkspaceError::Serialize)?;
    write_atomic(&master_path, &content)?;

    tracing::info!("Example project written to {}", dir.display());
    Ok(master_path)
}
