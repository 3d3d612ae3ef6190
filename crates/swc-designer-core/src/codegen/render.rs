//! Artifact rendering
//!
//! Produces the scaffolding text of every artifact from the unified
//! project. Rendering only reads generation-eligible elements and is a pure
//! function of the project and settings: no timestamps, no hash ordering.

use std::fmt::{self, Write};

use super::c_types::{
    app_type_decl, data_element_type, impl_type_decl, ordered_app_types, parameter_list,
};
use super::preserve::{begin_marker, end_marker};
use crate::model::{
    Interface, InterfaceKind, Operation, Port, PortDirection, RunnableTrigger, SoftwareComponent,
    Uid,
};
use crate::project::{GeneratorSettings, UnifiedProject};

/// Text every generated file carries in its header comment
pub const GENERATED_BY: &str = "Generated by SWC Designer";

/// Role of an artifact in the output directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// `Std_Types.h`, `Rte_Type.h`
    Shared,
    /// `<Swc>.h`
    Header,
    /// `<Swc>.c`
    Source,
    /// `Rte_<Swc>.h`
    RteHeader,
}

impl ArtifactKind {
    pub const SHARED_FILES: [&'static str; 2] = ["Std_Types.h", "Rte_Type.h"];

    /// Kind of a file found in an output directory, by its name
    pub fn of_file_name(file_name: &str) -> Option<Self> {
        if Self::SHARED_FILES.contains(&file_name) {
            Some(Self::Shared)
        } else if file_name.starts_with("Rte_") && file_name.ends_with(".h") {
            Some(Self::RteHeader)
        } else if file_name.ends_with(".c") {
            Some(Self::Source)
        } else if file_name.ends_with(".h") {
            Some(Self::Header)
        } else {
            None
        }
    }

    /// Name of the component a per-component file is named after
    pub fn component_name(self, file_name: &str) -> Option<&str> {
        match self {
            Self::Shared => None,
            Self::Header => file_name.strip_suffix(".h"),
            Self::Source => file_name.strip_suffix(".c"),
            Self::RteHeader => file_name.strip_prefix("Rte_")?.strip_suffix(".h"),
        }
    }
}

/// One rendered output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// File name inside the output directory
    pub file_name: String,
    pub kind: ArtifactKind,
    /// Component the artifact is generated for
    pub component: Option<Uid>,
    /// Scaffolding with empty preserved regions
    pub content: String,
}

/// Preserved-region tags
pub mod tags {
    use crate::model::Uid;

    pub fn includes(component: &Uid) -> String {
        format!("includes:{component}")
    }

    pub fn declarations(component: &Uid) -> String {
        format!("declarations:{component}")
    }

    pub fn runnable(runnable: &Uid) -> String {
        format!("runnable:{runnable}")
    }

    pub fn operation(port: &Uid, operation: &Uid) -> String {
        format!("operation:{port}:{operation}")
    }

    /// Component named by an `includes:` or `declarations:` tag
    pub fn component_of(tag: &str) -> Option<Uid> {
        tag.strip_prefix("includes:")
            .or_else(|| tag.strip_prefix("declarations:"))
            .map(Uid::new)
    }
}

/// Render context shared by all artifacts of one run
pub struct Renderer<'a> {
    project: &'a UnifiedProject,
    settings: &'a GeneratorSettings,
    indent: String,
}

fn guard_name(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Name of the server entry point implementing a provided operation
pub fn server_entry_name(swc: &SoftwareComponent, port: &Port, operation: &str) -> String {
    format!("{}_{}_{}", swc.name, port.name, operation)
}

fn shared(file_name: &str, content: String) -> Artifact {
    Artifact {
        file_name: file_name.to_string(),
        kind: ArtifactKind::Shared,
        component: None,
        content,
    }
}

impl<'a> Renderer<'a> {
    pub fn new(project: &'a UnifiedProject, settings: &'a GeneratorSettings) -> Self {
        Self {
            project,
            settings,
            indent: " ".repeat(settings.indent),
        }
    }

    /// Every artifact, in a fixed order
    pub fn render_all(&self) -> Result<Vec<Artifact>, fmt::Error> {
        let mut artifacts = vec![self.std_types()?, self.rte_types()?];
        for swc in self.project.eligible_components() {
            artifacts.push(self.component_header(swc)?);
            artifacts.push(self.component_source(swc)?);
            artifacts.push(self.component_rte_header(swc)?);
        }
        Ok(artifacts)
    }

    fn file_header(&self, out: &mut String, file_name: &str, brief: &str) -> fmt::Result {
        writeln!(out, "/**")?;
        writeln!(out, " * @file {file_name}")?;
        writeln!(out, " * @brief {brief}")?;
        writeln!(out, " *")?;
        writeln!(out, " * {GENERATED_BY} from project '{}'.", self.project.name())?;
        if let Some(banner) = &self.settings.banner {
            writeln!(out, " * {banner}")?;
        }
        writeln!(out, " * Only code between USER CODE markers survives regeneration.")?;
        writeln!(out, " */")?;
        writeln!(out)
    }

    fn open_guard(out: &mut String, file_name: &str) -> fmt::Result {
        let guard = guard_name(file_name);
        writeln!(out, "#ifndef {guard}")?;
        writeln!(out, "#define {guard}")?;
        writeln!(out)
    }

    fn close_guard(out: &mut String, file_name: &str) -> fmt::Result {
        writeln!(out, "#endif /* {} */", guard_name(file_name))
    }

    fn region(&self, out: &mut String, tag: &str, depth: usize) -> fmt::Result {
        let pad = self.indent.repeat(depth);
        writeln!(out, "{pad}{}", begin_marker(tag))?;
        writeln!(out, "{pad}{}", end_marker(tag))
    }

    fn interface_of(&self, port: &Port) -> Option<&'a Interface> {
        self.project.interface(port.interface_uid.as_str())
    }

    // =========================================================================
    // Project-wide headers
    // =========================================================================

    fn std_types(&self) -> Result<Artifact, fmt::Error> {
        let file_name = "Std_Types.h";
        let mut out = String::new();
        self.file_header(&mut out, file_name, "Standard platform types")?;
        Self::open_guard(&mut out, file_name)?;

        for line in [
            "typedef unsigned char uint8;",
            "typedef unsigned short uint16;",
            "typedef unsigned int uint32;",
            "typedef unsigned long long uint64;",
            "typedef signed char sint8;",
            "typedef signed short sint16;",
            "typedef signed int sint32;",
            "typedef signed long long sint64;",
            "typedef float float32;",
            "typedef double float64;",
            "typedef unsigned char boolean;",
            "",
            "typedef uint8 Std_ReturnType;",
            "",
            "#define E_OK ((Std_ReturnType)0x00u)",
            "#define E_NOT_OK ((Std_ReturnType)0x01u)",
            "",
            "#ifndef TRUE",
            "#define TRUE ((boolean)1)",
            "#endif",
            "#ifndef FALSE",
            "#define FALSE ((boolean)0)",
            "#endif",
            "",
            "#define NULL_PTR ((void *)0)",
            "",
        ] {
            writeln!(out, "{line}")?;
        }

        Self::close_guard(&mut out, file_name)?;
        Ok(shared(file_name, out))
    }

    fn rte_types(&self) -> Result<Artifact, fmt::Error> {
        let file_name = "Rte_Type.h";
        let mut out = String::new();
        self.file_header(&mut out, file_name, "RTE data types of all interfaces")?;
        Self::open_guard(&mut out, file_name)?;
        writeln!(out, "#include \"Std_Types.h\"")?;
        writeln!(out)?;

        let idts: Vec<_> = self.project.eligible_implementation_data_types().collect();
        if !idts.is_empty() {
            writeln!(out, "/* Implementation data types */")?;
            for idt in idts {
                writeln!(out, "{}", impl_type_decl(idt))?;
            }
            writeln!(out)?;
        }

        let adts = ordered_app_types(self.project);
        if !adts.is_empty() {
            writeln!(out, "/* Application data types */")?;
            for adt in adts {
                if let Some(cm) = adt
                    .compu_method_uid
                    .as_ref()
                    .and_then(|uid| self.project.compu_method(uid.as_str()))
                {
                    let unit = if cm.unit.is_empty() { "-" } else { cm.unit.as_str() };
                    writeln!(
                        out,
                        "/* {}: physical = raw * {} + {} [{}] */",
                        adt.name, cm.factor, cm.offset, unit
                    )?;
                }
                for line in app_type_decl(self.project, adt, &self.indent) {
                    writeln!(out, "{line}")?;
                }
            }
            writeln!(out)?;
        }

        for iface in self.project.eligible_interfaces() {
            writeln!(out, "/* Interface {} ({}) */", iface.name, iface.kind.label())?;
            match iface.kind {
                InterfaceKind::SenderReceiver => {
                    for de in iface.data_elements.iter() {
                        writeln!(
                            out,
                            "typedef {} Rte_DT_{}_{};",
                            data_element_type(self.project, de),
                            iface.name,
                            de.name
                        )?;
                    }
                }
                InterfaceKind::ClientServer => {
                    for op in iface.operations.iter() {
                        writeln!(
                            out,
                            "/*   {}({}) */",
                            op.name,
                            parameter_list(self.project, &op.arguments)
                        )?;
                    }
                }
            }
            writeln!(out)?;
        }

        Self::close_guard(&mut out, file_name)?;
        Ok(shared(file_name, out))
    }

    // =========================================================================
    // Per-component artifacts
    // =========================================================================

    /// Provided client-server ports with their operations
    fn server_operations(&self, swc: &'a SoftwareComponent) -> Vec<(&'a Port, &'a Operation)> {
        swc.ports
            .iter()
            .filter(|p| p.direction == PortDirection::Provided)
            .filter_map(|p| self.interface_of(p).map(|iface| (p, iface)))
            .filter(|(_, iface)| iface.kind == InterfaceKind::ClientServer)
            .flat_map(|(p, iface)| iface.operations.iter().map(move |op| (p, op)))
            .collect()
    }

    fn component_header(&self, swc: &'a SoftwareComponent) -> Result<Artifact, fmt::Error> {
        let file_name = format!("{}.h", swc.name);
        let mut out = String::new();
        self.file_header(&mut out, &file_name, &format!("Component {}", swc.name))?;
        Self::open_guard(&mut out, &file_name)?;
        writeln!(out, "#include \"Rte_{}.h\"", swc.name)?;
        writeln!(out)?;

        self.region(&mut out, &tags::declarations(&swc.uid), 0)?;
        writeln!(out)?;

        if !swc.runnables.is_empty() {
            writeln!(out, "/* Runnables */")?;
            for runnable in swc.runnables.iter() {
                writeln!(out, "void {}(void);", runnable.name)?;
            }
            writeln!(out)?;
        }

        let servers = self.server_operations(swc);
        if !servers.is_empty() {
            writeln!(out, "/* Server entry points */")?;
            for (port, op) in servers {
                writeln!(
                    out,
                    "Std_ReturnType {}({});",
                    server_entry_name(swc, port, &op.name),
                    parameter_list(self.project, &op.arguments)
                )?;
            }
            writeln!(out)?;
        }

        Self::close_guard(&mut out, &file_name)?;
        Ok(Artifact {
            file_name,
            kind: ArtifactKind::Header,
            component: Some(swc.uid.clone()),
            content: out,
        })
    }

    fn component_source(&self, swc: &'a SoftwareComponent) -> Result<Artifact, fmt::Error> {
        let file_name = format!("{}.c", swc.name);
        let mut out = String::new();
        self.file_header(&mut out, &file_name, &format!("Implementation of {}", swc.name))?;
        writeln!(out, "#include \"{}.h\"", swc.name)?;
        self.region(&mut out, &tags::includes(&swc.uid), 0)?;

        for runnable in swc.runnables.iter() {
            writeln!(out)?;
            let trigger = match runnable.trigger() {
                RunnableTrigger::Periodic(ms) => format!("periodic, {ms} ms"),
                RunnableTrigger::Event => "event".to_string(),
            };
            writeln!(out, "/**")?;
            writeln!(out, " * Runnable: {}", runnable.name)?;
            writeln!(out, " * Trigger: {trigger}")?;
            if !runnable.description.is_empty() {
                writeln!(out, " * {}", runnable.description)?;
            }
            writeln!(out, " */")?;
            writeln!(out, "void {}(void)", runnable.name)?;
            writeln!(out, "{{")?;
            self.region(&mut out, &tags::runnable(&runnable.uid), 1)?;
            writeln!(out, "}}")?;
        }

        for (port, op) in self.server_operations(swc) {
            writeln!(out)?;
            writeln!(out, "/**")?;
            writeln!(out, " * Server: {}.{}", port.name, op.name)?;
            writeln!(out, " */")?;
            writeln!(
                out,
                "Std_ReturnType {}({})",
                server_entry_name(swc, port, &op.name),
                parameter_list(self.project, &op.arguments)
            )?;
            writeln!(out, "{{")?;
            self.region(&mut out, &tags::operation(&port.uid, &op.uid), 1)?;
            writeln!(out, "{}return E_OK;", self.indent)?;
            writeln!(out, "}}")?;
        }

        Ok(Artifact {
            file_name,
            kind: ArtifactKind::Source,
            component: Some(swc.uid.clone()),
            content: out,
        })
    }

    /// "Swc.Port" names of the peers connected to `port`
    fn peers(&self, port: &Port) -> Vec<String> {
        self.project
            .connections_for_port(port.uid.as_str())
            .into_iter()
            .filter_map(|c| {
                let peer = if c.provider_port_uid == port.uid {
                    &c.requester_port_uid
                } else {
                    &c.provider_port_uid
                };
                self.project
                    .port(peer.as_str())
                    .map(|(swc, p)| format!("{}.{}", swc.name, p.name))
            })
            .collect()
    }

    fn component_rte_header(&self, swc: &'a SoftwareComponent) -> Result<Artifact, fmt::Error> {
        let file_name = format!("Rte_{}.h", swc.name);
        let mut out = String::new();
        self.file_header(&mut out, &file_name, &format!("RTE API of {}", swc.name))?;
        Self::open_guard(&mut out, &file_name)?;
        writeln!(out, "#include \"Rte_Type.h\"")?;
        writeln!(out)?;

        for port in swc.ports.iter() {
            let Some(iface) = self.interface_of(port) else {
                continue;
            };
            let direction = match port.direction {
                PortDirection::Provided => "provided",
                PortDirection::Required => "required",
            };
            writeln!(out, "/* Port {} ({}, {}) */", port.name, direction, iface.name)?;
            let peers = self.peers(port);
            if peers.is_empty() {
                writeln!(out, "/* Not connected */")?;
            } else {
                writeln!(out, "/* Connected to: {} */", peers.join(", "))?;
            }

            match (iface.kind, port.direction) {
                (InterfaceKind::SenderReceiver, PortDirection::Provided) => {
                    for de in iface.data_elements.iter() {
                        writeln!(
                            out,
                            "Std_ReturnType Rte_Write_{}_{}({} data);",
                            port.name,
                            de.name,
                            data_element_type(self.project, de)
                        )?;
                    }
                }
                (InterfaceKind::SenderReceiver, PortDirection::Required) => {
                    for de in iface.data_elements.iter() {
                        writeln!(
                            out,
                            "Std_ReturnType Rte_Read_{}_{}({}* data);",
                            port.name,
                            de.name,
                            data_element_type(self.project, de)
                        )?;
                    }
                }
                (InterfaceKind::ClientServer, PortDirection::Required) => {
                    for op in iface.operations.iter() {
                        writeln!(
                            out,
                            "Std_ReturnType Rte_Call_{}_{}({});",
                            port.name,
                            op.name,
                            parameter_list(self.project, &op.arguments)
                        )?;
                    }
                }
                (InterfaceKind::ClientServer, PortDirection::Provided) => {
                    for op in iface.operations.iter() {
                        writeln!(out, "/* Served by {} */", server_entry_name(swc, port, &op.name))?;
                    }
                }
            }
            writeln!(out)?;
        }

        Self::close_guard(&mut out, &file_name)?;
        Ok(Artifact {
            file_name,
            kind: ArtifactKind::RteHeader,
            component: Some(swc.uid.clone()),
            content: out,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_kind_from_file_name() {
        assert_eq!(ArtifactKind::of_file_name("Rte_Type.h"), Some(ArtifactKind::Shared));
        assert_eq!(ArtifactKind::of_file_name("Rte_Swc_A.h"), Some(ArtifactKind::RteHeader));
        assert_eq!(ArtifactKind::of_file_name("Swc_A.c"), Some(ArtifactKind::Source));
        assert_eq!(ArtifactKind::of_file_name("Swc_A.h"), Some(ArtifactKind::Header));
        assert_eq!(ArtifactKind::of_file_name("Swc_A.c.orphaned"), None);

        assert_eq!(ArtifactKind::RteHeader.component_name("Rte_Swc_A.h"), Some("Swc_A"));
        assert_eq!(ArtifactKind::Source.component_name("Swc_A.c"), Some("Swc_A"));
    }

    #[test]
    fn test_component_tag_lookup() {
        assert_eq!(tags::component_of("includes:c1"), Some(Uid::new("c1")));
        assert_eq!(tags::component_of("declarations:c1"), Some(Uid::new("c1")));
        assert_eq!(tags::component_of("runnable:r1"), None);
    }
}
