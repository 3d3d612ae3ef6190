//! C type resolution
//!
//! Turns model type references into C type names and orders application
//! types so every typedef only uses types declared above it.

use std::collections::HashSet;

use crate::model::{
    AppDataCategory, ApplicationDataType, ArgumentDirection, BaseDataType, DataElement,
    ImplementationDataType, OperationArgument, Uid,
};
use crate::project::UnifiedProject;

/// C declaration of an implementation data type
pub fn impl_type_decl(idt: &ImplementationDataType) -> String {
    match idt.array_size {
        Some(n) => format!("typedef {} {}[{}];", idt.base_type.c_name(), idt.name, n),
        None => format!("typedef {} {};", idt.base_type.c_name(), idt.name),
    }
}

/// Type name used for a reference to an application type, with a
/// primitive fallback when the reference is absent or unusable
pub fn resolve_type_name(
    project: &UnifiedProject,
    app_type_uid: Option<&Uid>,
    fallback: BaseDataType,
) -> String {
    app_type_uid
        .filter(|uid| project.is_generation_eligible(uid.as_str()))
        .and_then(|uid| project.application_data_type(uid.as_str()))
        .map(|adt| adt.name.clone())
        .unwrap_or_else(|| fallback.c_name().to_string())
}

pub fn data_element_type(project: &UnifiedProject, de: &DataElement) -> String {
    resolve_type_name(project, de.app_type_uid.as_ref(), de.base_type)
}

/// Parameter declaration for an operation argument (`out`/`inout` by pointer)
pub fn argument_decl(project: &UnifiedProject, arg: &OperationArgument) -> String {
    let ty = resolve_type_name(project, arg.app_type_uid.as_ref(), arg.base_type);
    match arg.direction {
        ArgumentDirection::In => format!("{} {}", ty, arg.name),
        ArgumentDirection::Out | ArgumentDirection::Inout => format!("{}* {}", ty, arg.name),
    }
}

/// Comma-separated parameter list, `void` when empty
pub fn parameter_list(project: &UnifiedProject, args: &[OperationArgument]) -> String {
    if args.is_empty() {
        return "void".to_string();
    }
    args.iter()
        .map(|a| argument_decl(project, a))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Typedef lines for one application type.
///
/// A mapped type aliases its implementation type. An unmapped type falls
/// back by category: values to `uint32`, enums to `uint8`, arrays and
/// structures to their element/member types. Enum literals become
/// `#define`s either way.
pub fn app_type_decl(project: &UnifiedProject, adt: &ApplicationDataType, indent: &str) -> Vec<String> {
    let member_type = |uid: Option<&Uid>| resolve_type_name(project, uid, BaseDataType::Uint32);

    let mut lines = match project.impl_type_for_app_type(adt.uid.as_str()) {
        Some(idt) => vec![format!("typedef {} {};", idt.name, adt.name)],
        None => match adt.category {
            AppDataCategory::Value => {
                vec![format!("typedef {} {};", BaseDataType::Uint32.c_name(), adt.name)]
            }
            AppDataCategory::Array => vec![format!(
                "typedef {} {}[{}];",
                member_type(adt.element_type_uid.as_ref()),
                adt.name,
                adt.array_size.unwrap_or(1)
            )],
            AppDataCategory::Structure => {
                let mut lines = vec!["typedef struct".to_string(), "{".to_string()];
                for member in adt.struct_members.iter() {
                    lines.push(format!(
                        "{}{} {};",
                        indent,
                        member_type(Some(&member.type_uid)),
                        member.name
                    ));
                }
                lines.push(format!("}} {};", adt.name));
                lines
            }
            AppDataCategory::Enum => {
                vec![format!("typedef {} {};", BaseDataType::Uint8.c_name(), adt.name)]
            }
        },
    };

    if adt.category == AppDataCategory::Enum {
        for literal in adt.enum_literals.iter() {
            lines.push(format!(
                "#define {}_{} (({}){})",
                adt.name, literal.name, adt.name, literal.value
            ));
        }
    }
    lines
}

/// Eligible application types, dependencies first (stable otherwise)
pub fn ordered_app_types(project: &UnifiedProject) -> Vec<&ApplicationDataType> {
    fn visit<'a>(
        project: &'a UnifiedProject,
        adt: &'a ApplicationDataType,
        done: &mut HashSet<&'a str>,
        active: &mut HashSet<&'a str>,
        out: &mut Vec<&'a ApplicationDataType>,
    ) {
        let uid = adt.uid.as_str();
        if done.contains(uid) || !active.insert(uid) {
            return;
        }
        // Mapped types only depend on their implementation type
        if project.impl_type_for_app_type(uid).is_none() {
            let deps = adt
                .element_type_uid
                .iter()
                .chain(adt.struct_members.iter().map(|m| &m.type_uid));
            for dep in deps {
                if let Some(dep) = project
                    .application_data_type(dep.as_str())
                    .filter(|d| project.is_generation_eligible(d.uid.as_str()))
                {
                    visit(project, dep, done, active, out);
                }
            }
        }
        active.remove(uid);
        done.insert(uid);
        out.push(adt);
    }

    let mut done = HashSet::new();
    let mut active = HashSet::new();
    let mut out = Vec::new();
    for adt in project.eligible_application_data_types() {
        visit(project, adt, &mut done, &mut active, &mut out);
    }
    out
}
