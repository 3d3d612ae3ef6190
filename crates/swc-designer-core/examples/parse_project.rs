use std::env;
use std::path::Path;

use swc_designer_core::project::Workspace;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        println!("Usage: parse_project <master.yaml|module.yaml>");
        return;
    }

    let path = &args[1];
    println!("Loading: {}", path);

    let workspace = match Workspace::open(Path::new(path)) {
        Ok(workspace) => workspace,
        Err(e) => {
            println!("Failed to open project: {}", e);
            return;
        }
    };

    let snapshot = workspace.build();
    let project = &snapshot.project;
    println!("Successfully merged '{}'", project.name());
    println!("Compu methods: {}", project.compu_methods().len());
    println!("Application types: {}", project.application_data_types().len());
    println!("Implementation types: {}", project.implementation_data_types().len());
    println!("Interfaces: {}", project.interfaces().len());
    println!("Components: {}", project.components().len());
    println!("Connections: {}", project.connections().len());
    println!("Degraded elements: {}", project.degraded_count());

    println!("\nModules:");
    for (reference, entry) in workspace.modules() {
        let state = match entry.map(|e| &e.state) {
            Some(Ok(module)) => format!("{} elements", module.resolved.element_count()),
            Some(Err(e)) => format!("error: {}", e),
            None => "not loaded".to_string(),
        };
        let flag = if reference.enabled { "" } else { " (disabled)" };
        println!("  - {}{}: {} [{}]", reference.name, flag, reference.path, state);
    }

    println!("\nComponents:");
    for swc in project.components() {
        println!(
            "  - {}: ports={}, runnables={}, module={}",
            swc.name,
            swc.ports.len(),
            swc.runnables.len(),
            project.find_element_module(swc.uid.as_str()).unwrap_or("-")
        );
    }

    if !snapshot.issues.is_empty() {
        println!("\nIssues:");
        for issue in snapshot.issues.iter() {
            println!("  - {}", issue);
        }
    }
    for failure in snapshot.load_errors.iter() {
        println!("  - module '{}': {}", failure.module, failure.error);
    }
}
