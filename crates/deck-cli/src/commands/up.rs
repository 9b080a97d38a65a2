use super::{json_pretty, EXIT_FAILURE, EXIT_SUCCESS};
use deck_core::WorkflowOrchestrator;
use deck_runtime::select_engine;
use deck_store::DeckLayout;

pub fn run(layout: &DeckLayout, name: &str, engine: &str, json: bool) -> Result<u8, String> {
    let engine = select_engine(engine).map_err(|e| e.to_string())?;
    if !engine.available() {
        return Err(format!(
            "container engine '{}' is not available on this system",
            engine.name()
        ));
    }

    let orchestrator = WorkflowOrchestrator::new(layout.clone(), engine);
    let image_name = orchestrator.resolve_image_name(name);
    let report = orchestrator.up(&image_name).map_err(|e| e.to_string())?;

    if json {
        println!("{}", json_pretty(&report)?);
    } else {
        for msg in &report.messages {
            println!("{msg}");
        }
    }
    Ok(if report.success {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    })
}
