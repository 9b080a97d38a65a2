use super::{colorize_layer, json_pretty, EXIT_SUCCESS};
use deck_store::{DeckLayout, Layer, LayerRepository, ResourceDescriptor};

pub fn run(layout: &DeckLayout, layer: Option<Layer>, json: bool) -> Result<u8, String> {
    let repo = LayerRepository::new(layout.clone());

    let mut entries: Vec<ResourceDescriptor> = Vec::new();
    let wanted = |l: Layer| layer.is_none() || layer == Some(l);
    if wanted(Layer::Template) {
        entries.extend(repo.list_templates().map_err(|e| format!("store error: {e}"))?);
    }
    if wanted(Layer::Custom) {
        entries.extend(repo.list_custom().map_err(|e| format!("store error: {e}"))?);
    }
    if wanted(Layer::Image) {
        entries.extend(repo.list_images().map_err(|e| format!("store error: {e}"))?);
    }

    if json {
        println!("{}", json_pretty(&entries)?);
    } else if entries.is_empty() {
        println!("no configurations found");
    } else {
        println!(
            "{:<10} {:<28} {:<8} {:<10} LAST_MODIFIED",
            "LAYER", "NAME", "TYPE", "STATUS"
        );
        for entry in &entries {
            let status = entry
                .metadata
                .as_ref()
                .map_or_else(
                    || if entry.available { "ok" } else { "incomplete" }.to_owned(),
                    |m| m.build_status.to_string(),
                );
            println!(
                "{:<10} {:<28} {:<8} {:<10} {}",
                colorize_layer(&entry.layer.to_string()),
                entry.name,
                entry.project_type,
                status,
                entry.last_modified.format("%Y-%m-%d %H:%M"),
            );
        }
    }
    Ok(EXIT_SUCCESS)
}
