use super::{json_pretty, EXIT_SUCCESS};
use deck_store::DeckLayout;

pub fn run(layout: &DeckLayout, json: bool) -> Result<u8, String> {
    layout
        .initialize()
        .map_err(|e| format!("store error: {e}"))?;
    if json {
        let payload = serde_json::json!({
            "status": "initialized",
            "root": layout.root(),
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("initialized deck tree at {}", layout.root().display());
    }
    Ok(EXIT_SUCCESS)
}
