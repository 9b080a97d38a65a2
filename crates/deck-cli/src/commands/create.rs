use super::{json_pretty, spin_fail, spin_ok, spinner, EXIT_SUCCESS};
use deck_core::TransitionEngine;
use deck_store::DeckLayout;

pub fn run(
    layout: &DeckLayout,
    template: &str,
    name: Option<&str>,
    json: bool,
) -> Result<u8, String> {
    layout
        .initialize()
        .map_err(|e| format!("store error: {e}"))?;
    let engine = TransitionEngine::new(layout.clone());

    let pb = if json {
        None
    } else {
        Some(spinner("copying template..."))
    };
    let custom_name = match engine.promote_template_to_custom(template, name) {
        Ok(n) => {
            if let Some(ref pb) = pb {
                spin_ok(pb, "custom configuration created");
            }
            n
        }
        Err(e) => {
            if let Some(ref pb) = pb {
                spin_fail(pb, "create failed");
            }
            return Err(e.to_string());
        }
    };

    if json {
        let payload = serde_json::json!({
            "status": "created",
            "template": template,
            "custom": custom_name,
            "path": layout.custom_path(&custom_name),
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("created custom configuration '{custom_name}' from template '{template}'");
        println!("edit it at {}", layout.custom_path(&custom_name).display());
    }
    Ok(EXIT_SUCCESS)
}
