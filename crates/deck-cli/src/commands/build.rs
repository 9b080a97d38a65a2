use super::{json_pretty, spin_fail, spin_ok, spinner, EXIT_SUCCESS};
use deck_core::TransitionEngine;
use deck_store::{DeckLayout, NameAllocator};

pub fn run(
    layout: &DeckLayout,
    custom: &str,
    image: Option<&str>,
    json: bool,
) -> Result<u8, String> {
    let engine = TransitionEngine::new(layout.clone());
    let allocator = NameAllocator::new(layout.clone());

    let image_name = match image {
        Some(n) => n.to_owned(),
        None => allocator
            .timestamped_name(custom)
            .map_err(|e| format!("store error: {e}"))?,
    };

    let pb = if json {
        None
    } else {
        Some(spinner("promoting custom configuration to image..."))
    };
    let custom_dir = layout.custom_path(custom);
    let image_dir = match engine.promote_custom_to_image(&image_name, &custom_dir) {
        Ok(dir) => {
            if let Some(ref pb) = pb {
                spin_ok(pb, "image created");
            }
            dir
        }
        Err(e) => {
            if let Some(ref pb) = pb {
                spin_fail(pb, "build failed");
            }
            return Err(e.to_string());
        }
    };

    if json {
        let payload = serde_json::json!({
            "status": "built",
            "custom": custom,
            "image": image_name,
            "path": image_dir,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("built image '{image_name}' from custom '{custom}'");
        println!("image directory: {}", image_dir.display());
    }
    Ok(EXIT_SUCCESS)
}
