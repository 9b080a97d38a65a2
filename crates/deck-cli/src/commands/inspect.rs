use super::{colorize_status, json_pretty, EXIT_SUCCESS};
use deck_store::{DeckLayout, MetadataStore};

pub fn run(layout: &DeckLayout, image: &str, json: bool) -> Result<u8, String> {
    let image_dir = layout.image_path(image);
    if !image_dir.is_dir() {
        return Err(format!("not found: image '{image}'"));
    }
    let meta = MetadataStore::read(&image_dir)
        .map_err(|e| format!("store error: {e}"))?
        .ok_or_else(|| format!("image '{image}' has no metadata ledger"))?;

    if json {
        println!("{}", json_pretty(&meta)?);
    } else {
        println!("image:         {}", meta.image_name);
        println!("created at:    {}", meta.created_at.to_rfc3339());
        println!("created by:    {}", meta.created_by);
        println!("source config: {}", meta.source_config.display());
        println!(
            "build status:  {}",
            colorize_status(&meta.build_status.to_string())
        );
        match meta.last_started {
            Some(ts) => println!("last started:  {}", ts.to_rfc3339()),
            None => println!("last started:  never"),
        }
        println!("directory:     {}", image_dir.display());
    }
    Ok(EXIT_SUCCESS)
}
