pub mod build;
pub mod clean;
pub mod completions;
pub mod create;
pub mod init;
pub mod inspect;
pub mod list;
pub mod up;

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_VALIDATION_ERROR: u8 = 2;
pub const EXIT_STORE_ERROR: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✗ {msg}"));
}

pub fn colorize_layer(layer: &str) -> String {
    use console::Style;
    match layer {
        "template" => Style::new().blue().apply_to(layer).to_string(),
        "custom" => Style::new().yellow().apply_to(layer).to_string(),
        "image" => Style::new().green().apply_to(layer).to_string(),
        other => other.to_owned(),
    }
}

pub fn colorize_status(status: &str) -> String {
    use console::Style;
    match status {
        "Built" => Style::new().green().apply_to(status).to_string(),
        "Running" => Style::new().cyan().bold().apply_to(status).to_string(),
        "Failed" => Style::new().red().apply_to(status).to_string(),
        other => other.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_pretty_serializes_value() {
        let val = serde_json::json!({"key": "value"});
        let result = json_pretty(&val).unwrap();
        assert!(result.contains("\"key\""));
    }

    #[test]
    fn colorize_layer_known_values() {
        assert!(colorize_layer("template").contains("template"));
        assert!(colorize_layer("custom").contains("custom"));
        assert!(colorize_layer("image").contains("image"));
        assert_eq!(colorize_layer("other"), "other");
    }

    #[test]
    fn colorize_status_known_values() {
        assert!(colorize_status("Built").contains("Built"));
        assert!(colorize_status("Running").contains("Running"));
        assert!(colorize_status("Failed").contains("Failed"));
        assert_eq!(colorize_status("odd"), "odd");
    }

    #[test]
    fn exit_codes_are_distinct() {
        assert_ne!(EXIT_SUCCESS, EXIT_FAILURE);
        assert_ne!(EXIT_FAILURE, EXIT_VALIDATION_ERROR);
        assert_ne!(EXIT_VALIDATION_ERROR, EXIT_STORE_ERROR);
    }

    #[test]
    fn spinner_helpers_do_not_panic() {
        let pb = spinner("working...");
        spin_ok(&pb, "done");
        let pb = spinner("working...");
        spin_fail(&pb, "failed");
    }
}
