use super::{json_pretty, EXIT_FAILURE, EXIT_SUCCESS};
use console::Style;
use deck_core::{CleaningKind, CleaningOperation, RetentionEngine, WarningLevel};
use deck_store::DeckLayout;
use dialoguer::Confirm;

#[allow(clippy::fn_params_excessive_bools)]
pub fn run(
    layout: &DeckLayout,
    kind: CleaningKind,
    items: Vec<String>,
    dry_run: bool,
    yes: bool,
    keep_latest: Option<usize>,
    json: bool,
) -> Result<u8, String> {
    let engine = RetentionEngine::new(layout.clone());

    if let Some(n) = keep_latest {
        let plan = engine.plan_keep_latest(n).map_err(|e| e.to_string())?;
        if json {
            println!("{}", json_pretty(&plan)?);
        } else if plan.to_remove.is_empty() {
            println!("keeping the latest {n} of every group; nothing to remove");
        } else {
            println!("keep-latest-{n} plan over {} group(s):", plan.groups.len());
            for kept in &plan.to_keep {
                println!("  keep   {}", kept.name);
            }
            for doomed in &plan.to_remove {
                println!("  remove {}", doomed.name);
            }
            println!("would free {} bytes", plan.space_to_free_bytes);
            println!("run 'deck clean selective --items <names>' to apply");
        }
        return Ok(EXIT_SUCCESS);
    }

    let op = CleaningOperation {
        kind,
        items,
        dry_run,
    };
    engine.validate(&op).map_err(|e| e.to_string())?;

    if !json {
        for warning in RetentionEngine::warnings_for(&op) {
            let tag = match warning.level {
                WarningLevel::Caution => Style::new().yellow().apply_to("caution"),
                WarningLevel::Warning => Style::new().yellow().bold().apply_to("warning"),
                WarningLevel::Error => Style::new().red().apply_to("error"),
                WarningLevel::Critical => Style::new().red().bold().apply_to("critical"),
            };
            eprintln!("{tag}: {}", warning.message);
        }
    }

    let needs_prompt = !yes && !dry_run && !json && kind != CleaningKind::Templates;
    if needs_prompt {
        let confirmed = Confirm::new()
            .with_prompt(format!("proceed with '{kind}' cleaning?"))
            .default(false)
            .interact()
            .unwrap_or(false);
        if !confirmed {
            println!("aborted");
            return Ok(EXIT_SUCCESS);
        }
    }

    let report = engine.execute(&op);
    if json {
        println!("{}", json_pretty(&report)?);
    } else {
        for msg in &report.messages {
            println!("{msg}");
        }
        if report.success && !report.dry_run && !report.removed.is_empty() {
            println!(
                "removed {} item(s), freed {} bytes",
                report.removed.len(),
                report.space_freed_bytes
            );
        }
    }
    Ok(if report.success {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    })
}
