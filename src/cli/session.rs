//! Session commands (show, run)

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use super::output::{format_vec3, Output};
use super::script::{RunReport, Script};
use crate::domain::Configuration;
use crate::store::{Config, PoleStore, RefreshThrottle};

fn start_session(seed: bool) -> PoleStore {
    if seed {
        PoleStore::with_default_configuration()
    } else {
        PoleStore::new()
    }
}

/// Show the state a fresh session starts with
pub fn show(output: &Output, config: &Config, seed: bool) -> Result<()> {
    let store = start_session(seed && config.seed_default_configuration);

    if output.is_json() {
        output.data(&store);
    } else {
        print_store(output, &store);
    }

    Ok(())
}

/// Run a script and show the resulting state
pub fn run_script(output: &Output, config: &Config, path: &Path, seed: bool) -> Result<()> {
    let script = Script::load(path)?;
    let seed = script
        .seed_default
        .unwrap_or(seed && config.seed_default_configuration);

    let mut store = start_session(seed);
    let mut throttle = RefreshThrottle::new(config.refresh_interval());

    let report = script
        .run(&mut store, &mut throttle)
        .with_context(|| format!("Script failed: {}", path.display()))?;

    // Leave every attached component consistent with its parent
    store.refresh_attachments();

    if output.is_json() {
        output.data(&serde_json::json!({
            "report": report,
            "state": store,
        }));
    } else {
        print_report(&report);
        output.blank();
        print_store(output, &store);
    }

    Ok(())
}

fn print_report(report: &RunReport) {
    println!(
        "Ran {} steps ({} skipped, {} refresh passes)",
        report.steps, report.skipped, report.refreshes
    );
    for save in &report.saves {
        println!(
            "Saved {} ({}, {} components) at {}",
            save.name,
            save.configuration,
            save.components,
            format_timestamp(&save.saved_at)
        );
    }
}

fn print_store(output: &Output, store: &PoleStore) {
    if store.configurations().is_empty() {
        println!("No configurations.");
        return;
    }

    println!("Configurations ({}):", store.configurations().len());
    for config in store.configurations() {
        let marker = if store.active_id() == Some(&config.id) {
            "*"
        } else {
            " "
        };
        println!(
            "{} {:<14} {:<28} {:>3} components  updated {}",
            marker,
            config.id.to_string(),
            config.name,
            config.len(),
            format_timestamp(&config.updated_at)
        );
    }

    if let Some(active) = store.active_configuration() {
        output.blank();
        print_components(active, store);
    }
}

fn print_components(config: &Configuration, store: &PoleStore) {
    if config.is_empty() {
        println!("{} has no components.", config.name);
        return;
    }

    println!(
        "{:<1} {:<12} {:<12} {:<28} {:<28} {:<10} ATTACHED TO",
        "", "ID", "KIND", "NAME", "POSITION", "HEADING"
    );
    println!("{}", "-".repeat(110));

    for component in &config.components {
        let selected = if store.selected_id() == Some(&component.id) {
            ">"
        } else {
            " "
        };
        let parent = match &component.attachment {
            Some(a) => {
                let name = config
                    .component(&a.parent)
                    .map(|p| p.name.as_str())
                    .unwrap_or("(missing)");
                format!("{} ({})", name, a.attachment_type)
            }
            None => "-".to_string(),
        };

        let heading = format!("{:.1}°", component.rotation[1].to_degrees());
        println!(
            "{} {:<12} {:<12} {:<28} {:<28} {:<10} {}",
            selected,
            component.id.to_string(),
            component.kind,
            truncate(&component.name, 28),
            format_vec3(&component.position),
            heading,
            parent
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_long_names() {
        assert_eq!(truncate("Insulator Left", 28), "Insulator Left");
        assert_eq!(truncate("Douglas Fir 45' Class 2 Extra Long", 12), "Douglas F...");
    }

    #[test]
    fn seeded_session_has_default_pole() {
        assert_eq!(start_session(true).components().len(), 5);
        assert!(start_session(false).configurations().is_empty());
    }
}
