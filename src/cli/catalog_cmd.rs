//! Catalog commands

use anyhow::{bail, Result};

use super::output::{format_vec3, Output};
use crate::domain::{catalog, ComponentDraft, ComponentKind};

/// Show the template a new component of `kind` starts from
pub fn defaults(output: &Output, kind: &str, data_id: Option<&str>) -> Result<()> {
    let draft = match data_id {
        Some(data_id) => {
            let parsed: ComponentKind = kind.parse()?;
            match catalog::from_data(parsed, data_id) {
                Some(draft) => draft,
                None => bail!("No company data templates for {}", parsed),
            }
        }
        None => catalog::defaults_for_tag(kind),
    };

    if output.is_json() {
        output.data(&draft);
    } else {
        print_draft(&draft);
    }

    Ok(())
}

fn print_draft(draft: &ComponentDraft) {
    println!("{} ({})", draft.name, draft.kind);
    println!("  position  {}", format_vec3(&draft.position));
    println!("  rotation  {}", format_vec3(&draft.rotation));
    println!("  scale     {}", format_vec3(&draft.scale));
    if let Some(color) = &draft.color {
        println!("  color     {}", color);
    }

    let imperial = &draft.imperial;
    if !imperial.is_empty() {
        println!(
            "  mount     height {}, offset {}, direction {}°",
            imperial.height.as_deref().unwrap_or("-"),
            imperial.offset.as_deref().unwrap_or("-"),
            imperial
                .direction
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string())
        );
    }
    if let Some(data_id) = &draft.data_id {
        println!(
            "  source    {} {}",
            draft.data_source.as_deref().unwrap_or("-"),
            data_id
        );
    }

    if !draft.specifications.is_empty() {
        println!();
        println!("Specifications:");
        for (key, value) in draft.specifications.iter() {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Null => "-".to_string(),
                other => other.to_string(),
            };
            println!("  {:<45} {}", key, text);
        }
    }
}
