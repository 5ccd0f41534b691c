//! Component catalog
//!
//! Per-kind default templates used when a new component is created, and
//! the seeded default configuration. Mount heights are fractions of a
//! 45 ft reference pole:
//!
//! | Kind | Height | Offset | Direction |
//! |------|--------|--------|-----------|
//! | crossarm, wire, cable | 60 % | 0' 0" | 0 |
//! | insulator | 65 % | 0' 6" | 0 |
//! | transformer, equipment | 45 % | 3' 0" | 0 |
//! | hardware | 50 % | 0' 0" | 0 |
//! | anchor | ground | 4' 3" | 45 |

use serde_json::json;

use super::attachment::{find_pole, pole_height_feet};
use super::component::{
    Attachment, Component, ComponentDraft, ComponentKind, ImperialPlacement, Specifications,
    POLE_HEIGHT_KEY,
};
use super::configuration::Configuration;
use super::id::ComponentId;
use super::measurement::format_feet_only;

/// Height of the reference pole the catalog is laid out against
pub const REFERENCE_POLE_HEIGHT_FEET: f64 = 45.0;

/// Name of the configuration seeded at startup
pub const DEFAULT_CONFIGURATION_NAME: &str = "Default Utility Pole";

const WOOD: &str = "#8B4513";
const WHITE: &str = "#FFFFFF";
const GRAY: &str = "#808080";
const BLACK: &str = "#000000";
const SILVER: &str = "#C0C0C0";
const LIGHT_GRAY: &str = "#A0A0A0";
const GENERIC_GRAY: &str = "#CCCCCC";

/// Feet up a pole of `pole_feet` at `fraction` of its height, rounded
fn mount_height(pole_feet: f64, fraction: f64) -> String {
    format_feet_only((pole_feet * fraction).round() as i32)
}

fn mount(fraction: f64, offset: &str, direction: f64) -> ImperialPlacement {
    ImperialPlacement::new(
        mount_height(REFERENCE_POLE_HEIGHT_FEET, fraction),
        offset,
        direction,
    )
}

/// Specification bundle of the standard 45 ft Douglas Fir class 2 pole
pub fn pole_specifications() -> Specifications {
    [
        ("Species", json!("Douglas Fir")),
        (POLE_HEIGHT_KEY, json!(45)),
        ("Class", json!("2")),
        ("Pole Top Circumference (\")", json!(24.9999994596)),
        ("Taper (in. dia. /ft)", json!(0.1265078038)),
        ("Poisson's Ratio", json!(0.3)),
        ("Modulus of Elasticity (lb/in²)", json!(2500000.0)),
        ("Density (lb/ft³)", json!(40)),
        ("Wall Thickness (\")", json!("SOLID")),
        ("Shape", json!("ROUND")),
        ("Material", json!("WOOD")),
        ("Maximum Allowable Stress (lb/in²)", json!(8000.0)),
        ("Maximum Allowable Groundline Moment (lbf)", json!(null)),
    ]
    .into_iter()
    .collect()
}

/// Default template for a kind
pub fn defaults_for(kind: ComponentKind) -> ComponentDraft {
    let draft = ComponentDraft::new(kind, kind.as_str());

    match kind {
        ComponentKind::Pole => draft
            .with_name("Douglas Fir 45' Class 2")
            .with_color(WOOD)
            .with_specifications(pole_specifications()),
        ComponentKind::Crossarm => draft
            .with_name("Crossarm")
            .with_position([0.0, 8.0, 0.0])
            .with_scale([1.0, 0.2, 0.2])
            .with_color(WOOD)
            .with_imperial(mount(0.6, "0' 0\"", 0.0)),
        ComponentKind::Insulator => draft
            .with_name("Insulator")
            .with_position([0.0, 8.5, 0.0])
            .with_scale([0.3, 0.3, 0.3])
            .with_color(WHITE)
            .with_imperial(mount(0.65, "0' 6\"", 0.0)),
        ComponentKind::Transformer => draft
            .with_name("Transformer")
            .with_position([0.0, 6.0, 1.0])
            .with_color(GRAY)
            .with_imperial(mount(0.45, "3' 0\"", 0.0)),
        ComponentKind::Wire => draft
            .with_name("Wire")
            .with_position([0.0, 8.0, 0.0])
            .with_color(BLACK)
            .with_imperial(mount(0.6, "0' 0\"", 0.0)),
        ComponentKind::Hardware => draft
            .with_name("Hardware")
            .with_position([0.0, 7.0, 0.0])
            .with_scale([0.5, 0.5, 0.5])
            .with_color(SILVER)
            .with_imperial(mount(0.5, "0' 0\"", 0.0)),
        ComponentKind::Anchor => draft
            .with_name("Anchor")
            .with_position([3.0, 0.0, 3.0])
            .with_scale([0.5, 0.5, 0.5])
            .with_color(LIGHT_GRAY)
            .with_imperial(ImperialPlacement::new("0' 0\"", "4' 3\"", 45.0)),
        ComponentKind::Cable => draft
            .with_name("Cable")
            .with_position([0.0, 8.0, 0.0])
            .with_color(BLACK)
            .with_imperial(mount(0.6, "0' 0\"", 0.0)),
        ComponentKind::Equipment => draft
            .with_name("Equipment")
            .with_position([0.0, 6.0, 1.0])
            .with_color(GRAY)
            .with_imperial(mount(0.45, "3' 0\"", 0.0)),
    }
}

/// Gray unit cube for kinds the catalog does not know
///
/// The template keeps the `equipment` kind so it still fits the closed set.
pub fn generic_template() -> ComponentDraft {
    ComponentDraft::new(ComponentKind::Equipment, "Component")
        .with_color(GENERIC_GRAY)
        .with_imperial(ImperialPlacement::new("0' 0\"", "0' 0\"", 0.0))
}

/// Looks up a template by kind text, falling back to [`generic_template`]
pub fn defaults_for_tag(tag: &str) -> ComponentDraft {
    match tag.parse::<ComponentKind>() {
        Ok(kind) => defaults_for(kind),
        Err(_) => generic_template(),
    }
}

/// Template for adding a component next to `existing`
///
/// A new crossarm is hung on the first pole at 60 % of that pole's declared
/// height. Everything else starts unattached with catalog placement.
pub fn draft_for(kind: ComponentKind, existing: &[Component]) -> ComponentDraft {
    let draft = defaults_for(kind);

    match (kind, find_pole(existing)) {
        (ComponentKind::Crossarm, Some(pole)) => draft
            .with_imperial(ImperialPlacement::new(
                mount_height(pole_height_feet(pole), 0.6),
                "0' 0\"",
                0.0,
            ))
            .with_attachment(Attachment::to_pole(pole.id.clone())),
        _ => draft,
    }
}

/// Template for a component sourced from company data
///
/// Only anchors, cables, crossarms and equipment come from company data.
pub fn from_data(kind: ComponentKind, data_id: &str) -> Option<ComponentDraft> {
    if !matches!(
        kind,
        ComponentKind::Anchor
            | ComponentKind::Cable
            | ComponentKind::Crossarm
            | ComponentKind::Equipment
    ) {
        return None;
    }

    let label = kind.as_str();
    let mut capitalized = label[..1].to_uppercase();
    capitalized.push_str(&label[1..]);

    let mut draft = defaults_for(kind).with_name(format!("{} {}", capitalized, data_id));
    draft.data_source = Some("company".to_string());
    draft.data_id = Some(data_id.to_string());
    Some(draft)
}

/// The configuration every session starts with
///
/// One 45 ft pole, a crossarm at 27 ft, an insulator at each end of the
/// crossarm and a center insulator on the pole at 29 ft.
pub fn default_configuration() -> Configuration {
    let mut config = Configuration::new(DEFAULT_CONFIGURATION_NAME);

    let mut push = |draft: ComponentDraft| -> ComponentId {
        let id = ComponentId::generate(&draft.name);
        config
            .components
            .push(Component::from_draft(id.clone(), draft));
        id
    };

    let pole = push(defaults_for(ComponentKind::Pole));

    let crossarm = push(
        ComponentDraft::new(ComponentKind::Crossarm, "Wood 8 Ft Crossarm")
            .with_position([0.0, 8.0, 0.0])
            .with_color(WOOD)
            .with_attachment(Attachment::to_pole(pole.clone()))
            .with_imperial(mount(0.6, "0' 0\"", 0.0)),
    );

    push(
        ComponentDraft::new(ComponentKind::Insulator, "Insulator Left")
            .with_position([-2.0, 8.0, 0.0])
            .with_color(WHITE)
            .with_attachment(Attachment::to_crossarm(crossarm.clone()))
            .with_imperial(ImperialPlacement::new("0' 0\"", "1' 0\"", 270.0)),
    );

    push(
        ComponentDraft::new(ComponentKind::Insulator, "Insulator Center")
            .with_position([0.0, 8.5, 0.0])
            .with_color(WHITE)
            .with_attachment(Attachment::to_pole(pole))
            .with_imperial(mount(0.65, "0' 6\"", 0.0)),
    );

    push(
        ComponentDraft::new(ComponentKind::Insulator, "Insulator Right")
            .with_position([2.0, 8.0, 0.0])
            .with_color(WHITE)
            .with_attachment(Attachment::to_crossarm(crossarm))
            .with_imperial(ImperialPlacement::new("0' 0\"", "15' 5\"", 90.0)),
    );

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::attachment::resolve_position;
    use crate::domain::component::AttachmentType;

    #[test]
    fn every_kind_has_a_template_of_that_kind() {
        for kind in ComponentKind::all() {
            assert_eq!(defaults_for(*kind).kind, *kind);
        }
    }

    #[test]
    fn pole_template_carries_specifications() {
        let pole = defaults_for(ComponentKind::Pole);

        assert_eq!(pole.name, "Douglas Fir 45' Class 2");
        assert_eq!(pole.specifications.pole_height_feet(), Some(45.0));
        assert_eq!(pole.specifications.get_text("Species").as_deref(), Some("Douglas Fir"));
        assert_eq!(
            pole.specifications.get("Maximum Allowable Groundline Moment (lbf)"),
            Some(&serde_json::Value::Null)
        );
        assert!(pole.attachment.is_none());
    }

    #[test]
    fn mount_heights_follow_reference_pole() {
        let height = |kind| defaults_for(kind).imperial.height.unwrap();

        assert_eq!(height(ComponentKind::Crossarm), "27' 0\"");
        assert_eq!(height(ComponentKind::Insulator), "29' 0\"");
        assert_eq!(height(ComponentKind::Transformer), "20' 0\"");
        assert_eq!(height(ComponentKind::Hardware), "23' 0\"");
        assert_eq!(height(ComponentKind::Anchor), "0' 0\"");
    }

    #[test]
    fn unknown_tag_gets_generic_cube() {
        let draft = defaults_for_tag("streetlight");

        assert_eq!(draft.name, "Component");
        assert_eq!(draft.color.as_deref(), Some(GENERIC_GRAY));
        assert_eq!(draft.scale, [1.0, 1.0, 1.0]);
        assert_eq!(defaults_for_tag("Wire").kind, ComponentKind::Wire);
    }

    #[test]
    fn new_crossarm_hangs_on_first_pole() {
        let config = default_configuration();
        let pole = find_pole(&config.components).unwrap().clone();

        let draft = draft_for(ComponentKind::Crossarm, &config.components);
        let attachment = draft.attachment.unwrap();

        assert_eq!(attachment.parent, pole.id);
        assert_eq!(attachment.attachment_type, AttachmentType::Pole);
        assert_eq!(draft.imperial.height.as_deref(), Some("27' 0\""));
    }

    #[test]
    fn new_crossarm_uses_declared_pole_height() {
        let mut config = default_configuration();
        config.components[0].specifications.set(POLE_HEIGHT_KEY, 50);

        let draft = draft_for(ComponentKind::Crossarm, &config.components);
        assert_eq!(draft.imperial.height.as_deref(), Some("30' 0\""));
    }

    #[test]
    fn crossarm_without_pole_is_unattached() {
        assert!(draft_for(ComponentKind::Crossarm, &[]).attachment.is_none());
        assert!(draft_for(ComponentKind::Insulator, &default_configuration().components)
            .attachment
            .is_none());
    }

    #[test]
    fn company_data_templates() {
        let draft = from_data(ComponentKind::Cable, "TX-100").unwrap();
        assert_eq!(draft.name, "Cable TX-100");
        assert_eq!(draft.data_source.as_deref(), Some("company"));
        assert_eq!(draft.data_id.as_deref(), Some("TX-100"));

        assert!(from_data(ComponentKind::Insulator, "I-1").is_none());
    }

    #[test]
    fn default_configuration_layout() {
        let config = default_configuration();
        assert_eq!(config.name, DEFAULT_CONFIGURATION_NAME);
        assert_eq!(config.len(), 5);

        let pole = &config.components[0];
        let crossarm = &config.components[1];
        assert_eq!(pole.kind, ComponentKind::Pole);
        assert_eq!(crossarm.attached_to(), Some(&pole.id));

        assert_eq!(config.children_of(&crossarm.id).count(), 2);
        assert_eq!(
            config
                .children_of(&pole.id)
                .filter(|c| c.kind == ComponentKind::Insulator)
                .count(),
            1
        );
    }

    #[test]
    fn seeded_insulators_sit_at_opposite_ends() {
        let config = default_configuration();
        let crossarm = &config.components[1];
        let x = |name: &str| {
            let ins = config.components.iter().find(|c| c.name == name).unwrap();
            resolve_position(ins, crossarm)[0]
        };

        // 1' 0" and 15' 5" along a 5 unit arm centered on x = 0
        assert!((x("Insulator Left") - (0.3048 - 2.5)).abs() < 1e-9);
        assert!((x("Insulator Right") - (4.699 - 2.5)).abs() < 1e-9);

        // Signed offsets lose their sign when parsed, so -2' 0" and 2' 0"
        // would stack both insulators on the same spot
        let mut left = config.components[2].clone();
        left.imperial.offset = Some("-2' 0\"".to_string());
        let mut right = left.clone();
        right.imperial.offset = Some("2' 0\"".to_string());
        assert_eq!(resolve_position(&left, crossarm), resolve_position(&right, crossarm));
    }
}
