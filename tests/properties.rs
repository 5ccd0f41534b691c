//! Property tests for the measurement codec and attachment resolver

use pole_cli::domain::measurement::{cartesian_to_polar, polar_to_cartesian};
use pole_cli::domain::{
    resolve_pose, Attachment, Component, ComponentDraft, ComponentId, ComponentKind,
    ImperialMeasurement, ImperialPlacement, POLE_HEIGHT_KEY,
};
use proptest::prelude::*;

fn pole(height_feet: f64, position: [f64; 3]) -> Component {
    let mut draft = ComponentDraft::new(ComponentKind::Pole, "Pole").with_position(position);
    draft.specifications.set(POLE_HEIGHT_KEY, height_feet);
    Component::from_draft(ComponentId::generate("pole"), draft)
}

proptest! {
    #[test]
    fn parse_inverts_format(feet in 0i32..10_000, inches in 0i32..12) {
        let m = ImperialMeasurement::new(feet, inches);
        prop_assert_eq!(ImperialMeasurement::parse(&m.to_string()), m);
    }

    #[test]
    fn from_meters_inverts_to_meters(feet in 0i32..1_000, inches in 0i32..12) {
        let m = ImperialMeasurement::new(feet, inches);
        prop_assert_eq!(ImperialMeasurement::from_meters(m.to_meters()), m);
    }

    #[test]
    fn polar_roundtrip(angle in 0.0f64..360.0, distance in 0.01f64..1_000.0) {
        let (x, z) = polar_to_cartesian(angle, distance);
        let (back_angle, back_distance) = cartesian_to_polar(x, z);

        // 359.9999... may come back as 0
        let diff = (back_angle - angle).abs();
        prop_assert!(diff < 1e-6 || (360.0 - diff) < 1e-6, "{} vs {}", back_angle, angle);
        prop_assert!((back_distance - distance).abs() < 1e-6 * distance.max(1.0));
        prop_assert!((0.0..360.0).contains(&back_angle));
    }

    #[test]
    fn resolution_is_idempotent(
        feet in 0i32..60,
        inches in 0i32..12,
        offset in 0i32..10,
        direction in 0.0f64..360.0,
        pole_height in 20.0f64..80.0,
        px in -10.0f64..10.0,
        pz in -10.0f64..10.0,
    ) {
        let parent = pole(pole_height, [px, 0.0, pz]);
        let placement = ImperialPlacement::new(
            format!("{}' {}\"", feet, inches),
            format!("{}' 0\"", offset),
            direction,
        );
        let child = Component::from_draft(
            ComponentId::generate("insulator"),
            ComponentDraft::new(ComponentKind::Insulator, "Insulator")
                .with_attachment(Attachment::to_pole(parent.id.clone()))
                .with_imperial(placement),
        );

        let first = resolve_pose(&child, &parent);
        let second = resolve_pose(&child, &parent);
        prop_assert_eq!(first, second);

        // Feeding the resolved pose back in changes nothing
        let mut resolved = child.clone();
        resolved.position = first.0;
        resolved.rotation = first.1;
        prop_assert_eq!(resolve_pose(&resolved, &parent), first);
    }

    #[test]
    fn legacy_resolution_is_idempotent(
        height in 0.0f64..15.0,
        angle in 0.0f64..360.0,
        offset in 0.0f64..3.0,
    ) {
        let parent = pole(45.0, [0.0; 3]);
        let child = Component::from_draft(
            ComponentId::generate("hardware"),
            ComponentDraft::new(ComponentKind::Hardware, "Bolt").with_attachment(
                Attachment::to_pole(parent.id.clone())
                    .with_height(height)
                    .with_angle(angle)
                    .with_offset(offset),
            ),
        );

        prop_assert_eq!(resolve_pose(&child, &parent), resolve_pose(&child, &parent));
    }
}
