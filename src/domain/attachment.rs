//! Attachment resolution
//!
//! Pure functions deriving an attached component's scene position and
//! rotation from its attachment declaration and its parent's current pose.
//!
//! Priority:
//! 1. No attachment: the component's own pose.
//! 2. Complete imperial placement: feet/inches relative to the parent.
//! 3. Otherwise the legacy polar fields (height, angle, offset).
//!
//! Resolution never fails. The store handles the missing-parent case by
//! not calling in at all, which leaves the last known pose in place.

use serde::Serialize;

use super::component::{AttachmentType, Component, ComponentKind, Vec3};
use super::id::ComponentId;
use super::measurement::{imperial_to_distance, polar_to_cartesian, ImperialMeasurement};

/// Height assumed for a pole without a usable height specification
pub const DEFAULT_POLE_HEIGHT_FEET: f64 = 45.0;

/// Rendered height of a pole in scene units, centered on y = 0
pub const POLE_SCENE_HEIGHT: f64 = 15.0;

/// Rendered length of a crossarm at unit X scale
pub const CROSSARM_SCENE_LENGTH: f64 = 5.0;

const DEFAULT_IMPERIAL: &str = "0' 0\"";

/// Derives the position of `component` from `parent`
pub fn resolve_position(component: &Component, parent: &Component) -> Vec3 {
    let Some(attachment) = &component.attachment else {
        return component.position;
    };
    let imperial = &component.imperial;

    if imperial.is_complete() {
        let height = imperial.height.as_deref().unwrap_or(DEFAULT_IMPERIAL);
        let offset = match imperial.offset.as_deref() {
            Some(text) if !text.is_empty() => text,
            _ => DEFAULT_IMPERIAL,
        };
        let direction = imperial.direction.unwrap_or(0.0);

        return match attachment.attachment_type {
            AttachmentType::Pole => {
                // Whole feet only; the inches part does not move the mount point
                let height_feet = f64::from(ImperialMeasurement::parse(height).feet);
                let y = height_feet / pole_height_feet(parent) * POLE_SCENE_HEIGHT
                    - POLE_SCENE_HEIGHT / 2.0;
                let (x, z) = polar_to_cartesian(direction, imperial_to_distance(offset));

                [parent.position[0] + x, y, parent.position[2] + z]
            }
            AttachmentType::Crossarm => {
                let y = parent.position[1] + imperial_to_distance(height);
                let along = imperial_to_distance(offset);

                [
                    parent.position[0] + along - crossarm_length(parent) / 2.0,
                    y,
                    parent.position[2],
                ]
            }
        };
    }

    let angle = attachment.angle_or_default();
    let offset = attachment.offset_or_default();

    match attachment.attachment_type {
        AttachmentType::Pole => {
            // Fraction of the 15-unit pole times the height in feet. Mixed units
            // are long-standing behavior of this path.
            let height_fraction = attachment.height_or_default() / POLE_SCENE_HEIGHT;
            let y = height_fraction * pole_height_feet(parent);
            let radians = angle.to_radians();

            [
                parent.position[0] + radians.sin() * offset,
                y,
                parent.position[2] + radians.cos() * offset,
            ]
        }
        AttachmentType::Crossarm => {
            let half = crossarm_length(parent) / 2.0;
            let mut position = parent.position;

            if angle <= 90.0 {
                position[0] -= half * (1.0 - angle / 90.0);
            } else if angle <= 180.0 {
                position[0] += half * ((angle - 90.0) / 90.0);
            }
            position[1] += offset;

            position
        }
    }
}

/// Derives the rotation of `component` from `parent`
///
/// Any imperial direction alone decides rotation, even when the rest of the
/// imperial placement is missing.
pub fn resolve_rotation(component: &Component, parent: &Component) -> Vec3 {
    let Some(attachment) = &component.attachment else {
        return component.rotation;
    };

    if let Some(direction) = component.imperial.direction {
        return [0.0, direction.to_radians(), 0.0];
    }

    match attachment.attachment_type {
        AttachmentType::Pole => [0.0, attachment.angle_or_default().to_radians(), 0.0],
        AttachmentType::Crossarm => parent.rotation,
    }
}

/// Resolves both halves at once
pub fn resolve_pose(component: &Component, parent: &Component) -> (Vec3, Vec3) {
    (
        resolve_position(component, parent),
        resolve_rotation(component, parent),
    )
}

/// Declared height of a pole, defaulting to 45 ft
pub fn pole_height_feet(pole: &Component) -> f64 {
    pole.specifications
        .pole_height_feet()
        .unwrap_or(DEFAULT_POLE_HEIGHT_FEET)
}

/// Rendered crossarm length: X scale times 5
pub fn crossarm_length(crossarm: &Component) -> f64 {
    crossarm.scale[0] * CROSSARM_SCENE_LENGTH
}

/// Finds the first pole
pub fn find_pole(components: &[Component]) -> Option<&Component> {
    components.iter().find(|c| c.kind == ComponentKind::Pole)
}

/// A component other components can be attached to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttachmentPoint {
    pub id: ComponentId,
    pub name: String,
    #[serde(rename = "type")]
    pub attachment_type: AttachmentType,
}

/// Every pole and crossarm, in insertion order
pub fn attachment_points(components: &[Component]) -> Vec<AttachmentPoint> {
    components
        .iter()
        .filter_map(|c| {
            c.kind.as_attachment_target().map(|attachment_type| AttachmentPoint {
                id: c.id.clone(),
                name: c.name.clone(),
                attachment_type,
            })
        })
        .collect()
}
