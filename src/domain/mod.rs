//! Domain models for pole configurations
//!
//! Components, configurations and the pure rules that place attached
//! components relative to their parents. No I/O happens here.

mod id;
mod component;
mod configuration;
mod attachment;
mod graph;
pub mod catalog;
pub mod measurement;

pub use id::{ComponentId, ConfigurationId, IdError};
pub use component::{
    Attachment, AttachmentType, Component, ComponentDraft, ComponentKind, ComponentPatch,
    ImperialPlacement, ParseKindError, Specifications, Vec3, POLE_HEIGHT_KEY,
};
pub use configuration::Configuration;
pub use attachment::{
    attachment_points, crossarm_length, find_pole, pole_height_feet,
    resolve_pose, resolve_position, resolve_rotation, AttachmentPoint, CROSSARM_SCENE_LENGTH,
    DEFAULT_POLE_HEIGHT_FEET, POLE_SCENE_HEIGHT,
};
pub use graph::AttachmentGraph;
pub use measurement::ImperialMeasurement;
