//! pole-cli - Utility pole configuration editor core
//!
//! Models poles and the hardware hung on them (crossarms, insulators,
//! transformers...) as named configurations. Attached components take their
//! position and rotation from their parent, computed from imperial
//! feet/inch placements or legacy polar fields.

pub mod domain;
pub mod store;
pub mod cli;

pub use domain::{Component, ComponentId, ComponentKind, Configuration, ConfigurationId};
pub use store::PoleStore;
