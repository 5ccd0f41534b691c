//! Configuration domain model
//!
//! A configuration is one named pole assembly: an ordered list of
//! components plus creation and last-update timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::component::Component;
use super::id::{ComponentId, ConfigurationId};

/// A named set of components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Unique identifier
    pub id: ConfigurationId,

    /// Display name
    pub name: String,

    /// Components in insertion order
    #[serde(default)]
    pub components: Vec<Component>,

    /// When the configuration was created
    pub created_at: DateTime<Utc>,

    /// When the configuration was last updated
    pub updated_at: DateTime<Utc>,
}

impl Configuration {
    /// Creates an empty configuration
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let now = Utc::now();
        Self {
            id: ConfigurationId::new(&name, now),
            name,
            components: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Bumps the last-updated timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn component(&self, id: &ComponentId) -> Option<&Component> {
        self.components.iter().find(|c| &c.id == id)
    }

    pub fn contains(&self, id: &ComponentId) -> bool {
        self.component(id).is_some()
    }

    /// Components whose attachment points at `parent`
    pub fn children_of<'a>(
        &'a self,
        parent: &'a ComponentId,
    ) -> impl Iterator<Item = &'a Component> + 'a {
        self.components
            .iter()
            .filter(move |c| c.attached_to() == Some(parent))
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}
