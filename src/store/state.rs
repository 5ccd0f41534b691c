//! Configuration store
//!
//! The in-memory model behind the editor: every configuration, which one is
//! active and which component is selected. All mutation goes through the
//! operations here so `updated_at`, the revision counter and the selection
//! stay consistent.
//!
//! Operations whose preconditions fail (no active configuration, unknown
//! id) leave the state alone and report `false` / `None`. Nothing is raised.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    attachment_points, catalog, find_pole, resolve_pose, AttachmentGraph, AttachmentPoint,
    Component, ComponentDraft, ComponentId, ComponentKind, ComponentPatch, Configuration,
    ConfigurationId, POLE_HEIGHT_KEY, POLE_SCENE_HEIGHT,
};
use crate::domain::measurement::METERS_PER_FOOT;

/// Acknowledgement returned by [`PoleStore::save_active`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveReceipt {
    pub configuration: ConfigurationId,
    pub name: String,
    pub components: usize,
    pub saved_at: DateTime<Utc>,
}

/// Authoritative state of an editing session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoleStore {
    configurations: Vec<Configuration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    active: Option<ConfigurationId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    selected: Option<ComponentId>,

    /// Bumped on every observable change
    #[serde(default)]
    revision: u64,
}

impl PoleStore {
    /// Creates a store with no configurations
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the seeded default configuration, active and
    /// with its attachments resolved
    pub fn with_default_configuration() -> Self {
        let mut store = Self::new();
        let config = catalog::default_configuration();

        store.active = Some(config.id.clone());
        store.configurations.push(config);
        store.refresh_attachments();

        store
    }

    // Configurations

    /// Appends an empty configuration and makes it active
    pub fn create_configuration(&mut self, name: impl Into<String>) -> ConfigurationId {
        let config = Configuration::new(name);
        let id = config.id.clone();

        tracing::debug!(configuration = %id, name = %config.name, "created configuration");

        self.configurations.push(config);
        self.active = Some(id.clone());
        self.selected = None;
        self.bump();

        id
    }

    /// Removes a configuration
    ///
    /// Removing the active one promotes the first survivor (or nothing) and
    /// clears the selection. Removing any other keeps the selection, which
    /// still points into the active configuration.
    pub fn remove_configuration(&mut self, id: &ConfigurationId) -> bool {
        let Some(index) = self.configurations.iter().position(|c| &c.id == id) else {
            tracing::trace!(configuration = %id, "remove skipped: unknown configuration");
            return false;
        };

        self.configurations.remove(index);

        if self.active.as_ref() == Some(id) {
            self.active = self.configurations.first().map(|c| c.id.clone());
            self.selected = None;
        }
        self.bump();

        tracing::debug!(
            configuration = %id,
            active = ?self.active.as_ref().map(ToString::to_string),
            "removed configuration"
        );
        true
    }

    /// Switches the active configuration and clears the selection
    pub fn set_active_configuration(&mut self, id: &ConfigurationId) -> bool {
        if !self.configurations.iter().any(|c| &c.id == id) {
            tracing::trace!(configuration = %id, "activate skipped: unknown configuration");
            return false;
        }

        self.active = Some(id.clone());
        self.selected = None;
        self.bump();

        tracing::debug!(configuration = %id, "activated configuration");
        true
    }

    /// Renames a configuration
    pub fn rename_configuration(&mut self, id: &ConfigurationId, name: impl Into<String>) -> bool {
        let Some(config) = self.configurations.iter_mut().find(|c| &c.id == id) else {
            return false;
        };

        config.name = name.into();
        config.touch();
        self.bump();
        true
    }

    // Components

    /// Adds a component to the active configuration and selects it
    ///
    /// The draft is stored as given; attached drafts are resolved by the
    /// next update or refresh.
    pub fn add_component(&mut self, draft: ComponentDraft) -> Option<ComponentId> {
        let Some(config) = self.active_mut() else {
            tracing::trace!(name = %draft.name, "add skipped: no active configuration");
            return None;
        };

        let id = ComponentId::generate(&draft.name);
        let component = Component::from_draft(id.clone(), draft);

        tracing::debug!(component = %id, kind = %component.kind, name = %component.name, "added component");

        config.components.push(component);
        config.touch();

        self.selected = Some(id.clone());
        self.bump();

        Some(id)
    }

    /// Adds a catalog component of `kind`, hanging a new crossarm on the
    /// first pole
    pub fn add_from_catalog(&mut self, kind: ComponentKind) -> Option<ComponentId> {
        let draft = catalog::draft_for(kind, self.components());
        self.add_component(draft)
    }

    /// Merges `patch` onto a component of the active configuration
    ///
    /// An attached component then has its position and rotation derived from
    /// its parent, unless the patch sets them explicitly. Derived values are
    /// written only when they differ from the stored ones.
    ///
    /// An empty patch on an unattached component changes nothing and returns
    /// `false`.
    pub fn update_component(&mut self, id: &ComponentId, patch: ComponentPatch) -> bool {
        let Some(config) = self.active_mut() else {
            tracing::trace!(component = %id, "update skipped: no active configuration");
            return false;
        };
        let Some(index) = config.components.iter().position(|c| &c.id == id) else {
            tracing::trace!(component = %id, "update skipped: unknown component");
            return false;
        };

        if patch.is_empty() && !config.components[index].is_attached() {
            return false;
        }

        config.components[index].apply(&patch);

        let resolved = {
            let component = &config.components[index];
            component
                .attached_to()
                .and_then(|parent| config.component(parent))
                .map(|parent| resolve_pose(component, parent))
        };

        if let Some((position, rotation)) = resolved {
            let component = &mut config.components[index];

            if patch.position.is_none() && component.position != position {
                tracing::trace!(component = %id, ?position, "resolved position");
                component.position = position;
            }
            if patch.rotation.is_none() && component.rotation != rotation {
                tracing::trace!(component = %id, ?rotation, "resolved rotation");
                component.rotation = rotation;
            }
        }

        config.touch();
        self.bump();

        if !patch.is_empty() {
            tracing::debug!(component = %id, revision = self.revision, "updated component");
        }
        true
    }

    /// Removes a component from the active configuration
    ///
    /// Components attached to it are detached first and keep their last
    /// resolved pose.
    pub fn remove_component(&mut self, id: &ComponentId) -> bool {
        let Some(config) = self.active_mut() else {
            tracing::trace!(component = %id, "remove skipped: no active configuration");
            return false;
        };
        let Some(index) = config.components.iter().position(|c| &c.id == id) else {
            tracing::trace!(component = %id, "remove skipped: unknown component");
            return false;
        };

        let mut detached = 0;
        for child in config
            .components
            .iter_mut()
            .filter(|c| c.attached_to() == Some(id))
        {
            child.detach();
            detached += 1;
        }

        config.components.remove(index);
        config.touch();

        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        self.bump();

        tracing::debug!(component = %id, detached, "removed component");
        true
    }

    /// Sets or clears the selection
    ///
    /// The id is not checked; an unknown id reads back as no selection.
    pub fn select_component(&mut self, id: Option<ComponentId>) {
        if self.selected != id {
            self.selected = id;
            self.bump();
        }
    }

    /// Re-derives every attached component of the active configuration,
    /// parents before children
    ///
    /// Equivalent to an empty update on each attached component with a live
    /// parent. Returns how many poses changed.
    pub fn refresh_attachments(&mut self) -> usize {
        let order = match self.active_configuration() {
            Some(config) => AttachmentGraph::from_components(&config.components)
                .resolution_order()
                .into_iter()
                .filter(|id| {
                    config
                        .component(id)
                        .and_then(Component::attached_to)
                        .is_some_and(|parent| config.contains(parent))
                })
                .collect::<Vec<_>>(),
            None => return 0,
        };

        let mut changed = 0;
        for id in &order {
            let before = self.pose_of(id);
            self.update_component(id, ComponentPatch::default());
            if self.pose_of(id) != before {
                changed += 1;
            }
        }

        tracing::trace!(attached = order.len(), changed, "refreshed attachments");
        changed
    }

    /// Sets the declared height of the first pole and lets its attached
    /// components follow
    ///
    /// The pole is renamed `"{species} {feet}' Class {class}"` and scaled so
    /// its rendered height matches.
    pub fn set_pole_height(&mut self, feet: f64) -> bool {
        if !feet.is_finite() || feet <= 0.0 {
            return false;
        }
        let Some(pole) = find_pole(self.components()) else {
            tracing::trace!("pole height skipped: no pole");
            return false;
        };

        let species = pole
            .specifications
            .get_text("Species")
            .unwrap_or_else(|| "Douglas Fir".to_string());
        let class = pole
            .specifications
            .get_text("Class")
            .unwrap_or_else(|| "2".to_string());

        let mut specifications = pole.specifications.clone();
        specifications.set(POLE_HEIGHT_KEY, feet);

        let mut scale = pole.scale;
        scale[1] = feet * METERS_PER_FOOT / POLE_SCENE_HEIGHT;

        let id = pole.id.clone();
        let patch = ComponentPatch::new()
            .name(format!("{} {}' Class {}", species, feet, class))
            .scale(scale)
            .specifications(specifications);

        let updated = self.update_component(&id, patch);
        if updated {
            self.refresh_attachments();
        }
        updated
    }

    /// Acknowledges a save of the active configuration without writing it
    /// anywhere
    pub fn save_active(&self) -> Option<SaveReceipt> {
        let config = self.active_configuration()?;

        let receipt = SaveReceipt {
            configuration: config.id.clone(),
            name: config.name.clone(),
            components: config.len(),
            saved_at: Utc::now(),
        };

        tracing::info!(
            configuration = %receipt.configuration,
            name = %receipt.name,
            components = receipt.components,
            "configuration saved"
        );
        Some(receipt)
    }

    // Queries

    pub fn configurations(&self) -> &[Configuration] {
        &self.configurations
    }

    pub fn configuration(&self, id: &ConfigurationId) -> Option<&Configuration> {
        self.configurations.iter().find(|c| &c.id == id)
    }

    pub fn active_id(&self) -> Option<&ConfigurationId> {
        self.active.as_ref()
    }

    pub fn active_configuration(&self) -> Option<&Configuration> {
        self.configuration(self.active.as_ref()?)
    }

    pub fn selected_id(&self) -> Option<&ComponentId> {
        self.selected.as_ref()
    }

    /// The selected component, if it exists in the active configuration
    pub fn selected_component(&self) -> Option<&Component> {
        self.active_configuration()?.component(self.selected.as_ref()?)
    }

    /// Components of the active configuration; empty when none is active
    pub fn components(&self) -> &[Component] {
        self.active_configuration()
            .map(|c| c.components.as_slice())
            .unwrap_or(&[])
    }

    pub fn component(&self, id: &ComponentId) -> Option<&Component> {
        self.active_configuration()?.component(id)
    }

    /// Poles and crossarms of the active configuration
    pub fn attachment_points(&self) -> Vec<AttachmentPoint> {
        attachment_points(self.components())
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn active_mut(&mut self) -> Option<&mut Configuration> {
        let active = self.active.as_ref()?;
        self.configurations.iter_mut().find(|c| &c.id == active)
    }

    fn pose_of(&self, id: &ComponentId) -> Option<([f64; 3], [f64; 3])> {
        self.component(id).map(|c| (c.position, c.rotation))
    }

    fn bump(&mut self) {
        self.revision += 1;
    }
}
