//! Session scripts
//!
//! A script is a list of store operations, written in TOML, YAML or JSON
//! and picked by file extension:
//!
//! ```toml
//! [[steps]]
//! op = "add"
//! kind = "insulator"
//! label = "top"
//! attach_to = "Douglas Fir 45' Class 2"
//! imperial_height = "40' 0\""
//!
//! [[steps]]
//! op = "set_pole_height"
//! feet = 50
//! ```
//!
//! Components are referenced by script label, by id, or by name within the
//! active configuration; configurations by id or name. A reference that
//! looks like an id is passed through even when nothing has it, so the
//! store decides whether the operation applies.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    catalog, Attachment, AttachmentGraph, AttachmentType, ComponentDraft, ComponentId,
    ComponentKind, ComponentPatch, ConfigurationId, Vec3,
};
use crate::store::{PoleStore, RefreshThrottle, SaveReceipt};

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Failed to read script {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported script format '{0}' (expected toml, yaml, yml or json)")]
    UnsupportedFormat(String),

    #[error("Failed to parse script {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Step {step}: unknown component '{reference}'")]
    UnknownComponent { step: usize, reference: String },

    #[error("Step {step}: unknown configuration '{reference}'")]
    UnknownConfiguration { step: usize, reference: String },

    #[error("Step {step}: '{name}' is a {kind} and cannot be attached to")]
    NotAnAttachmentPoint {
        step: usize,
        name: String,
        kind: ComponentKind,
    },

    #[error("Step {step}: crossarm '{name}' must stay attached to a pole")]
    CrossarmDetach { step: usize, name: String },

    #[error("Step {step}: crossarm '{name}' can only be attached to a pole, not '{parent}'")]
    CrossarmParent {
        step: usize,
        name: String,
        parent: String,
    },

    #[error("Step {step}: attaching '{child}' to '{parent}' would create a cycle")]
    Cycle {
        step: usize,
        child: String,
        parent: String,
    },

    #[error("Step {step}: label '{label}' is already in use")]
    DuplicateLabel { step: usize, label: String },
}

/// A parsed session script
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Script {
    /// Overrides whether the session starts from the default configuration
    #[serde(default)]
    pub seed_default: Option<bool>,

    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    CreateConfiguration { name: String },
    RemoveConfiguration { configuration: String },
    RenameConfiguration { configuration: String, name: String },
    Activate { configuration: String },
    Add(AddStep),
    Update(UpdateStep),
    Remove { component: String },
    Select {
        #[serde(default)]
        component: Option<String>,
    },
    SetPoleHeight { feet: f64 },
    Refresh,
    Save,
}

/// Fields shared by `add` and `update` for placing a component
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Placement {
    /// Parent reference
    pub attach_to: Option<String>,
    /// Defaults to the parent's kind
    pub attachment_type: Option<AttachmentType>,
    pub height: Option<f64>,
    pub angle: Option<f64>,
    pub offset: Option<f64>,
    pub imperial_height: Option<String>,
    pub imperial_offset: Option<String>,
    pub imperial_direction: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddStep {
    /// Component kind; unknown kinds get the generic template
    pub kind: String,
    pub label: Option<String>,
    pub name: Option<String>,
    /// Use the company-data template for this id
    pub data_id: Option<String>,
    pub position: Option<Vec3>,
    pub rotation: Option<Vec3>,
    pub scale: Option<Vec3>,
    pub color: Option<String>,
    #[serde(default)]
    pub specifications: BTreeMap<String, serde_json::Value>,
    #[serde(flatten)]
    pub placement: Placement,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStep {
    pub component: String,
    pub name: Option<String>,
    pub position: Option<Vec3>,
    pub rotation: Option<Vec3>,
    pub scale: Option<Vec3>,
    pub color: Option<String>,
    /// Keys merged into the existing specifications
    #[serde(default)]
    pub specifications: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub detach: bool,
    #[serde(flatten)]
    pub placement: Placement,
}

/// What a script run did
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    pub steps: usize,
    /// Steps the store declined (unknown target, no active configuration)
    pub skipped: usize,
    /// Attachment refresh passes run by the throttle between steps
    pub refreshes: usize,
    pub saves: Vec<SaveReceipt>,
}

impl Script {
    /// Loads a script, picking the format from the file extension
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let content = fs::read_to_string(path).map_err(|source| ScriptError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        let parsed = match extension.as_str() {
            "toml" => toml::from_str(&content).map_err(|e| e.to_string()),
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| e.to_string()),
            "json" => serde_json::from_str(&content).map_err(|e| e.to_string()),
            other => return Err(ScriptError::UnsupportedFormat(other.to_string())),
        };

        parsed.map_err(|message| ScriptError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Runs every step against `store`, ticking `throttle` after each one
    pub fn run(
        &self,
        store: &mut PoleStore,
        throttle: &mut RefreshThrottle,
    ) -> Result<RunReport, ScriptError> {
        let mut runner = Runner {
            store,
            labels: HashMap::new(),
            report: RunReport::default(),
        };

        for (index, step) in self.steps.iter().enumerate() {
            let number = index + 1;
            tracing::debug!(step = number, ?step, "running step");

            if !runner.step(number, step)? {
                runner.report.skipped += 1;
            }
            runner.report.steps += 1;

            if throttle.tick(runner.store).is_some() {
                runner.report.refreshes += 1;
            }
        }

        Ok(runner.report)
    }
}

struct Runner<'a> {
    store: &'a mut PoleStore,
    labels: HashMap<String, ComponentId>,
    report: RunReport,
}

impl Runner<'_> {
    /// Applies one step; false when the store declined it
    fn step(&mut self, number: usize, step: &Step) -> Result<bool, ScriptError> {
        let applied = match step {
            Step::CreateConfiguration { name } => {
                self.store.create_configuration(name.as_str());
                true
            }
            Step::RemoveConfiguration { configuration } => {
                let id = self.configuration(number, configuration)?;
                self.store.remove_configuration(&id)
            }
            Step::RenameConfiguration {
                configuration,
                name,
            } => {
                let id = self.configuration(number, configuration)?;
                self.store.rename_configuration(&id, name.as_str())
            }
            Step::Activate { configuration } => {
                let id = self.configuration(number, configuration)?;
                self.store.set_active_configuration(&id)
            }
            Step::Add(add) => self.add(number, add)?,
            Step::Update(update) => self.update(number, update)?,
            Step::Remove { component } => {
                let id = self.component(number, component)?;
                self.store.remove_component(&id)
            }
            Step::Select { component } => {
                let id = match component {
                    Some(reference) => Some(self.component(number, reference)?),
                    None => None,
                };
                self.store.select_component(id);
                true
            }
            Step::SetPoleHeight { feet } => self.store.set_pole_height(*feet),
            Step::Refresh => {
                self.store.refresh_attachments();
                true
            }
            Step::Save => match self.store.save_active() {
                Some(receipt) => {
                    self.report.saves.push(receipt);
                    true
                }
                None => false,
            },
        };

        Ok(applied)
    }

    fn add(&mut self, number: usize, add: &AddStep) -> Result<bool, ScriptError> {
        if let Some(label) = &add.label {
            if self.labels.contains_key(label) {
                return Err(ScriptError::DuplicateLabel {
                    step: number,
                    label: label.clone(),
                });
            }
        }

        let mut draft = self.template(add);

        if let Some(name) = &add.name {
            draft.name = name.clone();
        }
        if let Some(position) = add.position {
            draft.position = position;
        }
        if let Some(rotation) = add.rotation {
            draft.rotation = rotation;
        }
        if let Some(scale) = add.scale {
            draft.scale = scale;
        }
        if let Some(color) = &add.color {
            draft.color = Some(color.clone());
        }
        for (key, value) in &add.specifications {
            draft.specifications.set(key.as_str(), value.clone());
        }

        let placement = &add.placement;
        if let Some(reference) = &placement.attach_to {
            let parent = self.component(number, reference)?;
            let attachment_type = self.attachment_type(number, &parent, placement)?;
            if draft.kind.requires_attachment() {
                self.check_crossarm_parent(number, &draft.name, &parent, attachment_type)?;
            }
            draft.attachment = Some(legacy_fields(
                Attachment::new(parent, attachment_type),
                placement,
            ));
        } else if let Some(attachment) = draft.attachment.take() {
            draft.attachment = Some(legacy_fields(attachment, placement));
        }
        if let Some(height) = &placement.imperial_height {
            draft.imperial.height = Some(height.clone());
        }
        if let Some(offset) = &placement.imperial_offset {
            draft.imperial.offset = Some(offset.clone());
        }
        if let Some(direction) = placement.imperial_direction {
            draft.imperial.direction = Some(direction);
        }

        let Some(id) = self.store.add_component(draft) else {
            return Ok(false);
        };

        if let Some(label) = &add.label {
            self.labels.insert(label.clone(), id.clone());
        }

        // Place it right away rather than waiting for the next refresh
        self.store.update_component(&id, ComponentPatch::default());
        Ok(true)
    }

    fn template(&self, add: &AddStep) -> ComponentDraft {
        match add.kind.parse::<ComponentKind>() {
            Ok(kind) => match &add.data_id {
                Some(data_id) => catalog::from_data(kind, data_id)
                    .unwrap_or_else(|| catalog::draft_for(kind, self.store.components())),
                None => catalog::draft_for(kind, self.store.components()),
            },
            Err(_) => catalog::defaults_for_tag(&add.kind),
        }
    }

    fn update(&mut self, number: usize, update: &UpdateStep) -> Result<bool, ScriptError> {
        let id = self.component(number, &update.component)?;
        let existing = self.store.component(&id).cloned();

        let mut patch = ComponentPatch {
            name: update.name.clone(),
            position: update.position,
            rotation: update.rotation,
            scale: update.scale,
            color: update.color.clone().map(Some),
            ..ComponentPatch::default()
        };

        if !update.specifications.is_empty() {
            let mut specifications = existing
                .as_ref()
                .map(|c| c.specifications.clone())
                .unwrap_or_default();
            for (key, value) in &update.specifications {
                specifications.set(key.as_str(), value.clone());
            }
            patch.specifications = Some(specifications);
        }

        let placement = &update.placement;
        if update.detach {
            if let Some(component) = existing.as_ref().filter(|c| c.kind.requires_attachment()) {
                return Err(ScriptError::CrossarmDetach {
                    step: number,
                    name: component.name.clone(),
                });
            }
            patch.attachment = Some(None);
        } else if let Some(reference) = &placement.attach_to {
            let parent = self.component(number, reference)?;
            self.check_cycle(number, &id, &parent)?;
            let attachment_type = self.attachment_type(number, &parent, placement)?;
            if let Some(component) = existing.as_ref().filter(|c| c.kind.requires_attachment()) {
                self.check_crossarm_parent(number, &component.name, &parent, attachment_type)?;
            }
            patch.attachment = Some(Some(Attachment::new(parent, attachment_type)));
        }

        patch.attachment_height = placement.height;
        patch.attachment_angle = placement.angle;
        patch.attachment_offset = placement.offset;
        patch.imperial_height = placement.imperial_height.clone().map(Some);
        patch.imperial_offset = placement.imperial_offset.clone().map(Some);
        patch.imperial_direction = placement.imperial_direction.map(Some);

        Ok(self.store.update_component(&id, patch))
    }

    fn check_cycle(
        &self,
        number: usize,
        child: &ComponentId,
        parent: &ComponentId,
    ) -> Result<(), ScriptError> {
        let graph = AttachmentGraph::from_components(self.store.components());
        if graph.would_create_cycle(child, parent) {
            return Err(ScriptError::Cycle {
                step: number,
                child: self.display_name(child),
                parent: self.display_name(parent),
            });
        }
        Ok(())
    }

    /// A crossarm hangs off a pole and nothing else
    fn check_crossarm_parent(
        &self,
        number: usize,
        name: &str,
        parent: &ComponentId,
        attachment_type: AttachmentType,
    ) -> Result<(), ScriptError> {
        let on_pole = self
            .store
            .component(parent)
            .is_some_and(|p| p.kind == ComponentKind::Pole);

        if on_pole && attachment_type == AttachmentType::Pole {
            return Ok(());
        }
        Err(ScriptError::CrossarmParent {
            step: number,
            name: name.to_string(),
            parent: self.display_name(parent),
        })
    }

    /// Explicit type, else the parent's own kind
    fn attachment_type(
        &self,
        number: usize,
        parent: &ComponentId,
        placement: &Placement,
    ) -> Result<AttachmentType, ScriptError> {
        if let Some(explicit) = placement.attachment_type {
            return Ok(explicit);
        }

        match self.store.component(parent) {
            Some(component) => component.kind.as_attachment_target().ok_or_else(|| {
                ScriptError::NotAnAttachmentPoint {
                    step: number,
                    name: component.name.clone(),
                    kind: component.kind,
                }
            }),
            // Dangling parent; the store leaves its pose alone
            None => Ok(AttachmentType::Pole),
        }
    }

    fn component(&self, number: usize, reference: &str) -> Result<ComponentId, ScriptError> {
        if let Some(id) = self.labels.get(reference) {
            return Ok(id.clone());
        }
        if let Ok(id) = reference.parse::<ComponentId>() {
            return Ok(id);
        }

        self.store
            .components()
            .iter()
            .find(|c| c.name == reference)
            .map(|c| c.id.clone())
            .ok_or_else(|| ScriptError::UnknownComponent {
                step: number,
                reference: reference.to_string(),
            })
    }

    fn configuration(
        &self,
        number: usize,
        reference: &str,
    ) -> Result<ConfigurationId, ScriptError> {
        if let Ok(id) = reference.parse::<ConfigurationId>() {
            return Ok(id);
        }

        self.store
            .configurations()
            .iter()
            .find(|c| c.name == reference)
            .map(|c| c.id.clone())
            .ok_or_else(|| ScriptError::UnknownConfiguration {
                step: number,
                reference: reference.to_string(),
            })
    }

    fn display_name(&self, id: &ComponentId) -> String {
        self.store
            .component(id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| id.to_string())
    }
}

fn legacy_fields(mut attachment: Attachment, placement: &Placement) -> Attachment {
    if let Some(height) = placement.height {
        attachment.height = Some(height);
    }
    if let Some(angle) = placement.angle {
        attachment.angle = Some(angle);
    }
    if let Some(offset) = placement.offset {
        attachment.offset = Some(offset);
    }
    attachment
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn parse_toml(text: &str) -> Script {
        toml::from_str(text).unwrap()
    }

    fn run(script: &Script) -> Result<(PoleStore, RunReport), ScriptError> {
        let mut store = PoleStore::with_default_configuration();
        let mut throttle = RefreshThrottle::new(Duration::from_secs(60));
        let report = script.run(&mut store, &mut throttle)?;
        Ok((store, report))
    }

    fn named<'a>(store: &'a PoleStore, name: &str) -> &'a crate::domain::Component {
        store.components().iter().find(|c| c.name == name).unwrap()
    }

    #[test]
    fn loads_by_extension() {
        let dir = TempDir::new().unwrap();

        let yaml = dir.path().join("s.yaml");
        fs::write(&yaml, "steps:\n  - op: create_configuration\n    name: Tangent\n").unwrap();
        assert_eq!(Script::load(&yaml).unwrap().steps.len(), 1);

        let json = dir.path().join("s.json");
        fs::write(&json, r#"{"seed_default": false, "steps": [{"op": "refresh"}]}"#).unwrap();
        let script = Script::load(&json).unwrap();
        assert_eq!(script.seed_default, Some(false));

        let txt = dir.path().join("s.txt");
        fs::write(&txt, "").unwrap();
        assert!(matches!(
            Script::load(&txt),
            Err(ScriptError::UnsupportedFormat(ext)) if ext == "txt"
        ));
    }

    #[test]
    fn add_with_label_and_attach() {
        let script = parse_toml(
            r#"
[[steps]]
op = "add"
kind = "transformer"
label = "xfmr"
attach_to = "Douglas Fir 45' Class 2"
imperial_height = "30' 0\""
imperial_offset = "2' 0\""
imperial_direction = 90

[[steps]]
op = "update"
component = "xfmr"
name = "Transformer 50kVA"
"#,
        );

        let (store, report) = run(&script).unwrap();
        assert_eq!(report.steps, 2);
        assert_eq!(report.skipped, 0);

        let xfmr = named(&store, "Transformer 50kVA");
        assert_eq!(xfmr.attachment.as_ref().unwrap().attachment_type, AttachmentType::Pole);
        assert!((xfmr.position[0] - 0.6096).abs() < 1e-9);
        assert!((xfmr.position[1] - 2.5).abs() < 1e-9);
    }

    #[test]
    fn attaching_to_a_wire_is_rejected() {
        let script = parse_toml(
            r#"
[[steps]]
op = "add"
kind = "wire"
label = "w"

[[steps]]
op = "add"
kind = "insulator"
attach_to = "w"
"#,
        );

        assert!(matches!(
            run(&script),
            Err(ScriptError::NotAnAttachmentPoint { step: 2, kind: ComponentKind::Wire, .. })
        ));
    }

    #[test]
    fn crossarm_detach_is_rejected() {
        let script = parse_toml(
            r#"
[[steps]]
op = "update"
component = "Wood 8 Ft Crossarm"
detach = true
"#,
        );

        assert!(matches!(run(&script), Err(ScriptError::CrossarmDetach { step: 1, .. })));
    }

    #[test]
    fn crossarm_cannot_move_onto_another_crossarm() {
        let script = parse_toml(
            r#"
[[steps]]
op = "add"
kind = "crossarm"
label = "arm2"

[[steps]]
op = "update"
component = "arm2"
attach_to = "Wood 8 Ft Crossarm"
"#,
        );

        assert!(matches!(
            run(&script),
            Err(ScriptError::CrossarmParent { step: 2, ref parent, .. }) if parent == "Wood 8 Ft Crossarm"
        ));
    }

    #[test]
    fn crossarm_attachment_type_must_be_pole() {
        let update = parse_toml(
            r#"
[[steps]]
op = "update"
component = "Wood 8 Ft Crossarm"
attach_to = "Douglas Fir 45' Class 2"
attachment_type = "crossarm"
"#,
        );
        assert!(matches!(run(&update), Err(ScriptError::CrossarmParent { step: 1, .. })));

        let add = parse_toml(
            r#"
[[steps]]
op = "add"
kind = "crossarm"
attach_to = "Wood 8 Ft Crossarm"
"#,
        );
        assert!(matches!(run(&add), Err(ScriptError::CrossarmParent { step: 1, .. })));
    }

    #[test]
    fn crossarm_can_move_between_poles() {
        let script = parse_toml(
            r#"
[[steps]]
op = "add"
kind = "pole"
name = "Second Pole"
position = [10.0, 0.0, 0.0]

[[steps]]
op = "update"
component = "Wood 8 Ft Crossarm"
attach_to = "Second Pole"
"#,
        );

        let (store, report) = run(&script).unwrap();
        assert_eq!(report.skipped, 0);

        let arm = named(&store, "Wood 8 Ft Crossarm");
        let pole = named(&store, "Second Pole");
        assert_eq!(arm.attached_to(), Some(&pole.id));
        assert!((arm.position[0] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn insulator_detach_is_allowed() {
        let script = parse_toml(
            r#"
[[steps]]
op = "update"
component = "Insulator Center"
detach = true
"#,
        );

        let (store, _) = run(&script).unwrap();
        assert!(!named(&store, "Insulator Center").is_attached());
    }

    #[test]
    fn cycles_are_rejected() {
        let script = parse_toml(
            r#"
[[steps]]
op = "update"
component = "Douglas Fir 45' Class 2"
attach_to = "Insulator Left"
attachment_type = "crossarm"
"#,
        );

        assert!(matches!(run(&script), Err(ScriptError::Cycle { step: 1, .. })));
    }

    #[test]
    fn unknown_name_is_an_error_but_unknown_id_is_skipped() {
        let by_name = parse_toml("[[steps]]\nop = \"remove\"\ncomponent = \"Streetlight\"\n");
        assert!(matches!(
            run(&by_name),
            Err(ScriptError::UnknownComponent { step: 1, .. })
        ));

        let by_id = parse_toml("[[steps]]\nop = \"remove\"\ncomponent = \"c-00000000\"\n");
        let (store, report) = run(&by_id).unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(store.components().len(), 5);
    }

    #[test]
    fn configuration_lifecycle() {
        let script = parse_toml(
            r#"
[[steps]]
op = "create_configuration"
name = "Tangent"

[[steps]]
op = "add"
kind = "pole"

[[steps]]
op = "add"
kind = "crossarm"
label = "arm"

[[steps]]
op = "save"

[[steps]]
op = "activate"
configuration = "Default Utility Pole"

[[steps]]
op = "remove_configuration"
configuration = "Tangent"
"#,
        );

        let (store, report) = run(&script).unwrap();
        assert_eq!(report.saves.len(), 1);
        assert_eq!(report.saves[0].name, "Tangent");
        assert_eq!(report.saves[0].components, 2);
        assert_eq!(store.configurations().len(), 1);
        assert_eq!(store.components().len(), 5);
    }

    #[test]
    fn unknown_kind_uses_generic_template() {
        let script = parse_toml("[[steps]]\nop = \"add\"\nkind = \"streetlight\"\n");

        let (store, _) = run(&script).unwrap();
        let added = store.selected_component().unwrap();
        assert_eq!(added.name, "Component");
        assert_eq!(added.color.as_deref(), Some("#CCCCCC"));
    }

    #[test]
    fn duplicate_labels_are_rejected() {
        let script = parse_toml(
            r#"
[[steps]]
op = "add"
kind = "wire"
label = "w"

[[steps]]
op = "add"
kind = "cable"
label = "w"
"#,
        );

        assert!(matches!(run(&script), Err(ScriptError::DuplicateLabel { step: 2, .. })));
    }

    #[test]
    fn throttle_limits_refreshes() {
        let script = parse_toml("[[steps]]\nop = \"select\"\n\n[[steps]]\nop = \"select\"\n");

        let (_, report) = run(&script).unwrap();
        assert_eq!(report.steps, 2);
        assert_eq!(report.refreshes, 1);
    }
}
