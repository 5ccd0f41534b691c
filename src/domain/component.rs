//! Component domain model
//!
//! A component is one placeable piece of pole hardware. Its pose is stored
//! in scene space (meters, radians). When it carries an [`Attachment`], the
//! position and rotation are derived from the parent by the resolver and
//! written back by the store.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::id::ComponentId;

/// Position, rotation or scale triple
pub type Vec3 = [f64; 3];

/// Specification key holding a pole's height in feet
pub const POLE_HEIGHT_KEY: &str = "Height (')";

#[derive(Debug, Error, PartialEq)]
pub enum ParseKindError {
    #[error("Unknown component kind: {0}")]
    UnknownComponentKind(String),

    #[error("Unknown attachment type: {0} (expected 'pole' or 'crossarm')")]
    UnknownAttachmentType(String),
}

/// Kind of component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Pole,
    Crossarm,
    Insulator,
    Transformer,
    Wire,
    Hardware,
    Anchor,
    Cable,
    Equipment,
}

impl ComponentKind {
    /// Returns all kinds in catalog order
    pub fn all() -> &'static [ComponentKind] {
        &[
            ComponentKind::Pole,
            ComponentKind::Crossarm,
            ComponentKind::Insulator,
            ComponentKind::Transformer,
            ComponentKind::Wire,
            ComponentKind::Hardware,
            ComponentKind::Anchor,
            ComponentKind::Cable,
            ComponentKind::Equipment,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Pole => "pole",
            ComponentKind::Crossarm => "crossarm",
            ComponentKind::Insulator => "insulator",
            ComponentKind::Transformer => "transformer",
            ComponentKind::Wire => "wire",
            ComponentKind::Hardware => "hardware",
            ComponentKind::Anchor => "anchor",
            ComponentKind::Cable => "cable",
            ComponentKind::Equipment => "equipment",
        }
    }

    /// The attachment type other components use to hang off this kind
    pub fn as_attachment_target(&self) -> Option<AttachmentType> {
        match self {
            ComponentKind::Pole => Some(AttachmentType::Pole),
            ComponentKind::Crossarm => Some(AttachmentType::Crossarm),
            _ => None,
        }
    }

    /// Crossarms must always hang off a pole
    pub fn requires_attachment(&self) -> bool {
        matches!(self, ComponentKind::Crossarm)
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ComponentKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        ComponentKind::all()
            .iter()
            .copied()
            .find(|kind| kind.as_str() == lower)
            .ok_or_else(|| ParseKindError::UnknownComponentKind(s.to_string()))
    }
}

/// What kind of mounting point a component is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentType {
    Pole,
    Crossarm,
}

impl fmt::Display for AttachmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachmentType::Pole => write!(f, "pole"),
            AttachmentType::Crossarm => write!(f, "crossarm"),
        }
    }
}

impl FromStr for AttachmentType {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pole" => Ok(AttachmentType::Pole),
            "crossarm" => Ok(AttachmentType::Crossarm),
            _ => Err(ParseKindError::UnknownAttachmentType(s.to_string())),
        }
    }
}

/// Attachment declaration: parent, mounting type and legacy polar placement
///
/// The legacy fields are meters-on-pole height (default 7), angle in
/// degrees (default 0) and offset in meters (default 0.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    /// Component this one is attached to
    pub parent: ComponentId,

    #[serde(rename = "type")]
    pub attachment_type: AttachmentType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<f64>,
}

impl Attachment {
    pub const DEFAULT_HEIGHT: f64 = 7.0;
    pub const DEFAULT_ANGLE: f64 = 0.0;
    pub const DEFAULT_OFFSET: f64 = 0.5;

    /// Attaches to a pole
    pub fn to_pole(parent: ComponentId) -> Self {
        Self::new(parent, AttachmentType::Pole)
    }

    /// Attaches to a crossarm
    pub fn to_crossarm(parent: ComponentId) -> Self {
        Self::new(parent, AttachmentType::Crossarm)
    }

    pub fn new(parent: ComponentId, attachment_type: AttachmentType) -> Self {
        Self {
            parent,
            attachment_type,
            height: None,
            angle: None,
            offset: None,
        }
    }

    pub fn with_height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    pub fn with_angle(mut self, angle: f64) -> Self {
        self.angle = Some(angle);
        self
    }

    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn height_or_default(&self) -> f64 {
        self.height.unwrap_or(Self::DEFAULT_HEIGHT)
    }

    pub fn angle_or_default(&self) -> f64 {
        self.angle.unwrap_or(Self::DEFAULT_ANGLE)
    }

    pub fn offset_or_default(&self) -> f64 {
        self.offset.unwrap_or(Self::DEFAULT_OFFSET)
    }
}

/// Imperial placement: height and offset as `X' Y"` text, direction in degrees
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImperialPlacement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<f64>,
}

impl ImperialPlacement {
    pub fn new(height: impl Into<String>, offset: impl Into<String>, direction: f64) -> Self {
        Self {
            height: Some(height.into()),
            offset: Some(offset.into()),
            direction: Some(direction),
        }
    }

    /// True when height (non-empty), offset and direction are all set
    pub fn is_complete(&self) -> bool {
        self.height.as_deref().is_some_and(|h| !h.is_empty())
            && self.offset.is_some()
            && self.direction.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.height.is_none() && self.offset.is_none() && self.direction.is_none()
    }
}

/// Free-form specification attributes (species, class, height...)
///
/// Display-only, except for [`POLE_HEIGHT_KEY`] which placement reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Specifications(BTreeMap<String, serde_json::Value>);

impl Specifications {
    /// Creates an empty specification bag
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Gets a value by key
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// Sets a value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Removes a value
    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.0.remove(key)
    }

    /// Returns true if empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over all key-value pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &serde_json::Value)> {
        self.0.iter()
    }

    /// Declared pole height in feet, if it is a positive number
    ///
    /// Numeric text such as `"50"` counts as a number.
    pub fn pole_height_feet(&self) -> Option<f64> {
        self.get(POLE_HEIGHT_KEY)
            .and_then(|value| match value {
                serde_json::Value::String(text) => text.trim().parse::<f64>().ok(),
                other => other.as_f64(),
            })
            .filter(|h| h.is_finite() && *h > 0.0)
    }

    /// Gets a value rendered as plain text (strings without quotes)
    pub fn get_text(&self, key: &str) -> Option<String> {
        self.get(key).map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

impl<K: Into<String>, V: Into<serde_json::Value>> FromIterator<(K, V)> for Specifications {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// A placeable component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Unique identifier
    pub id: ComponentId,

    /// Display name
    pub name: String,

    #[serde(rename = "type")]
    pub kind: ComponentKind,

    /// Scene position in meters
    pub position: Vec3,

    /// Euler rotation in radians
    pub rotation: Vec3,

    pub scale: Vec3,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default, skip_serializing_if = "Specifications::is_empty")]
    pub specifications: Specifications,

    /// Where company-sourced components came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,

    #[serde(default, skip_serializing_if = "ImperialPlacement::is_empty")]
    pub imperial: ImperialPlacement,
}

impl Component {
    /// Materializes a draft under the given ID
    pub fn from_draft(id: ComponentId, draft: ComponentDraft) -> Self {
        Self {
            id,
            name: draft.name,
            kind: draft.kind,
            position: draft.position,
            rotation: draft.rotation,
            scale: draft.scale,
            color: draft.color,
            specifications: draft.specifications,
            data_source: draft.data_source,
            data_id: draft.data_id,
            attachment: draft.attachment,
            imperial: draft.imperial,
        }
    }

    /// Returns the parent ID when attached
    pub fn attached_to(&self) -> Option<&ComponentId> {
        self.attachment.as_ref().map(|a| &a.parent)
    }

    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    /// Drops the attachment group; pose and imperial fields are kept
    pub fn detach(&mut self) -> Option<Attachment> {
        self.attachment.take()
    }

    /// Shallow-merges a patch onto this component
    pub fn apply(&mut self, patch: &ComponentPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(rotation) = patch.rotation {
            self.rotation = rotation;
        }
        if let Some(scale) = patch.scale {
            self.scale = scale;
        }
        if let Some(color) = &patch.color {
            self.color = color.clone();
        }
        if let Some(specifications) = &patch.specifications {
            self.specifications = specifications.clone();
        }
        if let Some(data_source) = &patch.data_source {
            self.data_source = data_source.clone();
        }
        if let Some(data_id) = &patch.data_id {
            self.data_id = data_id.clone();
        }
        if let Some(attachment) = &patch.attachment {
            self.attachment = attachment.clone();
        }
        if let Some(attachment) = self.attachment.as_mut() {
            if let Some(height) = patch.attachment_height {
                attachment.height = Some(height);
            }
            if let Some(angle) = patch.attachment_angle {
                attachment.angle = Some(angle);
            }
            if let Some(offset) = patch.attachment_offset {
                attachment.offset = Some(offset);
            }
        }
        if let Some(height) = &patch.imperial_height {
            self.imperial.height = height.clone();
        }
        if let Some(offset) = &patch.imperial_offset {
            self.imperial.offset = offset.clone();
        }
        if let Some(direction) = patch.imperial_direction {
            self.imperial.direction = direction;
        }
    }
}

/// A component that has not been given an ID yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDraft {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: ComponentKind,

    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default, skip_serializing_if = "Specifications::is_empty")]
    pub specifications: Specifications,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,

    #[serde(default, skip_serializing_if = "ImperialPlacement::is_empty")]
    pub imperial: ImperialPlacement,
}

impl ComponentDraft {
    /// Creates a bare draft at the origin with unit scale
    pub fn new(kind: ComponentKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: [1.0; 3],
            color: None,
            specifications: Specifications::new(),
            data_source: None,
            data_id: None,
            attachment: None,
            imperial: ImperialPlacement::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    pub fn with_imperial(mut self, imperial: ImperialPlacement) -> Self {
        self.imperial = imperial;
        self
    }

    pub fn with_specifications(mut self, specifications: Specifications) -> Self {
        self.specifications = specifications;
        self
    }
}

/// Partial update for a component
///
/// `None` leaves a field alone. For optional fields, `Some(None)` clears.
/// The legacy `attachment_*` fields apply onto whatever attachment the
/// component has after `attachment` is merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentPatch {
    pub name: Option<String>,
    pub position: Option<Vec3>,
    pub rotation: Option<Vec3>,
    pub scale: Option<Vec3>,
    pub color: Option<Option<String>>,
    pub specifications: Option<Specifications>,
    pub data_source: Option<Option<String>>,
    pub data_id: Option<Option<String>>,
    pub attachment: Option<Option<Attachment>>,
    pub attachment_height: Option<f64>,
    pub attachment_angle: Option<f64>,
    pub attachment_offset: Option<f64>,
    pub imperial_height: Option<Option<String>>,
    pub imperial_offset: Option<Option<String>>,
    pub imperial_direction: Option<Option<f64>>,
}

impl ComponentPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the patch sets nothing
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn position(mut self, position: Vec3) -> Self {
        self.position = Some(position);
        self
    }

    pub fn rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = Some(rotation);
        self
    }

    pub fn scale(mut self, scale: Vec3) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(Some(color.into()));
        self
    }

    pub fn specifications(mut self, specifications: Specifications) -> Self {
        self.specifications = Some(specifications);
        self
    }

    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(Some(attachment));
        self
    }

    pub fn detach(mut self) -> Self {
        self.attachment = Some(None);
        self
    }

    pub fn imperial_height(mut self, height: impl Into<String>) -> Self {
        self.imperial_height = Some(Some(height.into()));
        self
    }

    pub fn imperial_offset(mut self, offset: impl Into<String>) -> Self {
        self.imperial_offset = Some(Some(offset.into()));
        self
    }

    pub fn imperial_direction(mut self, direction: f64) -> Self {
        self.imperial_direction = Some(Some(direction));
        self
    }
}
