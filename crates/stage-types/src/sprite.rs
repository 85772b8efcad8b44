//! Sprite records and the partial updates the engine publishes for them.
//!
//! A [`Sprite`] is the persisted, displayed record owned by whoever holds
//! the authoritative sprite list (the editor, or the in-memory stage in the
//! engine crate). During playback the engine never edits it directly: it
//! sends [`SpriteUpdate`]s carrying only the fields a step changed.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::actions::ScriptBlock;
use crate::ids::SpriteId;
use crate::lenient;

/// What kind of bubble the current message is drawn in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum MessageKind {
    /// No bubble.
    #[default]
    #[serde(rename = "")]
    None,
    /// Speech bubble.
    #[serde(rename = "say")]
    Say,
    /// Thought bubble.
    #[serde(rename = "think")]
    Think,
}

/// A scripted actor on the stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Sprite {
    /// Stable identifier. Editor keys such as `"sprite-1"` are accepted
    /// and mapped to a stable id (see [`lenient::id`]).
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: SpriteId,
    /// Display name, e.g. `Sprite 1`.
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    /// Horizontal position.
    #[serde(default, deserialize_with = "lenient::number")]
    pub x: f64,
    /// Vertical position.
    #[serde(default, deserialize_with = "lenient::number")]
    pub y: f64,
    /// Heading in degrees. Never normalized; may exceed 0..360.
    #[serde(default, deserialize_with = "lenient::number")]
    pub rotation: f64,
    /// Bubble text currently shown, empty when none.
    #[serde(default, deserialize_with = "lenient::text")]
    pub message: String,
    /// Bubble style of `message`.
    #[serde(default, deserialize_with = "lenient::message_kind")]
    pub message_type: MessageKind,
    /// The authored script.
    #[serde(default, deserialize_with = "lenient::blocks")]
    pub actions: Vec<ScriptBlock>,
}

impl Sprite {
    /// Create a sprite at the origin facing 0 degrees with an empty script.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: SpriteId::new(),
            name: name.into(),
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            message: String::new(),
            message_type: MessageKind::None,
            actions: Vec::new(),
        }
    }

    /// Builder-style position setter.
    #[must_use]
    pub const fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Builder-style script setter.
    #[must_use]
    pub fn with_script(mut self, actions: Vec<ScriptBlock>) -> Self {
        self.actions = actions;
        self
    }

    /// Put the sprite back at the origin, facing 0 degrees, with no bubble.
    ///
    /// The script is left alone.
    pub fn reset_pose(&mut self) {
        self.x = 0.0;
        self.y = 0.0;
        self.rotation = 0.0;
        self.message.clear();
        self.message_type = MessageKind::None;
    }

    /// Apply a partial update in place.
    pub fn apply(&mut self, update: &SpriteUpdate) {
        if let Some(x) = update.x {
            self.x = x;
        }
        if let Some(y) = update.y {
            self.y = y;
        }
        if let Some(rotation) = update.rotation {
            self.rotation = rotation;
        }
        if let Some(ref message) = update.message {
            self.message.clone_from(message);
        }
        if let Some(kind) = update.message_type {
            self.message_type = kind;
        }
    }
}

/// The subset of displayed sprite fields changed by one step.
///
/// `None` means "leave as is".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct SpriteUpdate {
    /// New horizontal position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    /// New vertical position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// New heading in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    /// New bubble text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// New bubble style.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_type: Option<MessageKind>,
}

impl SpriteUpdate {
    /// A position change.
    pub const fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            rotation: None,
            message: None,
            message_type: None,
        }
    }

    /// A heading change.
    pub const fn rotation(rotation: f64) -> Self {
        Self {
            x: None,
            y: None,
            rotation: Some(rotation),
            message: None,
            message_type: None,
        }
    }

    /// Show a bubble.
    pub fn message(message: impl Into<String>, kind: MessageKind) -> Self {
        Self {
            message: Some(message.into()),
            message_type: Some(kind),
            ..Self::default()
        }
    }

    /// Hide the bubble.
    pub fn clear_message() -> Self {
        Self::message(String::new(), MessageKind::None)
    }

    /// Full pose reset: origin, heading 0, no bubble.
    pub fn reset_pose() -> Self {
        Self {
            x: Some(0.0),
            y: Some(0.0),
            rotation: Some(0.0),
            message: Some(String::new()),
            message_type: Some(MessageKind::None),
        }
    }

    /// Whether this update changes nothing.
    pub const fn is_empty(&self) -> bool {
        self.x.is_none()
            && self.y.is_none()
            && self.rotation.is_none()
            && self.message.is_none()
            && self.message_type.is_none()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::actions::Action;

    #[test]
    fn message_type_uses_editor_strings() {
        let mut sprite = Sprite::new("Sprite 1");
        sprite.apply(&SpriteUpdate::message("Hello!", MessageKind::Say));
        let json = serde_json::to_value(&sprite).unwrap();
        assert_eq!(json.get("messageType").and_then(|v| v.as_str()), Some("say"));
        assert_eq!(json.get("message").and_then(|v| v.as_str()), Some("Hello!"));

        sprite.apply(&SpriteUpdate::clear_message());
        let json = serde_json::to_value(&sprite).unwrap();
        assert_eq!(json.get("messageType").and_then(|v| v.as_str()), Some(""));
    }

    #[test]
    fn partial_update_leaves_other_fields() {
        let mut sprite = Sprite::new("Sprite 1").at(3.0, 4.0);
        sprite.rotation = 45.0;
        sprite.apply(&SpriteUpdate::rotation(90.0));
        assert!((sprite.x - 3.0).abs() < f64::EPSILON);
        assert!((sprite.y - 4.0).abs() < f64::EPSILON);
        assert!((sprite.rotation - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn reset_pose_keeps_script() {
        let mut sprite = Sprite::new("Sprite 1")
            .at(10.0, -5.0)
            .with_script(vec![ScriptBlock::new(Action::move_steps(10.0))]);
        sprite.rotation = 720.0;
        sprite.apply(&SpriteUpdate::message("hm", MessageKind::Think));

        sprite.reset_pose();

        assert!(sprite.x.abs() < f64::EPSILON);
        assert!(sprite.y.abs() < f64::EPSILON);
        assert!(sprite.rotation.abs() < f64::EPSILON);
        assert!(sprite.message.is_empty());
        assert_eq!(sprite.message_type, MessageKind::None);
        assert_eq!(sprite.actions.len(), 1);
    }

    #[test]
    fn decodes_record_as_the_editor_saves_it() {
        let json = r#"{
            "id": "sprite-1",
            "name": "Sprite 1",
            "x": 0, "y": "", "rotation": null,
            "message": null, "messageType": null,
            "actions": [{"id": 1700000000000, "type": "move", "steps": 10}]
        }"#;
        let sprite: Sprite = serde_json::from_str(json).unwrap();
        let again: Sprite = serde_json::from_str(json).unwrap();

        assert_eq!(sprite.id, again.id);
        assert!(sprite.message.is_empty());
        assert_eq!(sprite.message_type, MessageKind::None);
        assert_eq!(
            sprite.actions.first().map(|b| &b.action),
            Some(&Action::move_steps(10.0))
        );
    }

    #[test]
    fn non_list_script_is_empty() {
        let sprite: Sprite =
            serde_json::from_str(r#"{"id": "sprite-9", "name": "S", "actions": null}"#).unwrap();
        assert!(sprite.actions.is_empty());
    }

    #[test]
    fn update_serializes_only_changed_fields() {
        let json = serde_json::to_value(SpriteUpdate::position(1.0, 2.0)).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert!(SpriteUpdate::default().is_empty());
        assert!(!SpriteUpdate::reset_pose().is_empty());
    }
}
