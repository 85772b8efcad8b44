//! The action vocabulary sprites are scripted with.
//!
//! An authored script is a list of [`ScriptBlock`]s: an [`Action`] plus the
//! identity token the editor uses to reorder and delete blocks. Only
//! [`Action::Repeat`] nests; its children are blocks too, so a stored
//! script keeps its exact shape when it is saved and loaded again.
//!
//! On the wire actions are internally tagged by `type`, e.g.
//! `{"type": "move", "steps": 10}`. Numeric fields are decoded leniently
//! (see [`crate::lenient`]). A block with an unrecognised, missing or
//! malformed tag decodes to [`Action::Unknown`] instead of rejecting the
//! whole script.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::ids::ActionId;
use crate::lenient;

/// One scripted step, or a repeat block wrapping several steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Action {
    /// Walk `steps` units along the current heading.
    Move {
        /// Distance to travel; negative walks backwards.
        #[serde(default, deserialize_with = "lenient::number")]
        steps: f64,
    },
    /// Rotate clockwise by `degrees`.
    TurnClockwise {
        /// Angle to add to the rotation.
        #[serde(default, deserialize_with = "lenient::number")]
        degrees: f64,
    },
    /// Rotate anticlockwise by `degrees`.
    TurnAnticlockwise {
        /// Angle to subtract from the rotation.
        #[serde(default, deserialize_with = "lenient::number")]
        degrees: f64,
    },
    /// Teleport to an absolute position.
    #[serde(rename = "goto")]
    GoTo {
        /// Target x coordinate.
        #[serde(default, deserialize_with = "lenient::number")]
        x: f64,
        /// Target y coordinate.
        #[serde(default, deserialize_with = "lenient::number")]
        y: f64,
    },
    /// Show a speech bubble for `duration` seconds.
    Say {
        /// Bubble text.
        #[serde(default, deserialize_with = "lenient::text")]
        message: String,
        /// Seconds the bubble stays visible.
        #[serde(default, deserialize_with = "lenient::number")]
        duration: f64,
    },
    /// Show a thought bubble for `duration` seconds.
    Think {
        /// Bubble text.
        #[serde(default, deserialize_with = "lenient::text")]
        message: String,
        /// Seconds the bubble stays visible.
        #[serde(default, deserialize_with = "lenient::number")]
        duration: f64,
    },
    /// Run `children` in order, `times` times over.
    ///
    /// A repeat inside `children` is not allowed and is dropped when the
    /// script is expanded.
    Repeat {
        /// Number of repetitions.
        #[serde(default, deserialize_with = "lenient::count")]
        times: u32,
        /// Blocks repeated on every pass.
        #[serde(default, deserialize_with = "lenient::blocks")]
        children: Vec<ScriptBlock>,
    },
    /// A block whose `type` this engine does not know. Executes as a no-op.
    #[serde(other)]
    Unknown,
}

impl Action {
    /// Build a [`Action::Move`].
    pub const fn move_steps(steps: f64) -> Self {
        Self::Move { steps }
    }

    /// Build an [`Action::Say`].
    pub fn say(message: impl Into<String>, duration: f64) -> Self {
        Self::Say {
            message: message.into(),
            duration,
        }
    }

    /// Build an [`Action::Think`].
    pub fn think(message: impl Into<String>, duration: f64) -> Self {
        Self::Think {
            message: message.into(),
            duration,
        }
    }

    /// Build an [`Action::Repeat`] over the given child actions.
    pub fn repeat(times: u32, children: impl IntoIterator<Item = Self>) -> Self {
        Self::Repeat {
            times,
            children: children.into_iter().map(ScriptBlock::new).collect(),
        }
    }

    /// Whether this action can appear in a run-sequence (everything but repeat).
    pub const fn is_primitive(&self) -> bool {
        !matches!(self, Self::Repeat { .. })
    }

    /// The wire tag of this action, for logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Move { .. } => "move",
            Self::TurnClockwise { .. } => "turn_clockwise",
            Self::TurnAnticlockwise { .. } => "turn_anticlockwise",
            Self::GoTo { .. } => "goto",
            Self::Say { .. } => "say",
            Self::Think { .. } => "think",
            Self::Repeat { .. } => "repeat",
            Self::Unknown => "unknown",
        }
    }
}

/// An authored action together with its editor identity.
///
/// Decoding never fails; see [`ScriptBlock::from_value`].
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ScriptBlock {
    /// Identity token assigned when the block was created. Opaque: the
    /// engine never looks at it.
    pub id: ActionId,
    /// The action itself, flattened next to `id` on the wire.
    #[serde(flatten)]
    pub action: Action,
}

impl ScriptBlock {
    /// Wrap an action in a block with a fresh identity.
    pub fn new(action: Action) -> Self {
        Self {
            id: ActionId::new(),
            action,
        }
    }

    /// Decode a block from loosely-typed JSON.
    ///
    /// Editor ids of any shape are accepted (see [`lenient::id`]); a missing
    /// id gets a fresh one. Anything that does not decode as an action,
    /// including a value that is not an object at all, becomes
    /// [`Action::Unknown`].
    pub fn from_value(value: &Value) -> Self {
        let id = value
            .get("id")
            .and_then(|raw| lenient::id::<_, ActionId>(raw).ok())
            .unwrap_or_default();
        Self {
            id,
            action: lenient::action(value),
        }
    }
}

impl<'de> Deserialize<'de> for ScriptBlock {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

impl From<Action> for ScriptBlock {
    fn from(action: Action) -> Self {
        Self::new(action)
    }
}
