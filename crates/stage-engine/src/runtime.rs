//! Live per-sprite state during playback.
//!
//! A [`RuntimeState`] is seeded from the sprite's displayed fields when a
//! session starts and is mutated in lock-step with the actions the sprite
//! executes. It, not the stored sprite record, is what collision tests
//! read. Each transition reports the [`SpriteUpdate`] to publish and how
//! long the sprite then pauses.

use std::time::Duration;

use stage_types::{Action, MessageKind, Sprite, SpriteId, SpriteUpdate};

/// How a sprite waits after applying an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    /// Continue immediately.
    None,
    /// The configured short step delay.
    StepDelay,
    /// Keep the bubble visible for this long, then clear it.
    Message(Duration),
}

/// Result of applying one action to a [`RuntimeState`].
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Fields to publish, `None` when the action changed nothing.
    pub update: Option<SpriteUpdate>,
    /// What to wait for afterwards.
    pub pause: Pause,
}

impl Transition {
    const fn noop() -> Self {
        Self {
            update: None,
            pause: Pause::None,
        }
    }

    const fn step(update: SpriteUpdate) -> Self {
        Self {
            update: Some(update),
            pause: Pause::StepDelay,
        }
    }
}

/// The live position, heading and bubble of one running sprite.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeState {
    /// Sprite this state belongs to.
    pub id: SpriteId,
    /// Display name, carried for logs.
    pub name: String,
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
    /// Heading in degrees.
    pub rotation: f64,
    /// Bubble text, empty when none.
    pub message: String,
    /// Bubble style.
    pub message_type: MessageKind,
}

impl RuntimeState {
    /// Seed runtime state from a sprite's displayed fields.
    pub fn from_sprite(sprite: &Sprite) -> Self {
        Self {
            id: sprite.id,
            name: sprite.name.clone(),
            x: sprite.x,
            y: sprite.y,
            rotation: sprite.rotation,
            message: sprite.message.clone(),
            message_type: sprite.message_type,
        }
    }

    /// Euclidean distance between two sprites.
    pub fn distance_to(&self, other: &Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Apply one action's state transition.
    ///
    /// Repeat blocks never reach a run-sequence; one that does, like an
    /// unknown block, is a no-op.
    pub fn apply(&mut self, action: &Action) -> Transition {
        match action {
            Action::Move { steps } => {
                let heading = self.rotation.to_radians();
                self.x += steps * heading.cos();
                self.y += steps * heading.sin();
                Transition::step(SpriteUpdate::position(self.x, self.y))
            }
            Action::TurnClockwise { degrees } => {
                self.rotation += degrees;
                Transition::step(SpriteUpdate::rotation(self.rotation))
            }
            Action::TurnAnticlockwise { degrees } => {
                self.rotation -= degrees;
                Transition::step(SpriteUpdate::rotation(self.rotation))
            }
            Action::GoTo { x, y } => {
                self.x = *x;
                self.y = *y;
                Transition::step(SpriteUpdate::position(self.x, self.y))
            }
            Action::Say { message, duration } => {
                self.show(message, MessageKind::Say, *duration)
            }
            Action::Think { message, duration } => {
                self.show(message, MessageKind::Think, *duration)
            }
            Action::Repeat { .. } | Action::Unknown => Transition::noop(),
        }
    }

    /// Hide the bubble, returning the update to publish.
    pub fn clear_message(&mut self) -> SpriteUpdate {
        self.message.clear();
        self.message_type = MessageKind::None;
        SpriteUpdate::clear_message()
    }

    fn show(&mut self, message: &str, kind: MessageKind, seconds: f64) -> Transition {
        message.clone_into(&mut self.message);
        self.message_type = kind;
        Transition {
            update: Some(SpriteUpdate::message(message, kind)),
            pause: Pause::Message(bubble_duration(seconds)),
        }
    }
}

/// Seconds to a [`Duration`]; negative, NaN and overflowing values are zero.
pub fn bubble_duration(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::ZERO)
}
