//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Sprites, authored script blocks and playback sessions each get their own
//! identifier type so they cannot be mixed up at compile time. All IDs use
//! UUID v7, which is time-ordered: a block created later sorts after one
//! created earlier, which is all the authoring surface needs from them.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a sprite (actor) on the stage.
    SpriteId
}

define_id! {
    /// Identity token of one authored script block.
    ///
    /// Only the authoring surface uses it (reordering, removal); the engine
    /// treats blocks as values and relies on list position alone.
    ActionId
}

define_id! {
    /// Unique identifier for one playback session (`play` to completion or stop).
    SessionId
}
