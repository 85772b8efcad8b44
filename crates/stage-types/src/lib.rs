//! Shared type definitions for the Sprite Stage playback engine.
//!
//! This crate is the single source of truth for the data exchanged between
//! the engine and its collaborators (the script editor and the renderer).
//! Types flow downstream to `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for sprites, script blocks and sessions
//! - [`actions`] -- The action vocabulary and authored script blocks
//! - [`sprite`] -- Sprite records and partial sprite updates
//! - [`lenient`] -- Forgiving deserializers for hand-typed numeric fields

pub mod actions;
pub mod ids;
pub mod lenient;
pub mod sprite;

// Re-export all public types at crate root for convenience.
pub use actions::{Action, ScriptBlock};
pub use ids::{ActionId, SessionId, SpriteId};
pub use sprite::{MessageKind, Sprite, SpriteUpdate};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the renderer.

    #[test]
    fn export_bindings() {
        // The files are written to the `bindings/` directory relative to
        // the crate root.
        use ts_rs::TS;

        let _ = crate::ids::SpriteId::export_all();
        let _ = crate::ids::ActionId::export_all();
        let _ = crate::ids::SessionId::export_all();

        let _ = crate::actions::Action::export_all();
        let _ = crate::actions::ScriptBlock::export_all();

        let _ = crate::sprite::MessageKind::export_all();
        let _ = crate::sprite::Sprite::export_all();
        let _ = crate::sprite::SpriteUpdate::export_all();
    }
}
