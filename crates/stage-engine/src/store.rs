//! The sprite store seam and an in-memory implementation.
//!
//! The engine does not own sprite records. Whoever does (an editor, a
//! renderer's state container, the headless player) implements
//! [`SpriteStore`]; the engine reads sprites from it when a session starts
//! and publishes every change back through it. Calls are synchronous and
//! are made while the session lock is held, so implementations must not
//! block for long.

use std::sync::{PoisonError, RwLock};

use rand::Rng;
use stage_types::{ScriptBlock, Sprite, SpriteId, SpriteUpdate};

/// Errors returned by a [`SpriteStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No sprite with this id exists.
    #[error("sprite not found: {0}")]
    SpriteNotFound(SpriteId),

    /// The stage must always keep at least one sprite.
    #[error("cannot remove the last sprite {0}")]
    LastSprite(SpriteId),
}

/// Authoritative list of sprites, as seen by the engine.
pub trait SpriteStore: Send + Sync {
    /// Current sprite records, in display order.
    fn sprites(&self) -> Vec<Sprite>;

    /// Apply a partial update to one sprite's displayed fields.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SpriteNotFound`] if the sprite does not exist.
    fn update_sprite(&self, id: SpriteId, update: &SpriteUpdate) -> Result<(), StoreError>;

    /// Replace one sprite's authored script.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SpriteNotFound`] if the sprite does not exist.
    fn update_script(&self, id: SpriteId, actions: Vec<ScriptBlock>) -> Result<(), StoreError>;

    /// Look up one sprite.
    fn sprite(&self, id: SpriteId) -> Option<Sprite> {
        self.sprites().into_iter().find(|sprite| sprite.id == id)
    }

    /// Exchange two sprites' authored scripts.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SpriteNotFound`] if either sprite is missing;
    /// in that case neither script is changed.
    fn swap_scripts(&self, a: SpriteId, b: SpriteId) -> Result<(), StoreError> {
        let first = self.sprite(a).ok_or(StoreError::SpriteNotFound(a))?;
        let second = self.sprite(b).ok_or(StoreError::SpriteNotFound(b))?;
        self.update_script(a, second.actions)?;
        self.update_script(b, first.actions)
    }
}

/// A [`SpriteStore`] backed by a vector behind a lock.
#[derive(Debug, Default)]
pub struct InMemoryStage {
    sprites: RwLock<Vec<Sprite>>,
}

impl InMemoryStage {
    /// Create a stage holding the given sprites.
    pub const fn new(sprites: Vec<Sprite>) -> Self {
        Self {
            sprites: RwLock::new(sprites),
        }
    }

    /// A fresh stage with a single `Sprite 1` at the origin.
    pub fn with_default_sprite() -> Self {
        Self::new(vec![Sprite::new("Sprite 1")])
    }

    /// Add a sprite named `Sprite N` at a random spot near the origin.
    pub fn add_sprite(&self) -> SpriteId {
        let mut rng = rand::rng();
        let mut sprites = self.sprites.write().unwrap_or_else(PoisonError::into_inner);
        let name = format!("Sprite {}", sprites.len().saturating_add(1));
        let sprite = Sprite::new(name).at(
            rng.random_range(-100.0..100.0),
            rng.random_range(-100.0..100.0),
        );
        let id = sprite.id;
        sprites.push(sprite);
        id
    }

    /// Remove a sprite. The last remaining sprite cannot be removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::LastSprite`] when only one sprite is left and
    /// [`StoreError::SpriteNotFound`] for an unknown id.
    pub fn remove_sprite(&self, id: SpriteId) -> Result<Sprite, StoreError> {
        let mut sprites = self.sprites.write().unwrap_or_else(PoisonError::into_inner);
        let position = sprites
            .iter()
            .position(|sprite| sprite.id == id)
            .ok_or(StoreError::SpriteNotFound(id))?;
        if sprites.len() <= 1 {
            return Err(StoreError::LastSprite(id));
        }
        Ok(sprites.remove(position))
    }

    fn with_sprite<T>(
        &self,
        id: SpriteId,
        edit: impl FnOnce(&mut Sprite) -> T,
    ) -> Result<T, StoreError> {
        let mut sprites = self.sprites.write().unwrap_or_else(PoisonError::into_inner);
        sprites
            .iter_mut()
            .find(|sprite| sprite.id == id)
            .map(edit)
            .ok_or(StoreError::SpriteNotFound(id))
    }
}

impl SpriteStore for InMemoryStage {
    fn sprites(&self) -> Vec<Sprite> {
        self.sprites
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update_sprite(&self, id: SpriteId, update: &SpriteUpdate) -> Result<(), StoreError> {
        self.with_sprite(id, |sprite| sprite.apply(update))
    }

    fn update_script(&self, id: SpriteId, actions: Vec<ScriptBlock>) -> Result<(), StoreError> {
        self.with_sprite(id, |sprite| sprite.actions = actions)
    }

    fn sprite(&self, id: SpriteId) -> Option<Sprite> {
        self.sprites
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|sprite| sprite.id == id)
            .cloned()
    }

    fn swap_scripts(&self, a: SpriteId, b: SpriteId) -> Result<(), StoreError> {
        let mut sprites = self.sprites.write().unwrap_or_else(PoisonError::into_inner);
        let first = sprites
            .iter()
            .position(|sprite| sprite.id == a)
            .ok_or(StoreError::SpriteNotFound(a))?;
        let second = sprites
            .iter()
            .position(|sprite| sprite.id == b)
            .ok_or(StoreError::SpriteNotFound(b))?;
        if first == second {
            return Ok(());
        }
        let first_script = sprites
            .get_mut(first)
            .map(|sprite| std::mem::take(&mut sprite.actions))
            .unwrap_or_default();
        if let Some(sprite) = sprites.get_mut(second) {
            let second_script = std::mem::replace(&mut sprite.actions, first_script);
            if let Some(sprite) = sprites.get_mut(first) {
                sprite.actions = second_script;
            }
        }
        Ok(())
    }
}
