//! Scene files: a saved list of sprites with their scripts.
//!
//! A scene is stored as JSON, `{"sprites": [...]}`, using the same record
//! shapes the editor produces. Editor keys that are not UUIDs load as
//! stable ids derived from the key and are written back as UUIDs. Scripts
//! are stored nested exactly as authored; expansion only happens when a
//! session starts.

use std::path::Path;

use serde::{Deserialize, Serialize};
use stage_types::Sprite;

use crate::store::{InMemoryStage, SpriteStore};

/// Errors that can occur when reading or writing a scene.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// Failed to read or write the scene file.
    #[error("scene file I/O failed: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The scene is not valid JSON or does not match the sprite schema.
    #[error("failed to parse scene JSON: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}

/// A saved stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Sprites in display order.
    #[serde(default)]
    pub sprites: Vec<Sprite>,
}

impl Scene {
    /// Load a scene from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Io`] if the file cannot be read, or
    /// [`SceneError::Json`] if it is not a valid scene.
    pub fn from_file(path: &Path) -> Result<Self, SceneError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse a scene from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Json`] if the string is not a valid scene.
    pub fn parse(json: &str) -> Result<Self, SceneError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Render the scene as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, SceneError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the scene to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Io`] or [`SceneError::Json`] on failure.
    pub fn save(&self, path: &Path) -> Result<(), SceneError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Capture the current contents of a store.
    pub fn snapshot(store: &dyn SpriteStore) -> Self {
        Self {
            sprites: store.sprites(),
        }
    }
}

impl From<Scene> for InMemoryStage {
    fn from(scene: Scene) -> Self {
        Self::new(scene.sprites)
    }
}
