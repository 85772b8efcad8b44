//! Error types for the stage player binary.
//!
//! [`PlayerError`] wraps every failure mode between startup and the final
//! scene dump so `main` can propagate with `?`.

/// Top-level error for the stage player.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: stage_engine::config::ConfigError,
    },

    /// Reading or writing a scene failed.
    #[error("scene error: {source}")]
    Scene {
        /// The underlying scene error.
        #[from]
        source: stage_engine::SceneError,
    },

    /// The playback session failed.
    #[error("playback error: {source}")]
    Playback {
        /// The underlying playback error.
        #[from]
        source: stage_engine::PlaybackError,
    },

    /// The controller refused to start a session.
    #[error("playback did not start: {message}")]
    NotStarted {
        /// Why it did not start.
        message: String,
    },
}
