//! Script expansion, concurrent playback and collision swapping for the
//! Sprite Stage.
//!
//! A stage holds sprites, each with an authored script of blocks. Playing
//! the stage expands every script into a flat run-sequence and runs all
//! sprites at once, one tokio task each. When two running sprites come
//! within the collision threshold of each other for the first time, their
//! remaining run-sequences are exchanged.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `stage-config.yaml`.
//! - [`expand`] -- Nested script blocks to a flat run-sequence.
//! - [`runtime`] -- Live per-sprite state and action transitions.
//! - [`session`] -- The per-play session aggregate.
//! - [`collision`] -- Proximity checks and the once-per-pair swap.
//! - [`scheduler`] -- One run loop per sprite.
//! - [`controller`] -- [`PlaybackController`] with play, stop and reset.
//! - [`events`] -- Broadcast [`PlaybackEvent`]s.
//! - [`store`] -- The [`SpriteStore`] seam and [`InMemoryStage`].
//! - [`scene`] -- Scene file load and save.
//!
//! [`PlaybackController`]: controller::PlaybackController
//! [`PlaybackEvent`]: events::PlaybackEvent
//! [`SpriteStore`]: store::SpriteStore
//! [`InMemoryStage`]: store::InMemoryStage

pub mod collision;
pub mod config;
pub mod controller;
pub mod events;
pub mod expand;
pub mod runtime;
pub mod scene;
pub mod scheduler;
pub mod session;
pub mod store;

pub use config::{PlaybackConfig, RepeatMode, StageConfig};
pub use controller::{PlaybackController, PlaybackError, PlaybackHandle, PlaybackSummary};
pub use events::{EventBus, PlaybackEvent};
pub use scene::{Scene, SceneError};
pub use session::EndReason;
pub use store::{InMemoryStage, SpriteStore, StoreError};
