//! Play, stop and reset for a whole stage.
//!
//! The [`PlaybackController`] is the entry point the stage controls call.
//! It is idle or running. `play()` expands every sprite's script, seeds a
//! fresh [`PlaybackSession`], spawns one task per sprite and returns a
//! [`PlaybackHandle`]; a driver task waits for the sprite tasks and puts the
//! controller back to idle. `stop()` and `reset()` cancel the session
//! cooperatively and return immediately without waiting for tasks.
//!
//! # Architecture
//!
//! The controller's control state is shared with the driver task through an
//! [`Arc`]. The playing flag is an atomic so [`PlaybackController::is_playing`]
//! never waits; the current session sits behind a tokio mutex that is only
//! touched on state changes. A driver only clears the slot if it still holds
//! its own session, so a stale driver never puts a newer session to idle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use futures::StreamExt as _;
use futures::stream::FuturesUnordered;
use serde::Serialize;
use stage_types::{SessionId, SpriteId, SpriteUpdate};
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::PlaybackConfig;
use crate::events::{EventBus, PlaybackEvent};
use crate::expand::expand_with;
use crate::scheduler::{SessionHandle, run_sprite};
use crate::session::{EndReason, PlaybackSession, SpritePair};
use crate::store::SpriteStore;

/// Errors surfaced while waiting for a session.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    /// The session's driver task panicked or was aborted.
    #[error("playback driver task failed: {source}")]
    Join {
        /// The underlying join error.
        #[from]
        source: tokio::task::JoinError,
    },
}

/// What happened during one session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackSummary {
    /// The session.
    pub session_id: SessionId,
    /// When `play()` started the session.
    pub started_at: DateTime<Utc>,
    /// When the last sprite task ended.
    pub ended_at: DateTime<Utc>,
    /// Why the session ended.
    pub end_reason: EndReason,
    /// Sprites that had a non-empty run-sequence.
    pub sprites_started: usize,
    /// Actions executed across all sprites.
    pub steps_executed: u64,
    /// Pairs that swapped, in order.
    pub swaps: Vec<SpritePair>,
}

/// Handle to a running session returned by [`PlaybackController::play`].
#[derive(Debug)]
pub struct PlaybackHandle {
    session_id: SessionId,
    join: JoinHandle<PlaybackSummary>,
}

impl PlaybackHandle {
    /// The session this handle belongs to.
    pub const fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Wait until every sprite task of the session has ended.
    ///
    /// Dropping the handle instead does not cancel anything.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::Join`] if the driver task panicked.
    pub async fn wait(self) -> Result<PlaybackSummary, PlaybackError> {
        Ok(self.join.await?)
    }
}

/// State shared between the controller and session drivers.
#[derive(Default)]
struct ControlState {
    playing: AtomicBool,
    current: Mutex<Option<Arc<SessionHandle>>>,
}

impl ControlState {
    /// Take the current session, if any, and flip to idle.
    async fn take(&self) -> Option<Arc<SessionHandle>> {
        let mut current = self.current.lock().await;
        self.playing.store(false, Ordering::Release);
        current.take()
    }

    /// Flip to idle if `handle` is still the current session.
    async fn release(&self, handle: &Arc<SessionHandle>) -> bool {
        let mut current = self.current.lock().await;
        if current.as_ref().is_some_and(|c| Arc::ptr_eq(c, handle)) {
            *current = None;
            self.playing.store(false, Ordering::Release);
            return true;
        }
        false
    }
}

/// Drives playback sessions against a [`SpriteStore`].
pub struct PlaybackController {
    store: Arc<dyn SpriteStore>,
    config: PlaybackConfig,
    events: EventBus,
    control: Arc<ControlState>,
}

impl PlaybackController {
    /// Create an idle controller.
    pub fn new(store: Arc<dyn SpriteStore>, config: PlaybackConfig) -> Self {
        let events = EventBus::new(config.event_capacity);
        Self {
            store,
            config,
            events,
            control: Arc::new(ControlState::default()),
        }
    }

    /// The store this controller plays.
    pub fn store(&self) -> &Arc<dyn SpriteStore> {
        &self.store
    }

    /// Whether a session is running.
    pub fn is_playing(&self) -> bool {
        self.control.playing.load(Ordering::Acquire)
    }

    /// Subscribe to playback events.
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    // -----------------------------------------------------------------------
    // Play
    // -----------------------------------------------------------------------

    /// Start a session with every sprite that has something to run.
    ///
    /// Returns `None` without doing anything while a session is running.
    pub async fn play(&self) -> Option<PlaybackHandle> {
        let mut current = self.control.current.lock().await;
        if current.is_some() {
            debug!("Play requested while a session is running, ignoring");
            return None;
        }

        let session_id = SessionId::new();
        let mut session = PlaybackSession::new(session_id);
        let mut started: Vec<SpriteId> = Vec::new();
        for sprite in self.store.sprites() {
            let sequence = expand_with(&sprite.actions, self.config.repeat_mode);
            if session.seed(&sprite, sequence) {
                started.push(sprite.id);
            }
        }

        let handle = Arc::new(SessionHandle::new(
            session,
            Arc::clone(&self.store),
            self.config.clone(),
            self.events.clone(),
        ));
        *current = Some(Arc::clone(&handle));
        self.control.playing.store(true, Ordering::Release);
        drop(current);

        let started_at = Utc::now();
        info!(session = %session_id, sprites = started.len(), "Playback session started");
        self.events.publish(PlaybackEvent::SessionStarted {
            session_id,
            sprites: started.clone(),
        });

        let tasks: FuturesUnordered<JoinHandle<()>> = started
            .iter()
            .map(|&sprite| tokio::spawn(run_sprite(Arc::clone(&handle), sprite)))
            .collect();

        let join = tokio::spawn(drive(
            handle,
            tasks,
            Arc::clone(&self.control),
            self.events.clone(),
            started_at,
            started.len(),
        ));
        Some(PlaybackHandle { session_id, join })
    }

    // -----------------------------------------------------------------------
    // Stop / Reset
    // -----------------------------------------------------------------------

    /// Cancel the running session and hide every speech bubble.
    ///
    /// Returns immediately; sprite tasks wind down on their own. Returns
    /// `false` if nothing was playing.
    pub async fn stop(&self) -> bool {
        let Some(handle) = self.control.take().await else {
            return false;
        };
        handle.cancel(EndReason::Stopped).await;
        self.update_all(&SpriteUpdate::clear_message());
        true
    }

    /// Put every sprite back at the origin, facing right, with no message.
    ///
    /// Cancels a running session first. Scripts are not touched.
    pub async fn reset(&self) {
        if let Some(handle) = self.control.take().await {
            handle.cancel(EndReason::Reset).await;
        }
        self.update_all(&SpriteUpdate::reset_pose());
        debug!("Stage reset");
    }

    fn update_all(&self, update: &SpriteUpdate) {
        for sprite in self.store.sprites() {
            if let Err(error) = self.store.update_sprite(sprite.id, update) {
                warn!(sprite = %sprite.id, %error, "Failed to update sprite");
            }
        }
    }
}

/// Wait for every sprite task, then close the session.
async fn drive(
    handle: Arc<SessionHandle>,
    mut tasks: FuturesUnordered<JoinHandle<()>>,
    control: Arc<ControlState>,
    events: EventBus,
    started_at: DateTime<Utc>,
    sprites_started: usize,
) -> PlaybackSummary {
    let session_id = handle.id();
    while let Some(result) = tasks.next().await {
        if let Err(error) = result {
            warn!(session = %session_id, %error, "Sprite task failed");
        }
    }

    control.release(&handle).await;
    let (end_reason, steps_executed, swaps) = {
        let mut session = handle.session().lock().await;
        session.clear();
        (
            session.end_reason(),
            session.steps_executed(),
            session.swaps().to_vec(),
        )
    };

    info!(
        session = %session_id,
        reason = ?end_reason,
        steps = steps_executed,
        swaps = swaps.len(),
        "Playback session ended"
    );
    events.publish(PlaybackEvent::SessionEnded {
        session_id,
        reason: end_reason,
    });

    PlaybackSummary {
        session_id,
        started_at,
        ended_at: Utc::now(),
        end_reason,
        sprites_started,
        steps_executed,
        swaps,
    }
}
