//! Per-sprite run loops.
//!
//! Every running sprite gets its own tokio task executing
//! [`run_sprite`]. Tasks share one [`SessionHandle`]; each step (the
//! cancellation check, reading the next action, the state transition,
//! publishing the update and the collision check) happens under the
//! session lock, so steps of different sprites never interleave. The lock
//! is released while a sprite pauses, which is where other sprites make
//! progress.
//!
//! Cancellation is cooperative. A task notices that it was deregistered
//! only when it comes back to the top of its loop; a pause that has
//! started is always waited out.

use std::sync::Arc;
use std::time::Duration;

use stage_types::{SessionId, SpriteId, SpriteUpdate};
use tokio::sync::Mutex;
use tracing::{info, trace, warn};

use crate::collision;
use crate::config::PlaybackConfig;
use crate::events::{EventBus, PlaybackEvent};
use crate::runtime::Pause;
use crate::session::{EndReason, PlaybackSession, SpritePair};
use crate::store::SpriteStore;

/// A session together with the collaborators its tasks publish to.
pub struct SessionHandle {
    id: SessionId,
    session: Mutex<PlaybackSession>,
    store: Arc<dyn SpriteStore>,
    config: PlaybackConfig,
    events: EventBus,
}

impl SessionHandle {
    /// Wrap a seeded session.
    pub fn new(
        session: PlaybackSession,
        store: Arc<dyn SpriteStore>,
        config: PlaybackConfig,
        events: EventBus,
    ) -> Self {
        Self {
            id: session.id(),
            session: Mutex::new(session),
            store,
            config,
            events,
        }
    }

    /// Session identifier.
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// The session state, for inspection.
    pub const fn session(&self) -> &Mutex<PlaybackSession> {
        &self.session
    }

    /// Deregister every sprite. Tasks wind down at their next loop check.
    pub async fn cancel(&self, reason: EndReason) -> Vec<SpriteId> {
        let cancelled = self.session.lock().await.cancel(reason);
        info!(
            session = %self.id,
            reason = ?reason,
            cancelled = cancelled.len(),
            "Playback session cancelled"
        );
        cancelled
    }

    /// Hand a change to the store. Empty updates never reach it.
    fn publish(&self, sprite: SpriteId, update: &SpriteUpdate) {
        if update.is_empty() {
            return;
        }
        if let Err(error) = self.store.update_sprite(sprite, update) {
            warn!(session = %self.id, sprite = %sprite, %error, "Failed to publish sprite update");
        }
    }

    fn swapped(&self, pair: SpritePair) {
        info!(
            session = %self.id,
            first = %pair.first,
            second = %pair.second,
            "Sprites collided, swapping remaining actions"
        );
        if self.config.propagate_to_scripts {
            let swapped = self.store.swap_scripts(pair.first, pair.second);
            if let Err(error) = swapped {
                warn!(session = %self.id, %error, "Failed to swap saved scripts");
            }
        }
        self.events.publish(PlaybackEvent::Swapped {
            session_id: self.id,
            pair,
        });
    }

    /// Run one step of `sprite` at `index`; `None` when its run is over.
    async fn step(&self, sprite: SpriteId, index: usize) -> Option<Pause> {
        let mut session = self.session.lock().await;
        if !session.is_running(sprite) {
            return None;
        }
        let action = session.action_at(sprite, index)?;
        let transition = session.state_mut(sprite)?.apply(&action);
        session.record_step();
        trace!(session = %self.id, sprite = %sprite, index, action = action.kind(), "Step");

        if let Some(update) = transition.update.filter(|update| !update.is_empty()) {
            self.publish(sprite, &update);
            self.events.publish(PlaybackEvent::StepApplied {
                session_id: self.id,
                sprite,
                action: action.kind().to_owned(),
                update,
            });
            let threshold = self.config.collision_threshold;
            for pair in collision::check_collisions(&mut session, sprite, threshold) {
                self.swapped(pair);
            }
        }
        Some(transition.pause)
    }

    /// Hide a bubble whose time is up, unless the session moved on.
    async fn clear_message(&self, sprite: SpriteId) {
        let mut session = self.session.lock().await;
        if !session.is_running(sprite) {
            return;
        }
        if let Some(state) = session.state_mut(sprite) {
            let update = state.clear_message();
            self.publish(sprite, &update);
        }
    }

    async fn finish(&self, sprite: SpriteId) {
        self.session.lock().await.finish(sprite);
        self.events.publish(PlaybackEvent::SpriteFinished {
            session_id: self.id,
            sprite,
        });
    }
}

/// Drive one sprite through its run-sequence until it ends or is cancelled.
///
/// The sequence is looked up by sprite id on every iteration, so a swap
/// takes effect at the very next step. The sprite keeps its index across
/// a swap.
pub async fn run_sprite(handle: Arc<SessionHandle>, sprite: SpriteId) {
    let step_delay = Duration::from_millis(handle.config.step_delay_ms);
    let mut index: usize = 0;

    while let Some(pause) = handle.step(sprite, index).await {
        match pause {
            Pause::None => {}
            Pause::StepDelay => tokio::time::sleep(step_delay).await,
            Pause::Message(duration) => {
                tokio::time::sleep(duration).await;
                handle.clear_message(sprite).await;
            }
        }
        index = index.saturating_add(1);
    }

    handle.finish(sprite).await;
    trace!(session = %handle.id, sprite = %sprite, steps = index, "Sprite finished");
}
