//! Playback events for renderers and observers.
//!
//! The controller publishes a [`PlaybackEvent`] for every step, swap and
//! lifecycle change on a broadcast channel. Nobody has to listen; the
//! store already receives every sprite update. Events are for consumers
//! that want to follow a session as it happens (a renderer animating
//! swaps, a test waiting for a collision).

use serde::{Deserialize, Serialize};
use stage_types::{SessionId, SpriteId, SpriteUpdate};
use tokio::sync::broadcast;

use crate::session::{EndReason, SpritePair};

/// Something that happened during a playback session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlaybackEvent {
    /// A session started with these sprites running.
    SessionStarted {
        /// The new session.
        session_id: SessionId,
        /// Sprites that had something to run.
        sprites: Vec<SpriteId>,
    },
    /// A sprite applied an action and published an update.
    StepApplied {
        /// The session.
        session_id: SessionId,
        /// The sprite that moved, turned or spoke.
        sprite: SpriteId,
        /// Wire tag of the action.
        action: String,
        /// Fields the step changed.
        update: SpriteUpdate,
    },
    /// Two sprites collided and exchanged their remaining sequences.
    Swapped {
        /// The session.
        session_id: SessionId,
        /// The two sprites.
        pair: SpritePair,
    },
    /// A sprite's run ended, naturally or by cancellation.
    SpriteFinished {
        /// The session.
        session_id: SessionId,
        /// The sprite.
        sprite: SpriteId,
    },
    /// Every sprite task of the session has ended.
    SessionEnded {
        /// The session.
        session_id: SessionId,
        /// Why it ended.
        reason: EndReason,
    },
}

/// Broadcast channel carrying [`PlaybackEvent`]s.
///
/// If a subscriber falls behind by more than the capacity it receives
/// [`broadcast::error::RecvError::Lagged`] and skips to the newest event.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PlaybackEvent>,
}

impl EventBus {
    /// Create a bus holding up to `capacity` undelivered events.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to all subscribers.
    ///
    /// Returns the number of receivers that got it; 0 when nobody is
    /// subscribed, which is not an error.
    pub fn publish(&self, event: PlaybackEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn publish_without_subscribers_is_fine() {
        let bus = EventBus::new(4);
        let sent = bus.publish(PlaybackEvent::SessionEnded {
            session_id: SessionId::new(),
            reason: EndReason::Completed,
        });
        assert_eq!(sent, 0);
    }

    #[tokio::test]
    async fn subscribers_receive_events() {
        let bus = EventBus::new(0);
        let mut rx = bus.subscribe();
        let session_id = SessionId::new();
        bus.publish(PlaybackEvent::SessionStarted {
            session_id,
            sprites: Vec::new(),
        });
        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            PlaybackEvent::SessionStarted {
                session_id,
                sprites: Vec::new()
            }
        );
    }

    #[test]
    fn events_serialize_with_tag() {
        let json = serde_json::to_value(PlaybackEvent::SessionEnded {
            session_id: SessionId::new(),
            reason: EndReason::Stopped,
        })
        .unwrap();
        assert_eq!(json.get("event").and_then(|v| v.as_str()), Some("session_ended"));
        assert_eq!(json.get("reason").and_then(|v| v.as_str()), Some("stopped"));
    }
}
