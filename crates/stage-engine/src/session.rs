//! The playback session aggregate.
//!
//! One [`PlaybackSession`] exists per `play()`. It owns everything that
//! lives only while sprites are running: which sprites are still running,
//! each sprite's run-sequence, each sprite's live [`RuntimeState`], and the
//! pairs that have already swapped. Sprite tasks address their sequence by
//! sprite id rather than holding a copy, so a swap made by the collision
//! detector is what the task reads on its next step.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use stage_types::{Action, SessionId, Sprite, SpriteId};

use crate::runtime::RuntimeState;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Every sprite ran to the end of its sequence.
    Completed,
    /// `stop()` cancelled the session.
    Stopped,
    /// `reset()` cancelled the session.
    Reset,
}

/// An unordered pair of sprites, stored smallest id first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpritePair {
    /// The smaller id.
    pub first: SpriteId,
    /// The larger id.
    pub second: SpriteId,
}

impl SpritePair {
    /// Build a pair; argument order does not matter.
    pub fn new(a: SpriteId, b: SpriteId) -> Self {
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    /// Whether `sprite` is one of the two.
    pub fn contains(&self, sprite: SpriteId) -> bool {
        self.first == sprite || self.second == sprite
    }
}

/// Session-scoped playback state.
#[derive(Debug)]
pub struct PlaybackSession {
    id: SessionId,
    running: BTreeSet<SpriteId>,
    sequences: BTreeMap<SpriteId, Vec<Action>>,
    states: BTreeMap<SpriteId, RuntimeState>,
    swapped: BTreeSet<SpritePair>,
    swap_log: Vec<SpritePair>,
    steps_executed: u64,
    end_reason: Option<EndReason>,
}

impl PlaybackSession {
    /// Create an empty session.
    pub const fn new(id: SessionId) -> Self {
        Self {
            id,
            running: BTreeSet::new(),
            sequences: BTreeMap::new(),
            states: BTreeMap::new(),
            swapped: BTreeSet::new(),
            swap_log: Vec::new(),
            steps_executed: 0,
            end_reason: None,
        }
    }

    /// Session identifier.
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Register a sprite with its run-sequence.
    ///
    /// Sprites with nothing to run are not registered. Returns whether the
    /// sprite was registered.
    pub fn seed(&mut self, sprite: &Sprite, sequence: Vec<Action>) -> bool {
        if sequence.is_empty() {
            return false;
        }
        self.states.insert(sprite.id, RuntimeState::from_sprite(sprite));
        self.sequences.insert(sprite.id, sequence);
        self.running.insert(sprite.id);
        true
    }

    /// Whether the sprite is still registered as running.
    pub fn is_running(&self, sprite: SpriteId) -> bool {
        self.running.contains(&sprite)
    }

    /// Ids of every running sprite.
    pub fn running(&self) -> impl Iterator<Item = SpriteId> + '_ {
        self.running.iter().copied()
    }

    /// The action at `index` of the sprite's current run-sequence.
    pub fn action_at(&self, sprite: SpriteId, index: usize) -> Option<Action> {
        self.sequences
            .get(&sprite)
            .and_then(|sequence| sequence.get(index))
            .cloned()
    }

    /// The sprite's current run-sequence.
    pub fn sequence(&self, sprite: SpriteId) -> Option<&[Action]> {
        self.sequences.get(&sprite).map(Vec::as_slice)
    }

    /// Live state of a running sprite.
    pub fn state(&self, sprite: SpriteId) -> Option<&RuntimeState> {
        self.states.get(&sprite)
    }

    /// Mutable live state of a running sprite.
    pub fn state_mut(&mut self, sprite: SpriteId) -> Option<&mut RuntimeState> {
        self.states.get_mut(&sprite)
    }

    /// Count one executed action.
    pub const fn record_step(&mut self) {
        self.steps_executed = self.steps_executed.saturating_add(1);
    }

    /// Number of actions executed so far.
    pub const fn steps_executed(&self) -> u64 {
        self.steps_executed
    }

    /// Whether the pair has already swapped this session.
    pub fn has_swapped(&self, pair: SpritePair) -> bool {
        self.swapped.contains(&pair)
    }

    /// Exchange the two sprites' remaining run-sequences, once per pair.
    ///
    /// Returns `false` (and changes nothing) if the pair already swapped or
    /// either sprite has no sequence.
    pub fn swap_sequences(&mut self, pair: SpritePair) -> bool {
        if self.swapped.contains(&pair) {
            return false;
        }
        let Some(first) = self.sequences.remove(&pair.first) else {
            return false;
        };
        let Some(second) = self.sequences.remove(&pair.second) else {
            self.sequences.insert(pair.first, first);
            return false;
        };
        self.sequences.insert(pair.first, second);
        self.sequences.insert(pair.second, first);
        self.swapped.insert(pair);
        self.swap_log.push(pair);
        true
    }

    /// Pairs swapped this session, in the order they swapped.
    pub fn swaps(&self) -> &[SpritePair] {
        &self.swap_log
    }

    /// Unregister a sprite whose run ended and drop its live state.
    pub fn finish(&mut self, sprite: SpriteId) {
        self.running.remove(&sprite);
        self.states.remove(&sprite);
        self.sequences.remove(&sprite);
    }

    /// Deregister every sprite and drop all session maps.
    ///
    /// Returns the sprites that were still running.
    pub fn cancel(&mut self, reason: EndReason) -> Vec<SpriteId> {
        if self.end_reason.is_none() {
            self.end_reason = Some(reason);
        }
        let cancelled = std::mem::take(&mut self.running).into_iter().collect();
        self.clear();
        cancelled
    }

    /// Drop all session maps, keeping the counters for the summary.
    pub fn clear(&mut self) {
        self.running.clear();
        self.sequences.clear();
        self.states.clear();
        self.swapped.clear();
    }

    /// How the session ended; `Completed` unless it was cancelled.
    pub fn end_reason(&self) -> EndReason {
        self.end_reason.unwrap_or(EndReason::Completed)
    }
}
