//! Proximity detection and the once-per-pair sequence swap.
//!
//! After every state-changing step of a sprite, its live position is
//! compared against every other running sprite. The first time a pair
//! comes closer than the threshold their remaining run-sequences are
//! exchanged. Each task keeps its own index, so a sprite that had already
//! run three actions continues at index three of what used to be the other
//! sprite's sequence.

use stage_types::SpriteId;

use crate::session::{PlaybackSession, SpritePair};

/// Swap `sprite` with every running sprite it now collides with.
///
/// Returns the pairs swapped by this call. Pairs that swapped earlier in
/// the session are skipped even if they still overlap.
pub fn check_collisions(
    session: &mut PlaybackSession,
    sprite: SpriteId,
    threshold: f64,
) -> Vec<SpritePair> {
    let Some(current) = session.state(sprite) else {
        return Vec::new();
    };

    let colliding: Vec<SpritePair> = session
        .running()
        .filter(|&other| other != sprite)
        .filter_map(|other| {
            let state = session.state(other)?;
            let pair = SpritePair::new(sprite, other);
            (current.distance_to(state) < threshold && !session.has_swapped(pair)).then_some(pair)
        })
        .collect();

    colliding
        .into_iter()
        .filter(|&pair| session.swap_sequences(pair))
        .collect()
}
