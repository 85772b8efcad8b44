//! Script expansion: authored blocks to a flat run-sequence.
//!
//! Playback never interprets repeat blocks. Before a session starts every
//! sprite's script is unrolled into the list of primitive actions it will
//! actually execute, in order. Expansion is pure and never fails: blocks
//! that make no sense (a repeat with nothing in it, a repeat nested inside
//! a repeat) contribute nothing, because half-built blocks are a normal
//! state for a script that is still being edited.
//!
//! A run-sequence holds at most [`MAX_RUN_SEQUENCE`] actions. A count typed
//! halfway (`99999999999`) would otherwise expand into billions of steps;
//! whatever lies past the cap is dropped with a debug log.

use stage_types::{Action, ScriptBlock};
use tracing::debug;

use crate::config::RepeatMode;

/// Longest run-sequence one sprite can get.
pub const MAX_RUN_SEQUENCE: usize = 100_000;

/// Preallocation cap; huge repeat counts grow the sequence as they go.
const MAX_PREALLOCATED: usize = 4096;

/// Expand a script with the default [`RepeatMode::Nested`] semantics.
pub fn expand(blocks: &[ScriptBlock]) -> Vec<Action> {
    expand_with(blocks, RepeatMode::Nested)
}

/// Expand a script, choosing how childless repeat blocks behave.
pub fn expand_with(blocks: &[ScriptBlock], mode: RepeatMode) -> Vec<Action> {
    let mut sequence = Vec::with_capacity(expanded_len(blocks).min(MAX_PREALLOCATED));
    let mut preceding: Option<&Action> = None;
    let mut truncated = false;

    for block in blocks {
        if sequence.len() >= MAX_RUN_SEQUENCE {
            truncated = true;
            break;
        }
        let room = MAX_RUN_SEQUENCE.saturating_sub(sequence.len());

        match &block.action {
            Action::Repeat { times, children } if children.is_empty() => {
                match (mode, preceding) {
                    (RepeatMode::RepeatPreceding, Some(previous)) => {
                        let count = to_usize(*times);
                        truncated |= count > room;
                        sequence.extend(std::iter::repeat_n(previous.clone(), count.min(room)));
                    }
                    _ => debug!(times, "dropping repeat block with no children"),
                }
                preceding = None;
            }
            Action::Repeat { times, children } => {
                let pass: Vec<&Action> = primitive_children(children).collect();
                if !pass.is_empty() {
                    truncated |= unroll(&mut sequence, &pass, *times);
                }
                preceding = None;
            }
            action => {
                sequence.push(action.clone());
                preceding = Some(action);
            }
        }
    }

    if truncated {
        debug!(
            limit = MAX_RUN_SEQUENCE,
            "run-sequence limit reached, dropping the rest of the script"
        );
    }
    sequence
}

/// Append `times` passes over `pass`, stopping at the length cap.
///
/// Returns whether the cap cut the repeat short.
fn unroll(sequence: &mut Vec<Action>, pass: &[&Action], times: u32) -> bool {
    for _ in 0..times {
        let room = MAX_RUN_SEQUENCE.saturating_sub(sequence.len());
        if room < pass.len() {
            sequence.extend(pass.iter().take(room).map(|&action| action.clone()));
            return true;
        }
        sequence.extend(pass.iter().map(|&action| action.clone()));
    }
    false
}

/// Upper bound on the expanded length, used to size the output.
fn expanded_len(blocks: &[ScriptBlock]) -> usize {
    blocks.iter().fold(0_usize, |total, block| {
        let len = match &block.action {
            Action::Repeat { times, children } => {
                to_usize(*times).saturating_mul(children.len().max(1))
            }
            _ => 1,
        };
        total.saturating_add(len)
    })
}

fn primitive_children(children: &[ScriptBlock]) -> impl Iterator<Item = &Action> {
    children.iter().filter_map(|child| {
        if child.action.is_primitive() {
            Some(&child.action)
        } else {
            debug!("dropping repeat nested inside a repeat");
            None
        }
    })
}

fn to_usize(times: u32) -> usize {
    usize::try_from(times).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use stage_types::Action;

    use super::*;

    fn blocks(actions: impl IntoIterator<Item = Action>) -> Vec<ScriptBlock> {
        actions.into_iter().map(ScriptBlock::new).collect()
    }

    fn turn(degrees: f64) -> Action {
        Action::TurnClockwise { degrees }
    }

    #[test]
    fn primitives_pass_through_in_order() {
        let script = blocks([Action::move_steps(10.0), turn(15.0), Action::say("hi", 1.0)]);
        assert_eq!(
            expand(&script),
            vec![Action::move_steps(10.0), turn(15.0), Action::say("hi", 1.0)]
        );
    }

    #[test]
    fn repeat_unrolls_children_in_order() {
        let script = blocks([Action::repeat(3, [Action::move_steps(1.0), turn(10.0)])]);
        let expanded = expand(&script);
        assert_eq!(expanded.len(), 6);
        assert_eq!(
            expanded,
            vec![
                Action::move_steps(1.0),
                turn(10.0),
                Action::move_steps(1.0),
                turn(10.0),
                Action::move_steps(1.0),
                turn(10.0),
            ]
        );
    }

    #[test]
    fn zero_times_expands_to_nothing() {
        let script = blocks([Action::repeat(0, [Action::move_steps(1.0), turn(10.0)])]);
        assert!(expand(&script).is_empty());
    }

    #[test]
    fn empty_repeat_is_dropped_by_default() {
        let script = blocks([Action::move_steps(5.0), Action::repeat(4, [])]);
        assert_eq!(expand(&script), vec![Action::move_steps(5.0)]);
    }

    #[test]
    fn nested_repeat_is_dropped() {
        let inner = Action::repeat(5, [Action::move_steps(100.0)]);
        let script = blocks([Action::repeat(2, [turn(1.0), inner])]);
        assert_eq!(expand(&script), vec![turn(1.0), turn(1.0)]);
    }

    #[test]
    fn unknown_blocks_pass_through() {
        let script = blocks([Action::Unknown, Action::move_steps(1.0)]);
        assert_eq!(expand(&script), vec![Action::Unknown, Action::move_steps(1.0)]);
    }

    #[test]
    fn repeat_preceding_mode_repeats_previous_block() {
        let script = blocks([turn(90.0), Action::move_steps(5.0), Action::repeat(2, [])]);
        assert_eq!(
            expand_with(&script, RepeatMode::RepeatPreceding),
            vec![
                turn(90.0),
                Action::move_steps(5.0),
                Action::move_steps(5.0),
                Action::move_steps(5.0),
            ]
        );
    }

    #[test]
    fn repeat_preceding_mode_needs_a_primitive_before_it() {
        let script = blocks([Action::repeat(3, []), Action::move_steps(1.0)]);
        assert_eq!(
            expand_with(&script, RepeatMode::RepeatPreceding),
            vec![Action::move_steps(1.0)]
        );

        let script = blocks([Action::repeat(1, [turn(1.0)]), Action::repeat(3, [])]);
        assert_eq!(expand_with(&script, RepeatMode::RepeatPreceding), vec![turn(1.0)]);
    }

    #[test]
    fn huge_counts_stop_at_the_length_cap() {
        let script = blocks([
            Action::repeat(u32::MAX, [Action::move_steps(1.0), turn(1.0), turn(2.0)]),
            Action::say("never reached", 1.0),
        ]);
        let expanded = expand(&script);
        assert_eq!(expanded.len(), MAX_RUN_SEQUENCE);
        assert_eq!(expanded.last(), Some(&Action::move_steps(1.0)));
    }

    #[test]
    fn huge_legacy_repeat_stops_at_the_length_cap() {
        let script = blocks([Action::move_steps(1.0), Action::repeat(u32::MAX, [])]);
        let expanded = expand_with(&script, RepeatMode::RepeatPreceding);
        assert_eq!(expanded.len(), MAX_RUN_SEQUENCE);
    }

    #[test]
    fn repeat_of_only_nested_repeats_is_cheap() {
        let inner = Action::repeat(2, [Action::move_steps(1.0)]);
        let script = blocks([Action::repeat(u32::MAX, [inner]), turn(5.0)]);
        assert_eq!(expand(&script), vec![turn(5.0)]);
    }

    #[test]
    fn expansion_is_deterministic() {
        let script = blocks([
            Action::GoTo { x: 1.0, y: 2.0 },
            Action::repeat(2, [Action::think("hmm", 0.5)]),
        ]);
        assert_eq!(expand(&script), expand(&script));
    }
}
