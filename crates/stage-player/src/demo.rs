//! The scene played when no scene file is given.
//!
//! Two sprites face each other and walk forward, so they meet, swap their
//! remaining scripts and walk back where they came from.

use stage_engine::Scene;
use stage_types::{Action, ScriptBlock, Sprite};

/// Build the demo scene.
pub fn scene() -> Scene {
    let left = Sprite::new("Sprite 1").at(-150.0, 0.0).with_script(blocks([
        Action::say("Hello!", 1.0),
        Action::repeat(10, [Action::move_steps(10.0)]),
        Action::think("Hmm...", 1.0),
    ]));
    let right = Sprite::new("Sprite 2").at(150.0, 0.0).with_script(blocks([
        Action::TurnClockwise { degrees: 180.0 },
        Action::repeat(10, [Action::move_steps(10.0)]),
        Action::GoTo { x: 0.0, y: 100.0 },
    ]));
    Scene {
        sprites: vec![left, right],
    }
}

fn blocks<const N: usize>(actions: [Action; N]) -> Vec<ScriptBlock> {
    actions.into_iter().map(ScriptBlock::new).collect()
}
