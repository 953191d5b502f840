//! Game simulation modules

pub mod actor;
pub mod bot;
pub mod combat;
pub mod geometry;
pub mod input;
pub mod r#match;
pub mod objective;
pub mod projectile;
pub mod skills;
pub mod snapshot;
pub mod targeting;

pub use actor::{Action, Actor};
pub use bot::Difficulty;
pub use input::{InputSnapshot, Intent, KeyMap};
pub use r#match::{
    GameMatch, GameMode, Match, MatchCommand, MatchConfig, MatchHandle, MatchOutcome, MatchRegistry,
    TickReport, Tuning,
};
pub use skills::SkillKind;

use serde::{Deserialize, Serialize};

/// Duration positional constants are expressed against, in milliseconds
pub const REFERENCE_FRAME_MS: f32 = 16.0;

/// Linear scale applied to per-frame velocities for a tick of `dt_ms`
pub fn frame_scale(dt_ms: f32) -> f32 {
    dt_ms / REFERENCE_FRAME_MS
}

/// Index of an actor within its match; stable for the match's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub usize);

/// Stage dimensions; the floor is a horizontal line, y grows downward
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub width: f32,
    pub height: f32,
    pub floor: f32,
}

impl Stage {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            floor: height - 50.0,
        }
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::new(800.0, 400.0)
    }
}

/// Things that happened during a tick, in the order they happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum GameEvent {
    SkillUsed {
        actor: ActorId,
        skill: SkillKind,
    },
    Hit {
        attacker: ActorId,
        target: ActorId,
        skill: SkillKind,
        damage: f32,
    },
    ProjectileSpawned {
        owner: ActorId,
        x: f32,
        y: f32,
        direction: f32,
    },
    ProjectileHit {
        owner: ActorId,
        target: ActorId,
        damage: f32,
    },
    ObjectivePickedUp {
        actor: ActorId,
    },
    ObjectiveDropped {
        actor: ActorId,
    },
    Eliminated {
        actor: ActorId,
    },
    MatchOver {
        winner: Option<ActorId>,
    },
}
