//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::geometry::Rect;
use crate::game::{Action, ActorId, Difficulty, GameEvent, GameMode, SkillKind};

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Start (or replace) this session's match; omitted fields use server defaults
    StartMatch {
        #[serde(default)]
        mode: Option<GameMode>,
        #[serde(default)]
        difficulty: Option<Difficulty>,
    },

    /// Key pressed
    KeyDown { key: String },

    /// Key released
    KeyUp { key: String },

    /// Recreate the current match with the same settings
    Restart,

    /// Ping for latency measurement
    Ping {
        /// Client timestamp
        t: u64,
    },
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Welcome message after connection
    Welcome { session_id: Uuid, server_time: u64 },

    /// A match began (also sent after a restart)
    MatchStarted {
        match_id: Uuid,
        mode: GameMode,
        difficulty: Difficulty,
        actors: Vec<ActorInfo>,
    },

    /// Game state snapshot (sent at regular intervals)
    Snapshot {
        /// Simulation tick number
        tick: u64,
        actors: Vec<ActorSnapshot>,
        objective: Option<ObjectiveSnapshot>,
        projectiles: Vec<ProjectileSnapshot>,
        /// Events that occurred since last snapshot
        events: Vec<GameEvent>,
    },

    /// Match has ended
    MatchOver {
        winner: Option<ActorId>,
        winner_name: Option<String>,
    },

    /// Error message
    Error { code: String, message: String },

    /// Pong response
    Pong {
        /// Echo back client timestamp
        t: u64,
    },
}

impl ServerMsg {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        ServerMsg::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// Static actor description sent once per match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorInfo {
    pub id: ActorId,
    pub name: String,
    pub color: String,
    pub is_bot: bool,
    pub skills: Vec<SkillKind>,
    /// Key bound to each intent, in `Intent::ALL` order
    pub keys: Vec<String>,
}

/// Remaining cooldown of one skill
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CooldownState {
    pub skill: SkillKind,
    pub remaining_ms: f32,
}

/// Actor state in a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorSnapshot {
    pub id: ActorId,
    pub x: f32,
    /// Feet line
    pub y: f32,
    pub health: f32,
    pub max_health: f32,
    pub action: Action,
    pub body: Rect,
    /// Damage volume of the current action, if any
    pub attack: Option<Rect>,
    pub cooldowns: Vec<CooldownState>,
    pub carrying: bool,
}

/// Contested object state in a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectiveSnapshot {
    pub hitbox: Rect,
    pub holder: Option<ActorId>,
    pub capture_time_ms: f32,
    pub remaining_ms: f32,
}

/// Projectile state in a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    pub owner: ActorId,
    pub hitbox: Rect,
    pub direction: f32,
}
