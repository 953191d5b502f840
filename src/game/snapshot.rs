//! Snapshot building for the render sink

use crate::ws::protocol::{
    ActorInfo, ActorSnapshot, CooldownState, ObjectiveSnapshot, ProjectileSnapshot, ServerMsg,
};

use super::input::Intent;
use super::r#match::Match;
use super::GameEvent;

/// Builds snapshots for network transmission
pub struct SnapshotBuilder {
    /// Tick counter since last snapshot
    ticks_since_snapshot: u32,
    /// Snapshot interval in ticks
    snapshot_interval: u32,
}

impl SnapshotBuilder {
    pub fn new(snapshot_interval: u32) -> Self {
        Self {
            ticks_since_snapshot: 0,
            snapshot_interval: snapshot_interval.max(1),
        }
    }

    /// Check if it's time to send a snapshot
    pub fn should_send(&mut self) -> bool {
        self.ticks_since_snapshot += 1;
        if self.ticks_since_snapshot >= self.snapshot_interval {
            self.ticks_since_snapshot = 0;
            true
        } else {
            false
        }
    }

    /// Force snapshot on next check (used for important events)
    pub fn force_next(&mut self) {
        self.ticks_since_snapshot = self.snapshot_interval;
    }

    /// Build a snapshot message
    pub fn build(&self, state: &Match, events: Vec<GameEvent>) -> ServerMsg {
        let holder = state.objective().and_then(|o| o.holder);

        let actors = state
            .actors()
            .iter()
            .map(|a| ActorSnapshot {
                id: a.id,
                x: a.x,
                y: a.y,
                health: a.health,
                max_health: a.max_health,
                action: a.action,
                body: a.body_hitbox(),
                attack: state.attack_hitbox(a.id),
                cooldowns: a
                    .skills
                    .kinds()
                    .map(|skill| CooldownState {
                        skill,
                        remaining_ms: a.cooldown(skill),
                    })
                    .collect(),
                carrying: holder == Some(a.id),
            })
            .collect();

        let objective = state.objective().map(|o| ObjectiveSnapshot {
            hitbox: o.hitbox(),
            holder: o.holder,
            capture_time_ms: o.capture_time_ms,
            remaining_ms: o.remaining_capture_ms(),
        });

        let projectiles = state
            .projectiles()
            .iter()
            .map(|p| ProjectileSnapshot {
                owner: p.owner,
                hitbox: p.hitbox(),
                direction: p.direction,
            })
            .collect();

        ServerMsg::Snapshot {
            tick: state.tick_count(),
            actors,
            objective,
            projectiles,
            events,
        }
    }
}

/// Roster description for `match_started`
pub fn match_started(state: &Match) -> ServerMsg {
    let config = state.config();
    let actors = state
        .actors()
        .iter()
        .map(|a| ActorInfo {
            id: a.id,
            name: a.name.clone(),
            color: a.color.clone(),
            is_bot: a.is_bot,
            skills: a.skills.kinds().collect(),
            keys: Intent::ALL
                .iter()
                .map(|intent| a.keys.key(*intent).to_string())
                .collect(),
        })
        .collect();

    ServerMsg::MatchStarted {
        match_id: state.id,
        mode: config.mode,
        difficulty: config.difficulty,
        actors,
    }
}
