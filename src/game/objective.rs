//! Contested object: picked up on contact, won by holding it long enough

use super::actor::Actor;
use super::geometry::Rect;
use super::{ActorId, Stage};

pub const OBJECTIVE_SIZE: f32 = 40.0;
pub const DEFAULT_CAPTURE_TIME_MS: f32 = 30_000.0;

/// Gold coin the free-for-all is played over
#[derive(Debug, Clone, PartialEq)]
pub struct ContestedObject {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Non-owning reference to the carrier, resolved against the roster
    pub holder: Option<ActorId>,
    pub capture_time_ms: f32,
    pub capture_threshold_ms: f32,
    home: (f32, f32),
}

impl ContestedObject {
    /// Coin resting mid-stage on the floor
    pub fn new(stage: &Stage, capture_threshold_ms: f32) -> Self {
        let home = (
            stage.width / 2.0 - OBJECTIVE_SIZE / 2.0,
            stage.floor - OBJECTIVE_SIZE,
        );
        Self {
            x: home.0,
            y: home.1,
            width: OBJECTIVE_SIZE,
            height: OBJECTIVE_SIZE,
            holder: None,
            capture_time_ms: 0.0,
            capture_threshold_ms,
            home,
        }
    }

    pub fn is_held(&self) -> bool {
        self.holder.is_some()
    }

    pub fn is_held_by(&self, id: ActorId) -> bool {
        self.holder == Some(id)
    }

    pub fn hitbox(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Strip the holder and send the coin back to its resting spot
    pub fn drop_to_home(&mut self) {
        self.holder = None;
        self.capture_time_ms = 0.0;
        self.x = self.home.0;
        self.y = self.home.1;
    }

    /// Follow the holder and accumulate capture time, or look for a new holder.
    /// Returns the actor that picked the coin up this tick.
    pub fn update(&mut self, dt_ms: f32, actors: &[Actor]) -> Option<ActorId> {
        if let Some(holder) = self.holder.and_then(|id| actors.get(id.0)) {
            self.x = holder.center_x() - self.width / 2.0;
            self.y = holder.y - holder.height - 5.0;
            self.capture_time_ms += dt_ms;
            return None;
        }

        // later actors win simultaneous contact
        let hitbox = self.hitbox();
        let taker = actors
            .iter()
            .rev()
            .find(|actor| actor.is_alive() && actor.body_hitbox().overlaps(&hitbox))
            .map(|actor| actor.id)?;

        self.holder = Some(taker);
        self.capture_time_ms = 0.0;
        Some(taker)
    }

    pub fn is_captured(&self) -> bool {
        self.is_held() && self.capture_time_ms >= self.capture_threshold_ms
    }

    pub fn remaining_capture_ms(&self) -> f32 {
        if self.is_held() {
            (self.capture_threshold_ms - self.capture_time_ms).max(0.0)
        } else {
            self.capture_threshold_ms
        }
    }
}
