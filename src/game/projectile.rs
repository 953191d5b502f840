//! Straight-line projectiles spawned by the channel skill

use super::actor::Actor;
use super::geometry::Rect;
use super::{frame_scale, ActorId, Stage};

pub const PROJECTILE_WIDTH: f32 = 20.0;
pub const PROJECTILE_HEIGHT: f32 = 10.0;
/// Units per reference frame
pub const PROJECTILE_SPEED: f32 = 15.0;
pub const PROJECTILE_DAMAGE: f32 = 8.0;
/// Distance past either stage edge before a projectile is discarded
pub const OUT_OF_BOUNDS_MARGIN: f32 = 100.0;

/// Active projectile in the match
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub owner: ActorId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// -1.0 moves left, 1.0 moves right
    pub direction: f32,
    pub speed: f32,
    pub damage: f32,
}

impl Projectile {
    pub fn new(owner: ActorId, x: f32, y: f32, direction: f32) -> Self {
        Self {
            owner,
            x,
            y,
            width: PROJECTILE_WIDTH,
            height: PROJECTILE_HEIGHT,
            direction: direction.signum(),
            speed: PROJECTILE_SPEED,
            damage: PROJECTILE_DAMAGE,
        }
    }

    /// Launch from the shooter's front edge at mid-body height
    pub fn launch(shooter: &Actor, facing_right: bool) -> Self {
        let (x, direction) = if facing_right {
            (shooter.x + shooter.width, 1.0)
        } else {
            (shooter.x - PROJECTILE_WIDTH, -1.0)
        };
        let y = shooter.y - shooter.height / 2.0 - PROJECTILE_HEIGHT / 2.0;
        Self::new(shooter.id, x, y, direction)
    }

    /// Advance and report whether it is still on (or near) the stage
    pub fn update(&mut self, dt_ms: f32, stage: &Stage) -> bool {
        self.x += self.direction * self.speed * frame_scale(dt_ms);
        !self.is_out_of_bounds(stage)
    }

    pub fn is_out_of_bounds(&self, stage: &Stage) -> bool {
        self.x > stage.width + OUT_OF_BOUNDS_MARGIN || self.x + self.width < -OUT_OF_BOUNDS_MARGIN
    }

    pub fn hitbox(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}
