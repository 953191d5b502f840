//! Actor state machine: timers, movement, skill activation and hitboxes

use serde::{Deserialize, Serialize};

use super::geometry::Rect;
use super::input::{InputSnapshot, Intent, KeyMap};
use super::skills::{SkillKind, SkillTable, Volume};
use super::{frame_scale, ActorId, Stage};

pub const ACTOR_WIDTH: f32 = 40.0;
pub const ACTOR_HEIGHT: f32 = 80.0;
pub const MAX_HEALTH: f32 = 100.0;
pub const BASE_SPEED: f32 = 5.0;
pub const GRAVITY: f32 = 0.8;
pub const JUMP_POWER: f32 = -15.0;

/// Speed multiplier while carrying the contested object
pub const CARRY_SPEED_FACTOR: f32 = 0.6;
pub const CARRY_JUMP_POWER: f32 = -7.0;

/// What the actor is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Idle,
    /// Moved this tick; clears back to idle on the next one
    Moving,
    Attack,
    Skill1,
    Skill2,
    Skill3,
}

impl Action {
    pub fn skill(self) -> Option<SkillKind> {
        match self {
            Action::Attack => Some(SkillKind::Attack),
            Action::Skill1 => Some(SkillKind::Skill1),
            Action::Skill2 => Some(SkillKind::Skill2),
            Action::Skill3 => Some(SkillKind::Skill3),
            Action::Idle | Action::Moving => None,
        }
    }
}

impl From<SkillKind> for Action {
    fn from(kind: SkillKind) -> Self {
        match kind {
            SkillKind::Attack => Action::Attack,
            SkillKind::Skill1 => Action::Skill1,
            SkillKind::Skill2 => Action::Skill2,
            SkillKind::Skill3 => Action::Skill3,
        }
    }
}

/// Creation parameters for an actor
#[derive(Debug, Clone)]
pub struct ActorSpawn {
    pub name: String,
    pub color: String,
    pub x: f32,
    pub keys: KeyMap,
    pub is_bot: bool,
}

/// A controllable character
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    pub color: String,

    // Position and movement
    pub x: f32,
    /// Feet line; the floor is the largest value reachable
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub velocity_y: f32,
    pub on_ground: bool,
    pub base_speed: f32,
    pub speed: f32,
    pub jump_power: f32,

    // Combat
    pub health: f32,
    pub max_health: f32,
    pub action: Action,
    cooldowns: [f32; 4],
    animation_ms: f32,
    pub skills: SkillTable,

    // Control
    pub keys: KeyMap,
    pub is_bot: bool,
}

impl Actor {
    /// Fresh actor standing on the floor with every cooldown at its maximum
    pub fn new(id: ActorId, spawn: ActorSpawn, skills: SkillTable, stage: &Stage) -> Self {
        let mut cooldowns = [0.0; 4];
        for kind in skills.kinds() {
            if let Some(spec) = skills.get(kind) {
                cooldowns[kind.index()] = spec.cooldown_ms;
            }
        }

        Self {
            id,
            name: spawn.name,
            color: spawn.color,
            x: spawn.x,
            y: stage.floor,
            width: ACTOR_WIDTH,
            height: ACTOR_HEIGHT,
            velocity_y: 0.0,
            on_ground: true,
            base_speed: BASE_SPEED,
            speed: BASE_SPEED,
            jump_power: JUMP_POWER,
            health: MAX_HEALTH,
            max_health: MAX_HEALTH,
            action: Action::Idle,
            cooldowns,
            animation_ms: 0.0,
            skills,
            keys: spawn.keys,
            is_bot: spawn.is_bot,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    pub fn is_idle(&self) -> bool {
        self.action == Action::Idle
    }

    pub fn cooldown(&self, kind: SkillKind) -> f32 {
        self.cooldowns[kind.index()]
    }

    pub fn animation_remaining(&self) -> f32 {
        self.animation_ms
    }

    /// Owned skill whose cooldown has fully elapsed
    pub fn skill_ready(&self, kind: SkillKind) -> bool {
        self.skills.owns(kind) && self.cooldown(kind) == 0.0
    }

    /// Swap between normal and carrying movement stats
    pub fn apply_carry(&mut self, carrying: bool) {
        if carrying {
            self.speed = self.base_speed * CARRY_SPEED_FACTOR;
            self.jump_power = CARRY_JUMP_POWER;
        } else {
            self.speed = self.base_speed;
            self.jump_power = JUMP_POWER;
        }
    }

    /// Count every timer down and drop back to idle once the lock expires
    pub fn tick_timers(&mut self, dt_ms: f32) {
        for cooldown in self.cooldowns.iter_mut() {
            if *cooldown > 0.0 {
                *cooldown = (*cooldown - dt_ms).max(0.0);
            }
        }
        if self.animation_ms > 0.0 {
            self.animation_ms = (self.animation_ms - dt_ms).max(0.0);
        }
        if self.action != Action::Idle && self.animation_ms == 0.0 {
            self.action = Action::Idle;
        }
    }

    /// Start a skill if idle and off cooldown; rejected attempts change nothing
    pub fn try_activate(&mut self, kind: SkillKind) -> bool {
        if !self.is_idle() || !self.skill_ready(kind) {
            return false;
        }
        let Some(spec) = self.skills.get(kind) else {
            return false;
        };

        self.action = Action::from(kind);
        self.cooldowns[kind.index()] = spec.cooldown_ms;
        self.animation_ms = spec.animation_ms;
        true
    }

    /// Return to idle right away, used after a single-hit skill connects
    pub fn interrupt(&mut self) {
        self.action = Action::Idle;
        self.animation_ms = 0.0;
    }

    /// Apply held movement and skill intents; returns the skill started this tick
    pub fn resolve_input(&mut self, input: &InputSnapshot, dt_ms: f32) -> Option<SkillKind> {
        if !self.is_alive() || !self.is_idle() {
            return None;
        }

        let scale = frame_scale(dt_ms);
        let start_x = self.x;
        if input.intent(&self.keys, Intent::Left) {
            self.x -= self.speed * scale;
        }
        if input.intent(&self.keys, Intent::Right) {
            self.x += self.speed * scale;
        }
        if input.intent(&self.keys, Intent::Jump) && self.on_ground {
            self.velocity_y = self.jump_power;
            self.on_ground = false;
        }

        let activated = [
            (Intent::Attack, SkillKind::Attack),
            (Intent::Skill1, SkillKind::Skill1),
            (Intent::Skill2, SkillKind::Skill2),
            (Intent::Skill3, SkillKind::Skill3),
        ]
        .into_iter()
        .find(|(intent, kind)| input.intent(&self.keys, *intent) && self.try_activate(*kind))
        .map(|(_, kind)| kind);

        if activated.is_none() && self.x != start_x {
            self.action = Action::Moving;
        }
        activated
    }

    /// Gravity, floor contact and horizontal clamping
    pub fn integrate(&mut self, dt_ms: f32, stage: &Stage) {
        let scale = frame_scale(dt_ms);
        self.velocity_y += GRAVITY * scale;
        self.y += self.velocity_y * scale;
        if self.y >= stage.floor {
            self.y = stage.floor;
            self.velocity_y = 0.0;
            self.on_ground = true;
        }
        self.x = self.x.clamp(0.0, stage.width - self.width);
    }

    /// Whole per-tick update for an actor whose intents are already in `input`
    pub fn update(
        &mut self,
        dt_ms: f32,
        input: &InputSnapshot,
        carrying: bool,
        stage: &Stage,
    ) -> Option<SkillKind> {
        self.apply_carry(carrying);
        self.tick_timers(dt_ms);
        let activated = self.resolve_input(input, dt_ms);
        self.integrate(dt_ms, stage);
        activated
    }

    /// Body volume, anchored at the feet and extending upward
    pub fn body_hitbox(&self) -> Rect {
        Rect::new(self.x, self.y - self.height, self.width, self.height)
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Face the opponent; without one, face the farther stage edge
    pub fn facing_right(&self, target_x: Option<f32>, stage: &Stage) -> bool {
        let opponent_x = target_x.unwrap_or(if self.x > stage.width / 2.0 {
            0.0
        } else {
            stage.width
        });
        self.x < opponent_x
    }

    /// Damage volume of the current action, if it has one
    pub fn attack_hitbox(&self, target_x: Option<f32>, stage: &Stage) -> Option<Rect> {
        if !self.is_alive() {
            return None;
        }
        let spec = self.skills.get(self.action.skill()?)?;
        let facing_right = self.facing_right(target_x, stage);

        match spec.volume {
            Volume::None => None,
            Volume::Front {
                width,
                height_ratio,
            } => {
                let height = self.height * height_ratio;
                let x = if facing_right {
                    self.x + self.width
                } else {
                    self.x - width
                };
                Some(Rect::new(x, self.y - height, width, height))
            }
            Volume::GroundBeam {
                body_widths,
                height,
            } => {
                let width = self.width * body_widths;
                let x = if facing_right {
                    self.x + self.width
                } else {
                    self.x - width
                };
                Some(Rect::new(x, stage.floor - height, width, height))
            }
        }
    }

    /// Subtract health, floored at zero; returns true if this hit was lethal
    pub fn receive_damage(&mut self, amount: f32) -> bool {
        if !self.is_alive() || amount <= 0.0 {
            return false;
        }
        self.health = (self.health - amount).max(0.0);
        !self.is_alive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage() -> Stage {
        Stage::default()
    }

    fn actor(skills: SkillTable) -> Actor {
        Actor::new(
            ActorId(0),
            ActorSpawn {
                name: "Player".to_string(),
                color: "#3498db".to_string(),
                x: 150.0,
                keys: KeyMap::player(),
                is_bot: false,
            },
            skills,
            &stage(),
        )
    }

    fn held(intents: &[Intent]) -> InputSnapshot {
        let keys = KeyMap::player();
        let mut input = InputSnapshot::new();
        for intent in intents {
            input.assert_intent(&keys, *intent);
        }
        input
    }

    #[test]
    fn cooldowns_start_at_maximum() {
        let a = actor(SkillTable::duel());
        let table = SkillTable::duel();
        for kind in SkillKind::ALL {
            let max = table.get(kind).map(|s| s.cooldown_ms).unwrap_or(0.0);
            assert_eq!(a.cooldown(kind), max);
            assert!(!a.skill_ready(kind));
        }
    }

    #[test]
    fn timers_floor_at_zero_and_never_increase() {
        let mut a = actor(SkillTable::duel());
        let mut previous = a.cooldown(SkillKind::Skill3);
        for dt in [16.0, 1000.0, 3.5, 9000.0, 16.0] {
            a.tick_timers(dt);
            let now = a.cooldown(SkillKind::Skill3);
            assert!(now <= previous);
            assert!(now >= 0.0);
            previous = now;
        }
        assert_eq!(a.cooldown(SkillKind::Skill3), 0.0);
    }

    #[test]
    fn activation_requires_idle_and_ready() {
        let mut a = actor(SkillTable::duel());
        assert!(!a.try_activate(SkillKind::Attack), "opening delay");

        a.tick_timers(10_000.0);
        assert!(a.try_activate(SkillKind::Attack));
        assert_eq!(a.action, Action::Attack);
        assert_eq!(a.cooldown(SkillKind::Attack), 500.0);
        assert_eq!(a.animation_remaining(), 100.0);

        // busy: skill1 is ready but must be rejected without touching timers
        let before = (a.cooldown(SkillKind::Skill1), a.animation_remaining());
        assert!(!a.try_activate(SkillKind::Skill1));
        assert_eq!((a.cooldown(SkillKind::Skill1), a.animation_remaining()), before);
        assert_eq!(a.action, Action::Attack);
    }

    #[test]
    fn rejected_on_cooldown_leaves_timers() {
        let mut a = actor(SkillTable::duel());
        a.tick_timers(200.0);
        let before = a.cooldown(SkillKind::Attack);
        assert!(!a.try_activate(SkillKind::Attack));
        assert_eq!(a.cooldown(SkillKind::Attack), before);
        assert_eq!(a.animation_remaining(), 0.0);
    }

    #[test]
    fn unowned_skill_never_activates() {
        let mut a = actor(SkillTable::free_for_all());
        a.tick_timers(10_000.0);
        assert!(!a.try_activate(SkillKind::Skill1));
        assert!(a.try_activate(SkillKind::Attack));
    }

    #[test]
    fn returns_to_idle_when_lock_expires() {
        let mut a = actor(SkillTable::duel());
        a.tick_timers(10_000.0);
        assert!(a.try_activate(SkillKind::Skill1));
        a.tick_timers(299.0);
        assert_eq!(a.action, Action::Skill1);
        a.tick_timers(1.0);
        assert_eq!(a.action, Action::Idle);
        // cooldown kept charging during the animation
        assert_eq!(a.cooldown(SkillKind::Skill1), 2700.0);
    }

    #[test]
    fn movement_ignored_while_acting() {
        let mut a = actor(SkillTable::duel());
        a.tick_timers(10_000.0);
        assert!(a.try_activate(SkillKind::Attack));
        let x = a.x;
        let started = a.resolve_input(&held(&[Intent::Right, Intent::Skill1]), 16.0);
        assert_eq!(started, None);
        assert_eq!(a.x, x);
    }

    #[test]
    fn opposite_directions_cancel() {
        let mut a = actor(SkillTable::duel());
        let x = a.x;
        a.update(16.0, &held(&[Intent::Left, Intent::Right]), false, &stage());
        assert_eq!(a.x, x);
        assert_eq!(a.action, Action::Idle);

        a.update(16.0, &held(&[Intent::Right]), false, &stage());
        assert_eq!(a.x, x + BASE_SPEED);
        assert_eq!(a.action, Action::Moving);

        a.update(16.0, &InputSnapshot::new(), false, &stage());
        assert_eq!(a.action, Action::Idle);
    }

    #[test]
    fn jump_lands_back_on_floor() {
        let stage = stage();
        let mut a = actor(SkillTable::duel());
        a.update(16.0, &held(&[Intent::Jump]), false, &stage);
        assert!(!a.on_ground);
        assert!(a.y < stage.floor);

        let mut ticks = 0;
        while !a.on_ground {
            a.update(16.0, &InputSnapshot::new(), false, &stage);
            assert!(a.y <= stage.floor);
            ticks += 1;
            assert!(ticks < 200, "never landed");
        }
        assert_eq!(a.y, stage.floor);
        assert_eq!(a.velocity_y, 0.0);
    }

    #[test]
    fn no_double_jump() {
        let mut a = actor(SkillTable::duel());
        a.update(16.0, &held(&[Intent::Jump]), false, &stage());
        let vy = a.velocity_y;
        a.update(16.0, &held(&[Intent::Jump]), false, &stage());
        assert_eq!(a.velocity_y, vy + GRAVITY);
    }

    #[test]
    fn x_is_clamped_to_stage() {
        let stage = stage();
        let mut a = actor(SkillTable::duel());
        for _ in 0..500 {
            a.update(16.0, &held(&[Intent::Right]), false, &stage);
        }
        assert_eq!(a.x, stage.width - a.width);
        for _ in 0..500 {
            a.update(16.0, &held(&[Intent::Left]), false, &stage);
        }
        assert_eq!(a.x, 0.0);
    }

    #[test]
    fn carrying_slows_and_weakens_jump() {
        let mut a = actor(SkillTable::free_for_all());
        a.apply_carry(true);
        assert_eq!(a.speed, BASE_SPEED * CARRY_SPEED_FACTOR);
        assert_eq!(a.jump_power, CARRY_JUMP_POWER);
        a.apply_carry(false);
        assert_eq!(a.speed, BASE_SPEED);
        assert_eq!(a.jump_power, JUMP_POWER);
    }

    #[test]
    fn body_hitbox_extends_up_from_feet() {
        let a = actor(SkillTable::duel());
        let body = a.body_hitbox();
        assert_eq!(body, Rect::new(150.0, 350.0 - 80.0, 40.0, 80.0));
    }

    #[test]
    fn attack_volume_follows_facing() {
        let stage = stage();
        let mut a = actor(SkillTable::duel());
        assert_eq!(a.attack_hitbox(Some(400.0), &stage), None, "idle has no volume");

        a.tick_timers(10_000.0);
        assert!(a.try_activate(SkillKind::Attack));
        let right = a.attack_hitbox(Some(400.0), &stage).unwrap();
        assert_eq!(right.x, 190.0);
        assert_eq!(right.width, 30.0);
        assert_eq!(right.height, 56.0);
        assert_eq!(right.bottom(), a.y);

        let left = a.attack_hitbox(Some(10.0), &stage).unwrap();
        assert_eq!(left.x, 120.0);
    }

    #[test]
    fn facing_without_target_points_to_far_edge() {
        let stage = stage();
        let a = actor(SkillTable::duel());
        assert!(a.facing_right(None, &stage));
        let mut b = a.clone();
        b.x = 700.0;
        assert!(!b.facing_right(None, &stage));
    }

    #[test]
    fn ground_beam_stays_on_floor_while_airborne() {
        let stage = stage();
        let mut a = actor(SkillTable::duel());
        a.tick_timers(10_000.0);
        assert!(a.try_activate(SkillKind::Skill3));
        a.y = 200.0;
        let beam = a.attack_hitbox(Some(700.0), &stage).unwrap();
        assert_eq!(beam, Rect::new(190.0, stage.floor - 20.0, 160.0, 20.0));
    }

    #[test]
    fn projectile_channel_has_no_volume() {
        let stage = stage();
        let mut a = actor(SkillTable::duel());
        a.tick_timers(10_000.0);
        assert!(a.try_activate(SkillKind::Skill2));
        assert_eq!(a.attack_hitbox(Some(700.0), &stage), None);
    }

    #[test]
    fn damage_clamps_and_ignores_dead_targets() {
        let mut a = actor(SkillTable::duel());
        assert!(!a.receive_damage(0.0));
        assert_eq!(a.health, MAX_HEALTH);
        assert!(a.receive_damage(250.0));
        assert_eq!(a.health, 0.0);
        assert!(!a.receive_damage(5.0));
        assert_eq!(a.health, 0.0);
    }
}
