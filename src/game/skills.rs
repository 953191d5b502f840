//! Skill kinds and their fixed data: cooldown, animation lock, damage, volume

use serde::{Deserialize, Serialize};

/// Cooldown-gated actions an actor can activate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillKind {
    /// Quick melee jab
    Attack,
    /// Heavy strike
    Skill1,
    /// Projectile channel
    Skill2,
    /// Ground beam
    Skill3,
}

impl SkillKind {
    pub const ALL: [SkillKind; 4] = [
        SkillKind::Attack,
        SkillKind::Skill1,
        SkillKind::Skill2,
        SkillKind::Skill3,
    ];

    pub const fn index(self) -> usize {
        match self {
            SkillKind::Attack => 0,
            SkillKind::Skill1 => 1,
            SkillKind::Skill2 => 2,
            SkillKind::Skill3 => 3,
        }
    }
}

/// Damage payload of a skill's attack volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Damage {
    Fixed(f32),
    /// Fraction of the attacker's max health
    MaxHealthFraction(f32),
}

impl Damage {
    pub fn amount(&self, attacker_max_health: f32) -> f32 {
        match *self {
            Damage::Fixed(amount) => amount,
            Damage::MaxHealthFraction(fraction) => attacker_max_health * fraction,
        }
    }
}

/// Shape of the attack volume relative to the actor's body
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Volume {
    /// No attack volume while the skill is active
    None,
    /// Box attached to the body's front edge, bottom-aligned with the feet
    Front { width: f32, height_ratio: f32 },
    /// Strip lying on the floor in front of the actor, independent of its height
    GroundBeam { body_widths: f32, height: f32 },
}

/// Fixed per-skill data, looked up once per activation or query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkillSpec {
    /// Cooldown in milliseconds
    pub cooldown_ms: f32,
    /// Animation lock in milliseconds
    pub animation_ms: f32,
    pub damage: Option<Damage>,
    pub volume: Volume,
    /// Return to idle on the first landed hit
    pub single_hit: bool,
    /// Spawn a projectile on activation
    pub spawns_projectile: bool,
}

pub const ATTACK_COOLDOWN_MS: f32 = 500.0;
pub const ATTACK_ANIMATION_MS: f32 = 100.0;

fn attack(damage: f32) -> SkillSpec {
    SkillSpec {
        cooldown_ms: ATTACK_COOLDOWN_MS,
        animation_ms: ATTACK_ANIMATION_MS,
        damage: Some(Damage::Fixed(damage)),
        volume: Volume::Front {
            width: 30.0,
            height_ratio: 0.7,
        },
        single_hit: true,
        spawns_projectile: false,
    }
}

/// Loadout of one actor: the skills it owns and their data
#[derive(Debug, Clone, PartialEq)]
pub struct SkillTable {
    specs: [Option<SkillSpec>; 4],
}

impl SkillTable {
    /// Attack only, one point per jab
    pub fn free_for_all() -> Self {
        Self {
            specs: [Some(attack(1.0)), None, None, None],
        }
    }

    /// Full loadout used in duels
    pub fn duel() -> Self {
        Self {
            specs: [
                Some(attack(5.0)),
                Some(SkillSpec {
                    cooldown_ms: 3000.0,
                    animation_ms: 300.0,
                    damage: Some(Damage::Fixed(12.0)),
                    volume: Volume::Front {
                        width: 50.0,
                        height_ratio: 1.0,
                    },
                    single_hit: true,
                    spawns_projectile: false,
                }),
                Some(SkillSpec {
                    cooldown_ms: 4000.0,
                    animation_ms: 400.0,
                    damage: None,
                    volume: Volume::None,
                    single_hit: false,
                    spawns_projectile: true,
                }),
                Some(SkillSpec {
                    cooldown_ms: 6000.0,
                    animation_ms: 500.0,
                    damage: Some(Damage::MaxHealthFraction(0.02)),
                    volume: Volume::GroundBeam {
                        body_widths: 4.0,
                        height: 20.0,
                    },
                    single_hit: false,
                    spawns_projectile: false,
                }),
            ],
        }
    }

    pub fn get(&self, kind: SkillKind) -> Option<&SkillSpec> {
        self.specs[kind.index()].as_ref()
    }

    pub fn owns(&self, kind: SkillKind) -> bool {
        self.get(kind).is_some()
    }

    /// Skills present in this loadout
    pub fn kinds(&self) -> impl Iterator<Item = SkillKind> + '_ {
        SkillKind::ALL.into_iter().filter(|kind| self.owns(*kind))
    }
}
