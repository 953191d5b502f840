//! Bot decision policy: turns the world into held intents for one bot

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::actor::Actor;
use super::input::{InputSnapshot, Intent};
use super::objective::ContestedObject;
use super::skills::SkillKind;
use super::Stage;

/// Holder flees from threats closer than this
pub const FLEE_DISTANCE: f32 = 200.0;
pub const HOLDER_JUMP_CHANCE: f64 = 0.1;
/// Simplified policy stops closing in below this distance
pub const SIMPLE_APPROACH_DISTANCE: f32 = 30.0;
pub const SIMPLE_ATTACK_DISTANCE: f32 = 50.0;
/// Tiered policies stop closing in below this distance
pub const TIERED_APPROACH_DISTANCE: f32 = 40.0;

/// Bot difficulty tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }

    /// Skills in the order the tier tries them
    pub fn priority(&self) -> &'static [SkillKind] {
        match self {
            Difficulty::Easy => &[SkillKind::Attack, SkillKind::Skill1],
            Difficulty::Normal => &[SkillKind::Skill1, SkillKind::Attack, SkillKind::Skill2],
            Difficulty::Hard => &[
                SkillKind::Skill3,
                SkillKind::Skill1,
                SkillKind::Skill2,
                SkillKind::Attack,
            ],
        }
    }

    /// Sample threshold a skill choice must pass; `None` means always
    pub fn skill_gate(&self) -> Option<f64> {
        match self {
            Difficulty::Easy => Some(0.25),
            Difficulty::Normal => Some(0.6),
            Difficulty::Hard => None,
        }
    }

    pub fn jump_chance(&self) -> f64 {
        match self {
            Difficulty::Easy => 0.01,
            Difficulty::Normal => 0.03,
            Difficulty::Hard => 0.05,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown difficulty: {0} (expected easy, normal or hard)")]
pub struct ParseDifficultyError(String);

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            other => Err(ParseDifficultyError(other.to_string())),
        }
    }
}

/// Distance band `[min, max)` in which a skill is worth firing
pub fn skill_band(kind: SkillKind) -> (f32, f32) {
    match kind {
        SkillKind::Attack => (0.0, 50.0),
        SkillKind::Skill1 => (0.0, 70.0),
        SkillKind::Skill3 => (0.0, 160.0),
        SkillKind::Skill2 => (200.0, f32::INFINITY),
    }
}

/// Which decision procedure a bot runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotPolicy {
    /// Free-for-all: grab the object, chase the holder, jab, flee when carrying
    Simplified,
    /// Duel: tier-dependent skill priorities
    Tiered(Difficulty),
}

/// What a bot sees when deciding
#[derive(Debug, Clone, Copy)]
pub struct BotView<'a> {
    pub me: &'a Actor,
    pub target: Option<&'a Actor>,
    pub objective: Option<&'a ContestedObject>,
    pub stage: &'a Stage,
}

impl BotView<'_> {
    /// Opponent x, or a reference point when nobody is left to chase
    fn target_x(&self) -> f32 {
        match (self.target, self.objective) {
            (Some(target), _) => target.x,
            (None, Some(objective)) => objective.x,
            (None, None) => self.stage.width / 2.0,
        }
    }
}

impl BotPolicy {
    /// Rewrite the bot's own intents for this tick. `sample` is uniform in [0, 1).
    pub fn decide(&self, view: BotView<'_>, sample: f64, input: &mut InputSnapshot) {
        let me = view.me;
        input.clear_actor(&me.keys);
        if !me.is_idle() || !me.is_alive() {
            return;
        }

        let target_x = view.target_x();
        let distance = (me.x - target_x).abs();

        match self {
            BotPolicy::Simplified => {
                let carrying = view.objective.is_some_and(|o| o.is_held_by(me.id));
                if carrying {
                    if view.target.is_some() && distance < FLEE_DISTANCE {
                        move_towards(me, target_x, true, input);
                    }
                    if me.on_ground && sample < HOLDER_JUMP_CHANCE {
                        input.assert_intent(&me.keys, Intent::Jump);
                    }
                } else {
                    if distance > SIMPLE_APPROACH_DISTANCE {
                        move_towards(me, target_x, false, input);
                    }
                    if distance < SIMPLE_ATTACK_DISTANCE && me.skill_ready(SkillKind::Attack) {
                        input.assert_intent(&me.keys, Intent::Attack);
                    }
                }
            }
            BotPolicy::Tiered(difficulty) => {
                if distance > TIERED_APPROACH_DISTANCE {
                    move_towards(me, target_x, false, input);
                }
                if me.on_ground && sample < difficulty.jump_chance() {
                    input.assert_intent(&me.keys, Intent::Jump);
                }

                let gate_open = difficulty.skill_gate().map_or(true, |gate| sample < gate);
                if !gate_open || view.target.is_none() {
                    return;
                }
                let choice = difficulty.priority().iter().copied().find(|kind| {
                    let (min, max) = skill_band(*kind);
                    me.skill_ready(*kind) && distance >= min && distance < max
                });
                if let Some(kind) = choice {
                    input.assert_intent(&me.keys, skill_intent(kind));
                }
            }
        }
    }
}

fn skill_intent(kind: SkillKind) -> Intent {
    match kind {
        SkillKind::Attack => Intent::Attack,
        SkillKind::Skill1 => Intent::Skill1,
        SkillKind::Skill2 => Intent::Skill2,
        SkillKind::Skill3 => Intent::Skill3,
    }
}

fn move_towards(me: &Actor, target_x: f32, flee: bool, input: &mut InputSnapshot) {
    let target_is_right = me.x < target_x;
    let go_right = target_is_right != flee;
    let intent = if go_right { Intent::Right } else { Intent::Left };
    input.assert_intent(&me.keys, intent);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::actor::ActorSpawn;
    use crate::game::input::KeyMap;
    use crate::game::objective::DEFAULT_CAPTURE_TIME_MS;
    use crate::game::skills::SkillTable;
    use crate::game::ActorId;

    fn bot(id: usize, x: f32, skills: SkillTable) -> Actor {
        Actor::new(
            ActorId(id),
            ActorSpawn {
                name: format!("Bot {id}"),
                color: "#e74c3c".to_string(),
                x,
                keys: KeyMap::bot(id),
                is_bot: true,
            },
            skills,
            &Stage::default(),
        )
    }

    fn ready(mut actor: Actor) -> Actor {
        actor.tick_timers(60_000.0);
        actor
    }

    fn held_intents(input: &InputSnapshot, keys: &KeyMap) -> Vec<Intent> {
        Intent::ALL
            .into_iter()
            .filter(|i| input.intent(keys, *i))
            .collect()
    }

    #[test]
    fn parses_difficulty() {
        assert_eq!("HARD".parse::<Difficulty>().ok(), Some(Difficulty::Hard));
        assert_eq!(" easy ".parse::<Difficulty>().ok(), Some(Difficulty::Easy));
        assert!("nightmare".parse::<Difficulty>().is_err());
    }

    #[test]
    fn simplified_chases_and_jabs() {
        let stage = Stage::default();
        let me = ready(bot(1, 300.0, SkillTable::free_for_all()));
        let far = bot(2, 500.0, SkillTable::free_for_all());
        let mut input = InputSnapshot::new();

        let view = BotView {
            me: &me,
            target: Some(&far),
            objective: None,
            stage: &stage,
        };
        BotPolicy::Simplified.decide(view, 0.5, &mut input);
        assert_eq!(held_intents(&input, &me.keys), vec![Intent::Right]);

        let near = bot(2, 340.0, SkillTable::free_for_all());
        let view = BotView {
            me: &me,
            target: Some(&near),
            objective: None,
            stage: &stage,
        };
        BotPolicy::Simplified.decide(view, 0.5, &mut input);
        assert_eq!(held_intents(&input, &me.keys), vec![Intent::Right, Intent::Attack]);
    }

    #[test]
    fn simplified_holder_flees() {
        let stage = Stage::default();
        let me = ready(bot(1, 300.0, SkillTable::free_for_all()));
        let chaser = bot(2, 250.0, SkillTable::free_for_all());
        let mut coin = ContestedObject::new(&stage, DEFAULT_CAPTURE_TIME_MS);
        coin.holder = Some(me.id);
        let mut input = InputSnapshot::new();

        let view = BotView {
            me: &me,
            target: Some(&chaser),
            objective: Some(&coin),
            stage: &stage,
        };
        BotPolicy::Simplified.decide(view, 0.05, &mut input);
        assert_eq!(held_intents(&input, &me.keys), vec![Intent::Right, Intent::Jump]);
    }

    #[test]
    fn falls_back_to_reference_point_without_target() {
        let stage = Stage::default();
        let me = ready(bot(1, 100.0, SkillTable::free_for_all()));
        let coin = ContestedObject::new(&stage, DEFAULT_CAPTURE_TIME_MS);
        let mut input = InputSnapshot::new();

        let view = BotView {
            me: &me,
            target: None,
            objective: Some(&coin),
            stage: &stage,
        };
        BotPolicy::Simplified.decide(view, 0.9, &mut input);
        assert_eq!(held_intents(&input, &me.keys), vec![Intent::Right]);

        let view = BotView {
            me: &me,
            target: None,
            objective: None,
            stage: &stage,
        };
        BotPolicy::Tiered(Difficulty::Hard).decide(view, 0.9, &mut input);
        assert_eq!(held_intents(&input, &me.keys), vec![Intent::Right]);
    }

    #[test]
    fn busy_bot_releases_everything() {
        let stage = Stage::default();
        let mut me = ready(bot(1, 300.0, SkillTable::duel()));
        assert!(me.try_activate(SkillKind::Attack));
        let target = bot(2, 320.0, SkillTable::duel());
        let mut input = InputSnapshot::new();
        input.assert_intent(&me.keys, Intent::Left);
        input.assert_intent(&target.keys, Intent::Right);

        let view = BotView {
            me: &me,
            target: Some(&target),
            objective: None,
            stage: &stage,
        };
        BotPolicy::Tiered(Difficulty::Hard).decide(view, 0.0, &mut input);

        assert!(held_intents(&input, &me.keys).is_empty());
        assert_eq!(held_intents(&input, &target.keys), vec![Intent::Right], "other keys untouched");
    }

    #[test]
    fn hard_fires_highest_priority_without_randomness() {
        let stage = Stage::default();
        let me = ready(bot(1, 300.0, SkillTable::duel()));
        let target = bot(2, 330.0, SkillTable::duel());
        let mut input = InputSnapshot::new();

        let view = BotView {
            me: &me,
            target: Some(&target),
            objective: None,
            stage: &stage,
        };
        BotPolicy::Tiered(Difficulty::Hard).decide(view, 0.99, &mut input);
        assert_eq!(held_intents(&input, &me.keys), vec![Intent::Skill3]);
    }

    #[test]
    fn hard_uses_projectile_at_range() {
        let stage = Stage::default();
        let me = ready(bot(1, 100.0, SkillTable::duel()));
        let target = bot(2, 600.0, SkillTable::duel());
        let mut input = InputSnapshot::new();

        let view = BotView {
            me: &me,
            target: Some(&target),
            objective: None,
            stage: &stage,
        };
        BotPolicy::Tiered(Difficulty::Hard).decide(view, 0.99, &mut input);
        assert_eq!(held_intents(&input, &me.keys), vec![Intent::Right, Intent::Skill2]);
    }

    #[test]
    fn lower_tiers_are_gated_by_the_sample() {
        let stage = Stage::default();
        let me = ready(bot(1, 300.0, SkillTable::duel()));
        let target = bot(2, 330.0, SkillTable::duel());

        let mut input = InputSnapshot::new();
        let view = BotView {
            me: &me,
            target: Some(&target),
            objective: None,
            stage: &stage,
        };
        BotPolicy::Tiered(Difficulty::Easy).decide(view, 0.5, &mut input);
        assert!(held_intents(&input, &me.keys).is_empty());

        BotPolicy::Tiered(Difficulty::Easy).decide(view, 0.2, &mut input);
        assert_eq!(held_intents(&input, &me.keys), vec![Intent::Attack]);

        BotPolicy::Tiered(Difficulty::Normal).decide(view, 0.5, &mut input);
        assert_eq!(held_intents(&input, &me.keys), vec![Intent::Skill1]);
    }

    #[test]
    fn skips_skills_on_cooldown() {
        let stage = Stage::default();
        let mut me = ready(bot(1, 300.0, SkillTable::duel()));
        assert!(me.try_activate(SkillKind::Skill3));
        me.tick_timers(500.0);
        let target = bot(2, 330.0, SkillTable::duel());
        let mut input = InputSnapshot::new();

        let view = BotView {
            me: &me,
            target: Some(&target),
            objective: None,
            stage: &stage,
        };
        BotPolicy::Tiered(Difficulty::Hard).decide(view, 0.99, &mut input);
        assert_eq!(held_intents(&input, &me.keys), vec![Intent::Skill1]);
    }
}
