//! Combat system - attack volumes, projectiles, damage

use tracing::debug;

use super::actor::Actor;
use super::geometry::check_aabb;
use super::objective::ContestedObject;
use super::projectile::Projectile;
use super::targeting::TargetSelector;
use super::{ActorId, GameEvent, Stage};

/// Result of a single damage application
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitResult {
    pub target: ActorId,
    pub damage: f32,
    pub target_killed: bool,
}

/// Combat resolution over the whole roster
pub struct CombatSystem;

impl CombatSystem {
    /// Apply damage to one actor. Dead targets are left alone; a carrier that
    /// drops to zero loses the object, which goes back to its resting spot.
    pub fn apply_damage(
        actors: &mut [Actor],
        target: ActorId,
        amount: f32,
        objective: Option<&mut ContestedObject>,
        events: &mut Vec<GameEvent>,
    ) -> Option<HitResult> {
        let actor = actors.get_mut(target.0)?;
        if !actor.is_alive() {
            return None;
        }

        let target_killed = actor.receive_damage(amount);
        if target_killed {
            debug!(actor = %actor.name, "Actor eliminated");
            events.push(GameEvent::Eliminated { actor: target });

            if let Some(objective) = objective.filter(|o| o.is_held_by(target)) {
                objective.drop_to_home();
                events.push(GameEvent::ObjectiveDropped { actor: target });
            }
        }

        Some(HitResult {
            target,
            damage: amount,
            target_killed,
        })
    }

    /// One pass over every ordered (attacker, defender) pair
    pub fn resolve_attacks(
        actors: &mut [Actor],
        selector: TargetSelector,
        mut objective: Option<&mut ContestedObject>,
        stage: &Stage,
        events: &mut Vec<GameEvent>,
    ) {
        for attacker in 0..actors.len() {
            for defender in 0..actors.len() {
                if attacker == defender || !actors[defender].is_alive() {
                    continue;
                }

                let striker = &actors[attacker];
                let Some(skill) = striker.action.skill() else {
                    break;
                };
                let Some(spec) = striker.skills.get(skill).copied() else {
                    break;
                };
                let Some(damage) = spec.damage else {
                    break;
                };

                let target_x = selector.target_x(actors, striker.id, objective.as_deref());
                let volume = striker.attack_hitbox(target_x, stage);
                let body = actors[defender].body_hitbox();
                if !check_aabb(volume.as_ref(), Some(&body)) {
                    continue;
                }

                let amount = damage.amount(striker.max_health);
                let attacker_id = striker.id;
                let target = ActorId(defender);
                debug!(
                    attacker = attacker_id.0,
                    target = defender,
                    skill = ?skill,
                    damage = amount,
                    "Attack landed"
                );
                events.push(GameEvent::Hit {
                    attacker: attacker_id,
                    target,
                    skill,
                    damage: amount,
                });
                Self::apply_damage(actors, target, amount, objective.as_deref_mut(), events);

                if spec.single_hit {
                    actors[attacker].interrupt();
                }
            }
        }
    }

    /// Projectiles hit the first living non-owner they touch and disappear
    pub fn resolve_projectiles(
        projectiles: &mut Vec<Projectile>,
        actors: &mut [Actor],
        mut objective: Option<&mut ContestedObject>,
        events: &mut Vec<GameEvent>,
    ) {
        let mut spent: Vec<usize> = Vec::new();

        for (idx, projectile) in projectiles.iter().enumerate() {
            let hitbox = projectile.hitbox();
            let victim = actors
                .iter()
                .find(|a| {
                    a.id != projectile.owner && a.is_alive() && a.body_hitbox().overlaps(&hitbox)
                })
                .map(|a| a.id);

            let Some(target) = victim else {
                continue;
            };

            events.push(GameEvent::ProjectileHit {
                owner: projectile.owner,
                target,
                damage: projectile.damage,
            });
            Self::apply_damage(
                actors,
                target,
                projectile.damage,
                objective.as_deref_mut(),
                events,
            );
            spent.push(idx);
        }

        // Remove in reverse order to keep indices valid
        for idx in spent.into_iter().rev() {
            projectiles.remove(idx);
        }
    }
}
