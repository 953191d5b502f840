//! Opponent selection for facing and bot decisions

use super::actor::Actor;
use super::objective::ContestedObject;
use super::ActorId;

/// How an actor picks the opponent it faces and chases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSelector {
    /// Duel: the one other actor, whatever its state
    FixedOpponent,
    /// Free-for-all: whoever carries the object, else the nearest living actor
    NearestWithPriority,
}

impl TargetSelector {
    pub fn select(
        &self,
        actors: &[Actor],
        me: ActorId,
        objective: Option<&ContestedObject>,
    ) -> Option<ActorId> {
        match self {
            TargetSelector::FixedOpponent => actors.iter().find(|a| a.id != me).map(|a| a.id),
            TargetSelector::NearestWithPriority => {
                let holder = objective.and_then(|o| o.holder);
                if let Some(holder) = holder.filter(|h| *h != me) {
                    if actors.get(holder.0).is_some_and(Actor::is_alive) {
                        return Some(holder);
                    }
                }
                nearest_living(actors, me)
            }
        }
    }

    /// X coordinate of the selected opponent, if any
    pub fn target_x(
        &self,
        actors: &[Actor],
        me: ActorId,
        objective: Option<&ContestedObject>,
    ) -> Option<f32> {
        self.select(actors, me, objective)
            .and_then(|id| actors.get(id.0))
            .map(|a| a.x)
    }
}

fn nearest_living(actors: &[Actor], me: ActorId) -> Option<ActorId> {
    let my_x = actors.get(me.0)?.x;
    actors
        .iter()
        .filter(|a| a.id != me && a.is_alive())
        .min_by(|a, b| (a.x - my_x).abs().total_cmp(&(b.x - my_x).abs()))
        .map(|a| a.id)
}
