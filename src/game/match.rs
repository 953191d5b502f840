//! Match state and the per-tick simulation pipeline

use std::fmt;
use std::str::FromStr;

use dashmap::DashMap;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::util::time::{frame_duration, FrameClock, SNAPSHOT_RATE};
use crate::ws::protocol::ServerMsg;

use super::actor::{Actor, ActorSpawn};
use super::bot::{BotPolicy, BotView, Difficulty};
use super::combat::CombatSystem;
use super::geometry::Rect;
use super::input::{InputSnapshot, KeyMap};
use super::objective::{ContestedObject, DEFAULT_CAPTURE_TIME_MS};
use super::projectile::Projectile;
use super::skills::SkillTable;
use super::snapshot::{self, SnapshotBuilder};
use super::targeting::TargetSelector;
use super::{ActorId, GameEvent, Stage};

pub const MAX_ACTORS: usize = 4;

/// Match variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// One human against one bot, fought to the last hit point
    Duel,
    /// Human plus three bots racing to hold the gold coin
    #[default]
    FreeForAll,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Duel => "duel",
            GameMode::FreeForAll => "free_for_all",
        }
    }

    pub fn actor_count(&self) -> usize {
        match self {
            GameMode::Duel => 2,
            GameMode::FreeForAll => MAX_ACTORS,
        }
    }

    pub fn target_selector(&self) -> TargetSelector {
        match self {
            GameMode::Duel => TargetSelector::FixedOpponent,
            GameMode::FreeForAll => TargetSelector::NearestWithPriority,
        }
    }

    pub fn bot_policy(&self, difficulty: Difficulty) -> BotPolicy {
        match self {
            GameMode::Duel => BotPolicy::Tiered(difficulty),
            GameMode::FreeForAll => BotPolicy::Simplified,
        }
    }

    pub fn skill_table(&self) -> SkillTable {
        match self {
            GameMode::Duel => SkillTable::duel(),
            GameMode::FreeForAll => SkillTable::free_for_all(),
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown game mode: {0} (expected duel or free_for_all)")]
pub struct ParseModeError(String);

impl FromStr for GameMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "duel" => Ok(GameMode::Duel),
            "free_for_all" | "ffa" => Ok(GameMode::FreeForAll),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}

/// Tunable constants; defaults reproduce the stock game
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuning {
    pub stage: Stage,
    pub capture_time_ms: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            stage: Stage::default(),
            capture_time_ms: DEFAULT_CAPTURE_TIME_MS,
        }
    }
}

/// Everything needed to (re)create a match
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchConfig {
    pub mode: GameMode,
    pub difficulty: Difficulty,
    /// Seed for the bots' random samples
    pub seed: u64,
    pub tuning: Tuning,
}

impl MatchConfig {
    pub fn new(mode: GameMode, difficulty: Difficulty, seed: u64) -> Self {
        Self {
            mode,
            difficulty,
            seed,
            tuning: Tuning::default(),
        }
    }
}

/// Terminal signal; `None` winner is a draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub winner: Option<ActorId>,
}

/// What one tick produced
#[derive(Debug, Default)]
pub struct TickReport {
    pub events: Vec<GameEvent>,
    pub outcome: Option<MatchOutcome>,
}

/// Authoritative state of one match
pub struct Match {
    pub id: Uuid,
    config: MatchConfig,
    stage: Stage,
    actors: Vec<Actor>,
    objective: Option<ContestedObject>,
    projectiles: Vec<Projectile>,
    input: InputSnapshot,
    selector: TargetSelector,
    policy: BotPolicy,
    rng: ChaCha8Rng,
    active: bool,
    last_tick_ms: Option<f64>,
    tick: u64,
    outcome: Option<MatchOutcome>,
}

/// Default roster: the human on the left, bots lined up from the right edge
fn roster(config: &MatchConfig, stage: &Stage) -> Vec<Actor> {
    let spawns = [
        ("Player", "#3498db", 50.0, false),
        ("Bot 1", "#e74c3c", stage.width - 50.0 - 40.0, true),
        ("Bot 2", "#ff7f7f", stage.width - 150.0 - 40.0, true),
        ("Bot 3", "#990000", stage.width - 250.0 - 40.0, true),
    ];

    spawns
        .into_iter()
        .take(config.mode.actor_count())
        .enumerate()
        .map(|(i, (name, color, x, is_bot))| {
            let keys = if is_bot {
                KeyMap::bot(i)
            } else {
                KeyMap::player()
            };
            Actor::new(
                ActorId(i),
                ActorSpawn {
                    name: name.to_string(),
                    color: color.to_string(),
                    x,
                    keys,
                    is_bot,
                },
                config.mode.skill_table(),
                stage,
            )
        })
        .collect()
}

impl Match {
    pub fn new(id: Uuid, config: MatchConfig) -> Self {
        let stage = config.tuning.stage;
        let objective = match config.mode {
            GameMode::FreeForAll => {
                Some(ContestedObject::new(&stage, config.tuning.capture_time_ms))
            }
            GameMode::Duel => None,
        };

        info!(
            match_id = %id,
            mode = %config.mode,
            difficulty = %config.difficulty,
            "Match created"
        );

        Self {
            id,
            stage,
            actors: roster(&config, &stage),
            objective,
            projectiles: Vec::new(),
            input: InputSnapshot::new(),
            selector: config.mode.target_selector(),
            policy: config.mode.bot_policy(config.difficulty),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            active: true,
            last_tick_ms: None,
            tick: 0,
            outcome: None,
            config,
        }
    }

    /// Recreate every entity and start over with the same configuration,
    /// bot randomness included
    pub fn restart(&mut self) {
        self.rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let stage = self.stage;
        self.actors = roster(&self.config, &stage);
        self.objective = match self.config.mode {
            GameMode::FreeForAll => Some(ContestedObject::new(
                &stage,
                self.config.tuning.capture_time_ms,
            )),
            GameMode::Duel => None,
        };
        self.projectiles.clear();
        self.input.clear();
        self.active = true;
        self.last_tick_ms = None;
        self.tick = 0;
        self.outcome = None;
        info!(match_id = %self.id, "Match restarted");
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(id.0)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(id.0)
    }

    pub fn objective(&self) -> Option<&ContestedObject> {
        self.objective.as_ref()
    }

    pub fn objective_mut(&mut self) -> Option<&mut ContestedObject> {
        self.objective.as_mut()
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn spawn_projectile(&mut self, projectile: Projectile) {
        self.projectiles.push(projectile);
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Halt the match without an outcome
    pub fn stop(&mut self) {
        self.active = false;
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn outcome(&self) -> Option<MatchOutcome> {
        self.outcome
    }

    /// Host-facing input: record a key as held or released
    pub fn set_key(&mut self, key: &str, held: bool) {
        self.input.set(key, held);
    }

    pub fn input(&self) -> &InputSnapshot {
        &self.input
    }

    /// Opponent x the actor currently faces
    pub fn facing_target_x(&self, id: ActorId) -> Option<f32> {
        self.selector.target_x(&self.actors, id, self.objective.as_ref())
    }

    /// Current damage volume of an actor, for display
    pub fn attack_hitbox(&self, id: ActorId) -> Option<Rect> {
        let actor = self.actor(id)?;
        actor.attack_hitbox(self.facing_target_x(id), &self.stage)
    }

    /// Advance using a host timestamp in milliseconds; the first call only primes the clock
    pub fn tick(&mut self, now_ms: f64) -> TickReport {
        let dt_ms = match self.last_tick_ms {
            Some(last) => (now_ms - last) as f32,
            None => 0.0,
        };
        self.last_tick_ms = Some(now_ms);
        self.advance(dt_ms)
    }

    /// Run one tick of `dt_ms` milliseconds
    pub fn advance(&mut self, dt_ms: f32) -> TickReport {
        let mut report = TickReport::default();
        if !self.active {
            return report;
        }
        self.tick += 1;

        // bots only ever write into this tick's copy
        let mut frame = self.input.clone();
        for i in 0..self.actors.len() {
            self.update_actor(ActorId(i), dt_ms, &mut frame, &mut report.events);
        }

        self.update_world(dt_ms, &mut report.events);

        CombatSystem::resolve_attacks(
            &mut self.actors,
            self.selector,
            self.objective.as_mut(),
            &self.stage,
            &mut report.events,
        );
        CombatSystem::resolve_projectiles(
            &mut self.projectiles,
            &mut self.actors,
            self.objective.as_mut(),
            &mut report.events,
        );

        if let Some(outcome) = self.check_outcome() {
            self.active = false;
            self.outcome = Some(outcome);
            report.events.push(GameEvent::MatchOver {
                winner: outcome.winner,
            });
            let winner = outcome
                .winner
                .and_then(|id| self.actor(id))
                .map(|a| a.name.as_str())
                .unwrap_or("none");
            info!(match_id = %self.id, tick = self.tick, winner, "Match over");
            report.outcome = Some(outcome);
        }

        report
    }

    fn update_actor(
        &mut self,
        id: ActorId,
        dt_ms: f32,
        frame: &mut InputSnapshot,
        events: &mut Vec<GameEvent>,
    ) {
        let carrying = self.objective.as_ref().is_some_and(|o| o.is_held_by(id));
        let actor = &mut self.actors[id.0];
        actor.apply_carry(carrying);
        actor.tick_timers(dt_ms);

        if self.actors[id.0].is_bot {
            let sample: f64 = self.rng.gen();
            let target = self
                .selector
                .select(&self.actors, id, self.objective.as_ref())
                .and_then(|t| self.actors.get(t.0));
            let view = BotView {
                me: &self.actors[id.0],
                target,
                objective: self.objective.as_ref(),
                stage: &self.stage,
            };
            self.policy.decide(view, sample, frame);
        }

        let actor = &mut self.actors[id.0];
        let activated = actor.resolve_input(frame, dt_ms);
        actor.integrate(dt_ms, &self.stage);

        let Some(skill) = activated else {
            return;
        };
        events.push(GameEvent::SkillUsed { actor: id, skill });

        let spawns = self.actors[id.0]
            .skills
            .get(skill)
            .is_some_and(|spec| spec.spawns_projectile);
        if spawns {
            let shooter = &self.actors[id.0];
            let facing_right = shooter.facing_right(self.facing_target_x(id), &self.stage);
            let projectile = Projectile::launch(shooter, facing_right);
            events.push(GameEvent::ProjectileSpawned {
                owner: id,
                x: projectile.x,
                y: projectile.y,
                direction: projectile.direction,
            });
            self.projectiles.push(projectile);
        }
    }

    /// Carry the contested object and move projectiles
    fn update_world(&mut self, dt_ms: f32, events: &mut Vec<GameEvent>) {
        if let Some(objective) = self.objective.as_mut() {
            if let Some(taker) = objective.update(dt_ms, &self.actors) {
                debug!(match_id = %self.id, actor = taker.0, "Objective picked up");
                events.push(GameEvent::ObjectivePickedUp { actor: taker });
            }
        }

        let stage = self.stage;
        self.projectiles.retain_mut(|p| p.update(dt_ms, &stage));
    }

    fn check_outcome(&self) -> Option<MatchOutcome> {
        match self.config.mode {
            GameMode::Duel => {
                if self.actors.iter().all(Actor::is_alive) {
                    return None;
                }
                let winner = self.actors.iter().find(|a| a.is_alive()).map(|a| a.id);
                Some(MatchOutcome { winner })
            }
            GameMode::FreeForAll => {
                let objective = self.objective.as_ref()?;
                if objective.is_captured() {
                    Some(MatchOutcome {
                        winner: objective.holder,
                    })
                } else {
                    None
                }
            }
        }
    }
}

/// Commands a session sends to its running match
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchCommand {
    Key { key: String, held: bool },
    Restart,
    Stop,
}

/// Handle to a running match
#[derive(Clone)]
pub struct MatchHandle {
    pub id: Uuid,
    pub config: MatchConfig,
    pub input_tx: mpsc::Sender<MatchCommand>,
    pub snapshot_tx: broadcast::Sender<ServerMsg>,
}

impl MatchHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMsg> {
        self.snapshot_tx.subscribe()
    }
}

/// Registry of all active matches
pub struct MatchRegistry {
    matches: DashMap<Uuid, MatchHandle>,
}

impl MatchRegistry {
    pub fn new() -> Self {
        Self {
            matches: DashMap::new(),
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<MatchHandle> {
        self.matches.get(id).map(|m| m.value().clone())
    }

    pub fn insert(&self, handle: MatchHandle) {
        self.matches.insert(handle.id, handle);
    }

    pub fn remove(&self, id: &Uuid) -> Option<MatchHandle> {
        self.matches.remove(id).map(|(_, h)| h)
    }

    pub fn active_matches(&self) -> usize {
        self.matches.len()
    }
}

impl Default for MatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A match driven by a tokio interval, fed by a command channel
pub struct GameMatch {
    state: Match,
    input_rx: mpsc::Receiver<MatchCommand>,
    snapshot_tx: broadcast::Sender<ServerMsg>,
    snapshot_builder: SnapshotBuilder,
    frame_rate: u32,
    pending_events: Vec<GameEvent>,
}

impl GameMatch {
    pub fn new(id: Uuid, config: MatchConfig, frame_rate: u32) -> (Self, MatchHandle) {
        let (input_tx, input_rx) = mpsc::channel(256);
        let (snapshot_tx, _) = broadcast::channel(64);

        let handle = MatchHandle {
            id,
            config,
            input_tx,
            snapshot_tx: snapshot_tx.clone(),
        };

        let snapshot_interval = (frame_rate / SNAPSHOT_RATE).max(1);
        let game_match = Self {
            state: Match::new(id, config),
            input_rx,
            snapshot_tx,
            snapshot_builder: SnapshotBuilder::new(snapshot_interval),
            frame_rate,
            pending_events: Vec::new(),
        };

        (game_match, handle)
    }

    pub fn state(&self) -> &Match {
        &self.state
    }

    /// `match_started` message describing the current roster
    pub fn describe(&self) -> ServerMsg {
        snapshot::match_started(&self.state)
    }

    /// Run the tick loop until stopped or every handle is dropped
    pub async fn run(mut self) {
        info!(match_id = %self.state.id, frame_rate = self.frame_rate, "Match loop started");

        let mut tick_interval = interval(frame_duration(self.frame_rate));
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut clock = FrameClock::new();

        loop {
            tick_interval.tick().await;

            if !self.process_inputs(&mut clock) {
                break;
            }

            let dt_ms = clock.lap_ms();
            if !self.state.is_active() {
                continue;
            }

            let report = self.state.advance(dt_ms);
            self.pending_events.extend(report.events);
            if report.outcome.is_some() {
                self.snapshot_builder.force_next();
            }

            if self.snapshot_builder.should_send() {
                let events = std::mem::take(&mut self.pending_events);
                let snapshot = self.snapshot_builder.build(&self.state, events);
                // No receivers is fine: the session may be between subscriptions
                let _ = self.snapshot_tx.send(snapshot);
            }

            if let Some(outcome) = report.outcome {
                let winner_name = outcome
                    .winner
                    .and_then(|id| self.state.actor(id))
                    .map(|a| a.name.clone());
                let _ = self.snapshot_tx.send(ServerMsg::MatchOver {
                    winner: outcome.winner,
                    winner_name,
                });
            }
        }

        info!(match_id = %self.state.id, ticks = self.state.tick_count(), "Match loop stopped");
    }

    /// Drain queued commands; returns false once the loop should exit
    fn process_inputs(&mut self, clock: &mut FrameClock) -> bool {
        loop {
            match self.input_rx.try_recv() {
                Ok(MatchCommand::Key { key, held }) => self.state.set_key(&key, held),
                Ok(MatchCommand::Restart) => {
                    self.state.restart();
                    self.pending_events.clear();
                    clock.reset();
                    let _ = self.snapshot_tx.send(self.describe());
                }
                Ok(MatchCommand::Stop) => return false,
                Err(mpsc::error::TryRecvError::Empty) => return true,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    warn!(match_id = %self.state.id, "All handles dropped");
                    return false;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::actor::Action;
    use crate::game::input::Intent;
    use crate::game::skills::SkillKind;

    fn duel() -> Match {
        Match::new(Uuid::new_v4(), MatchConfig::new(GameMode::Duel, Difficulty::Hard, 7))
    }

    fn free_for_all() -> Match {
        Match::new(
            Uuid::new_v4(),
            MatchConfig::new(GameMode::FreeForAll, Difficulty::Normal, 7),
        )
    }

    #[test]
    fn parses_modes() {
        assert_eq!("duel".parse::<GameMode>().ok(), Some(GameMode::Duel));
        assert_eq!("free-for-all".parse::<GameMode>().ok(), Some(GameMode::FreeForAll));
        assert_eq!("FFA".parse::<GameMode>().ok(), Some(GameMode::FreeForAll));
        assert!("coop".parse::<GameMode>().is_err());
    }

    #[test]
    fn roster_sizes_follow_mode() {
        let duel = duel();
        assert_eq!(duel.actors().len(), 2);
        assert!(duel.objective().is_none());
        assert!(!duel.actors()[0].is_bot);
        assert!(duel.actors()[1].is_bot);

        let ffa = free_for_all();
        assert_eq!(ffa.actors().len(), 4);
        assert!(ffa.objective().is_some());
        assert_eq!(ffa.actors()[3].x, 800.0 - 290.0);
    }

    #[test]
    fn first_tick_only_primes_the_clock() {
        let mut m = duel();
        let before = m.actors()[0].cooldown(SkillKind::Attack);
        m.tick(1_000.0);
        assert_eq!(m.actors()[0].cooldown(SkillKind::Attack), before);
        m.tick(1_016.0);
        assert_eq!(m.actors()[0].cooldown(SkillKind::Attack), before - 16.0);
    }

    #[test]
    fn human_input_moves_the_player() {
        let mut m = duel();
        m.set_key("d", true);
        m.advance(16.0);
        assert_eq!(m.actors()[0].x, 55.0);
        m.set_key("D", false);
        m.advance(16.0);
        assert_eq!(m.actors()[0].x, 55.0);
    }

    #[test]
    fn bots_do_not_leak_into_global_input() {
        let mut m = free_for_all();
        for _ in 0..30 {
            m.advance(16.0);
        }
        let keys: Vec<KeyMap> = m.actors().iter().map(|a| a.keys.clone()).collect();
        for map in keys.iter().skip(1) {
            for intent in Intent::ALL {
                assert!(!m.input().intent(map, intent));
            }
        }
    }

    #[test]
    fn duel_ends_when_health_reaches_zero() {
        let mut m = duel();
        if let Some(bot) = m.actor_mut(ActorId(1)) {
            bot.health = 1.0;
        }
        assert!(m.advance(16.0).outcome.is_none());

        // put the player in reach with a ready jab
        let target_x = m.actors()[1].x;
        if let Some(player) = m.actor_mut(ActorId(0)) {
            player.x = target_x - 45.0;
            player.tick_timers(10_000.0);
        }
        m.set_key("f", true);
        let report = m.advance(16.0);

        assert_eq!(report.outcome, Some(MatchOutcome { winner: Some(ActorId(0)) }));
        assert!(report.events.contains(&GameEvent::MatchOver { winner: Some(ActorId(0)) }));
        assert!(!m.is_active());

        // inactive matches ignore further ticks
        let after = m.advance(16.0);
        assert!(after.events.is_empty());
        assert_eq!(m.tick_count(), 2);
    }

    #[test]
    fn capture_win_fires_exactly_at_threshold() {
        let mut m = free_for_all();
        // freeze the bots far from the player so nobody interferes
        for i in 1..4 {
            if let Some(bot) = m.actor_mut(ActorId(i)) {
                bot.is_bot = false;
            }
        }
        if let Some(coin) = m.objective_mut() {
            coin.holder = Some(ActorId(0));
        }

        let mut elapsed = 0.0;
        while elapsed < 30_000.0 - 16.0 {
            let report = m.advance(16.0);
            elapsed += 16.0;
            assert!(report.outcome.is_none(), "ended early at {elapsed}ms");
        }
        let last = 30_000.0 - elapsed;
        let report = m.advance(last);
        assert_eq!(report.outcome, Some(MatchOutcome { winner: Some(ActorId(0)) }));
    }

    #[test]
    fn projectile_skill_spawns_toward_opponent() {
        let mut m = duel();
        if let Some(player) = m.actor_mut(ActorId(0)) {
            player.tick_timers(10_000.0);
        }
        m.set_key("h", true);
        let report = m.advance(16.0);

        assert!(report.events.contains(&GameEvent::SkillUsed {
            actor: ActorId(0),
            skill: SkillKind::Skill2,
        }));
        assert_eq!(m.projectiles().len(), 1);
        assert_eq!(m.projectiles()[0].direction, 1.0);
        assert_eq!(m.actors()[0].action, Action::Skill2);
    }

    #[test]
    fn restart_resets_everything() {
        let mut m = free_for_all();
        if let Some(coin) = m.objective_mut() {
            coin.holder = Some(ActorId(0));
        }
        for _ in 0..10 {
            m.advance(16.0);
        }
        m.set_key("a", true);
        m.stop();

        m.restart();

        assert!(m.is_active());
        assert_eq!(m.tick_count(), 0);
        assert!(!m.input().is_held("a"));
        let coin = m.objective().unwrap();
        assert!(!coin.is_held());
        assert_eq!(coin.capture_time_ms, 0.0);
        assert_eq!(m.actors()[0].cooldown(SkillKind::Attack), 500.0);
    }

    #[test]
    fn registry_tracks_handles() {
        let registry = MatchRegistry::new();
        let id = Uuid::new_v4();
        let config = MatchConfig::new(GameMode::Duel, Difficulty::Easy, 3);
        let (_game, handle) = GameMatch::new(id, config, 60);
        registry.insert(handle);
        assert_eq!(registry.active_matches(), 1);
        assert!(registry.get(&id).is_some());
        assert!(registry.remove(&id).is_some());
        assert_eq!(registry.active_matches(), 0);
    }

    #[tokio::test]
    async fn runner_streams_snapshots_and_stops() {
        let config = MatchConfig::new(GameMode::FreeForAll, Difficulty::Normal, 11);
        let (game, handle) = GameMatch::new(Uuid::new_v4(), config, 60);
        let mut rx = handle.subscribe();
        let task = tokio::spawn(game.run());

        handle
            .input_tx
            .send(MatchCommand::Key {
                key: "d".to_string(),
                held: true,
            })
            .await
            .unwrap();

        let mut saw_snapshot = false;
        while !saw_snapshot {
            if let ServerMsg::Snapshot { actors, .. } = rx.recv().await.unwrap() {
                assert_eq!(actors.len(), 4);
                saw_snapshot = true;
            }
        }

        handle.input_tx.send(MatchCommand::Stop).await.unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(1), task)
            .await
            .expect("loop exits after stop")
            .unwrap();
    }

    #[tokio::test]
    async fn restart_announces_the_roster_again() {
        let config = MatchConfig::new(GameMode::Duel, Difficulty::Easy, 5);
        let (game, handle) = GameMatch::new(Uuid::new_v4(), config, 60);
        let mut rx = handle.subscribe();
        let task = tokio::spawn(game.run());

        handle.input_tx.send(MatchCommand::Restart).await.unwrap();
        loop {
            if let ServerMsg::MatchStarted { match_id, .. } = rx.recv().await.unwrap() {
                assert_eq!(match_id, handle.id);
                break;
            }
        }

        drop(rx);
        drop(handle);
        tokio::time::timeout(std::time::Duration::from_secs(1), task)
            .await
            .expect("loop exits once every handle is gone")
            .unwrap();
    }

    #[test]
    fn restart_replays_like_a_fresh_match() {
        let config = MatchConfig::new(GameMode::FreeForAll, Difficulty::Normal, 99);
        let mut fresh = Match::new(Uuid::new_v4(), config);
        let mut restarted = Match::new(Uuid::new_v4(), config);
        for _ in 0..200 {
            restarted.advance(16.0);
        }
        restarted.restart();

        for _ in 0..300 {
            assert_eq!(fresh.advance(16.0).events, restarted.advance(16.0).events);
        }
        for (a, b) in fresh.actors().iter().zip(restarted.actors()) {
            assert_eq!((a.x, a.y, a.health), (b.x, b.y, b.health));
        }
    }
}
