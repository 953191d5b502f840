//! Logical input intents and the per-tick held-key snapshot

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Logical intents an actor reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Left,
    Right,
    Jump,
    Attack,
    Skill1,
    Skill2,
    Skill3,
}

impl Intent {
    pub const ALL: [Intent; 7] = [
        Intent::Left,
        Intent::Right,
        Intent::Jump,
        Intent::Attack,
        Intent::Skill1,
        Intent::Skill2,
        Intent::Skill3,
    ];
}

/// Immutable mapping from intents to the string keys that carry them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMap {
    pub left: String,
    pub right: String,
    pub jump: String,
    pub attack: String,
    pub skill1: String,
    pub skill2: String,
    pub skill3: String,
}

impl KeyMap {
    pub fn new(keys: [&str; 7]) -> Self {
        let [left, right, jump, attack, skill1, skill2, skill3] = keys;
        Self {
            left: left.to_string(),
            right: right.to_string(),
            jump: jump.to_string(),
            attack: attack.to_string(),
            skill1: skill1.to_string(),
            skill2: skill2.to_string(),
            skill3: skill3.to_string(),
        }
    }

    /// Keyboard layout of the human player
    pub fn player() -> Self {
        Self::new(["a", "d", "w", "f", "g", "h", "r"])
    }

    /// Layout of the n-th bot (1-based); every bot gets its own keys
    pub fn bot(n: usize) -> Self {
        match n {
            1 => Self::new(["j", "l", "i", "k", "7", "8", "9"]),
            2 => Self::new(["t", "y", "u", "z", "4", "5", "6"]),
            _ => Self::new(["n", "m", "o", "p", "1", "2", "3"]),
        }
    }

    pub fn key(&self, intent: Intent) -> &str {
        match intent {
            Intent::Left => &self.left,
            Intent::Right => &self.right,
            Intent::Jump => &self.jump,
            Intent::Attack => &self.attack,
            Intent::Skill1 => &self.skill1,
            Intent::Skill2 => &self.skill2,
            Intent::Skill3 => &self.skill3,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        Intent::ALL.into_iter().map(move |intent| self.key(intent))
    }
}

/// Held state of string-keyed inputs; last write wins
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    held: HashMap<String, bool>,
}

impl InputSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes keys to lowercase like the browser listener did
    pub fn set(&mut self, key: &str, held: bool) {
        self.held.insert(key.to_lowercase(), held);
    }

    pub fn is_held(&self, key: &str) -> bool {
        self.held.get(key).copied().unwrap_or(false)
    }

    pub fn intent(&self, keys: &KeyMap, intent: Intent) -> bool {
        self.is_held(keys.key(intent))
    }

    pub fn assert_intent(&mut self, keys: &KeyMap, intent: Intent) {
        self.set(keys.key(intent), true);
    }

    /// Release every key belonging to one actor
    pub fn clear_actor(&mut self, keys: &KeyMap) {
        for key in keys.keys() {
            self.set(key, false);
        }
    }

    pub fn clear(&mut self) {
        self.held.clear();
    }
}
