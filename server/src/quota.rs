//! Per-player cell quotas for the current generation
//!
//! Every player may add a fixed number of cells per generation. The tracker
//! only counts; the game service decides when to check, record and reset so
//! that all three happen under the same lock as the board mutation.

use std::collections::HashMap;

/// Counts cell additions per player within one generation
///
/// Players are tracked lazily on their first addition. Resetting drops every
/// entry, so the map only ever holds players active in the current generation.
#[derive(Debug, Clone)]
pub struct QuotaTracker {
    /// Maximum additions per player per generation
    max_per_generation: u32,
    /// Additions so far this generation, by player identity
    used: HashMap<String, u32>,
}

impl QuotaTracker {
    pub fn new(max_per_generation: u32) -> Self {
        Self {
            max_per_generation,
            used: HashMap::new(),
        }
    }

    pub fn max_per_generation(&self) -> u32 {
        self.max_per_generation
    }

    /// Returns true if the player has at least one addition left
    pub fn can_add(&self, player_id: &str) -> bool {
        self.remaining(player_id) > 0
    }

    /// Charges one addition to the player
    ///
    /// Callers must have checked [`can_add`](Self::can_add) under the same
    /// lock. The count saturates at the maximum so the invariant holds even
    /// if that contract is broken.
    pub fn record_addition(&mut self, player_id: &str) {
        let max = self.max_per_generation;
        let used = self.used.entry(player_id.to_string()).or_insert(0);
        *used = (*used + 1).min(max);
    }

    /// Additions the player has left this generation
    ///
    /// Players never seen this generation report the full maximum.
    pub fn remaining(&self, player_id: &str) -> u32 {
        let used = self.used.get(player_id).copied().unwrap_or(0);
        self.max_per_generation.saturating_sub(used)
    }

    /// Forgets every player's usage. Called once per generation tick.
    pub fn reset_all(&mut self) {
        self.used.clear();
    }

    /// Number of players with at least one addition this generation
    pub fn tracked_players(&self) -> usize {
        self.used.len()
    }
}
