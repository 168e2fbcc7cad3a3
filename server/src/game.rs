//! Authoritative board, generation counter and quotas
//!
//! Everything mutable lives in one [`GameCore`] behind a single lock. Each
//! public operation takes the lock once, so readers only ever see fully
//! committed generations and the quota check of an addition can never be
//! separated from its board write.

use crate::error::GameError;
use crate::life;
use crate::quota::QuotaTracker;
use log::{debug, info};
use shared::Board;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::time::Instant;

/// Capacity of the generation-change channel before slow subscribers lag
const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// Fixed rules of one game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSettings {
    pub width: usize,
    pub height: usize,
    pub next_generation_interval: Duration,
    pub max_cells_per_player_per_generation: u32,
}

/// Consistent view of the game for one player
#[derive(Debug, Clone, PartialEq)]
pub struct GameSnapshot {
    pub board: Board,
    pub generation: u64,
    pub time_until_next_generation: Duration,
    pub next_generation_interval: Duration,
    pub cells_left: u32,
    pub max_cells_per_player_per_generation: u32,
}

/// Fired after every committed tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationChanged {
    pub generation: u64,
}

/// Diagnostics for periodic logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameStats {
    pub generation: u64,
    pub live_cells: usize,
    pub tracked_players: usize,
}

#[derive(Debug)]
struct GameCore {
    board: Board,
    generation: u64,
    quotas: QuotaTracker,
    next_generation_at: Instant,
}

impl GameCore {
    fn snapshot(&self, player_id: &str, interval: Duration) -> GameSnapshot {
        GameSnapshot {
            board: self.board.clone(),
            generation: self.generation,
            time_until_next_generation: self
                .next_generation_at
                .saturating_duration_since(Instant::now()),
            next_generation_interval: interval,
            cells_left: self.quotas.remaining(player_id),
            max_cells_per_player_per_generation: self.quotas.max_per_generation(),
        }
    }
}

/// Shared handle to one running game
///
/// Every operation is async because it waits for the core lock. Readers
/// share the lock; `add_cell` and `advance_generation` take it exclusively,
/// which serializes additions against ticks.
pub struct GameService {
    core: RwLock<GameCore>,
    settings: GameSettings,
    changes: broadcast::Sender<GenerationChanged>,
    #[cfg(test)]
    fail_next_tick: std::sync::atomic::AtomicBool,
}

impl GameService {
    /// Creates a game at generation 0 whose first tick is due one interval from now
    pub fn new(settings: GameSettings, initial: Board) -> Result<Self, GameError> {
        if initial.width() != settings.width || initial.height() != settings.height {
            return Err(GameError::BoardSizeMismatch {
                width: settings.width,
                height: settings.height,
                actual_width: initial.width(),
                actual_height: initial.height(),
            });
        }

        Ok(Self::build(settings, initial))
    }

    /// Creates a game on an empty board
    pub fn empty(settings: GameSettings) -> Self {
        let board = Board::new(settings.width, settings.height);
        Self::build(settings, board)
    }

    fn build(settings: GameSettings, initial: Board) -> Self {
        info!(
            "Game created: {}x{} board, {} live cells, {:?} per generation, {} cells per player",
            settings.width,
            settings.height,
            initial.live_count(),
            settings.next_generation_interval,
            settings.max_cells_per_player_per_generation
        );

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let core = GameCore {
            board: initial,
            generation: 0,
            quotas: QuotaTracker::new(settings.max_cells_per_player_per_generation),
            next_generation_at: Instant::now() + settings.next_generation_interval,
        };

        Self {
            core: RwLock::new(core),
            settings,
            changes,
            #[cfg(test)]
            fail_next_tick: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Fixed time between two ticks
    ///
    /// The clock also uses it to delay the retry after a failed tick.
    pub fn next_generation_interval(&self) -> Duration {
        self.settings.next_generation_interval
    }

    /// Makes the next tick panic after stepping but before committing
    #[cfg(test)]
    pub(crate) fn fail_next_tick(&self) {
        self.fail_next_tick
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }

    /// Current state as seen by `player_id`
    pub async fn state(&self, player_id: &str) -> GameSnapshot {
        let core = self.core.read().await;
        core.snapshot(player_id, self.settings.next_generation_interval)
    }

    /// Brings the cell at `(x, y)` to life and charges one unit of quota
    ///
    /// Re-adding a living cell succeeds and still costs quota. On failure
    /// neither the board nor the quota changes.
    pub async fn add_cell(&self, x: i64, y: i64, player_id: &str) -> Result<GameSnapshot, GameError> {
        let mut core = self.core.write().await;

        if !core.board.contains(x, y) {
            return Err(GameError::OutOfRange {
                x,
                y,
                width: core.board.width(),
                height: core.board.height(),
            });
        }

        if !core.quotas.can_add(player_id) {
            return Err(GameError::QuotaExceeded {
                player_id: player_id.to_string(),
                max: core.quotas.max_per_generation(),
            });
        }

        core.board.set(x as usize, y as usize, true);
        core.quotas.record_addition(player_id);
        debug!(
            "Player {} added cell ({}, {}) in generation {}",
            player_id, x, y, core.generation
        );

        Ok(core.snapshot(player_id, self.settings.next_generation_interval))
    }

    /// Additions `player_id` may still make in the current generation
    ///
    /// Players that have not added anything yet report the full quota.
    pub async fn cells_left_for_player(&self, player_id: &str) -> u32 {
        self.core.read().await.quotas.remaining(player_id)
    }

    /// Number of ticks committed so far; the initial board is generation 0
    pub async fn generation(&self) -> u64 {
        self.core.read().await.generation
    }

    /// When the next tick is due
    pub async fn next_generation_deadline(&self) -> Instant {
        self.core.read().await.next_generation_at
    }

    /// Runs one tick: steps the board, resets quotas, bumps the generation
    /// and schedules the next deadline, all under one write lock
    pub async fn advance_generation(&self) -> u64 {
        let generation = {
            let mut core = self.core.write().await;
            // Nothing is written until the step has completed
            let next = life::step(&core.board);

            #[cfg(test)]
            if self
                .fail_next_tick
                .swap(false, std::sync::atomic::Ordering::SeqCst)
            {
                panic!("tick failed at generation {}", core.generation);
            }

            core.board = next;
            core.generation += 1;
            core.quotas.reset_all();
            core.next_generation_at = Instant::now() + self.settings.next_generation_interval;
            core.generation
        };

        debug!("Advanced to generation {}", generation);

        // No receivers is not an error
        let _ = self.changes.send(GenerationChanged { generation });

        generation
    }

    /// Receives a [`GenerationChanged`] after every tick
    pub fn subscribe(&self) -> broadcast::Receiver<GenerationChanged> {
        self.changes.subscribe()
    }

    /// Counters for the periodic summary log
    ///
    /// `tracked_players` only counts players who added a cell since the
    /// last tick, because each tick clears the quota map.
    pub async fn stats(&self) -> GameStats {
        let core = self.core.read().await;
        GameStats {
            generation: core.generation,
            live_cells: core.board.live_count(),
            tracked_players: core.quotas.tracked_players(),
        }
    }
}
