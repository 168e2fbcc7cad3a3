//! # Life Arena Server Library
//!
//! Authoritative server for a shared Game of Life board. Players add cells
//! to one board over UDP; the board advances to its next generation on a
//! fixed timer; each player may add a limited number of cells per generation.
//!
//! ## Core
//!
//! ### Game Module (`game`)
//! Owns the board, the generation counter, the per-player quotas and the
//! next-generation deadline behind a single lock:
//! - `state` returns a fully committed snapshot for one player
//! - `add_cell` validates bounds and quota and mutates in the same critical section
//! - `advance_generation` steps the board, resets quotas and reschedules, atomically
//! - `subscribe` yields a notification after every committed tick
//!
//! ### Clock Module (`clock`)
//! A long-lived task that sleeps until the game's deadline and runs the tick.
//! It stops between ticks on shutdown and logs and survives a failing tick.
//!
//! ### Life and Quota Modules (`life`, `quota`)
//! The pure Life transition over a bounded board (edges are dead) and the
//! per-generation addition counters.
//!
//! ## Boundary
//!
//! ### Controller Module (`controller`)
//! Maps snapshots to bit-packed `GameStateResponse`s, game errors to
//! `ResponseStatus`, and reports each successful call to the activity tracker.
//!
//! ### Network Module (`network`)
//! UDP datagrams carrying `bincode`-encoded `shared::Packet`s. Requests are
//! answered from their own task; subscribers receive `GenerationChanged`
//! pushes and re-fetch state themselves.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::activity::DailyActivityLog;
//! use server::clock::GenerationClock;
//! use server::controller::GameController;
//! use server::game::{GameService, GameSettings};
//! use server::network::Server;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let game = Arc::new(GameService::empty(GameSettings {
//!         width: 100,
//!         height: 100,
//!         next_generation_interval: Duration::from_secs(5),
//!         max_cells_per_player_per_generation: 10,
//!     }));
//!     let clock = GenerationClock::spawn(Arc::clone(&game));
//!
//!     let controller = Arc::new(GameController::new(game, Arc::new(DailyActivityLog::new())));
//!     let mut server = Server::new("127.0.0.1:8080", controller, 256).await?;
//!
//!     let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!     server.run(shutdown_rx).await?;
//!     clock.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod activity;
pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod game;
pub mod life;
pub mod network;
pub mod quota;
pub mod subscribers;
