//! Periodic task that advances the game one generation at each deadline

use crate::game::GameService;
use log::{error, info};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

/// Generations between summary log lines
const SUMMARY_INTERVAL: u64 = 60;

/// Handle to the running generation clock
///
/// The clock sleeps until the game's next deadline, runs the tick and
/// repeats. Shutdown is only observed while sleeping, so a tick that has
/// started always commits before the task exits.
pub struct GenerationClock {
    handle: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

impl GenerationClock {
    /// Starts the clock on the current tokio runtime
    pub fn spawn(game: Arc<GameService>) -> Self {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run_clock(game, shutdown_rx));
        info!("Generation clock started");
        Self { handle, shutdown }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stops the clock and waits for it to exit
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            error!("Generation clock task failed: {}", e);
        }
    }
}

async fn run_clock(game: Arc<GameService>, mut shutdown: watch::Receiver<bool>) {
    // Set after a failed tick, whose deadline was never rescheduled
    let mut retry_at: Option<Instant> = None;

    loop {
        let scheduled = game.next_generation_deadline().await;
        let deadline = retry_at.map_or(scheduled, |retry| retry.max(scheduled));

        tokio::select! {
            _ = sleep_until(deadline) => {}
            _ = shutdown.changed() => {
                info!("Generation clock stopped");
                break;
            }
        }

        // A panicking tick surfaces here as a JoinError
        let tick = {
            let game = Arc::clone(&game);
            tokio::spawn(async move { game.advance_generation().await })
        };

        match tick.await {
            Ok(generation) => {
                retry_at = None;
                if generation % SUMMARY_INTERVAL == 0 {
                    let stats = game.stats().await;
                    info!(
                        "Generation {}: {} live cells, {} players active this generation",
                        stats.generation, stats.live_cells, stats.tracked_players
                    );
                }
            }
            Err(e) => {
                error!("Generation tick failed, retrying next interval: {}", e);
                retry_at = Some(Instant::now() + game.next_generation_interval());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameSettings;
    use shared::Board;
    use std::time::Duration;
    use tokio::time::sleep;

    fn game(interval: Duration) -> Arc<GameService> {
        Arc::new(GameService::empty(GameSettings {
            width: 5,
            height: 5,
            next_generation_interval: interval,
            max_cells_per_player_per_generation: 2,
        }))
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_advances_once_per_interval() {
        let game = game(Duration::from_secs(1));
        let clock = GenerationClock::spawn(Arc::clone(&game));

        sleep(Duration::from_millis(3500)).await;
        assert_eq!(game.generation().await, 3);

        clock.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_time_until_next_generation_counts_down() {
        let game = game(Duration::from_secs(10));
        let clock = GenerationClock::spawn(Arc::clone(&game));

        sleep(Duration::from_secs(4)).await;
        let state = game.state("A").await;
        assert_eq!(state.generation, 0);
        assert_eq!(state.time_until_next_generation, Duration::from_secs(6));

        sleep(Duration::from_secs(7)).await;
        let state = game.state("A").await;
        assert_eq!(state.generation, 1);
        assert_eq!(state.time_until_next_generation, Duration::from_secs(9));

        clock.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_resets_quotas() {
        let game = game(Duration::from_secs(1));
        let clock = GenerationClock::spawn(Arc::clone(&game));

        game.add_cell(0, 0, "A").await.unwrap();
        game.add_cell(1, 0, "A").await.unwrap();
        assert!(game.add_cell(2, 0, "A").await.is_err());

        sleep(Duration::from_millis(1500)).await;

        assert_eq!(game.cells_left_for_player("A").await, 2);
        assert!(game.add_cell(2, 0, "A").await.is_ok());

        clock.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_notifies_each_generation() {
        let game = game(Duration::from_secs(1));
        let mut changes = game.subscribe();
        let clock = GenerationClock::spawn(Arc::clone(&game));

        assert_eq!(changes.recv().await.unwrap().generation, 1);
        assert_eq!(changes.recv().await.unwrap().generation, 2);

        clock.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_ticking() {
        let game = game(Duration::from_secs(1));
        let clock = GenerationClock::spawn(Arc::clone(&game));
        assert!(clock.is_running());

        sleep(Duration::from_millis(1500)).await;
        clock.shutdown().await;
        let stopped_at = game.generation().await;

        sleep(Duration::from_secs(10)).await;
        assert_eq!(stopped_at, 1);
        assert_eq!(game.generation().await, stopped_at);
    }

    #[tokio::test(start_paused = true)]
    async fn test_seeded_board_evolves_under_clock() {
        let blinker = Board::with_living_cells(5, 5, [(1, 2), (2, 2), (3, 2)]);
        let game = Arc::new(
            GameService::new(
                GameSettings {
                    width: 5,
                    height: 5,
                    next_generation_interval: Duration::from_secs(1),
                    max_cells_per_player_per_generation: 2,
                },
                blinker.clone(),
            )
            .unwrap(),
        );
        let clock = GenerationClock::spawn(Arc::clone(&game));

        sleep(Duration::from_millis(2500)).await;
        let state = game.state("A").await;
        assert_eq!(state.generation, 2);
        assert_eq!(state.board, blinker);

        clock.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_survives_failing_tick() {
        let blinker = Board::with_living_cells(5, 5, [(1, 2), (2, 2), (3, 2)]);
        let game = Arc::new(
            GameService::new(
                GameSettings {
                    width: 5,
                    height: 5,
                    next_generation_interval: Duration::from_secs(1),
                    max_cells_per_player_per_generation: 2,
                },
                blinker.clone(),
            )
            .unwrap(),
        );
        game.fail_next_tick();
        let clock = GenerationClock::spawn(Arc::clone(&game));

        sleep(Duration::from_millis(1500)).await;
        assert!(clock.is_running());
        let state = game.state("A").await;
        assert_eq!(state.generation, 0);
        assert_eq!(state.board, blinker);

        // Retried one interval after the failure
        sleep(Duration::from_secs(1)).await;
        let state = game.state("A").await;
        assert_eq!(state.generation, 1);
        assert_eq!(
            state.board,
            Board::with_living_cells(5, 5, [(2, 1), (2, 2), (2, 3)])
        );

        clock.shutdown().await;
    }
}
