//! Request-level boundary between the transport and the game service
//!
//! The controller turns game snapshots into wire responses, maps game errors
//! onto response statuses and reports one activity per successful call.

use crate::activity::UserActivityRecorder;
use crate::game::{GameService, GameSnapshot};
use chrono::{NaiveDate, Utc};
use log::{debug, error, warn};
use shared::{preserialize, GameStateResponse, ResponseStatus};
use std::sync::Arc;

pub struct GameController {
    game: Arc<GameService>,
    activity: Arc<dyn UserActivityRecorder>,
}

impl GameController {
    pub fn new(game: Arc<GameService>, activity: Arc<dyn UserActivityRecorder>) -> Self {
        Self { game, activity }
    }

    pub fn game(&self) -> &Arc<GameService> {
        &self.game
    }

    /// State of the game for `player_id`. Never fails.
    pub async fn get_state(&self, player_id: &str) -> GameStateResponse {
        let snapshot = self.game.state(player_id).await;
        self.report_activity(player_id);
        to_response(&snapshot)
    }

    /// Adds a cell for `player_id` and returns the updated state
    ///
    /// Out-of-range coordinates and exhausted quotas are client errors.
    pub async fn add_cell(
        &self,
        x: i64,
        y: i64,
        player_id: &str,
    ) -> Result<GameStateResponse, ResponseStatus> {
        match self.game.add_cell(x, y, player_id).await {
            Ok(snapshot) => {
                self.report_activity(player_id);
                Ok(to_response(&snapshot))
            }
            Err(e) if e.is_client_error() => {
                debug!("Rejected cell from {}: {}", player_id, e);
                Err(ResponseStatus::BadRequest)
            }
            Err(e) => {
                error!("Failed to add cell for {}: {}", player_id, e);
                Err(ResponseStatus::InternalServerError)
            }
        }
    }

    /// Distinct players seen today (UTC)
    pub fn daily_active_users(&self) -> Result<(NaiveDate, usize), ResponseStatus> {
        let date = today();
        match self.activity.daily_active_users(date) {
            Ok(count) => Ok((date, count)),
            Err(e) => {
                error!("Failed to read daily active users: {}", e);
                Err(ResponseStatus::InternalServerError)
            }
        }
    }

    /// Drops activity from before yesterday
    pub fn prune_activity(&self) {
        let cutoff = today().pred_opt().unwrap_or(NaiveDate::MIN);
        if let Err(e) = self.activity.prune_before(cutoff) {
            warn!("Failed to prune activity log: {}", e);
        }
    }

    fn report_activity(&self, player_id: &str) {
        if let Err(e) = self.activity.report_user_activity(player_id, today()) {
            warn!("Failed to record activity for {}: {}", player_id, e);
        }
    }
}

/// Shapes a snapshot into the wire response, packing the board
pub fn to_response(snapshot: &GameSnapshot) -> GameStateResponse {
    GameStateResponse {
        living_cells: preserialize(&snapshot.board),
        generation: snapshot.generation,
        time_until_next_generation: snapshot.time_until_next_generation,
        next_generation_interval: snapshot.next_generation_interval,
        cells_left: snapshot.cells_left,
        max_cells_per_player_per_generation: snapshot.max_cells_per_player_per_generation,
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}
