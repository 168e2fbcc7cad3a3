pub mod bitboard;
pub mod board;

pub use bitboard::{preserialize, restore, CodecError, PackedBoard};
pub use board::Board;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BOARD_WIDTH: usize = 100;
pub const DEFAULT_BOARD_HEIGHT: usize = 100;
pub const DEFAULT_GENERATION_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_CELLS_PER_PLAYER_PER_GENERATION: u32 = 10;

/// Largest UDP payload a response may occupy
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Packet {
    GetState {
        player_id: String,
    },
    AddCell {
        player_id: String,
        x: i64,
        y: i64,
    },
    Subscribe,
    Unsubscribe,
    GetDailyActiveUsers,

    GameState(GameStateResponse),
    Rejected {
        status: ResponseStatus,
    },
    GenerationChanged {
        generation: u64,
    },
    DailyActiveUsers {
        date: NaiveDate,
        count: usize,
    },
}

/// Snapshot of the game as seen by one player
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GameStateResponse {
    pub living_cells: PackedBoard,
    pub generation: u64,
    pub time_until_next_generation: Duration,
    pub next_generation_interval: Duration,
    pub cells_left: u32,
    pub max_cells_per_player_per_generation: u32,
}

/// Status signal for a request that produced no game state
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    BadRequest,
    InternalServerError,
}

impl ResponseStatus {
    pub fn is_client_error(&self) -> bool {
        matches!(self, ResponseStatus::BadRequest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_response() -> GameStateResponse {
        let board = Board::with_living_cells(2, 2, [(0, 0)]);
        GameStateResponse {
            living_cells: preserialize(&board),
            generation: 42,
            time_until_next_generation: Duration::from_secs(5),
            next_generation_interval: Duration::from_secs(5),
            cells_left: 5,
            max_cells_per_player_per_generation: 10,
        }
    }

    #[test]
    fn test_packet_serialization_add_cell() {
        let packet = Packet::AddCell {
            player_id: "John Doe".to_string(),
            x: -1,
            y: 7,
        };
        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::AddCell { player_id, x, y } => {
                assert_eq!(player_id, "John Doe");
                assert_eq!(x, -1);
                assert_eq!(y, 7);
            }
            _ => panic!("Wrong packet type after deserialization"),
        }
    }

    #[test]
    fn test_packet_serialization_game_state() {
        let packet = Packet::GameState(sample_response());
        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::GameState(response) => {
                assert_eq!(response.generation, 42);
                assert_eq!(response.cells_left, 5);
                assert_eq!(response.max_cells_per_player_per_generation, 10);
                assert_eq!(response.time_until_next_generation, Duration::from_secs(5));
                let board = restore(&response.living_cells).unwrap();
                assert!(board.get(0, 0));
                assert_eq!(board.live_count(), 1);
            }
            _ => panic!("Wrong packet type after deserialization"),
        }
    }

    #[test]
    fn test_default_board_fits_one_datagram() {
        let board = Board::new(DEFAULT_BOARD_WIDTH, DEFAULT_BOARD_HEIGHT);
        let mut response = sample_response();
        response.living_cells = preserialize(&board);

        let serialized = bincode::serialize(&Packet::GameState(response)).unwrap();
        assert!(serialized.len() < MAX_DATAGRAM_SIZE);
    }

    #[test]
    fn test_response_status_classification() {
        assert!(ResponseStatus::BadRequest.is_client_error());
        assert!(!ResponseStatus::InternalServerError.is_client_error());
    }
}
