use thiserror::Error;

/// Failures of the game-service operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("cell ({x}, {y}) is outside the {width}x{height} board")]
    OutOfRange {
        x: i64,
        y: i64,
        width: usize,
        height: usize,
    },

    #[error("player {player_id} has used all {max} cells for this generation")]
    QuotaExceeded { player_id: String, max: u32 },

    #[error("initial board is {actual_width}x{actual_height}, expected {width}x{height}")]
    BoardSizeMismatch {
        width: usize,
        height: usize,
        actual_width: usize,
        actual_height: usize,
    },
}

impl GameError {
    /// True for errors caused by a malformed or disallowed request
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            GameError::OutOfRange { .. } | GameError::QuotaExceeded { .. }
        )
    }
}
