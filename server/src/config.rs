//! Command-line configuration for the server binary

use crate::game::GameSettings;
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{
    Board, PackedBoard, DEFAULT_BOARD_HEIGHT, DEFAULT_BOARD_WIDTH,
    DEFAULT_MAX_CELLS_PER_PLAYER_PER_GENERATION, MAX_DATAGRAM_SIZE,
};
use std::time::Duration;
use thiserror::Error;

/// Upper bound on the non-board bytes of an encoded `GameState` packet
const RESPONSE_OVERHEAD: usize = 128;

/// Command line arguments
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    pub host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    /// Board width in cells
    #[arg(long, default_value_t = DEFAULT_BOARD_WIDTH)]
    pub width: usize,

    /// Board height in cells
    #[arg(long, default_value_t = DEFAULT_BOARD_HEIGHT)]
    pub height: usize,

    /// Milliseconds between generations
    #[arg(short, long, default_value = "5000")]
    pub interval_ms: u64,

    /// Cells each player may add per generation
    #[arg(short, long, default_value_t = DEFAULT_MAX_CELLS_PER_PLAYER_PER_GENERATION)]
    pub max_cells: u32,

    /// Maximum addresses receiving generation pushes
    #[arg(long, default_value = "256")]
    pub max_subscribers: usize,

    /// Fraction of cells alive on the initial board
    #[arg(long, default_value = "0.0")]
    pub seed_density: f64,

    /// Seed for the initial board; random if omitted
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("board dimensions must be non-zero, got {width}x{height}")]
    EmptyBoard { width: usize, height: usize },

    #[error("generation interval must be non-zero")]
    ZeroInterval,

    #[error("players must be allowed at least one cell per generation")]
    ZeroQuota,

    #[error("seed density must be between 0 and 1, got {0}")]
    InvalidDensity(f64),

    #[error("a {width}x{height} board needs {bytes} bytes per response, more than one datagram ({max})")]
    BoardTooLarge {
        width: usize,
        height: usize,
        bytes: usize,
        max: usize,
    },
}

/// Validated server configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind_address: String,
    pub game: GameSettings,
    pub max_subscribers: usize,
    pub seed_density: f64,
    pub seed: Option<u64>,
}

impl ServerConfig {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        if args.width == 0 || args.height == 0 {
            return Err(ConfigError::EmptyBoard {
                width: args.width,
                height: args.height,
            });
        }

        let bytes = args
            .width
            .checked_mul(args.height)
            .map(|cells| cells.div_ceil(8) + RESPONSE_OVERHEAD)
            .unwrap_or(usize::MAX);
        if bytes > MAX_DATAGRAM_SIZE {
            return Err(ConfigError::BoardTooLarge {
                width: args.width,
                height: args.height,
                bytes,
                max: MAX_DATAGRAM_SIZE,
            });
        }

        if args.interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }

        if args.max_cells == 0 {
            return Err(ConfigError::ZeroQuota);
        }

        if !(0.0..=1.0).contains(&args.seed_density) {
            return Err(ConfigError::InvalidDensity(args.seed_density));
        }

        Ok(Self {
            bind_address: format!("{}:{}", args.host, args.port),
            game: GameSettings {
                width: args.width,
                height: args.height,
                next_generation_interval: Duration::from_millis(args.interval_ms),
                max_cells_per_player_per_generation: args.max_cells,
            },
            max_subscribers: args.max_subscribers,
            seed_density: args.seed_density,
            seed: args.seed,
        })
    }

    /// Builds the generation-0 board, randomly filled to `seed_density`
    pub fn initial_board(&self) -> Board {
        let mut board = Board::new(self.game.width, self.game.height);
        if self.seed_density <= 0.0 {
            return board;
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        for y in 0..self.game.height {
            for x in 0..self.game.width {
                if rng.gen_bool(self.seed_density) {
                    board.set(x, y, true);
                }
            }
        }

        board
    }

    /// Bytes of packed board in every response
    pub fn packed_board_len(&self) -> usize {
        PackedBoard::byte_len(self.game.width, self.game.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        let mut full = vec!["server"];
        full.extend_from_slice(args);
        Args::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_args(&parse(&[])).unwrap();

        assert_eq!(config.bind_address, "127.0.0.1:8080");
        assert_eq!(config.game.width, DEFAULT_BOARD_WIDTH);
        assert_eq!(config.game.height, DEFAULT_BOARD_HEIGHT);
        assert_eq!(config.game.next_generation_interval, Duration::from_secs(5));
        assert_eq!(
            config.game.max_cells_per_player_per_generation,
            DEFAULT_MAX_CELLS_PER_PLAYER_PER_GENERATION
        );
        assert_eq!(config.max_subscribers, 256);
        assert_eq!(config.initial_board().live_count(), 0);
    }

    #[test]
    fn test_custom_arguments() {
        let args = parse(&[
            "-H", "0.0.0.0", "-p", "9000", "--width", "20", "--height", "10", "-i", "250", "-m",
            "3",
        ]);
        let config = ServerConfig::from_args(&args).unwrap();

        assert_eq!(config.bind_address, "0.0.0.0:9000");
        assert_eq!(config.game.width, 20);
        assert_eq!(config.game.height, 10);
        assert_eq!(
            config.game.next_generation_interval,
            Duration::from_millis(250)
        );
        assert_eq!(config.game.max_cells_per_player_per_generation, 3);
        assert_eq!(config.packed_board_len(), 25);
    }

    #[test]
    fn test_rejects_invalid_values() {
        let cases = vec![
            (vec!["--width", "0"], ConfigError::EmptyBoard { width: 0, height: 100 }),
            (vec!["-i", "0"], ConfigError::ZeroInterval),
            (vec!["-m", "0"], ConfigError::ZeroQuota),
            (vec!["--seed-density", "1.5"], ConfigError::InvalidDensity(1.5)),
        ];

        for (args, expected) in cases {
            assert_eq!(ServerConfig::from_args(&parse(&args)), Err(expected));
        }
    }

    #[test]
    fn test_rejects_board_larger_than_a_datagram() {
        let result = ServerConfig::from_args(&parse(&["--width", "1000", "--height", "1000"]));
        assert!(matches!(result, Err(ConfigError::BoardTooLarge { .. })));

        let overflow = ServerConfig::from_args(&parse(&[
            "--width",
            &usize::MAX.to_string(),
            "--height",
            "2",
        ]));
        assert!(matches!(overflow, Err(ConfigError::BoardTooLarge { .. })));
    }

    #[test]
    fn test_seeded_board_is_reproducible() {
        let args = parse(&["--width", "30", "--height", "30", "--seed-density", "0.3", "--seed", "7"]);
        let config = ServerConfig::from_args(&args).unwrap();

        let first = config.initial_board();
        let second = config.initial_board();

        assert_eq!(first, second);
        assert!(first.live_count() > 0);
        assert!(first.live_count() < 900);
    }

    #[test]
    fn test_full_density_fills_board() {
        let args = parse(&["--width", "8", "--height", "4", "--seed-density", "1.0"]);
        let config = ServerConfig::from_args(&args).unwrap();
        assert_eq!(config.initial_board().live_count(), 32);
    }
}
