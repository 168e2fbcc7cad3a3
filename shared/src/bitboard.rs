//! Bit-packed representation of a [`Board`] for network transfer
//!
//! Wire layout, shared by client and server:
//! - cells are visited row-major, cell `(x, y)` has index `i = y * width + x`
//! - cell `i` is stored in byte `i / 8`, bit `7 - i % 8` (most significant bit first)
//! - a set bit is a living cell
//! - the byte vector holds exactly `ceil(width * height / 8)` bytes and the
//!   padding bits of the final byte are zero
//!
//! A 2x2 board with `(0, 0)` and `(0, 1)` alive packs to `[0b1010_0000]`.

use crate::board::Board;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedBoard {
    pub width: u32,
    pub height: u32,
    pub bits: Vec<u8>,
}

impl PackedBoard {
    /// Number of bytes needed to pack a board of the given size
    pub fn byte_len(width: usize, height: usize) -> usize {
        (width * height).div_ceil(8)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("board dimensions must be non-zero, got {width}x{height}")]
    EmptyBoard { width: u32, height: u32 },

    #[error("expected {expected} bytes for packed board, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("padding bits after the last cell must be zero")]
    NonZeroPadding,
}

/// Packs a board to one bit per cell
pub fn preserialize(board: &Board) -> PackedBoard {
    let mut bits = vec![0u8; PackedBoard::byte_len(board.width(), board.height())];

    for (i, alive) in board.cells().iter().enumerate() {
        if *alive {
            bits[i / 8] |= 0x80 >> (i % 8);
        }
    }

    PackedBoard {
        width: board.width() as u32,
        height: board.height() as u32,
        bits,
    }
}

/// Unpacks a board produced by [`preserialize`]
pub fn restore(packed: &PackedBoard) -> Result<Board, CodecError> {
    let width = packed.width as usize;
    let height = packed.height as usize;

    if width == 0 || height == 0 {
        return Err(CodecError::EmptyBoard {
            width: packed.width,
            height: packed.height,
        });
    }

    let expected = PackedBoard::byte_len(width, height);
    if packed.bits.len() != expected {
        return Err(CodecError::LengthMismatch {
            expected,
            actual: packed.bits.len(),
        });
    }

    let total = width * height;
    let padding = expected * 8 - total;
    if padding > 0 {
        let mask = (1u8 << padding) - 1;
        if packed.bits[expected - 1] & mask != 0 {
            return Err(CodecError::NonZeroPadding);
        }
    }

    let cells = (0..total)
        .map(|i| packed.bits[i / 8] & (0x80 >> (i % 8)) != 0)
        .collect();

    Board::from_cells(width, height, cells).ok_or(CodecError::LengthMismatch {
        expected: total,
        actual: packed.bits.len() * 8,
    })
}
