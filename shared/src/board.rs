//! Fixed-size dense grid of living and dead cells

use serde::{Deserialize, Serialize};

/// A `width x height` grid of booleans stored row-major.
///
/// Coordinates are `(x, y)` with `x` selecting the column and `y` the row.
/// The dimensions are fixed at construction; nothing on this type can
/// resize it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl Board {
    /// Creates an all-dead board
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width * height],
        }
    }

    /// Creates a board with the given cells alive. Coordinates outside the
    /// board are ignored.
    pub fn with_living_cells(
        width: usize,
        height: usize,
        living: impl IntoIterator<Item = (usize, usize)>,
    ) -> Self {
        let mut board = Self::new(width, height);
        for (x, y) in living {
            board.set(x, y, true);
        }
        board
    }

    /// Builds a board from row-major cells, returning `None` if the length
    /// does not match the dimensions.
    pub fn from_cells(width: usize, height: usize, cells: Vec<bool>) -> Option<Self> {
        if cells.len() != width * height {
            return None;
        }
        Some(Self {
            width,
            height,
            cells,
        })
    }

    /// Number of columns; valid x coordinates are `0..width`
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows; valid y coordinates are `0..height`
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns true if `(x, y)` lies on the board
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as u64) < self.width as u64 && (y as u64) < self.height as u64
    }

    /// Cell state at `(x, y)`; anything off the board reads as dead
    pub fn get(&self, x: usize, y: usize) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.cells[y * self.width + x]
    }

    /// Sets the cell at `(x, y)`. Returns false if the coordinate is off the board.
    pub fn set(&mut self, x: usize, y: usize, alive: bool) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.cells[y * self.width + x] = alive;
        true
    }

    /// Row-major view of every cell
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    /// Number of living cells
    ///
    /// Walks the whole board, so callers on hot paths should cache it.
    pub fn live_count(&self) -> usize {
        self.cells.iter().filter(|alive| **alive).count()
    }

    /// Coordinates of every living cell in row-major order
    pub fn living_cells(&self) -> Vec<(usize, usize)> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(|(i, _)| (i % self.width, i / self.width))
            .collect()
    }
}
