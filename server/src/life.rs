//! Conway's Game of Life transition rule on a bounded board

use shared::Board;

const NEIGHBOR_DELTAS: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Counts living neighbours of `(x, y)`. Cells past the edge count as dead.
pub fn live_neighbors(board: &Board, x: usize, y: usize) -> u8 {
    let mut count = 0;
    for &(dx, dy) in &NEIGHBOR_DELTAS {
        let nx = x as i64 + dx;
        let ny = y as i64 + dy;
        if board.contains(nx, ny) && board.get(nx as usize, ny as usize) {
            count += 1;
        }
    }
    count
}

/// Computes the next generation without touching `board`
pub fn step(board: &Board) -> Board {
    let mut next = Board::new(board.width(), board.height());

    for y in 0..board.height() {
        for x in 0..board.width() {
            let neighbors = live_neighbors(board, x, y);
            let alive = if board.get(x, y) {
                // Survives with 2 or 3 neighbours
                neighbors == 2 || neighbors == 3
            } else {
                // Born with exactly 3
                neighbors == 3
            };
            if alive {
                next.set(x, y, true);
            }
        }
    }

    next
}
