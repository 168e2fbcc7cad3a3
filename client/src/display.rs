//! Plain-text rendering of game state for the terminal

use crate::network::GameView;
use shared::Board;
use std::fmt::Write;

pub const LIVE_CELL: char = '#';
pub const DEAD_CELL: char = '.';

/// Draws the board one row per line, top row first
pub fn render_board(board: &Board) -> String {
    let mut out = String::with_capacity((board.width() + 1) * board.height());
    for y in 0..board.height() {
        for x in 0..board.width() {
            out.push(if board.get(x, y) { LIVE_CELL } else { DEAD_CELL });
        }
        out.push('\n');
    }
    out
}

/// One-line header followed by the board
pub fn render_view(view: &GameView) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "generation {} | next in {:.1}s of {:.1}s | {} of {} cells left | {} alive",
        view.generation,
        view.time_until_next_generation.as_secs_f64(),
        view.next_generation_interval.as_secs_f64(),
        view.cells_left,
        view.max_cells_per_player_per_generation,
        view.board.live_count(),
    );
    out.push_str(&render_board(&view.board));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_render_board() {
        let board = Board::with_living_cells(3, 2, [(0, 0), (2, 1)]);
        assert_eq!(render_board(&board), "#..\n..#\n");
    }

    #[test]
    fn test_render_view_header() {
        let view = GameView {
            board: Board::with_living_cells(2, 2, [(1, 1)]),
            generation: 12,
            time_until_next_generation: Duration::from_millis(2500),
            next_generation_interval: Duration::from_secs(5),
            cells_left: 4,
            max_cells_per_player_per_generation: 10,
        };

        let rendered = render_view(&view);
        let mut lines = rendered.lines();
        assert_eq!(
            lines.next(),
            Some("generation 12 | next in 2.5s of 5.0s | 4 of 10 cells left | 1 alive")
        );
        assert_eq!(lines.next(), Some(".."));
        assert_eq!(lines.next(), Some(".#"));
        assert_eq!(lines.next(), None);
    }
}
