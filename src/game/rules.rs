use crate::models::Symbol;

/// Side length of the board.
pub const BOARD_SIZE: usize = 3;

/// The 8 lines that win a game: 3 rows, 3 columns, 2 diagonals.
pub const WIN_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// How a board stands after a move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardStatus {
    InProgress,
    Won(Symbol),
    Draw,
}

/// Get the symbol holding a complete line, if any
pub fn winning_symbol(cells: &[Option<Symbol>; 9]) -> Option<Symbol> {
    WIN_LINES.iter().find_map(|&[a, b, c]| match (cells[a], cells[b], cells[c]) {
        (Some(x), Some(y), Some(z)) if x == y && y == z => Some(x),
        _ => None,
    })
}

/// Evaluate the board. A win takes precedence over a full board.
pub fn board_status(cells: &[Option<Symbol>; 9]) -> BoardStatus {
    if let Some(symbol) = winning_symbol(cells) {
        BoardStatus::Won(symbol)
    } else if cells.iter().all(Option::is_some) {
        BoardStatus::Draw
    } else {
        BoardStatus::InProgress
    }
}

/// Map a (row, col) pair to a cell index, rejecting anything off the board.
pub fn cell_index(row: i32, col: i32) -> Option<usize> {
    let size = BOARD_SIZE as i32;
    if (0..size).contains(&row) && (0..size).contains(&col) {
        Some((row * size + col) as usize)
    } else {
        None
    }
}
