use std::fmt;

use crate::error::RelayError;
use crate::game::rules::{board_status, cell_index, BoardStatus};

/// Mark placed on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    X,
    O,
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::X => f.write_str("X"),
            Symbol::O => f.write_str("O"),
        }
    }
}

/// Result of a move that was accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The game goes on and `next` holds the turn.
    Continue { next: String },
    Win { winner: String },
    Draw,
}

/// Authoritative state of one game between a challenger and an acceptor.
///
/// The challenger always plays `X` and moves first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    challenger: String,
    acceptor: String,
    board: [Option<Symbol>; 9],
    turn: String,
}

impl GameState {
    pub fn new(challenger: impl Into<String>, acceptor: impl Into<String>) -> Self {
        let challenger = challenger.into();
        Self {
            turn: challenger.clone(),
            challenger,
            acceptor: acceptor.into(),
            board: [None; 9],
        }
    }

    pub fn players(&self) -> (&str, &str) {
        (&self.challenger, &self.acceptor)
    }

    pub fn has_player(&self, name: &str) -> bool {
        self.challenger == name || self.acceptor == name
    }

    pub fn opponent_of(&self, name: &str) -> Option<&str> {
        if self.challenger == name {
            Some(&self.acceptor)
        } else if self.acceptor == name {
            Some(&self.challenger)
        } else {
            None
        }
    }

    pub fn symbol_of(&self, name: &str) -> Option<Symbol> {
        if self.challenger == name {
            Some(Symbol::X)
        } else if self.acceptor == name {
            Some(Symbol::O)
        } else {
            None
        }
    }

    pub fn turn(&self) -> &str {
        &self.turn
    }

    pub fn board(&self) -> &[Option<Symbol>; 9] {
        &self.board
    }

    /// Validate and apply a move. The board is untouched on error.
    pub fn apply_move(&mut self, player: &str, row: i32, col: i32) -> Result<MoveOutcome, RelayError> {
        if player != self.turn {
            return Err(RelayError::NotYourTurn);
        }
        let index = cell_index(row, col).ok_or(RelayError::OutOfRange)?;
        if self.board[index].is_some() {
            return Err(RelayError::CellOccupied);
        }
        let symbol = self.symbol_of(player).ok_or(RelayError::NotYourTurn)?;
        self.board[index] = Some(symbol);

        let outcome = match board_status(&self.board) {
            BoardStatus::Won(_) => MoveOutcome::Win {
                winner: player.to_string(),
            },
            BoardStatus::Draw => MoveOutcome::Draw,
            BoardStatus::InProgress => {
                let next = self.opponent_of(player).unwrap_or(player).to_string();
                self.turn = next.clone();
                MoveOutcome::Continue { next }
            }
        };
        Ok(outcome)
    }
}
