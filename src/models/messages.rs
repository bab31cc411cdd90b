use std::fmt;

use crate::models::Symbol;

/// Marker sent in `GAME_END` when nobody won.
pub const DRAW_MARKER: &str = "empate";

/// Command parsed from one inbound line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Challenge { target: String },
    Accept,
    Move { row: i32, col: i32 },
    Chat(String),
}

/// Line sent from server to client.
///
/// Every variant renders to the exact token layout the front end parses, so
/// the `Display` impl is the wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    GameStart { opponent: String, symbol: Symbol },
    GameMove { row: usize, col: usize, mover: String },
    /// `None` means the game ended in a draw.
    GameEnd { winner: Option<String> },
    System(String),
    Users(Vec<String>),
    Chat { from: String, text: String },
    Joined(String),
    Left(String),
    Theme(String),
    ThemeReset,
}

impl ServerMessage {
    pub fn turn_of(name: &str) -> Self {
        ServerMessage::System(format!("vez de {}", name))
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::GameStart { opponent, symbol } => {
                write!(f, "GAME_START velha {} {}", opponent, symbol)
            }
            ServerMessage::GameMove { row, col, mover } => {
                write!(f, "GAME_MOVE {} {} {}", row, col, mover)
            }
            ServerMessage::GameEnd { winner } => {
                write!(f, "GAME_END {}", winner.as_deref().unwrap_or(DRAW_MARKER))
            }
            ServerMessage::System(text) => write!(f, "SISTEMA: {}", text),
            ServerMessage::Users(names) => {
                let payload = serde_json::to_string(names).unwrap_or_else(|_| "[]".to_string());
                write!(f, "USUARIOS {}", payload)
            }
            ServerMessage::Chat { from, text } => write!(f, "{}: {}", from, text),
            ServerMessage::Joined(name) => write!(f, "--- {} entrou ---", name),
            ServerMessage::Left(name) => write!(f, "--- {} saiu ---", name),
            ServerMessage::Theme(token) => write!(f, "THEME {}", token),
            ServerMessage::ThemeReset => write!(f, "THEME reset"),
        }
    }
}
