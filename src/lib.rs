//! Group chat relay with tic-tac-toe challenges over the same WebSocket.

pub mod config;
pub mod error;
pub mod game;
pub mod models;
pub mod routes;
pub mod state;
pub mod websocket;
