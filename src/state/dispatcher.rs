use std::num::IntErrorKind;

use log::{debug, info, warn};
use uuid::Uuid;

use crate::error::RelayError;
use crate::models::{ClientMessage, ServerMessage};
use crate::state::RelayState;

const CHALLENGE_COMMAND: &str = "/desafiar";
const ACCEPT_COMMAND: &str = "/aceitar";
const MOVE_COMMAND: &str = "/jogada";
const MOVE_USAGE: &str = "/jogada <linha> <coluna>";

/// Chat word that gets an answer from the bot and switches the theme.
pub const TRIGGER_WORD: &str = "flamengo";
pub const BOT_NAME: &str = "Bot";
pub const BOT_REPLY: &str = "Uma vez Flamengo, sempre Flamengo!";

/// Classify one inbound line. Blank lines yield `None`.
pub fn parse_command(text: &str) -> Result<Option<ClientMessage>, RelayError> {
    let line = text.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let mut tokens = line.split_whitespace();
    let command = tokens.next().unwrap_or_default();
    let args: Vec<&str> = tokens.collect();

    let message = match command {
        CHALLENGE_COMMAND => match args.as_slice() {
            [target] => ClientMessage::Challenge {
                target: target.to_string(),
            },
            _ => return Err(RelayError::MalformedCommand("/desafiar <nome>")),
        },
        ACCEPT_COMMAND => match args.as_slice() {
            [] => ClientMessage::Accept,
            _ => return Err(RelayError::MalformedCommand("/aceitar")),
        },
        MOVE_COMMAND => match args.as_slice() {
            [row, col] => ClientMessage::Move {
                row: parse_coordinate(row)?,
                col: parse_coordinate(col)?,
            },
            _ => return Err(RelayError::MalformedCommand(MOVE_USAGE)),
        },
        _ => ClientMessage::Chat(line.to_string()),
    };
    Ok(Some(message))
}

/// Parse one board coordinate.
///
/// Integers too large for `i32` saturate and are later rejected as off the board.
fn parse_coordinate(raw: &str) -> Result<i32, RelayError> {
    match raw.parse::<i32>() {
        Ok(value) => Ok(value),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Ok(i32::MAX),
            IntErrorKind::NegOverflow => Ok(i32::MIN),
            _ => Err(RelayError::MalformedCommand(MOVE_USAGE)),
        },
    }
}

impl RelayState {
    /// Route one line from a registered connection.
    ///
    /// Errors go back to the sender as a `SISTEMA:` notice and never end the connection.
    pub fn handle_message(&mut self, id: Uuid, text: &str) {
        let Some(sender) = self.registry.name_of(id).map(str::to_string) else {
            warn!("Ignoring message from unregistered connection {}", id);
            return;
        };

        let result = parse_command(text).and_then(|command| match command {
            None => Ok(()),
            Some(ClientMessage::Challenge { target }) => self.challenge(&sender, &target),
            Some(ClientMessage::Accept) => self.accept(&sender),
            Some(ClientMessage::Move { row, col }) => self.play(&sender, row, col).map(|_| ()),
            Some(ClientMessage::Chat(line)) => {
                self.chat(&sender, line);
                Ok(())
            }
        });

        if let Err(e) = result {
            info!("Rejected command from {}: {}", sender, e);
            self.send_to(id, &ServerMessage::System(e.to_string()));
        }
    }

    fn chat(&mut self, sender: &str, text: String) {
        debug!("{}: {}", sender, text);
        let triggered = text.to_lowercase() == TRIGGER_WORD;
        self.broadcast(
            &ServerMessage::Chat {
                from: sender.to_string(),
                text,
            },
            None,
        );
        if triggered {
            self.broadcast(
                &ServerMessage::Chat {
                    from: BOT_NAME.to_string(),
                    text: BOT_REPLY.to_string(),
                },
                None,
            );
            self.broadcast(&ServerMessage::Theme(TRIGGER_WORD.to_string()), None);
        }
    }
}
