use std::collections::HashMap;

use log::info;

use crate::error::RelayError;
use crate::models::{GameState, MoveOutcome, ServerMessage};
use crate::state::RelayState;

/// Unordered pair of player names, stored sorted.
type PairKey = (String, String);

fn pair_key(a: &str, b: &str) -> PairKey {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Active games, one per unordered player pair.
#[derive(Debug, Default)]
pub struct Games {
    sessions: HashMap<PairKey, GameState>,
}

impl Games {
    /// Start a game, replacing any existing one between the same pair.
    pub fn start(&mut self, challenger: &str, acceptor: &str) {
        self.sessions
            .insert(pair_key(challenger, acceptor), GameState::new(challenger, acceptor));
    }

    pub fn between(&self, a: &str, b: &str) -> Option<&GameState> {
        self.sessions.get(&pair_key(a, b))
    }

    pub fn is_playing(&self, name: &str) -> bool {
        self.key_of(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    fn key_of(&self, name: &str) -> Option<PairKey> {
        self.sessions
            .iter()
            .find(|(_, game)| game.has_player(name))
            .map(|(key, _)| key.clone())
    }

    /// Apply a move to the player's game, dropping the game once it ends.
    ///
    /// Returns the outcome with the (challenger, acceptor) pair so callers can notify both.
    pub fn apply_move(
        &mut self,
        player: &str,
        row: i32,
        col: i32,
    ) -> Result<(MoveOutcome, (String, String)), RelayError> {
        let key = self.key_of(player).ok_or(RelayError::NoActiveGame)?;
        let game = self
            .sessions
            .get_mut(&key)
            .ok_or(RelayError::NoActiveGame)?;
        let outcome = game.apply_move(player, row, col)?;
        let (challenger, acceptor) = game.players();
        let players = (challenger.to_string(), acceptor.to_string());
        if !matches!(outcome, MoveOutcome::Continue { .. }) {
            self.sessions.remove(&key);
        }
        Ok((outcome, players))
    }

    /// Remove and return the game the player is in, if any.
    pub fn remove_player(&mut self, name: &str) -> Option<GameState> {
        let key = self.key_of(name)?;
        self.sessions.remove(&key)
    }
}

impl RelayState {
    pub fn play(&mut self, player: &str, row: i32, col: i32) -> Result<MoveOutcome, RelayError> {
        let (outcome, (challenger, acceptor)) = self.games.apply_move(player, row, col)?;

        // apply_move only succeeds for on-board coordinates
        let placed = ServerMessage::GameMove {
            row: row as usize,
            col: col as usize,
            mover: player.to_string(),
        };
        self.send_to_name(&challenger, &placed);
        self.send_to_name(&acceptor, &placed);

        let follow_up = match &outcome {
            MoveOutcome::Continue { next } => ServerMessage::turn_of(next),
            MoveOutcome::Win { winner } => {
                info!("{} won the game between {} and {}", winner, challenger, acceptor);
                ServerMessage::GameEnd {
                    winner: Some(winner.clone()),
                }
            }
            MoveOutcome::Draw => {
                info!("Game between {} and {} ended in a draw", challenger, acceptor);
                ServerMessage::GameEnd { winner: None }
            }
        };
        self.send_to_name(&challenger, &follow_up);
        self.send_to_name(&acceptor, &follow_up);
        Ok(outcome)
    }

    /// End the user's game in favour of the opponent.
    pub(crate) fn forfeit(&mut self, leaver: &str) {
        let Some(game) = self.games.remove_player(leaver) else {
            return;
        };
        let Some(opponent) = game.opponent_of(leaver).map(str::to_string) else {
            return;
        };
        info!("{} left mid-game; {} wins by forfeit", leaver, opponent);
        self.send_to_name(
            &opponent,
            &ServerMessage::System(format!("{} saiu da partida.", leaver)),
        );
        self.send_to_name(
            &opponent,
            &ServerMessage::GameEnd {
                winner: Some(opponent.clone()),
            },
        );
    }
}
