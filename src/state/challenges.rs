use std::collections::HashMap;

use log::info;

use crate::error::RelayError;
use crate::models::{ServerMessage, Symbol};
use crate::state::RelayState;

/// Pending invitations, keyed by invitee name
#[derive(Debug, Default)]
pub struct Challenges {
    pending: HashMap<String, String>,
}

impl Challenges {
    /// Record a challenge, returning the challenger it replaced.
    pub fn record(&mut self, target: &str, challenger: &str) -> Option<String> {
        self.pending.insert(target.to_string(), challenger.to_string())
    }

    pub fn challenger_for(&self, target: &str) -> Option<&str> {
        self.pending.get(target).map(String::as_str)
    }

    pub fn take(&mut self, target: &str) -> Option<String> {
        self.pending.remove(target)
    }

    /// Forget every challenge the user issued or received.
    pub fn drop_user(&mut self, name: &str) {
        self.pending
            .retain(|target, challenger| target != name && challenger != name);
    }
}

impl RelayState {
    pub fn challenge(&mut self, from: &str, to: &str) -> Result<(), RelayError> {
        if from == to {
            return Err(RelayError::SelfChallenge);
        }
        if self.registry.resolve(to).is_none() {
            return Err(RelayError::TargetNotFound(to.to_string()));
        }
        for name in [from, to] {
            if self.games.is_playing(name) {
                return Err(RelayError::PlayerBusy(name.to_string()));
            }
        }

        if let Some(previous) = self.challenges.record(to, from) {
            info!("Challenge from {} to {} replaces one from {}", from, to, previous);
        } else {
            info!("{} challenged {}", from, to);
        }

        self.send_to_name(
            to,
            &ServerMessage::System(format!(
                "{} desafiou você para o Jogo da Velha! Digite /aceitar para jogar.",
                from
            )),
        );
        self.send_to_name(
            from,
            &ServerMessage::System(format!("Desafio enviado para {}.", to)),
        );
        Ok(())
    }

    pub fn accept(&mut self, by: &str) -> Result<(), RelayError> {
        let challenger = self
            .challenges
            .challenger_for(by)
            .ok_or(RelayError::NoPendingChallenge)?
            .to_string();
        for name in [challenger.as_str(), by] {
            if self.games.is_playing(name) {
                return Err(RelayError::PlayerBusy(name.to_string()));
            }
        }
        self.challenges.take(by);

        self.games.start(&challenger, by);
        info!(
            "Game started: {} (X) vs {} (O), {} active",
            challenger,
            by,
            self.games.len()
        );

        self.send_to_name(
            &challenger,
            &ServerMessage::GameStart {
                opponent: by.to_string(),
                symbol: Symbol::X,
            },
        );
        self.send_to_name(
            by,
            &ServerMessage::GameStart {
                opponent: challenger.clone(),
                symbol: Symbol::O,
            },
        );
        let turn = ServerMessage::turn_of(&challenger);
        self.send_to_name(&challenger, &turn);
        self.send_to_name(by, &turn);
        Ok(())
    }
}
