//! Shared relay state: who is online, pending challenges and active games.
//!
//! All three live in one [`RelayState`] behind a single mutex owned by
//! [`ChatServer`]. Every public operation takes the lock once, does its work
//! (including all outbound sends) and unregisters connections that failed a
//! send before releasing it.

use std::sync::{Mutex, MutexGuard, PoisonError};

use log::info;
use uuid::Uuid;

use crate::error::RelayError;
use crate::models::{GameState, MoveOutcome, ServerMessage};

pub mod challenges;
pub mod dispatcher;
pub mod games;
pub mod registry;
pub mod router;

#[cfg(test)]
pub(crate) mod testing;

use challenges::Challenges;
use games::Games;
use registry::{display_name, Registry};

/// A live client channel as seen by the relay.
///
/// Sends must not block. An error means the channel is gone for good.
pub trait Connection: Send {
    fn send_text(&self, text: &str) -> Result<(), RelayError>;
}

#[derive(Default)]
pub struct RelayState {
    registry: Registry,
    challenges: Challenges,
    games: Games,
    dead: Vec<Uuid>,
}

impl RelayState {
    /// Bind a connection to a display name and announce it. Returns the name used.
    pub fn register(&mut self, id: Uuid, connection: Box<dyn Connection>, requested: &str) -> String {
        let name = display_name(requested);
        self.registry.bind(id, connection, name.clone());
        info!("{} joined as connection {} ({} online)", name, id, self.registry.len());

        self.broadcast(&ServerMessage::Joined(name.clone()), None);
        self.broadcast(&ServerMessage::Users(self.registry.names()), None);
        name
    }

    /// Drop a connection and announce it. Returns the name it had.
    pub fn unregister(&mut self, id: Uuid) -> Option<String> {
        let name = self.registry.remove(id)?;
        self.dead.retain(|dead| *dead != id);
        info!("{} left, connection {} ({} online)", name, id, self.registry.len());

        // A duplicate-named connection still online keeps the user's game and challenges.
        if self.registry.resolve(&name).is_none() {
            self.challenges.drop_user(&name);
            self.forfeit(&name);
        }

        self.broadcast(&ServerMessage::Left(name.clone()), None);
        self.broadcast(&ServerMessage::Users(self.registry.names()), None);
        if self.registry.is_empty() {
            info!("Registry is empty; resetting theme");
            self.broadcast(&ServerMessage::ThemeReset, None);
        }
        Some(name)
    }
}

/// Thread-safe handle to the relay, shared by every connection handler.
#[derive(Default)]
pub struct ChatServer {
    state: Mutex<RelayState>,
}

impl ChatServer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RelayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` under the lock, then unregister whatever died meanwhile.
    fn with_state<T>(&self, f: impl FnOnce(&mut RelayState) -> T) -> T {
        let mut state = self.lock();
        let result = f(&mut state);
        state.reap();
        result
    }

    pub fn register(&self, id: Uuid, connection: Box<dyn Connection>, name: &str) -> String {
        self.with_state(|state| state.register(id, connection, name))
    }

    pub fn unregister(&self, id: Uuid) -> Option<String> {
        self.with_state(|state| state.unregister(id))
    }

    pub fn resolve(&self, name: &str) -> Option<Uuid> {
        self.lock().registry.resolve(name)
    }

    pub fn snapshot_names(&self) -> Vec<String> {
        self.lock().registry.names()
    }

    pub fn send_to(&self, id: Uuid, message: &ServerMessage) {
        self.with_state(|state| state.send_to(id, message))
    }

    pub fn broadcast(&self, message: &ServerMessage, exclude: Option<Uuid>) {
        self.with_state(|state| state.broadcast(message, exclude))
    }

    pub fn challenge(&self, from: &str, to: &str) -> Result<(), RelayError> {
        self.with_state(|state| state.challenge(from, to))
    }

    pub fn accept(&self, by: &str) -> Result<(), RelayError> {
        self.with_state(|state| state.accept(by))
    }

    pub fn play(&self, player: &str, row: i32, col: i32) -> Result<MoveOutcome, RelayError> {
        self.with_state(|state| state.play(player, row, col))
    }

    pub fn handle_message(&self, id: Uuid, text: &str) {
        self.with_state(|state| state.handle_message(id, text))
    }

    pub fn pending_challenger(&self, target: &str) -> Option<String> {
        self.lock()
            .challenges
            .challenger_for(target)
            .map(str::to_string)
    }

    pub fn game_between(&self, a: &str, b: &str) -> Option<GameState> {
        self.lock().games.between(a, b).cloned()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::models::Symbol;
    use crate::state::testing::RecordingConnection;

    fn connect(server: &ChatServer, name: &str) -> (Uuid, RecordingConnection) {
        let id = Uuid::new_v4();
        let connection = RecordingConnection::new();
        server.register(id, Box::new(connection.clone()), name);
        (id, connection)
    }

    #[test]
    fn register_announces_join_and_user_list() {
        let server = ChatServer::new();
        let (_, ana_conn) = connect(&server, "Ana");
        let (_, bia_conn) = connect(&server, "Bia");

        assert_eq!(
            ana_conn.lines(),
            vec![
                "--- Ana entrou ---",
                r#"USUARIOS ["Ana"]"#,
                "--- Bia entrou ---",
                r#"USUARIOS ["Ana","Bia"]"#,
            ]
        );
        assert_eq!(bia_conn.lines(), vec!["--- Bia entrou ---", r#"USUARIOS ["Ana","Bia"]"#]);
    }

    #[test]
    fn empty_name_gets_default() {
        let server = ChatServer::new();
        let (id, _) = connect(&server, "   ");
        assert_eq!(server.snapshot_names(), vec![registry::DEFAULT_NAME]);
        assert_eq!(server.resolve(registry::DEFAULT_NAME), Some(id));
    }

    #[test]
    fn unregister_announces_leave_until_registry_is_empty() {
        let server = ChatServer::new();
        let (ana, _) = connect(&server, "Ana");
        let (bia, bia_conn) = connect(&server, "Bia");
        bia_conn.clear();

        assert_eq!(server.unregister(ana), Some("Ana".to_string()));
        assert_eq!(bia_conn.lines(), vec!["--- Ana saiu ---", r#"USUARIOS ["Bia"]"#]);
        assert_eq!(server.unregister(ana), None);

        assert_eq!(server.unregister(bia), Some("Bia".to_string()));
        assert!(server.snapshot_names().is_empty());
    }

    #[test]
    fn snapshot_never_lists_unregistered_names() {
        let server = ChatServer::new();
        let mut ids = Vec::new();
        for name in ["Ana", "Bia", "Caio", "Dani", "Edu"] {
            ids.push((connect(&server, name).0, name));
        }
        for (i, (id, name)) in ids.iter().enumerate() {
            if i % 2 == 0 {
                server.unregister(*id);
                assert!(!server.snapshot_names().contains(&name.to_string()));
            }
        }
        assert_eq!(server.snapshot_names(), vec!["Bia", "Dani"]);
    }

    #[test]
    fn dead_connection_is_pruned_by_any_send() {
        let server = ChatServer::new();
        let (_, ana_conn) = connect(&server, "Ana");
        let (bia, bia_conn) = connect(&server, "Bia");
        bia_conn.kill();
        ana_conn.clear();

        server.send_to(bia, &ServerMessage::System("oi".into()));
        assert_eq!(server.resolve("Bia"), None);
        assert_eq!(ana_conn.lines(), vec!["--- Bia saiu ---", r#"USUARIOS ["Ana"]"#]);
    }

    #[test]
    fn challenge_then_accept_starts_game_with_challenger_first() {
        let server = ChatServer::new();
        let (_, ana_conn) = connect(&server, "Ana");
        let (_, bia_conn) = connect(&server, "Bia");
        ana_conn.clear();
        bia_conn.clear();

        server.challenge("Ana", "Bia").unwrap();
        assert_eq!(server.pending_challenger("Bia"), Some("Ana".to_string()));
        assert_eq!(
            bia_conn.lines(),
            vec!["SISTEMA: Ana desafiou você para o Jogo da Velha! Digite /aceitar para jogar."]
        );
        assert_eq!(ana_conn.lines(), vec!["SISTEMA: Desafio enviado para Bia."]);
        ana_conn.clear();
        bia_conn.clear();

        server.accept("Bia").unwrap();
        assert_eq!(server.pending_challenger("Bia"), None);
        let game = server.game_between("Ana", "Bia").unwrap();
        assert_eq!(game.turn(), "Ana");
        assert_eq!(game.symbol_of("Ana"), Some(Symbol::X));
        assert_eq!(game.symbol_of("Bia"), Some(Symbol::O));

        assert_eq!(ana_conn.lines(), vec!["GAME_START velha Bia X", "SISTEMA: vez de Ana"]);
        assert_eq!(bia_conn.lines(), vec!["GAME_START velha Ana O", "SISTEMA: vez de Ana"]);
    }

    #[test]
    fn challenge_errors() {
        let server = ChatServer::new();
        connect(&server, "Ana");
        connect(&server, "Bia");

        assert_eq!(server.challenge("Ana", "Ana"), Err(RelayError::SelfChallenge));
        assert_eq!(server.game_between("Ana", "Ana"), None);
        assert_eq!(server.pending_challenger("Ana"), None);
        assert_eq!(
            server.challenge("Ana", "Zeca"),
            Err(RelayError::TargetNotFound("Zeca".to_string()))
        );
        assert_eq!(server.accept("Bia"), Err(RelayError::NoPendingChallenge));
    }

    #[test]
    fn newer_challenger_wins() {
        let server = ChatServer::new();
        connect(&server, "Ana");
        connect(&server, "Bia");
        connect(&server, "Caio");

        server.challenge("Ana", "Bia").unwrap();
        server.challenge("Caio", "Bia").unwrap();
        server.accept("Bia").unwrap();
        assert!(server.game_between("Ana", "Bia").is_none());
        assert_eq!(server.game_between("Caio", "Bia").unwrap().turn(), "Caio");
    }

    #[test]
    fn players_in_a_game_cannot_start_another() {
        let server = ChatServer::new();
        connect(&server, "Ana");
        connect(&server, "Bia");
        connect(&server, "Caio");
        server.challenge("Ana", "Bia").unwrap();
        server.accept("Bia").unwrap();

        assert_eq!(
            server.challenge("Caio", "Ana"),
            Err(RelayError::PlayerBusy("Ana".to_string()))
        );
        assert_eq!(
            server.challenge("Bia", "Caio"),
            Err(RelayError::PlayerBusy("Bia".to_string()))
        );
    }

    #[test]
    fn full_game_over_the_wire() {
        let server = ChatServer::new();
        let (ana, ana_conn) = connect(&server, "Ana");
        let (bia, bia_conn) = connect(&server, "Bia");
        server.handle_message(ana, "/desafiar Bia");
        server.handle_message(bia, "/aceitar");
        ana_conn.clear();
        bia_conn.clear();

        server.handle_message(bia, "/jogada 0 0");
        assert_eq!(bia_conn.lines(), vec!["SISTEMA: Não é sua vez."]);
        assert!(ana_conn.lines().is_empty());
        bia_conn.clear();

        for (id, line) in [
            (ana, "/jogada 0 0"),
            (bia, "/jogada 1 0"),
            (ana, "/jogada 0 1"),
            (bia, "/jogada 1 1"),
        ] {
            server.handle_message(id, line);
        }
        ana_conn.clear();
        bia_conn.clear();
        server.handle_message(bia, "/jogada 2 2");
        server.handle_message(ana, "/jogada 9 9");
        server.handle_message(ana, "/jogada 1 1");
        assert_eq!(bia_conn.lines(), vec!["SISTEMA: Não é sua vez."]);
        assert_eq!(
            ana_conn.lines(),
            vec![
                "SISTEMA: Jogada fora do tabuleiro: linha e coluna vão de 0 a 2.",
                "SISTEMA: Essa casa já está ocupada.",
            ]
        );
        ana_conn.clear();
        bia_conn.clear();

        server.handle_message(ana, "/jogada 0 2");
        let expected = vec!["GAME_MOVE 0 2 Ana", "GAME_END Ana"];
        assert_eq!(ana_conn.lines(), expected);
        assert_eq!(bia_conn.lines(), expected);
        assert!(server.game_between("Ana", "Bia").is_none());

        server.handle_message(ana, "/jogada 1 2");
        assert_eq!(
            ana_conn.lines().last().map(String::as_str),
            Some("SISTEMA: Você não está em nenhuma partida.")
        );
    }

    #[test]
    fn moves_announce_next_turn() {
        let server = ChatServer::new();
        let (_, ana_conn) = connect(&server, "Ana");
        let (_, bia_conn) = connect(&server, "Bia");
        server.challenge("Ana", "Bia").unwrap();
        server.accept("Bia").unwrap();
        ana_conn.clear();
        bia_conn.clear();

        assert_eq!(
            server.play("Ana", 1, 1),
            Ok(MoveOutcome::Continue { next: "Bia".to_string() })
        );
        let expected = vec!["GAME_MOVE 1 1 Ana", "SISTEMA: vez de Bia"];
        assert_eq!(ana_conn.lines(), expected);
        assert_eq!(bia_conn.lines(), expected);
    }

    #[test]
    fn draw_is_announced() {
        let server = ChatServer::new();
        let (_, ana_conn) = connect(&server, "Ana");
        connect(&server, "Bia");
        server.challenge("Ana", "Bia").unwrap();
        server.accept("Bia").unwrap();

        // X O X / X O O / O X X
        for (player, row, col) in [
            ("Ana", 0, 0),
            ("Bia", 0, 1),
            ("Ana", 0, 2),
            ("Bia", 1, 1),
            ("Ana", 1, 0),
            ("Bia", 1, 2),
            ("Ana", 2, 1),
            ("Bia", 2, 0),
        ] {
            server.play(player, row, col).unwrap();
        }
        assert_eq!(server.play("Ana", 2, 2), Ok(MoveOutcome::Draw));
        assert_eq!(ana_conn.lines().last().map(String::as_str), Some("GAME_END empate"));
        assert!(server.game_between("Ana", "Bia").is_none());
    }

    #[test]
    fn leaving_mid_game_forfeits_to_opponent() {
        let server = ChatServer::new();
        let (ana, _) = connect(&server, "Ana");
        let (_, bia_conn) = connect(&server, "Bia");
        server.challenge("Ana", "Bia").unwrap();
        server.accept("Bia").unwrap();
        bia_conn.clear();

        server.unregister(ana);
        assert!(server.game_between("Ana", "Bia").is_none());
        assert_eq!(
            bia_conn.lines(),
            vec![
                "SISTEMA: Ana saiu da partida.",
                "GAME_END Bia",
                "--- Ana saiu ---",
                r#"USUARIOS ["Bia"]"#,
            ]
        );
    }

    #[test]
    fn leaving_drops_pending_challenges() {
        let server = ChatServer::new();
        let (ana, _) = connect(&server, "Ana");
        connect(&server, "Bia");
        server.challenge("Ana", "Bia").unwrap();
        server.unregister(ana);
        assert_eq!(server.pending_challenger("Bia"), None);
        assert_eq!(server.accept("Bia"), Err(RelayError::NoPendingChallenge));
    }

    #[test]
    fn duplicate_name_keeps_state_while_one_remains() {
        let server = ChatServer::new();
        let (first, first_conn) = connect(&server, "Ana");
        let (second, second_conn) = connect(&server, "Ana");
        connect(&server, "Bia");
        assert_eq!(server.resolve("Ana"), Some(first));

        server.challenge("Bia", "Ana").unwrap();
        first_conn.clear();
        second_conn.clear();
        server.unregister(first);
        assert_eq!(server.resolve("Ana"), Some(second));
        assert_eq!(server.pending_challenger("Ana"), Some("Bia".to_string()));

        server.accept("Ana").unwrap();
        assert!(second_conn.lines().contains(&"GAME_START velha Bia O".to_string()));
    }

    #[test]
    fn concurrent_moves_on_one_game_are_serialized() {
        let server = Arc::new(ChatServer::new());
        connect(&server, "Ana");
        connect(&server, "Bia");
        server.challenge("Ana", "Bia").unwrap();
        server.accept("Bia").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let server = Arc::clone(&server);
                thread::spawn(move || server.play("Ana", i / 3, i % 3).is_ok())
            })
            .collect();
        let accepted = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(accepted, 1);
        let game = server.game_between("Ana", "Bia").unwrap();
        assert_eq!(game.turn(), "Bia");
        assert_eq!(game.board().iter().filter(|cell| cell.is_some()).count(), 1);
    }

    #[test]
    fn concurrent_connects_and_disconnects_stay_consistent() {
        let server = Arc::new(ChatServer::new());
        let (_, watcher) = connect(&server, "Observador");

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let server = Arc::clone(&server);
                thread::spawn(move || {
                    let id = Uuid::new_v4();
                    let name = format!("user{}", i);
                    server.register(id, Box::new(RecordingConnection::new()), &name);
                    server.broadcast(&ServerMessage::System(name.clone()), Some(id));
                    if i % 2 == 0 {
                        server.unregister(id);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let names = server.snapshot_names();
        assert_eq!(names.len(), 9);
        for i in (0..16).step_by(2) {
            assert!(!names.contains(&format!("user{}", i)));
        }
        let system_lines = watcher
            .lines()
            .iter()
            .filter(|line| line.starts_with("SISTEMA: user"))
            .count();
        assert_eq!(system_lines, 16);
    }
}
