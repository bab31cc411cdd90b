use log::{debug, warn};
use uuid::Uuid;

use crate::models::ServerMessage;
use crate::state::RelayState;

impl RelayState {
    /// Best-effort unicast. A failed send marks the connection dead.
    pub fn send_to(&mut self, id: Uuid, message: &ServerMessage) {
        let text = message.to_string();
        self.deliver(id, &text);
    }

    /// Send to whoever currently resolves by `name`.
    pub fn send_to_name(&mut self, name: &str, message: &ServerMessage) {
        match self.registry.resolve(name) {
            Some(id) => self.send_to(id, message),
            None => debug!("Dropping message for {}: not connected", name),
        }
    }

    /// Send to every registered connection except `exclude`.
    ///
    /// Iterates a snapshot of the ids taken up front. Failed sends never stop
    /// the fan-out; the dead connections are unregistered later by `reap`.
    pub fn broadcast(&mut self, message: &ServerMessage, exclude: Option<Uuid>) {
        let text = message.to_string();
        let targets = self.registry.ids();
        debug!("Broadcasting to {} connections: {}", targets.len(), text);
        for id in targets {
            if Some(id) != exclude {
                self.deliver(id, &text);
            }
        }
    }

    fn deliver(&mut self, id: Uuid, text: &str) {
        if self.dead.contains(&id) {
            return;
        }
        let Some(connection) = self.registry.connection(id) else {
            debug!("Connection {} is not registered", id);
            return;
        };
        if let Err(e) = connection.send_text(text) {
            warn!("Send to connection {} failed ({}); dropping it", id, e);
            self.dead.push(id);
        }
    }

    /// Unregister every connection that failed a send, including ones that
    /// fail while their predecessors' departures are announced.
    pub fn reap(&mut self) {
        while let Some(id) = self.dead.pop() {
            self.unregister(id);
        }
    }
}
