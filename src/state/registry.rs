use uuid::Uuid;

use crate::state::Connection;

/// Name given to users who connect without one.
pub const DEFAULT_NAME: &str = "Anonimo";

/// Normalise a requested display name into a single protocol token.
pub fn display_name(raw: &str) -> String {
    let name = raw.split_whitespace().collect::<Vec<_>>().join("_");
    if name.is_empty() {
        DEFAULT_NAME.to_string()
    } else {
        name
    }
}

struct Entry {
    id: Uuid,
    name: String,
    connection: Box<dyn Connection>,
}

/// Live connections in registration order.
///
/// Names are not unique: `resolve` returns the earliest registered match.
#[derive(Default)]
pub struct Registry {
    entries: Vec<Entry>,
}

impl Registry {
    /// Bind `name` to `id`, replacing the name and channel of an existing binding in place.
    pub fn bind(&mut self, id: Uuid, connection: Box<dyn Connection>, name: String) {
        match self.entries.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => {
                entry.name = name;
                entry.connection = connection;
            }
            None => self.entries.push(Entry { id, name, connection }),
        }
    }

    pub fn remove(&mut self, id: Uuid) -> Option<String> {
        let position = self.entries.iter().position(|entry| entry.id == id)?;
        Some(self.entries.remove(position).name)
    }

    pub fn resolve(&self, name: &str) -> Option<Uuid> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.id)
    }

    pub fn name_of(&self, id: Uuid) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.name.as_str())
    }

    pub fn connection(&self, id: Uuid) -> Option<&dyn Connection> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.connection.as_ref())
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.name.clone()).collect()
    }

    pub fn ids(&self) -> Vec<Uuid> {
        self.entries.iter().map(|entry| entry.id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
