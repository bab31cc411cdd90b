use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::RelayError;
use crate::state::Connection;

/// Connection double that records every line and can be made to fail.
#[derive(Clone)]
pub struct RecordingConnection {
    lines: Arc<Mutex<Vec<String>>>,
    alive: Arc<AtomicBool>,
}

impl RecordingConnection {
    pub fn new() -> Self {
        Self {
            lines: Arc::new(Mutex::new(Vec::new())),
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.lines.lock().unwrap().clear();
    }

    /// Make every later send fail.
    pub fn kill(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}

impl Connection for RecordingConnection {
    fn send_text(&self, text: &str) -> Result<(), RelayError> {
        if !self.alive.load(Ordering::SeqCst) {
            return Err(RelayError::DeliveryFailure);
        }
        self.lines.lock().unwrap().push(text.to_string());
        Ok(())
    }
}
