//! Import notifications

use crate::types::AssetDescriptor;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Emitted once for every file successfully placed in the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportEvent {
    /// Serialized with the registry field names (Name, Description, MD5, Size)
    pub descriptor: AssetDescriptor,
    /// Canonical path the file was placed at
    pub path: PathBuf,
}

/// Receives import events
pub trait ImportListener: Send + Sync {
    fn on_import(&self, event: &ImportEvent);
}

impl<F> ImportListener for F
where
    F: Fn(&ImportEvent) + Send + Sync,
{
    fn on_import(&self, event: &ImportEvent) {
        self(event)
    }
}

/// Subscribers notified synchronously, in subscription order
#[derive(Default)]
pub struct ImportEvents {
    listeners: Vec<Arc<dyn ImportListener>>,
}

impl ImportEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep a clone of the `Arc` to inspect a listener after events fire
    pub fn subscribe(&mut self, listener: Arc<dyn ImportListener>) {
        self.listeners.push(listener);
    }

    /// Deliver an event to every subscriber
    pub fn emit(&self, event: &ImportEvent) {
        for listener in &self.listeners {
            listener.on_import(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl std::fmt::Debug for ImportEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportEvents")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// A listener that records events so they can be drained later
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<ImportEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all recorded events
    pub fn drain(&self) -> Vec<ImportEvent> {
        match self.events.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ImportListener for EventLog {
    fn on_import(&self, event: &ImportEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
