//! Real-time fan-out. Producers call `broadcast_all`, every connected socket
//! holds a `broadcast::Receiver`. Fire-and-forget: no acks, no retries.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::model::{Article, InitialState, Match, User};

pub const DEFAULT_FANOUT_CAPACITY: usize = 1024;

/// Server → client frames: `{"event": "...", "data": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    NewArticle(Article),
    NewUser(User),
    NewMatch(Match),
    StreamsStarted,
    InitialState(InitialState),
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::NewArticle(_) => "new_article",
            ServerEvent::NewUser(_) => "new_user",
            ServerEvent::NewMatch(_) => "new_match",
            ServerEvent::StreamsStarted => "streams_started",
            ServerEvent::InitialState(_) => "initial_state",
        }
    }
}

/// Client → server frames.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    StartStreams,
}

/// Seam between the pipeline and the transport. Tests swap in a recorder.
pub trait Broadcaster: Send + Sync {
    fn broadcast_all(&self, event: ServerEvent);
}

pub type DynBroadcaster = Arc<dyn Broadcaster>;

/// `tokio::sync::broadcast` backed hub; sockets subscribe on connect.
#[derive(Clone)]
pub struct BroadcastHub {
    tx: broadcast::Sender<Arc<ServerEvent>>,
}

impl BroadcastHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<ServerEvent>> {
        self.tx.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(DEFAULT_FANOUT_CAPACITY)
    }
}

impl Broadcaster for BroadcastHub {
    fn broadcast_all(&self, event: ServerEvent) {
        // Err only means nobody is listening right now.
        let _ = self.tx.send(Arc::new(event));
    }
}

/// Keeps every event in order. For tests and headless runs.
#[derive(Debug, Default)]
pub struct RecordingBroadcaster {
    events: Mutex<Vec<ServerEvent>>,
}

impl RecordingBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ServerEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(ServerEvent::name)
            .collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.names().into_iter().filter(|n| *n == name).count()
    }
}

impl Broadcaster for RecordingBroadcaster {
    fn broadcast_all(&self, event: ServerEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
