//! history.rs: bounded in-memory replay buffers for late-joining clients.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use crate::model::{Article, InitialState, Match, User};

pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Fixed-capacity FIFO; the oldest entry is dropped on overflow.
#[derive(Debug)]
pub struct Ring<T> {
    inner: Mutex<VecDeque<T>>,
    cap: usize,
}

impl<T: Clone> Ring<T> {
    pub fn with_capacity(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            inner: Mutex::new(VecDeque::with_capacity(cap)),
            cap,
        }
    }

    pub fn push(&self, item: T) {
        let mut v = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        v.push_back(item);
        while v.len() > self.cap {
            v.pop_front();
        }
    }

    /// Current contents, oldest first.
    pub fn snapshot(&self) -> Vec<T> {
        let v = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        v.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }
}

/// The three display buffers. Independent of each other; no cross-buffer ordering.
#[derive(Debug)]
pub struct HistoryStore {
    pub articles: Ring<Article>,
    pub users: Ring<User>,
    pub matches: Ring<Match>,
}

impl HistoryStore {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            articles: Ring::with_capacity(cap),
            users: Ring::with_capacity(cap),
            matches: Ring::with_capacity(cap),
        }
    }

    pub fn snapshot(&self) -> InitialState {
        InitialState {
            articles: self.articles.snapshot(),
            users: self.users.snapshot(),
            matches: self.matches.snapshot(),
        }
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}
