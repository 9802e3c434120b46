//! Latest-wins tracking for content loaded on selection.

use std::fmt::Display;

use lanegraph_protocol::SharedStr;
use tracing::{debug, warn};

/// Identifies one issued request. Only the most recent ticket is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum ContentState<K, V> {
    Idle,
    Loading(K),
    Ready(K, V),
    Failed(K, SharedStr),
}

/// Tracks the most recent request for keyed content. A newer request
/// supersedes the previous one; results for superseded tickets are dropped.
#[derive(Debug, Clone)]
pub struct LatestRequest<K, V> {
    state: ContentState<K, V>,
    current: Option<Ticket>,
    next: u64,
}

impl<K: Clone + PartialEq, V> LatestRequest<K, V> {
    pub fn new() -> Self {
        Self {
            state: ContentState::Idle,
            current: None,
            next: 0,
        }
    }

    pub fn state(&self) -> &ContentState<K, V> {
        &self.state
    }

    pub fn current(&self) -> Option<Ticket> {
        self.current
    }

    /// Key of the content being loaded or shown, if any.
    pub fn key(&self) -> Option<&K> {
        match &self.state {
            ContentState::Idle => None,
            ContentState::Loading(k) | ContentState::Ready(k, _) | ContentState::Failed(k, _) => {
                Some(k)
            }
        }
    }

    pub fn value(&self) -> Option<&V> {
        match &self.state {
            ContentState::Ready(_, v) => Some(v),
            _ => None,
        }
    }

    /// Start loading `key`, superseding any outstanding request.
    pub fn request(&mut self, key: K) -> Ticket {
        let ticket = Ticket(self.next);
        self.next += 1;
        if let Some(previous) = self.current.replace(ticket) {
            debug!(previous = previous.0, ticket = ticket.0, "content request superseded");
        }
        self.state = ContentState::Loading(key);
        ticket
    }

    /// Apply a result. Returns `false` and leaves the state untouched when
    /// `ticket` is no longer current.
    pub fn complete<E: Display>(&mut self, ticket: Ticket, result: Result<V, E>) -> bool {
        if self.current != Some(ticket) {
            debug!(ticket = ticket.0, "discarding stale content result");
            return false;
        }
        let ContentState::Loading(key) = &self.state else {
            return false;
        };
        let key = key.clone();
        self.current = None;
        self.state = match result {
            Ok(value) => ContentState::Ready(key, value),
            Err(err) => {
                warn!(error = %err, "content request failed");
                ContentState::Failed(key, SharedStr::from(err.to_string()))
            }
        };
        true
    }

    /// Drop the current content and any outstanding request.
    pub fn clear(&mut self) {
        self.current = None;
        self.state = ContentState::Idle;
    }
}

impl<K: Clone + PartialEq, V> Default for LatestRequest<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
