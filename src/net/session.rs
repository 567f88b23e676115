//! Session identity and lifetime accounting.
//!
//! # Responsibilities
//! - Generate unique session IDs for tracing
//! - Count live sessions (one per upgraded connection)
//! - Keep the `bridge_active_sessions` gauge in step with the count

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use uuid::Uuid;

use crate::observability::metrics;

/// Unique identifier for a bridged connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sess-{}", self.0)
    }
}

/// Tracks live sessions.
///
/// Cheap to clone; all clones share one counter.
#[derive(Debug, Clone, Default)]
pub struct SessionTracker {
    active: Arc<AtomicU64>,
}

impl SessionTracker {
    /// Create a new tracker with no live sessions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new session. Returns a guard that decrements on drop.
    pub fn track(&self) -> SessionGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        metrics::session_opened();
        SessionGuard {
            active: Arc::clone(&self.active),
            id: SessionId::new(),
        }
    }

    /// Current number of live sessions.
    pub fn active(&self) -> u64 {
        self.active.load(Ordering::SeqCst)
    }
}

/// Guard that tracks a session's lifetime.
#[derive(Debug)]
pub struct SessionGuard {
    active: Arc<AtomicU64>,
    id: SessionId,
}

impl SessionGuard {
    /// This session's ID.
    pub fn id(&self) -> SessionId {
        self.id
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        metrics::session_closed();
        tracing::trace!(session_id = %self.id, "Session released");
    }
}
