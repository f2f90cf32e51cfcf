//! # Runtime events emitted by fan-out groups, registries and interrupt listeners.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Subscription events**: sinks joining or leaving a group
//! - **Lifecycle events**: group creation, closing transition, final closure, failed deliveries
//! - **Process events**: interrupt observed, registry cleared
//!
//! The [`Event`] struct carries additional metadata such as timestamps, scope id,
//! subscriber counts and the reason a group closed.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are observed from several receivers.
//!
//! ## Example
//! ```rust
//! use interrupt_fanout::{CloseReason, Event, EventKind, Scope};
//!
//! let scope = Scope::new();
//! let ev = Event::new(EventKind::GroupClosed)
//!     .with_scope(scope.id())
//!     .with_subscribers(3)
//!     .with_close_reason(CloseReason::ScopeCompleted);
//!
//! assert_eq!(ev.kind, EventKind::GroupClosed);
//! assert_eq!(ev.scope, Some(scope.id()));
//! assert_eq!(ev.subscribers, Some(3));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::scope::ScopeId;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscription events ===
    /// A sink was applied to a group's subscriber set (also emitted for duplicate adds).
    ///
    /// Sets:
    /// - `scope`: group scope
    /// - `subscribers`: subscriber count after the change
    SinkAdded,

    /// A remove request was applied (whether or not the sink was present).
    ///
    /// Sets:
    /// - `scope`: group scope
    /// - `subscribers`: subscriber count after the change
    SinkRemoved,

    // === Group lifecycle events ===
    /// A new group was created in a registry.
    ///
    /// Sets:
    /// - `scope`: group scope
    GroupCreated,

    /// The group left the running state and is draining pending requests.
    ///
    /// Sets:
    /// - `scope`: group scope
    /// - `close_reason`: which trigger won
    GroupClosing,

    /// All notifications were dispatched; the group is terminal.
    ///
    /// Sets:
    /// - `scope`: group scope
    /// - `subscribers`: number of sinks notified
    /// - `close_reason`: which trigger won
    GroupClosed,

    /// Delivery to a sink failed because its receiver was gone.
    ///
    /// Sets:
    /// - `scope`: group scope
    /// - `reason`: failure description
    NotificationDropped,

    // === Process events ===
    /// An interrupt source fired.
    ///
    /// Sets:
    /// - `reason`: source name
    InterruptReceived,

    /// A registry closed every tracked group and cleared its map.
    ///
    /// Sets:
    /// - `subscribers`: number of groups closed
    RegistryCleared,
}

/// Trigger that moved a group out of the running state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The bound scope completed.
    ScopeCompleted,
    /// `close()` was called (directly or through `Registry::close_all`).
    Explicit,
}

impl CloseReason {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            CloseReason::ScopeCompleted => "scope_completed",
            CloseReason::Explicit => "explicit",
        }
    }
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Scope of the group concerned, if applicable.
    pub scope: Option<ScopeId>,
    /// Subscriber (or group) count, depending on kind.
    pub subscribers: Option<u32>,
    /// Why a group closed.
    pub close_reason: Option<CloseReason>,
    /// Human-readable detail.
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            scope: None,
            subscribers: None,
            close_reason: None,
            reason: None,
        }
    }

    /// Attaches a scope id.
    #[inline]
    pub fn with_scope(mut self, scope: ScopeId) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Attaches a count (saturated to `u32::MAX`).
    #[inline]
    pub fn with_subscribers(mut self, n: usize) -> Self {
        self.subscribers = Some(u32::try_from(n).unwrap_or(u32::MAX));
        self
    }

    /// Attaches the close trigger.
    #[inline]
    pub fn with_close_reason(mut self, reason: CloseReason) -> Self {
        self.close_reason = Some(reason);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Returns `true` for [`EventKind::GroupClosed`], the last event a group publishes.
    #[inline]
    pub fn is_group_closed(&self) -> bool {
        matches!(self.kind, EventKind::GroupClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::GroupCreated);
        let b = Event::new(EventKind::GroupCreated);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_subscribers_saturate() {
        let ev = Event::new(EventKind::RegistryCleared).with_subscribers(usize::MAX);
        assert_eq!(ev.subscribers, Some(u32::MAX));
    }

    #[test]
    fn test_builders() {
        let ev = Event::new(EventKind::NotificationDropped).with_reason("receiver dropped");
        assert_eq!(ev.reason.as_deref(), Some("receiver dropped"));
        assert!(ev.scope.is_none());
        assert!(!ev.is_group_closed());
        assert!(Event::new(EventKind::GroupClosed).is_group_closed());
        assert_eq!(CloseReason::Explicit.as_label(), "explicit");
    }
}
