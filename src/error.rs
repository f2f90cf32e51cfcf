//! Error types used by the fan-out runtime.
//!
//! The public `add`/`remove` operations report rejection as a plain `bool`.
//! The `try_*` variants return [`FanoutError`] instead, which tells *why* a
//! submission did not take effect.
//!
//! [`FanoutError`] provides helper methods (`as_label`, `as_message`) for logging.

use thiserror::Error;

use crate::scope::ScopeId;

/// # Reasons a subscription change was rejected.
///
/// In both cases the sink was **not** added (or removed) and will not be
/// affected by the group's closure.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanoutError {
    /// The group had already left the running state, or its scope had completed,
    /// when the request was made.
    #[error("fan-out group for {scope} is closed")]
    Closed {
        /// Scope the group is bound to.
        scope: ScopeId,
    },

    /// The group's request path shut down while the request was in flight.
    #[error("request to {scope} rejected after drain window")]
    Rejected {
        /// Scope the group is bound to.
        scope: ScopeId,
    },
}

impl FanoutError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use interrupt_fanout::{FanoutError, Scope};
    ///
    /// let err = FanoutError::Closed { scope: Scope::new().id() };
    /// assert_eq!(err.as_label(), "group_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            FanoutError::Closed { .. } => "group_closed",
            FanoutError::Rejected { .. } => "request_rejected",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            FanoutError::Closed { scope } => format!("closed: {scope}"),
            FanoutError::Rejected { scope } => format!("rejected while closing: {scope}"),
        }
    }

    /// Returns the scope the rejected request targeted.
    pub fn scope(&self) -> ScopeId {
        match self {
            FanoutError::Closed { scope } | FanoutError::Rejected { scope } => *scope,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::Scope;

    #[test]
    fn test_labels_and_scope() {
        let id = Scope::new().id();
        let closed = FanoutError::Closed { scope: id };
        let rejected = FanoutError::Rejected { scope: id };

        assert_eq!(closed.as_label(), "group_closed");
        assert_eq!(rejected.as_label(), "request_rejected");
        assert_eq!(closed.scope(), id);
        assert_eq!(rejected.scope(), id);
        assert!(closed.to_string().contains(&id.to_string()));
        assert!(rejected.as_message().starts_with("rejected"));
    }
}
