//! # Cancellable scopes observed by the fan-out.
//!
//! A [`Scope`] is the unit of work whose completion triggers notification of
//! every sink registered against it. It wraps a [`CancellationToken`] and adds
//! a process-unique [`ScopeId`] so that the registry can key groups by
//! reference identity: all clones of a scope share its id, while two scopes
//! built from the same token (via [`Scope::from_token`]) are distinct.
//!
//! ## Rules
//! - The fan-out only **observes** completion; it never cancels a scope.
//! - Identity is fixed at construction and never reused within the process.
//! - [`Scope::child`] yields a new identity whose token is cancelled with its parent.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use tokio_util::sync::CancellationToken;

/// Global allocator for scope identities.
static SCOPE_SEQ: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`Scope`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u64);

impl ScopeId {
    fn next() -> Self {
        Self(SCOPE_SEQ.fetch_add(1, AtomicOrdering::Relaxed))
    }

    /// Returns the raw numeric id.
    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope#{}", self.0)
    }
}

/// Cancellable unit of work with reference-based identity.
///
/// ## Example
/// ```rust
/// use interrupt_fanout::Scope;
///
/// let scope = Scope::new();
/// let same = scope.clone();
/// let child = scope.child();
///
/// assert_eq!(scope.id(), same.id());
/// assert_ne!(scope.id(), child.id());
///
/// scope.cancel();
/// assert!(child.is_cancelled());
/// ```
#[derive(Clone, Debug)]
pub struct Scope {
    id: ScopeId,
    token: CancellationToken,
}

impl Scope {
    /// Creates a fresh, uncancelled scope.
    pub fn new() -> Self {
        Self::from_token(CancellationToken::new())
    }

    /// Wraps an existing token in a new scope identity.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            id: ScopeId::next(),
            token,
        }
    }

    /// Creates a child scope, cancelled whenever `self` is cancelled.
    pub fn child(&self) -> Self {
        Self::from_token(self.token.child_token())
    }

    /// Returns the scope identity.
    #[inline]
    pub fn id(&self) -> ScopeId {
        self.id
    }

    /// Returns the underlying cancellation token.
    #[inline]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Completes the scope.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns `true` once the scope has completed.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves when the scope completes.
    pub async fn completed(&self) {
        self.token.cancelled().await
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl From<CancellationToken> for Scope {
    fn from(token: CancellationToken) -> Self {
        Self::from_token(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_identity() {
        let scope = Scope::new();
        let clone = scope.clone();
        assert_eq!(scope.id(), clone.id());
    }

    #[test]
    fn test_same_token_distinct_identity() {
        let token = CancellationToken::new();
        let a = Scope::from_token(token.clone());
        let b = Scope::from(token.clone());
        assert_ne!(a.id(), b.id());

        token.cancel();
        assert!(a.is_cancelled());
        assert!(b.is_cancelled());
    }

    #[test]
    fn test_child_follows_parent() {
        let parent = Scope::new();
        let child = parent.child();
        assert_ne!(parent.id(), child.id());

        child.cancel();
        assert!(!parent.is_cancelled());

        let child2 = parent.child();
        parent.cancel();
        assert!(child2.is_cancelled());
    }

    #[test]
    fn test_display() {
        let scope = Scope::new();
        assert_eq!(
            scope.id().to_string(),
            format!("scope#{}", scope.id().as_u64())
        );
    }

    #[tokio::test]
    async fn test_completed_resolves_after_cancel() {
        let scope = Scope::new();
        let waiter = scope.clone();
        let join = tokio::spawn(async move { waiter.completed().await });
        scope.cancel();
        tokio::time::timeout(std::time::Duration::from_secs(1), join)
            .await
            .expect("completed() did not resolve")
            .expect("waiter panicked");
    }
}
