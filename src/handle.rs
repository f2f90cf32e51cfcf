//! # Scope-bound handles and one-shot notifiers.
//!
//! [`Handle`] is what most call sites hold: it remembers one [`Scope`] and a
//! [`Registry`] and forwards `add`/`remove` to the scope's fan-out group.
//! Handles are cheap to clone and carry no other state, so independent call
//! sites that share a scope automatically share its group.
//!
//! [`notifier`] wraps the whole dance into a single call that returns a
//! receiver yielding `true` once, when the scope completes or the process is
//! interrupted.
//!
//! ## Example
//! ```rust
//! use interrupt_fanout::{Scope, notifier};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let scope = Scope::new();
//!     let (mut rx, ok) = notifier(&scope).await;
//!     assert!(ok);
//!
//!     scope.cancel();
//!     assert_eq!(rx.recv().await, Some(true));
//!     assert_eq!(rx.recv().await, None);
//! }
//! ```

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::trace;

use crate::core::Registry;
use crate::error::FanoutError;
use crate::scope::Scope;
use crate::sink::{self, Sink};

/// Façade bound to one scope.
#[derive(Clone)]
pub struct Handle {
    registry: Arc<Registry>,
    scope: Scope,
}

impl Handle {
    /// Binds a handle to `scope` on the process-wide registry.
    ///
    /// The first call in the process arms the interrupt listener (see
    /// [`Registry::global`]). Before that, `SIGINT` terminates the process as
    /// usual; call `Registry::global()` early in `main` to arm it up front.
    pub fn new(scope: &Scope) -> Self {
        Self::with_registry(Registry::global(), scope)
    }

    /// Binds a handle to `scope` on an explicit registry.
    pub fn with_registry(registry: Arc<Registry>, scope: &Scope) -> Self {
        Self {
            registry,
            scope: scope.clone(),
        }
    }

    /// Registers `sink`; `false` iff the scope's group has already closed.
    pub async fn add(&self, sink: &Sink) -> bool {
        self.registry.add(&self.scope, sink).await
    }

    /// Unregisters `sink`; `false` iff the scope's group has already closed.
    pub async fn remove(&self, sink: &Sink) -> bool {
        self.registry.remove(&self.scope, sink).await
    }

    /// Like [`add`](Self::add), reporting why a rejected request failed.
    pub async fn try_add(&self, sink: &Sink) -> Result<(), FanoutError> {
        self.registry.try_add(&self.scope, sink).await
    }

    /// Like [`remove`](Self::remove), reporting why a rejected request failed.
    pub async fn try_remove(&self, sink: &Sink) -> Result<(), FanoutError> {
        self.registry.try_remove(&self.scope, sink).await
    }

    /// Returns the bound scope.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Returns a receiver that yields `true` once when the bound scope's group closes.
    ///
    /// An internal sink is registered and a forwarding task relays the first
    /// notification, unregisters the internal sink, and drops the sending side,
    /// so the receiver yields `None` afterwards. If the caller drops the
    /// receiver first, the forwarding task unregisters early.
    ///
    /// The flag is `false` only if registration was rejected; the receiver is
    /// then already closed.
    pub async fn notifier(&self) -> (mpsc::Receiver<bool>, bool) {
        let (out_tx, out_rx) = mpsc::channel(1);
        let (inner, mut inner_rx) = sink::channel();

        if !self.add(&inner).await {
            return (out_rx, false);
        }

        let handle = self.clone();
        self.registry.spawn(async move {
            let notified = tokio::select! {
                msg = inner_rx.recv() => msg.is_some(),
                _ = out_tx.closed() => false,
            };
            if notified {
                let _ = out_tx.send(true).await;
            }
            handle.remove(&inner).await;
            trace!(scope = %handle.scope.id(), notified, "notifier finished");
        });

        (out_rx, true)
    }
}

/// Creates a one-shot notifier for `scope` on the process-wide registry.
///
/// See [`Handle::notifier`].
pub async fn notifier(scope: &Scope) -> (mpsc::Receiver<bool>, bool) {
    Handle::new(scope).notifier().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use std::time::Duration;
    use tokio::sync::mpsc::error::TryRecvError;
    use tokio::time;

    const WAIT: Duration = Duration::from_secs(2);

    async fn recv_within(rx: &mut mpsc::Receiver<bool>) -> Option<bool> {
        time::timeout(WAIT, rx.recv()).await.ok().flatten()
    }

    async fn settle() {
        time::sleep(Duration::from_millis(30)).await;
    }

    #[tokio::test]
    async fn test_two_scopes_are_independent() {
        let reg = Registry::new(Config::default());
        let x = Scope::new();
        let y = Scope::new();
        let hx = reg.handle(&x);
        let hy = reg.handle(&y);

        let (s1, mut r1) = sink::channel();
        let (s2, mut r2) = sink::channel();
        let (s3, mut r3) = sink::channel();
        assert!(hx.add(&s1).await);
        assert!(hy.add(&s2).await);
        assert!(hx.add(&s3).await);

        x.cancel();
        assert_eq!(recv_within(&mut r1).await, Some(true));
        assert_eq!(recv_within(&mut r3).await, Some(true));
        settle().await;
        assert_eq!(r2.try_recv(), Err(TryRecvError::Empty));

        y.cancel();
        assert_eq!(recv_within(&mut r2).await, Some(true));
    }

    #[tokio::test]
    async fn test_handles_share_scope_group() {
        let reg = Registry::new(Config::default());
        let scope = Scope::new();
        let a = reg.handle(&scope);
        let b = reg.handle(&scope.clone());

        let (tx, mut rx) = sink::channel();
        assert!(a.add(&tx).await);
        assert!(b.add(&tx).await);
        assert_eq!(reg.len().await, 1);

        scope.cancel();
        assert_eq!(recv_within(&mut rx).await, Some(true));
        settle().await;
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn test_notifier_fires_on_cancel() {
        let reg = Registry::new(Config::default());
        let scope = Scope::new();
        let (mut rx, ok) = reg.notifier(&scope).await;
        assert!(ok);

        let reader = tokio::spawn(async move {
            time::timeout(Duration::from_millis(500), rx.recv())
                .await
                .ok()
                .flatten()
        });
        scope.cancel();
        assert_eq!(reader.await.expect("reader panicked"), Some(true));
    }

    #[tokio::test]
    async fn test_notifier_yields_once_then_closes() {
        let reg = Registry::new(Config::default());
        let scope = Scope::new();
        let (mut rx, ok) = reg.notifier(&scope).await;
        assert!(ok);

        reg.close_all().await;
        assert_eq!(recv_within(&mut rx).await, Some(true));
        assert_eq!(time::timeout(WAIT, rx.recv()).await, Ok(None));
    }

    #[tokio::test]
    async fn test_notifier_on_completed_scope_fails() {
        let reg = Registry::new(Config::default());
        let scope = Scope::new();
        scope.cancel();

        let (mut rx, ok) = reg.notifier(&scope).await;
        assert!(!ok);
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_notifier_unregisters_when_receiver_dropped() {
        let reg = Registry::new(Config::default());
        let scope = Scope::new();
        let mut events = reg.subscribe();

        let (rx, ok) = reg.notifier(&scope).await;
        assert!(ok);
        drop(rx);

        let removed = time::timeout(WAIT, async {
            loop {
                match events.recv().await {
                    Ok(ev) if ev.kind == crate::EventKind::SinkRemoved => return ev,
                    Ok(_) => continue,
                    Err(e) => panic!("bus closed: {e}"),
                }
            }
        })
        .await
        .expect("internal sink was not removed");
        assert_eq!(removed.subscribers, Some(0));
    }

    #[tokio::test]
    async fn test_add_after_cancel_rejected() {
        let reg = Registry::new(Config::default());
        let scope = Scope::new();
        let handle = reg.handle(&scope);
        let (tx, mut rx) = sink::channel();

        scope.cancel();
        assert!(!handle.add(&tx).await);
        assert!(handle.try_add(&tx).await.is_err());

        settle().await;
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn test_remove_before_close_suppresses_sink() {
        let reg = Registry::new(Config::default());
        let scope = Scope::new();
        let handle = reg.handle(&scope);
        let (kept, mut kept_rx) = sink::channel();
        let (gone, mut gone_rx) = sink::channel();

        assert!(handle.add(&kept).await);
        assert!(handle.add(&gone).await);
        assert!(handle.remove(&gone).await);
        assert!(handle.try_remove(&gone).await.is_ok());

        scope.cancel();
        assert_eq!(recv_within(&mut kept_rx).await, Some(true));
        settle().await;
        assert_eq!(gone_rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn test_global_handle_notifier() {
        let scope = Scope::new();
        let handle = Handle::new(&scope);
        assert_eq!(handle.scope().id(), scope.id());

        let (mut rx, ok) = notifier(&scope).await;
        assert!(ok);
        scope.cancel();
        assert_eq!(recv_within(&mut rx).await, Some(true));
    }
}
