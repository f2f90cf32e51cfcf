//! # Interrupt sources and the listener that turns them into `close_all`.
//!
//! An [`InterruptSource`] is anything that resolves once when the process should
//! stop. [`InterruptListener`] waits on one source and then closes every group of
//! a [`Registry`], exactly once.
//!
//! ## Architecture
//! ```text
//! OsInterrupt (SIGINT / Ctrl-C) ─┐
//! ManualInterrupt (tests) ───────┼─► InterruptListener::run()
//! custom impl ───────────────────┘       ├─ Ok  → publish InterruptReceived → Registry::close_all()
//!                                        └─ Err → warn, disarm (nothing closed)
//! ```
//!
//! ## Rules
//! - A listener consumes its source: it fires **at most once**.
//! - A failing source never closes anything.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::core::registry::Registry;
use crate::core::signals;
use crate::events::{Event, EventKind};

/// Single-fire external stop event.
#[async_trait]
pub trait InterruptSource: Send + Sync + 'static {
    /// Resolves when the interrupt fires.
    ///
    /// Returns `Err` if the source could not be armed (e.g. signal registration failed).
    async fn wait(&self) -> std::io::Result<()>;

    /// Human-readable name (for logs/events).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Which OS signals count as an interrupt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SignalSet {
    /// `SIGINT` / Ctrl-C only.
    #[default]
    Interrupt,
    /// `SIGINT`, `SIGTERM` and `SIGQUIT` on Unix; Ctrl-C elsewhere.
    Termination,
}

/// Interrupt source backed by OS signals.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsInterrupt {
    signals: SignalSet,
}

impl OsInterrupt {
    /// Creates a source listening for `signals`.
    pub fn new(signals: SignalSet) -> Self {
        Self { signals }
    }

    /// Returns the configured signal set.
    pub fn signals(&self) -> SignalSet {
        self.signals
    }
}

#[async_trait]
impl InterruptSource for OsInterrupt {
    async fn wait(&self) -> std::io::Result<()> {
        match self.signals {
            SignalSet::Interrupt => signals::wait_for_interrupt().await,
            SignalSet::Termination => signals::wait_for_termination().await,
        }
    }

    fn name(&self) -> &'static str {
        match self.signals {
            SignalSet::Interrupt => "os_interrupt",
            SignalSet::Termination => "os_termination",
        }
    }
}

/// Interrupt source fired by calling [`trigger`](Self::trigger).
///
/// Clones share the same trigger.
///
/// ## Example
/// ```rust
/// use interrupt_fanout::{Config, InterruptListener, ManualInterrupt, Registry, Scope, sink};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let registry = Registry::new(Config::default());
///     let interrupt = ManualInterrupt::new();
///     let listener = InterruptListener::new(registry.clone(), interrupt.clone()).spawn();
///
///     let (tx, mut rx) = sink::channel();
///     assert!(registry.add(&Scope::new(), &tx).await);
///
///     interrupt.trigger();
///     assert!(listener.await.unwrap());
///     assert_eq!(rx.recv().await, Some(true));
/// }
/// ```
#[derive(Clone, Debug, Default)]
pub struct ManualInterrupt {
    token: CancellationToken,
}

impl ManualInterrupt {
    /// Creates an untriggered source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires the interrupt. Idempotent.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    /// Returns `true` once triggered.
    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[async_trait]
impl InterruptSource for ManualInterrupt {
    async fn wait(&self) -> std::io::Result<()> {
        self.token.cancelled().await;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "manual"
    }
}

/// Waits for one interrupt and closes every group of a registry.
pub struct InterruptListener {
    registry: Arc<Registry>,
    source: Box<dyn InterruptSource>,
}

impl InterruptListener {
    /// Creates a listener; nothing happens until [`run`](Self::run) or [`spawn`](Self::spawn).
    pub fn new(registry: Arc<Registry>, source: impl InterruptSource) -> Self {
        Self {
            registry,
            source: Box::new(source),
        }
    }

    /// Runs the listener on the current tokio runtime.
    ///
    /// The join handle resolves to the result of [`run`](Self::run).
    pub fn spawn(self) -> JoinHandle<bool> {
        tokio::spawn(self.run())
    }

    /// Waits for the source, then calls [`Registry::close_all`] once.
    ///
    /// Returns `true` if the interrupt fired and the registry was closed,
    /// `false` if the source failed.
    pub async fn run(self) -> bool {
        let name = self.source.name();
        match self.source.wait().await {
            Ok(()) => {
                info!(source = name, "interrupt received; closing all fan-out groups");
                self.registry
                    .publish(Event::new(EventKind::InterruptReceived).with_reason(name));
                self.registry.close_all().await;
                true
            }
            Err(e) => {
                warn!(source = name, error = %e, "interrupt source failed; listener disarmed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::scope::Scope;
    use crate::sink;
    use std::time::Duration;
    use tokio::sync::mpsc::error::TryRecvError;
    use tokio::time;

    const WAIT: Duration = Duration::from_secs(2);

    struct Broken;

    #[async_trait]
    impl InterruptSource for Broken {
        async fn wait(&self) -> std::io::Result<()> {
            Err(std::io::Error::other("no signals here"))
        }
    }

    #[tokio::test]
    async fn test_interrupt_closes_all_scopes() {
        let reg = Registry::new(Config::default());
        let mut events = reg.subscribe();
        let interrupt = ManualInterrupt::new();
        let listener = InterruptListener::new(Arc::clone(&reg), interrupt.clone()).spawn();

        let (a, mut ra) = sink::channel();
        let (b, mut rb) = sink::channel();
        assert!(reg.add(&Scope::new(), &a).await);
        assert!(reg.add(&Scope::new(), &b).await);

        interrupt.trigger();
        assert!(interrupt.is_triggered());
        assert!(time::timeout(WAIT, listener).await.expect("listener hung").expect("panicked"));

        assert_eq!(time::timeout(WAIT, ra.recv()).await, Ok(Some(true)));
        assert_eq!(time::timeout(WAIT, rb.recv()).await, Ok(Some(true)));
        assert!(reg.is_empty().await);

        let mut saw_interrupt = false;
        while let Ok(ev) = events.try_recv() {
            if ev.kind == EventKind::InterruptReceived {
                assert_eq!(ev.reason.as_deref(), Some("manual"));
                saw_interrupt = true;
            }
        }
        assert!(saw_interrupt);
    }

    #[tokio::test]
    async fn test_listener_fires_only_once() {
        let reg = Registry::new(Config::default());
        let interrupt = ManualInterrupt::new();
        let listener = InterruptListener::new(Arc::clone(&reg), interrupt.clone()).spawn();

        interrupt.trigger();
        assert!(listener.await.expect("panicked"));

        let scope = Scope::new();
        let (tx, mut rx) = sink::channel();
        assert!(reg.add(&scope, &tx).await);

        interrupt.trigger();
        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
        assert_eq!(reg.len().await, 1);
    }

    #[tokio::test]
    async fn test_failing_source_closes_nothing() {
        let reg = Registry::new(Config::default());
        let scope = Scope::new();
        let (tx, mut rx) = sink::channel();
        assert!(reg.add(&scope, &tx).await);

        let fired = InterruptListener::new(Arc::clone(&reg), Broken).run().await;
        assert!(!fired);

        time::sleep(Duration::from_millis(30)).await;
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
        assert_eq!(reg.len().await, 1);
    }

    #[test]
    fn test_source_names() {
        assert_eq!(OsInterrupt::default().name(), "os_interrupt");
        assert_eq!(
            OsInterrupt::new(SignalSet::Termination).name(),
            "os_termination"
        );
        assert_eq!(ManualInterrupt::new().name(), "manual");
        assert!(Broken.name().ends_with("Broken"));
        assert_eq!(OsInterrupt::default().signals(), SignalSet::Interrupt);
    }
}
