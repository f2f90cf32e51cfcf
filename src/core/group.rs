//! # FanoutGroup: per-scope subscriber actor.
//!
//! Owns the deduplicated set of sinks registered against one [`Scope`] and
//! notifies each of them exactly once when the group closes.
//!
//! ## Lifecycle
//! ```text
//! RUNNING ──(scope completed | close())──► CLOSING ──(drain, dispatch)──► CLOSED
//! ```
//!
//! ## Architecture
//! ```text
//! add(sink) ──┐                           ┌─► sinks: Vec<Sink> (single writer)
//! remove(sink)┼─► [request queue] ──► loop┤
//!             │     (bounded mpsc)        └─► ack (oneshot) ──► caller resumes
//! close() ────┼─► shutdown token ─────► loop
//! scope ──────┘   completed()      ───► loop
//!
//! loop {
//!   ├─► scope completed       → CLOSING (ScopeCompleted)
//!   ├─► shutdown cancelled    → CLOSING (Explicit)
//!   └─► request               → apply + ack
//! }
//! CLOSING:
//!   ├─► apply requests until `drain_grace` passes with nothing new
//!   ├─► close queue, apply whatever is still buffered
//!   ├─► spawn one delivery task per sink: sink.send(true)
//!   └─► CLOSED, release `closed()` waiters
//! ```
//!
//! ## Rules
//! - The subscriber set is touched **only** by the loop task.
//! - Every request the loop receives is applied **and** acknowledged, including
//!   requests drained while closing; a request the loop never receives fails.
//! - A caller that got `true` from `add` is notified exactly once; `false` means
//!   the request had no effect.
//! - Closing triggers are coalesced: the group closes exactly once.
//! - Delivery tasks are independent: an unread or dropped sink never delays others.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering as AtomicOrdering};
use std::time::Duration;

use tokio::runtime;
use tokio::sync::{mpsc, oneshot};
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::core::config::Config;
use crate::error::FanoutError;
use crate::events::{Bus, CloseReason, Event, EventKind};
use crate::scope::{Scope, ScopeId};
use crate::sink::{Sink, same_sink};

/// Lifecycle state of a [`FanoutGroup`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupState {
    /// Accepting add/remove requests.
    Running,
    /// Draining in-flight requests; new submissions are rejected.
    Closing,
    /// Notifications dispatched; terminal.
    Closed,
}

impl GroupState {
    const fn as_u8(self) -> u8 {
        match self {
            GroupState::Running => 0,
            GroupState::Closing => 1,
            GroupState::Closed => 2,
        }
    }

    const fn from_u8(v: u8) -> Self {
        match v {
            0 => GroupState::Running,
            1 => GroupState::Closing,
            _ => GroupState::Closed,
        }
    }
}

/// Mutation submitted to the group loop.
enum Request {
    Add { sink: Sink, ack: oneshot::Sender<()> },
    Remove { sink: Sink, ack: oneshot::Sender<()> },
}

/// Handle to a per-scope fan-out group.
///
/// Cheap to share behind an `Arc`; all handles talk to the same loop task.
/// Dropping every handle does not close the group: registered sinks are still
/// notified when the scope completes.
pub struct FanoutGroup {
    scope: Scope,
    state: Arc<AtomicU8>,
    shutdown: CancellationToken,
    closed: CancellationToken,
    tx: mpsc::Sender<Request>,
}

impl FanoutGroup {
    /// Starts a group bound to `scope` and spawns its loop on the current tokio runtime.
    ///
    /// # Panics
    /// Panics if called outside of a tokio runtime (same as [`tokio::spawn`]).
    pub fn spawn(scope: &Scope, cfg: &Config, bus: Bus) -> Arc<Self> {
        Self::spawn_on(scope, cfg, bus, &runtime::Handle::current())
    }

    /// Starts a group bound to `scope` and spawns its loop on `rt`.
    ///
    /// The loop and its delivery tasks live as long as `rt` does. If `scope`
    /// has already completed, the group is created in the [`GroupState::Closed`]
    /// state and no task is spawned.
    pub fn spawn_on(scope: &Scope, cfg: &Config, bus: Bus, rt: &runtime::Handle) -> Arc<Self> {
        let (tx, rx) = mpsc::channel(cfg.queue_capacity_clamped());
        let group = Arc::new(Self {
            scope: scope.clone(),
            state: Arc::new(AtomicU8::new(GroupState::Running.as_u8())),
            shutdown: CancellationToken::new(),
            closed: CancellationToken::new(),
            tx,
        });

        if scope.is_cancelled() {
            group.state.store(GroupState::Closed.as_u8(), AtomicOrdering::SeqCst);
            group.closed.cancel();
            trace!(scope = %scope.id(), "scope already completed; group created closed");
            return group;
        }

        let worker = GroupLoop {
            scope: scope.clone(),
            state: Arc::clone(&group.state),
            shutdown: group.shutdown.clone(),
            closed: group.closed.clone(),
            rx,
            sinks: Vec::new(),
            bus,
            grace: cfg.drain_grace,
        };
        rt.spawn(worker.run());
        group
    }

    /// Registers `sink`; returns `false` iff the group is no longer running.
    ///
    /// Resolves once the loop has applied the request. Adding the same sink
    /// twice is a no-op that still returns `true`.
    pub async fn add(&self, sink: &Sink) -> bool {
        self.try_add(sink).await.is_ok()
    }

    /// Unregisters `sink`; returns `false` iff the group is no longer running.
    ///
    /// The result does not say whether the sink was subscribed.
    pub async fn remove(&self, sink: &Sink) -> bool {
        self.try_remove(sink).await.is_ok()
    }

    /// Like [`add`](Self::add), reporting why a rejected request failed.
    pub async fn try_add(&self, sink: &Sink) -> Result<(), FanoutError> {
        self.submit(|ack| Request::Add {
            sink: sink.clone(),
            ack,
        })
        .await
    }

    /// Like [`remove`](Self::remove), reporting why a rejected request failed.
    pub async fn try_remove(&self, sink: &Sink) -> Result<(), FanoutError> {
        self.submit(|ack| Request::Remove {
            sink: sink.clone(),
            ack,
        })
        .await
    }

    /// Requests closure. Idempotent; safe to race with scope completion.
    ///
    /// Submissions made after this returns are rejected. Use
    /// [`closed`](Self::closed) to wait for notifications to be dispatched.
    pub fn close(&self) {
        let moved = self
            .state
            .compare_exchange(
                GroupState::Running.as_u8(),
                GroupState::Closing.as_u8(),
                AtomicOrdering::SeqCst,
                AtomicOrdering::SeqCst,
            )
            .is_ok();
        if moved {
            self.shutdown.cancel();
        }
    }

    /// Resolves once the group is [`GroupState::Closed`] and every delivery task is spawned.
    pub async fn closed(&self) {
        self.closed.cancelled().await
    }

    /// Returns the current lifecycle state.
    #[inline]
    pub fn state(&self) -> GroupState {
        GroupState::from_u8(self.state.load(AtomicOrdering::SeqCst))
    }

    /// Returns `true` once notifications have been dispatched.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.state() == GroupState::Closed
    }

    /// Returns the identity of the bound scope.
    #[inline]
    pub fn scope_id(&self) -> ScopeId {
        self.scope.id()
    }

    /// Returns `true` if the bound scope has completed.
    #[inline]
    pub fn scope_completed(&self) -> bool {
        self.scope.is_cancelled()
    }

    /// Returns `true` if the loop is gone while the group still reports [`GroupState::Running`].
    ///
    /// This happens when the runtime the loop was spawned on shuts down. Such a
    /// group can neither accept requests nor notify its sinks.
    pub fn is_orphaned(&self) -> bool {
        self.state() == GroupState::Running && self.tx.is_closed()
    }

    /// Sends one request and waits for its acknowledgement.
    async fn submit<F>(&self, make: F) -> Result<(), FanoutError>
    where
        F: FnOnce(oneshot::Sender<()>) -> Request,
    {
        let scope = self.scope.id();
        if self.state() != GroupState::Running || self.scope.is_cancelled() {
            return Err(FanoutError::Closed { scope });
        }

        let (ack, done) = oneshot::channel();
        self.tx
            .send(make(ack))
            .await
            .map_err(|_| FanoutError::Rejected { scope })?;
        done.await.map_err(|_| FanoutError::Rejected { scope })
    }
}

impl fmt::Debug for FanoutGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FanoutGroup")
            .field("scope", &self.scope.id())
            .field("state", &self.state())
            .finish()
    }
}

/// State owned by the group's loop task.
struct GroupLoop {
    scope: Scope,
    state: Arc<AtomicU8>,
    shutdown: CancellationToken,
    closed: CancellationToken,
    rx: mpsc::Receiver<Request>,
    sinks: Vec<Sink>,
    bus: Bus,
    grace: Duration,
}

impl GroupLoop {
    async fn run(mut self) {
        let id = self.scope.id();
        let trigger = self.serve().await;

        // losing the transition means close() got there first
        let reason = match self.state.compare_exchange(
            GroupState::Running.as_u8(),
            GroupState::Closing.as_u8(),
            AtomicOrdering::SeqCst,
            AtomicOrdering::SeqCst,
        ) {
            Ok(_) => trigger,
            Err(_) => CloseReason::Explicit,
        };
        debug!(scope = %id, reason = reason.as_label(), "fan-out group closing");
        self.bus.publish(
            Event::new(EventKind::GroupClosing)
                .with_scope(id)
                .with_close_reason(reason),
        );

        self.drain().await;
        let notified = self.dispatch();

        self.state
            .store(GroupState::Closed.as_u8(), AtomicOrdering::SeqCst);
        self.bus.publish(
            Event::new(EventKind::GroupClosed)
                .with_scope(id)
                .with_subscribers(notified)
                .with_close_reason(reason),
        );
        self.closed.cancel();
        debug!(scope = %id, subscribers = notified, "fan-out group closed");
    }

    /// Applies requests until a closing trigger fires.
    ///
    /// Triggers are polled first so closing is never outrun by a steady stream
    /// of requests; those are picked up by the drain instead.
    async fn serve(&mut self) -> CloseReason {
        let id = self.scope.id();
        loop {
            tokio::select! {
                biased;
                reason = first_trigger(&self.scope, &self.shutdown) => return reason,
                Some(req) = self.rx.recv() => apply(&mut self.sinks, &self.bus, id, req),
            }
        }
    }

    /// Applies in-flight requests, then shuts the request path.
    async fn drain(&mut self) {
        let id = self.scope.id();
        let mut applied = 0usize;

        while let Ok(Some(req)) = time::timeout(self.grace, self.rx.recv()).await {
            apply(&mut self.sinks, &self.bus, id, req);
            applied += 1;
        }

        self.rx.close();
        while let Ok(req) = self.rx.try_recv() {
            apply(&mut self.sinks, &self.bus, id, req);
            applied += 1;
        }
        trace!(scope = %id, applied, "drain window closed");
    }

    /// Spawns one delivery task per subscribed sink; returns how many.
    fn dispatch(&mut self) -> usize {
        let id = self.scope.id();
        let count = self.sinks.len();

        for sink in self.sinks.drain(..) {
            let bus = self.bus.clone();
            tokio::spawn(async move {
                if sink.send(true).await.is_err() {
                    debug!(scope = %id, "sink receiver dropped before delivery");
                    bus.publish(
                        Event::new(EventKind::NotificationDropped)
                            .with_scope(id)
                            .with_reason("receiver_dropped"),
                    );
                }
            });
        }
        count
    }
}

/// Resolves with whichever closing trigger fires first.
async fn first_trigger(scope: &Scope, shutdown: &CancellationToken) -> CloseReason {
    tokio::select! {
        biased;
        _ = shutdown.cancelled() => CloseReason::Explicit,
        _ = scope.completed() => CloseReason::ScopeCompleted,
    }
}

/// Applies one request to the subscriber set and acknowledges it.
fn apply(sinks: &mut Vec<Sink>, bus: &Bus, scope: ScopeId, req: Request) {
    match req {
        Request::Add { sink, ack } => {
            if !sinks.iter().any(|s| same_sink(s, &sink)) {
                sinks.push(sink);
            }
            bus.publish(
                Event::new(EventKind::SinkAdded)
                    .with_scope(scope)
                    .with_subscribers(sinks.len()),
            );
            // caller may have given up waiting
            let _ = ack.send(());
        }
        Request::Remove { sink, ack } => {
            if let Some(pos) = sinks.iter().position(|s| same_sink(s, &sink)) {
                sinks.remove(pos);
            }
            bus.publish(
                Event::new(EventKind::SinkRemoved)
                    .with_scope(scope)
                    .with_subscribers(sinks.len()),
            );
            let _ = ack.send(());
        }
    }
}
