//! # Registry: scope → fan-out group map.
//!
//! The registry hands out one [`FanoutGroup`] per distinct [`Scope`], creating
//! it lazily on first use, and can close every tracked group at once (this is
//! what the interrupt listener calls).
//!
//! ## Architecture
//! ```text
//! Handle::add(sink) ──► Registry::add(scope, sink)
//!                          └─► find_or_create(scope)
//!                                ├─ read lock:  live hit → Arc<FanoutGroup>
//!                                └─ write lock: re-check → prune → FanoutGroup::spawn_on → insert
//!
//! InterruptListener ──► Registry::close_all()
//!                          └─► write lock: group.close() for each → clear map → RegistryCleared
//! ```
//!
//! ## Rules
//! - At most one group per scope id is ever live in the map.
//! - `close_all` resets the registry: later lookups start fresh groups, even
//!   for scopes that were tracked before.
//! - Groups closed because their scope completed are pruned when a new group is
//!   inserted; a later lookup for that scope yields a group that is already closed.
//! - A group closed with [`FanoutGroup::close`] while its scope is still live
//!   stays in the map (and keeps rejecting) until its scope completes or
//!   `close_all` runs.
//! - Orphaned groups (loop lost with its runtime) are never returned: lookups
//!   replace them and inserts prune them. Sinks registered with an orphaned
//!   group are not notified; pin the registry to a long-lived runtime with
//!   [`Registry::with_runtime`] when callers come and go.

use std::collections::HashMap;
use std::sync::Arc;

use std::future::Future;

use tokio::runtime;
use tokio::sync::{RwLock, broadcast, mpsc};
use tracing::{debug, info};

use crate::core::config::Config;
use crate::core::group::FanoutGroup;
use crate::error::FanoutError;
use crate::events::{Bus, Event, EventKind};
use crate::handle::Handle;
use crate::scope::{Scope, ScopeId};
use crate::sink::Sink;

/// Lazily populated map of scopes to their fan-out groups.
pub struct Registry {
    groups: RwLock<HashMap<ScopeId, Arc<FanoutGroup>>>,
    cfg: Config,
    bus: Bus,
    runtime: Option<runtime::Handle>,
}

impl Registry {
    /// Creates a new, empty registry.
    ///
    /// Most callers want the process-wide instance from [`Registry::global`];
    /// explicit registries are useful for isolation (tests, embedded runtimes).
    /// Group loops run on the runtime of whoever first touches each scope.
    pub fn new(cfg: Config) -> Arc<Self> {
        Self::build(cfg, None)
    }

    /// Creates a new, empty registry whose groups and notifier tasks run on `rt`.
    ///
    /// Groups then survive the runtimes of their callers; they stop only when
    /// `rt` shuts down.
    pub fn with_runtime(cfg: Config, rt: runtime::Handle) -> Arc<Self> {
        Self::build(cfg, Some(rt))
    }

    fn build(cfg: Config, runtime: Option<runtime::Handle>) -> Arc<Self> {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        Arc::new(Self {
            groups: RwLock::new(HashMap::new()),
            cfg,
            bus,
            runtime,
        })
    }

    /// Returns the group for `scope`, creating and starting it if needed.
    ///
    /// # Panics
    /// Panics outside of a tokio runtime unless the registry was built with
    /// [`Registry::with_runtime`].
    pub async fn find_or_create(&self, scope: &Scope) -> Arc<FanoutGroup> {
        let id = scope.id();
        {
            let groups = self.groups.read().await;
            if let Some(group) = groups.get(&id).filter(|g| !g.is_orphaned()) {
                return Arc::clone(group);
            }
        }

        let mut groups = self.groups.write().await;
        if let Some(group) = groups.get(&id).filter(|g| !g.is_orphaned()) {
            return Arc::clone(group);
        }

        let before = groups.len();
        groups.retain(|_, g| !g.is_orphaned() && !(g.is_closed() && g.scope_completed()));
        let pruned = before - groups.len();
        if pruned > 0 {
            debug!(pruned, "pruned completed or orphaned groups");
        }

        let rt = match &self.runtime {
            Some(rt) => rt.clone(),
            None => runtime::Handle::current(),
        };
        let group = FanoutGroup::spawn_on(scope, &self.cfg, self.bus.clone(), &rt);
        groups.insert(id, Arc::clone(&group));
        drop(groups);

        self.bus
            .publish(Event::new(EventKind::GroupCreated).with_scope(id));
        debug!(scope = %id, "fan-out group created");
        group
    }

    /// Registers `sink` with the group for `scope`.
    pub async fn add(&self, scope: &Scope, sink: &Sink) -> bool {
        self.find_or_create(scope).await.add(sink).await
    }

    /// Unregisters `sink` from the group for `scope`.
    pub async fn remove(&self, scope: &Scope, sink: &Sink) -> bool {
        self.find_or_create(scope).await.remove(sink).await
    }

    /// Like [`add`](Self::add), reporting why a rejected request failed.
    pub async fn try_add(&self, scope: &Scope, sink: &Sink) -> Result<(), FanoutError> {
        self.find_or_create(scope).await.try_add(sink).await
    }

    /// Like [`remove`](Self::remove), reporting why a rejected request failed.
    pub async fn try_remove(&self, scope: &Scope, sink: &Sink) -> Result<(), FanoutError> {
        self.find_or_create(scope).await.try_remove(sink).await
    }

    /// Closes every tracked group, then clears the map.
    ///
    /// Returns how many groups were tracked. Closing only starts each group's
    /// shutdown; sinks are notified by the groups' own loops shortly after.
    pub async fn close_all(&self) -> usize {
        let mut groups = self.groups.write().await;
        for group in groups.values() {
            group.close();
        }
        let closed = groups.len();
        groups.clear();
        drop(groups);

        self.bus
            .publish(Event::new(EventKind::RegistryCleared).with_subscribers(closed));
        info!(groups = closed, "closed all fan-out groups");
        closed
    }

    /// Returns a handle bound to `scope` on this registry.
    pub fn handle(self: &Arc<Self>, scope: &Scope) -> Handle {
        Handle::with_registry(Arc::clone(self), scope)
    }

    /// Creates a one-shot notifier for `scope` on this registry.
    ///
    /// See [`Handle::notifier`].
    pub async fn notifier(self: &Arc<Self>, scope: &Scope) -> (mpsc::Receiver<bool>, bool) {
        self.handle(scope).notifier().await
    }

    /// Returns the number of tracked groups.
    pub async fn len(&self) -> usize {
        self.groups.read().await.len()
    }

    /// Returns true if no group is tracked.
    pub async fn is_empty(&self) -> bool {
        self.groups.read().await.is_empty()
    }

    /// Returns sorted list of tracked scope ids.
    pub async fn scopes(&self) -> Vec<ScopeId> {
        let groups = self.groups.read().await;
        let mut ids: Vec<ScopeId> = groups.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Creates a receiver for this registry's runtime events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Returns the configuration groups are created with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub(crate) fn publish(&self, ev: Event) {
        self.bus.publish(ev);
    }

    /// Spawns a helper task next to this registry's groups.
    pub(crate) fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match &self.runtime {
            Some(rt) => {
                rt.spawn(fut);
            }
            None => {
                tokio::spawn(fut);
            }
        }
    }
}
