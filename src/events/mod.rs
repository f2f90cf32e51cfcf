//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/observe what fan-out groups, registries and interrupt listeners do.
//!
//! ## Contents
//! - [`EventKind`], [`Event`], [`CloseReason`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: group loops (`SinkAdded`, `SinkRemoved`, `GroupClosing`,
//!   `GroupClosed`, `NotificationDropped`), delivery tasks, `Registry`
//!   (`GroupCreated`, `RegistryCleared`), `InterruptListener` (`InterruptReceived`).
//! - **Consumers**: anything holding a receiver from `Registry::subscribe()`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{CloseReason, Event, EventKind};
