//! # interrupt-fanout
//!
//! **interrupt-fanout** delivers exactly one "stop now" notification to every
//! channel registered against a cancellation scope, when that scope completes
//! or the process is interrupted, whichever comes first.
//!
//! Any number of independent call sites can register sinks (`mpsc::Sender<bool>`)
//! for the same [`Scope`]; they all share one fan-out group per scope. Each sink
//! registered and not removed before the group closes receives `true` exactly
//! once. A sink is never notified twice and never notified after removal.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   Handle A   │   │   Handle B   │   │  notifier()  │
//!     │  (scope X)   │   │  (scope X)   │   │  (scope Y)   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Registry (process-wide via Registry::global, or explicit)        │
//! │  - ScopeId → Arc<FanoutGroup> (created lazily)                    │
//! │  - Bus (broadcast events)                                         │
//! │  - close_all() (driven by InterruptListener)                      │
//! └──────┬──────────────────────────────────────┬─────────────────────┘
//!        ▼                                      ▼
//!     ┌──────────────────────┐               ┌──────────────────────┐
//!     │  FanoutGroup (X)     │               │  FanoutGroup (Y)     │
//!     │  actor loop:         │               │  actor loop:         │
//!     │  - Add / Remove      │               │  - Add / Remove      │
//!     │  - scope completed ─┐│               │  - scope completed ─┐│
//!     │  - close()         ─┤│               │  - close()         ─┤│
//!     └─────────────────────┼┘               └─────────────────────┼┘
//!                           ▼                                      ▼
//!               drain → send(true) to each sink        drain → send(true) to each sink
//! ```
//!
//! ### Lifecycle
//! ```text
//! Running ──(scope completed | close())──► Closing ──(drain, dispatch)──► Closed
//!    │                                        │                            │
//!    └─ add/remove applied, acked `true`      └─ in-flight requests        └─ add/remove
//!                                                applied within the           rejected with
//!                                                drain grace                  `false`
//! ```
//!
//! ## Features
//! | Area              | Description                                                | Key types / traits                          |
//! |-------------------|------------------------------------------------------------|---------------------------------------------|
//! | **Handles**       | Register/unregister sinks for a scope.                     | [`Handle`], [`notifier`]                    |
//! | **Groups**        | Per-scope serialized sink set and one-time dispatch.       | [`FanoutGroup`], [`GroupState`]             |
//! | **Registry**      | Scope → group map, process-wide or explicit.               | [`Registry`]                                |
//! | **Interrupts**    | Close everything on SIGINT or a custom trigger.            | [`InterruptSource`], [`InterruptListener`]  |
//! | **Events**        | Observe group and registry lifecycle.                      | [`Event`], [`EventKind`], [`Bus`]           |
//! | **Errors**        | Typed rejection reasons.                                   | [`FanoutError`]                             |
//! | **Configuration** | Drain grace, queue and bus capacities.                     | [`Config`]                                  |
//!
//! ## Example
//! ```rust
//! use interrupt_fanout::{Config, Registry, Scope, sink};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let registry = Registry::new(Config::default());
//!     let scope = Scope::new();
//!     let handle = registry.handle(&scope);
//!
//!     let (a, mut ra) = sink::channel();
//!     let (b, mut rb) = sink::channel();
//!     assert!(handle.add(&a).await);
//!     assert!(handle.add(&b).await);
//!     assert!(handle.remove(&b).await);
//!
//!     scope.cancel();
//!     assert_eq!(ra.recv().await, Some(true));
//!
//!     // Removed sinks are never notified; the group is now closed.
//!     assert!(!handle.add(&b).await);
//!     assert!(rb.try_recv().is_err());
//! }
//! ```
mod core;
mod error;
mod events;
mod handle;
mod scope;
pub mod sink;

// ---- Public re-exports ----

pub use crate::core::{
    Config, FanoutGroup, GroupState, InterruptListener, InterruptSource, ManualInterrupt,
    OsInterrupt, Registry, SignalSet, wait_for_interrupt, wait_for_termination,
};
pub use error::FanoutError;
pub use events::{Bus, CloseReason, Event, EventKind};
pub use handle::{Handle, notifier};
pub use scope::{Scope, ScopeId};
pub use sink::Sink;
