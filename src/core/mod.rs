//! Runtime core: groups, the registry, and interrupt handling.
//!
//! Internal modules:
//! - [`group`]: one actor loop per scope, owning the sink set and delivering the notification;
//! - [`registry`]: scope → group map with lazy creation and `close_all`;
//! - [`global`]: the process-wide registry and its OS interrupt listener;
//! - [`interrupt`]: interrupt sources and the listener driving `close_all`;
//! - [`signals`]: cross-platform OS signal waiting;
//! - [`config`]: registry/group settings.

mod config;
mod global;
mod group;
mod interrupt;
mod registry;
mod signals;

pub use config::Config;
pub use group::{FanoutGroup, GroupState};
pub use interrupt::{InterruptListener, InterruptSource, ManualInterrupt, OsInterrupt, SignalSet};
pub use registry::Registry;
pub use signals::{wait_for_interrupt, wait_for_termination};
