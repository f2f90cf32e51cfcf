//! # Runtime configuration.
//!
//! Provides [`Config`] centralized settings for registries and the fan-out groups they create.
//!
//! ## Sentinel values
//! - `queue_capacity = 0` → clamped to 1
//! - `bus_capacity = 0` → clamped to 1
//! - `drain_grace = 0s` → the drain only applies requests already queued when closing starts

use std::time::Duration;

/// Configuration for a [`Registry`](crate::Registry) and its groups.
///
/// ## Field semantics
/// - `drain_grace`: How long a closing group waits for each further in-flight request
/// - `queue_capacity`: Bound of each group's request queue (min 1)
/// - `bus_capacity`: Event bus ring buffer size (min 1)
#[derive(Clone, Debug)]
pub struct Config {
    /// Idle window granted to in-flight add/remove requests once a group starts closing.
    ///
    /// Each request received during the drain restarts the window. When it lapses
    /// the request queue is closed and later submissions fail immediately.
    pub drain_grace: Duration,

    /// Capacity of each group's add/remove request queue.
    ///
    /// Submitters wait for a free slot; the wait ends as soon as the loop
    /// consumes a request or the queue is closed.
    pub queue_capacity: usize,

    /// Capacity of the registry event bus broadcast channel.
    pub bus_capacity: usize,
}

impl Config {
    /// Returns the request queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn queue_capacity_clamped(&self) -> usize {
        self.queue_capacity.max(1)
    }

    /// Returns the bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `drain_grace = 1ms`
    /// - `queue_capacity = 10`
    /// - `bus_capacity = 256`
    fn default() -> Self {
        Self {
            drain_grace: Duration::from_millis(1),
            queue_capacity: 10,
            bus_capacity: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.drain_grace, Duration::from_millis(1));
        assert_eq!(cfg.queue_capacity_clamped(), 10);
        assert_eq!(cfg.bus_capacity_clamped(), 256);
    }

    #[test]
    fn test_zero_capacities_clamped() {
        let cfg = Config {
            queue_capacity: 0,
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.queue_capacity_clamped(), 1);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
