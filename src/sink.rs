//! # Notification sinks.
//!
//! A sink is a caller-owned, single-slot channel that receives at most one
//! `true` per fan-out group it is registered with. The crate only ever holds
//! clones of the sending half; it never closes a sink it did not create.
//!
//! Sinks are compared by channel identity ([`mpsc::Sender::same_channel`]),
//! so registering two clones of the same sender counts as one subscription.

use tokio::sync::mpsc;

/// Sending half of a notification channel.
pub type Sink = mpsc::Sender<bool>;

/// Creates a single-slot notification channel.
///
/// ## Example
/// ```rust
/// let (sink, mut rx) = interrupt_fanout::sink::channel();
/// sink.try_send(true).unwrap();
/// assert_eq!(rx.try_recv(), Ok(true));
/// ```
pub fn channel() -> (Sink, mpsc::Receiver<bool>) {
    mpsc::channel(1)
}

/// Returns `true` if both senders feed the same channel.
#[inline]
pub(crate) fn same_sink(a: &Sink, b: &Sink) -> bool {
    a.same_channel(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_are_same_sink() {
        let (a, _rx) = channel();
        let b = a.clone();
        let (c, _rx2) = channel();

        assert!(same_sink(&a, &b));
        assert!(!same_sink(&a, &c));
    }
}
