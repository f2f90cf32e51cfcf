//! # Cross-platform OS signal waiting.
//!
//! Provides async helpers that complete when the process receives an interrupt
//! or termination signal. Used by [`OsInterrupt`](crate::OsInterrupt).
//!
//! ## Signals
//! **Unix platforms:**
//! - [`wait_for_interrupt`]: `SIGINT` (Ctrl-C in terminal)
//! - [`wait_for_termination`]: `SIGINT`, `SIGTERM` (systemd/Kubernetes), `SIGQUIT`
//!
//! **Windows platforms:**
//! - both helpers wait for `Ctrl-C` via [`tokio::signal::ctrl_c`]
//!
//! Once a listener is registered the default disposition of the signal is
//! replaced for the rest of the process: `SIGINT` no longer terminates it.

/// Waits for an interrupt signal.
///
/// Each call creates independent signal listeners.
///
/// Returns `Ok(())` when the signal is received, or `Err` if signal registration fails.
#[cfg(unix)]
pub async fn wait_for_interrupt() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    sigint.recv().await;
    Ok(())
}

/// Waits for an interrupt signal.
///
/// Returns `Ok(())` when Ctrl-C is received, or `Err` if registration fails.
#[cfg(not(unix))]
pub async fn wait_for_interrupt() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

/// Waits for any termination signal.
///
/// Each call creates independent signal listeners.
///
/// Returns `Ok(())` when any signal is received, or `Err` if signal registration fails.
#[cfg(unix)]
pub async fn wait_for_termination() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = sigint.recv()  => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

/// Waits for any termination signal.
///
/// Returns `Ok(())` when Ctrl-C is received, or `Err` if registration fails.
#[cfg(not(unix))]
pub async fn wait_for_termination() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
