//! # Process-wide registry.
//!
//! [`Registry::global`] lazily creates one registry per process. The first
//! access starts a dedicated OS thread with its own single-threaded runtime.
//! That runtime hosts the [`InterruptListener`] over [`OsInterrupt`] and every
//! group loop of the global registry, so groups outlive any runtime the caller
//! happens to use.
//!
//! If the thread or its runtime cannot be started the failure is logged and the
//! registry falls back to caller runtimes; it then never receives interrupts.

use std::sync::{Arc, OnceLock, mpsc as std_mpsc};

use tokio::runtime;
use tracing::{debug, warn};

use crate::core::config::Config;
use crate::core::interrupt::{InterruptListener, OsInterrupt};
use crate::core::registry::Registry;

static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();

impl Registry {
    /// Returns the process-wide registry, creating it on first use.
    ///
    /// The first call arms the OS interrupt listener. Until then `SIGINT` keeps
    /// its default behavior and terminates the process; from then on `SIGINT`
    /// (Ctrl-C on Windows) closes every group instead.
    pub fn global() -> Arc<Registry> {
        Arc::clone(GLOBAL.get_or_init(|| match start_host() {
            Some((rt, armed)) => {
                let registry = Registry::with_runtime(Config::default(), rt.clone());
                if armed.send(Arc::clone(&registry)).is_err() {
                    warn!("interrupt listener thread exited before arming");
                }
                registry
            }
            None => Registry::new(Config::default()),
        }))
    }
}

/// Starts the host thread; returns its runtime handle and the channel that arms the listener.
fn start_host() -> Option<(runtime::Handle, std_mpsc::SyncSender<Arc<Registry>>)> {
    let (handle_tx, handle_rx) = std_mpsc::sync_channel(1);
    let (arm_tx, arm_rx) = std_mpsc::sync_channel::<Arc<Registry>>(1);

    let spawned = std::thread::Builder::new()
        .name("interrupt-fanout".into())
        .spawn(move || {
            let rt = match runtime::Builder::new_current_thread().enable_all().build() {
                Ok(rt) => rt,
                Err(e) => {
                    warn!(error = %e, "failed to build interrupt-fanout runtime");
                    return;
                }
            };
            if handle_tx.send(rt.handle().clone()).is_err() {
                return;
            }
            let Ok(registry) = arm_rx.recv() else {
                return;
            };

            rt.block_on(async move {
                let fired = InterruptListener::new(registry, OsInterrupt::default())
                    .run()
                    .await;
                debug!(fired, "global interrupt listener exited");
                // keep hosting group loops for the rest of the process
                std::future::pending::<()>().await
            });
        });

    if let Err(e) = spawned {
        warn!(error = %e, "failed to spawn interrupt-fanout thread");
        return None;
    }
    handle_rx.recv().ok().map(|rt| (rt, arm_tx))
}
