//! Background stale-session sweep

use tokio::time::MissedTickBehavior;

use crate::registry::SessionRegistry;
use crate::store::SessionStore;

/// Run the stale-session sweep until the task is aborted.
///
/// Spawned by the service alongside the HTTP server; errors are logged and
/// the next tick retries, since the store TTL bounds the damage of a
/// missed sweep.
pub async fn run_sweeper<S: SessionStore>(registry: SessionRegistry<S>) {
    let mut interval = tokio::time::interval(registry.sweep_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        match registry.cleanup_stale().await {
            Ok(0) => {}
            Ok(cleaned) => tracing::info!(cleaned, "stale sessions cleaned up"),
            Err(e) => tracing::warn!(error = %e, "stale session sweep failed"),
        }
    }
}
