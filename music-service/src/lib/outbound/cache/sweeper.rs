use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::domain::auth::ports::TokenCache;

/// Periodically purge expired cache entries until the runtime shuts down.
pub fn spawn_cleanup_task<TC>(cache: Arc<TC>, every: Duration) -> JoinHandle<()>
where
    TC: TokenCache,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match cache.cleanup_expired().await {
                Ok(0) => {}
                Ok(removed) => tracing::debug!(removed, "Expired cache entries purged"),
                Err(e) => tracing::warn!(error = %e, "Cache cleanup failed"),
            }
        }
    })
}
