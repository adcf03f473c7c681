use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use yatube_api::AppStateInner;

/// Background task that drops expired page cache entries.
///
/// Expired entries are never served, so this only bounds memory held by
/// pages nobody has asked for since they went stale.
pub async fn run_purge_loop(state: Arc<AppStateInner>, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        let purged = state.cache.purge_expired();
        if purged > 0 {
            info!("Purge: dropped {} expired cached pages", purged);
        } else {
            debug!("Purge: nothing expired, {} cached pages", state.cache.len());
        }
    }
}
