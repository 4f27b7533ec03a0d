use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use async_trait::async_trait;
use tokio::{
    task::JoinHandle,
    time::{interval_at, Instant},
};

const MIN_SWEEP_PERIOD: Duration = Duration::from_secs(1);

/// A service holding per-user sessions that can go stale.
#[async_trait]
pub trait IdleSessions: Send + Sync + 'static {
    /// Drops every session untouched for longer than `max_idle`; returns how many went.
    async fn evict_idle(&self, max_idle: Duration) -> usize;

    fn kind(&self) -> &'static str;
}

/// Sweeps `service` periodically until the service itself is dropped.
pub fn spawn_sweeper<S: IdleSessions>(service: &Arc<S>, max_idle: Duration) -> JoinHandle<()> {
    let service: Weak<S> = Arc::downgrade(service);
    let period = (max_idle / 4).max(MIN_SWEEP_PERIOD);

    tokio::spawn(async move {
        let mut ticks = interval_at(Instant::now() + period, period);
        loop {
            ticks.tick().await;
            let Some(service) = service.upgrade() else {
                return;
            };
            let evicted = service.evict_idle(max_idle).await;
            if evicted > 0 {
                log::info!("Evicted {} idle {} sessions", evicted, service.kind());
            }
        }
    })
}
