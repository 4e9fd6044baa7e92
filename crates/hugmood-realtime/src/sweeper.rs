//! Liveness sweeper: evicts connections that have gone quiet.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time;

use hugmood_core::config::RealtimeConfig;

use crate::broadcast::Broadcaster;
use crate::connection::{CLOSE_NORMAL, ConnectionRegistry};
use crate::metrics::GatewayMetrics;

/// Close reason sent to evicted connections.
pub const IDLE_CLOSE_REASON: &str = "Inactive timeout";

/// Periodically closes connections with no inbound traffic for longer than
/// the idle threshold.
#[derive(Debug, Clone)]
pub struct Sweeper {
    registry: Arc<ConnectionRegistry>,
    broadcaster: Arc<Broadcaster>,
    metrics: Arc<GatewayMetrics>,
    threshold: chrono::Duration,
    period: Duration,
}

impl Sweeper {
    /// Create a sweeper using the idle threshold and period of `config`.
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        broadcaster: Arc<Broadcaster>,
        metrics: Arc<GatewayMetrics>,
        config: &RealtimeConfig,
    ) -> Self {
        Self {
            registry,
            broadcaster,
            metrics,
            threshold: chrono::Duration::seconds(
                i64::try_from(config.idle_timeout_seconds).unwrap_or(i64::MAX),
            ),
            period: config.sweep_interval(),
        }
    }

    /// Run one pass at `now`. Returns the number of evicted connections.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let mut evicted = 0;
        for id in self.registry.idle_connections(now, self.threshold) {
            // Activity may have arrived since the scan.
            let still_idle = self
                .registry
                .find(id)
                .is_some_and(|conn| conn.idle_for(now) > self.threshold);
            if !still_idle {
                continue;
            }

            let Some(removal) = self.registry.remove(id) else {
                continue;
            };
            let conn = removal.connection;
            conn.handle.close(CLOSE_NORMAL, IDLE_CLOSE_REASON);
            self.metrics.record_swept();
            self.metrics.record_disconnect();
            evicted += 1;

            tracing::info!(
                conn_id = %id,
                user_id = ?conn.user_id,
                idle_seconds = conn.idle_for(now).num_seconds(),
                "Closed inactive connection"
            );

            if removal.user_offline {
                if let Some(user_id) = &conn.user_id {
                    self.broadcaster.announce_presence(user_id, false);
                }
            }
        }
        evicted
    }

    /// Sweep every period until `cancel` flips to `true`.
    pub async fn run(self, mut cancel: watch::Receiver<bool>) {
        tracing::info!(
            period_seconds = self.period.as_secs(),
            idle_seconds = self.threshold.num_seconds(),
            "Liveness sweeper started"
        );
        let mut interval = time::interval(self.period);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        break;
                    }
                }
                _ = interval.tick() => {
                    let evicted = self.sweep(Utc::now());
                    if evicted > 0 {
                        tracing::info!(evicted, remaining = self.registry.len(), "Sweep complete");
                    }
                }
            }
        }
        tracing::info!("Liveness sweeper stopped");
    }
}
