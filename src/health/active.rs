//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every backend
//! - Update backend liveness based on results

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant};

use crate::config::HealthCheckConfig;
use crate::health::probe::Probe;
use crate::load_balancer::BackendPool;

pub struct HealthMonitor {
    pool: Arc<BackendPool>,
    probe: Arc<dyn Probe>,
    interval: Duration,
    timeout: Duration,
}

impl HealthMonitor {
    pub fn new(pool: Arc<BackendPool>, probe: Arc<dyn Probe>, config: &HealthCheckConfig) -> Self {
        Self {
            pool,
            probe,
            interval: Duration::from_secs(config.interval_secs),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Run forever. The first round starts one full interval after the call.
    pub async fn run(self) {
        tracing::info!(
            interval = ?self.interval,
            timeout = ?self.timeout,
            "Health monitor starting"
        );

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        loop {
            ticker.tick().await;
            self.run_once().await;
        }
    }

    /// Perform a single health check round over the whole pool.
    pub async fn run_once(&self) {
        tracing::info!("Starting health check");
        self.pool.health_check(self.probe.as_ref(), self.timeout).await;
        tracing::info!(
            live = self.pool.live_count(),
            total = self.pool.len(),
            "Health check completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::backend::tests::OkForwarder;
    use crate::load_balancer::Backend;
    use futures_util::future::BoxFuture;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use url::Url;

    /// Probe whose answer can be flipped by the test.
    struct ToggleProbe {
        reachable: AtomicBool,
        calls: AtomicUsize,
    }

    impl Probe for ToggleProbe {
        fn can_connect<'a>(&'a self, _target: &'a Url, _timeout: Duration) -> BoxFuture<'a, bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let alive = self.reachable.load(Ordering::SeqCst);
            Box::pin(async move { alive })
        }
    }

    fn single_pool(url: &str) -> Arc<BackendPool> {
        Arc::new(
            BackendPool::builder()
                .add(Backend::new(Url::parse(url).unwrap(), Arc::new(OkForwarder)))
                .build()
                .unwrap(),
        )
    }

    fn config(interval_secs: u64) -> HealthCheckConfig {
        HealthCheckConfig {
            enabled: true,
            interval_secs,
            timeout_secs: 2,
        }
    }

    #[tokio::test]
    async fn test_tick_revives_dead_backend() {
        let pool = single_pool("http://127.0.0.1:5001");
        let url = pool.backends()[0].url().clone();
        pool.set_status(&url, false);
        assert!(pool.next_live().is_none());

        let probe = Arc::new(ToggleProbe { reachable: AtomicBool::new(true), calls: AtomicUsize::new(0) });
        let monitor = HealthMonitor::new(pool.clone(), probe, &config(120));
        monitor.run_once().await;

        assert_eq!(pool.next_live().unwrap().url(), &url);
    }

    #[tokio::test]
    async fn test_tick_marks_unreachable_backend_dead() {
        let pool = single_pool("http://127.0.0.1:5001");
        let probe = Arc::new(ToggleProbe { reachable: AtomicBool::new(false), calls: AtomicUsize::new(0) });
        let monitor = HealthMonitor::new(pool.clone(), probe, &config(120));
        monitor.run_once().await;

        assert_eq!(pool.live_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_waits_full_interval_before_first_round() {
        let pool = single_pool("http://127.0.0.1:5001");
        let probe = Arc::new(ToggleProbe { reachable: AtomicBool::new(true), calls: AtomicUsize::new(0) });
        let monitor = HealthMonitor::new(pool, probe.clone(), &config(120));
        tokio::spawn(monitor.run());

        time::sleep(Duration::from_secs(119)).await;
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);

        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(probe.calls.load(Ordering::SeqCst), 1);

        time::sleep(Duration::from_secs(120)).await;
        assert_eq!(probe.calls.load(Ordering::SeqCst), 2);
    }
}
