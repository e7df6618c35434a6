use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info};

pub mod tasks;

/// Job scheduler for background tasks
pub struct JobScheduler {
    context: Arc<crate::context::AppContext>,
    started: Instant,
}

impl JobScheduler {
    pub fn new(context: Arc<crate::context::AppContext>) -> Self {
        Self {
            context,
            started: Instant::now(),
        }
    }

    /// Start all background jobs
    pub fn start(self: Arc<Self>) -> Vec<JoinHandle<()>> {
        info!("Starting background job scheduler");

        let mut handles = Vec::new();

        let refresh_secs = self.context.config.console.background_refresh_secs;
        if refresh_secs > 0 {
            handles.push(tokio::spawn(Self::passive_refresh_job(
                Arc::clone(&self),
                Duration::from_secs(refresh_secs),
            )));
        } else {
            info!("Passive console refresh disabled");
        }

        handles.push(tokio::spawn(Self::health_check_job(Arc::clone(&self))));

        info!("Background jobs started");
        handles
    }

    /// Silently refresh the console so it converges even without change events
    async fn passive_refresh_job(scheduler: Arc<Self>, period: Duration) {
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick fires immediately; the initial load already covered it
        interval.tick().await;

        loop {
            interval.tick().await;

            match tasks::passive_refresh(&scheduler.context).await {
                Ok(total) => {
                    crate::metrics::record_background_job("passive_refresh", "success");
                    info!("Passive refresh: {} verification requests", total);
                }
                Err(e) => {
                    crate::metrics::record_background_job("passive_refresh", "failure");
                    error!("Passive refresh failed: {}", e);
                }
            }
        }
    }

    /// Health check job (runs every 5 minutes)
    async fn health_check_job(scheduler: Arc<Self>) {
        let mut interval = interval(Duration::from_secs(300)); // Every 5 minutes

        loop {
            interval.tick().await;
            crate::metrics::UPTIME_SECONDS.set(scheduler.started.elapsed().as_secs_f64());

            match tasks::health_check(&scheduler.context).await {
                Ok(_) => {
                    crate::metrics::record_background_job("health_check", "success");
                }
                Err(e) => {
                    crate::metrics::record_background_job("health_check", "failure");
                    error!("Health check failed: {}", e);
                }
            }
        }
    }
}
