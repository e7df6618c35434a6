/// KlikJasa - identity-verification console service
///
/// Serves the admin verification console of the KlikJasa marketplace:
/// stats, filtering and live refresh over verification requests.

use klikjasa::{
    config::ServerConfig,
    context::AppContext,
    error::KlikResult,
    jobs::JobScheduler,
    server,
    verification::{ConsoleNotice, RecordSource},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> KlikResult<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "klikjasa=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    print_banner();

    // Load configuration
    let config = ServerConfig::from_env()?;
    tracing::debug!(level = %config.logging.level, "Configuration loaded");

    // Create application context
    let ctx = AppContext::new(config).await?;

    // Surface console notices; a UI adapter would turn these into toasts
    let mut notices = ctx.console.read().await.subscribe_notices();
    tokio::spawn(async move {
        while let Ok(notice) = notices.recv().await {
            match notice {
                ConsoleNotice::RefreshSucceeded { total } => {
                    tracing::info!(total, "Verification list refreshed")
                }
                ConsoleNotice::LoadFailed { message } | ConsoleNotice::RefreshFailed { message } => {
                    tracing::warn!(%message, "Verification list could not be loaded")
                }
            }
        }
    });

    // Subscribe first so writes during the initial load still reach the console
    let subscription = ctx.store.subscribe();

    // Initial load; a failure leaves an empty, retryable console
    if let Err(e) = ctx.console.load().await {
        tracing::warn!("Initial verification load failed: {}", e);
    }

    // Live updates stay active until this guard drops at shutdown
    let _live = ctx.start_live_updates(subscription);

    // Start background jobs
    let scheduler = Arc::new(JobScheduler::new(Arc::new(ctx.clone())));
    let _jobs = scheduler.start();

    // Start server
    server::serve(ctx).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
    __ __ ___ __       __
   / //_// (_) /__    / /___ __________ _
  / ,<  / / / //_/_  / / __ `/ ___/ __ `/
 / /| |/ / / ,< / /_/ / /_/ (__  ) /_/ /
/_/ |_/_/_/_/|_|\____/\__,_/____/\__,_/

        Verification Console v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}
