//! herald server binary entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use herald_common::config::AppConfig;
use herald_engine::catalog::MessageCatalog;
use herald_engine::service::ReminderService;
use herald_notifier::build_sender;
use herald_scheduler::next_fire_time;
use herald_scheduler::trigger::DailyTrigger;

use herald_api::routes::create_router;
use herald_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("herald_api=debug,herald_engine=debug,herald_scheduler=info,herald_notifier=debug,tower_http=debug")
        }))
        .init();

    tracing::info!("Starting herald reminder service...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Wire the provider sender into the reminder service
    let sender = build_sender(&config)?;
    let catalog = MessageCatalog::new(config.message_text.clone());
    let service = Arc::new(ReminderService::new(sender, catalog, &config));

    let next = next_fire_time(chrono::Utc::now(), &config.schedule);
    tracing::info!(
        provider = %config.provider,
        schedule = %config.schedule.local_label(),
        next_fire = %next,
        catalog_size = service.catalog().len(),
        recipient_configured = service.recipient_configured(),
        "Reminder service configured"
    );

    // Spawn the daily trigger
    let trigger = {
        let service = Arc::clone(&service);
        DailyTrigger::start(config.schedule, move || {
            let service = Arc::clone(&service);
            async move {
                service.fire(None).await?;
                Ok(())
            }
        })
    };

    // Optional boot probe: one test send shortly after startup
    if config.startup_test_send {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            match service.fire(None).await {
                Ok(receipt) => {
                    tracing::info!(message_id = %receipt.message_id, "Startup test send delivered")
                }
                Err(e) => tracing::warn!(error = %e, "Startup test send failed"),
            }
        });
    }

    // Build router
    let state = AppState::new(Arc::clone(&service), config.clone());
    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server, stopping the trigger after a graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("HTTP facade listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Received shutdown signal, stopping gracefully...");
        })
        .await?;

    trigger.stop().await;
    tracing::info!("herald stopped.");

    Ok(())
}
