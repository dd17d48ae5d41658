use std::sync::Arc;

use crewhub_api::{build_router, state::AppState};
use crewhub_config::Settings;
use crewhub_db::{connect, indexes::ensure_indexes};
use crewhub_services::lifecycle::scheduler;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (silently ignore if missing)
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "crewhub_api=debug,crewhub_services=debug,crewhub_db=debug,tower_http=debug".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load config
    let settings = Settings::load()?;
    info!(
        "Starting CrewHub API on {}:{}",
        settings.app.host, settings.app.port
    );

    // Connect to MongoDB
    let db = connect(&settings).await?;

    // Ensure indexes
    ensure_indexes(&db).await?;

    // Build app state
    let app_state = AppState::new(db, settings.clone());

    // Start the deadline scheduler; the handle must stay alive for the
    // jobs to keep firing.
    let _scheduler = if settings.scheduler.enabled {
        Some(scheduler::start(&settings.scheduler, Arc::clone(&app_state.lifecycle)).await?)
    } else {
        info!("Scheduler disabled by configuration");
        None
    };

    // Build router
    let app = build_router(app_state);

    // Start server
    let addr = format!("{}:{}", settings.app.host, settings.app.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
