pub mod error;
pub mod routes;
pub mod state;
pub mod ws;

use axum::{
    Router,
    routing::{get, patch, post},
};
use state::AppState;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Notification routes
    let notification_routes = Router::new()
        .route("/send", post(routes::notification::send))
        .route(
            "/project/{project_id}",
            post(routes::notification::send_to_project_team),
        )
        .route("/user/{user_id}", get(routes::notification::list_for_user))
        .route(
            "/{notification_id}/read",
            patch(routes::notification::mark_as_read),
        )
        .route("/read-all", patch(routes::notification::mark_all_as_read));

    // Manual lifecycle triggers (the scheduler fires the same ticks)
    let lifecycle_routes = Router::new()
        .route("/daily", post(routes::lifecycle::run_daily))
        .route("/hourly", post(routes::lifecycle::run_hourly));

    // Compose API
    let api = Router::new()
        .nest("/notifications", notification_routes)
        .nest("/lifecycle", lifecycle_routes);

    // Health check
    let health = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api)
        .merge(health)
        .route("/ws", get(ws::handler::ws_upgrade))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
