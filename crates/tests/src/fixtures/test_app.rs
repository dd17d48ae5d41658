use crewhub_api::{build_router, state::AppState};
use crewhub_config::Settings;
use crewhub_db::indexes::ensure_indexes;
use mongodb::{Client, Database, options::ClientOptions};
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// A running test application with its own MongoDB database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub base_url: String,
    pub db: Database,
    pub settings: Settings,
    pub state: AppState,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Spawn a new test server connected to the test MongoDB.
    ///
    /// Requires a running MongoDB at localhost:27017.
    /// Set CREWHUB__DATABASE__URL env var to override the connection string.
    /// Each test gets a unique database name for isolation. The cron
    /// scheduler is never started here; tests drive ticks directly.
    pub async fn spawn() -> Self {
        let db_name = format!("crewhub_test_{}", uuid::Uuid::new_v4().simple());

        let mut settings = Settings::load().unwrap_or_else(|_| test_settings());
        // Allow env var override for database URL
        if let Ok(url) = std::env::var("CREWHUB__DATABASE__URL") {
            settings.database.url = url;
        }
        settings.database.name = db_name.clone();
        settings.scheduler.enabled = false;

        let client_options = ClientOptions::parse(&settings.database.url)
            .await
            .expect("Failed to parse MongoDB URL");
        let mongo_client =
            Client::with_options(client_options).expect("Failed to create MongoDB client");
        let db = mongo_client.database(&db_name);

        ensure_indexes(&db).await.expect("Failed to create indexes");

        let state = AppState::new(db.clone(), settings.clone());
        let app = build_router(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let base_url = format!("http://{}", addr);
        let client = reqwest::Client::builder()
            .build()
            .expect("Failed to build HTTP client");

        Self {
            addr,
            base_url,
            db,
            settings,
            state,
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let db = self.db.clone();
        // Best effort cleanup: drop the test database
        tokio::spawn(async move {
            let _ = db.drop().await;
        });
    }
}

fn test_settings() -> Settings {
    Settings {
        app: crewhub_config::AppSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec![],
        },
        database: crewhub_config::DatabaseSettings {
            url: "mongodb://localhost:27017".to_string(),
            name: "crewhub_test".to_string(),
            max_pool_size: Some(5),
            min_pool_size: Some(1),
        },
        scheduler: crewhub_config::SchedulerSettings {
            enabled: false,
            daily_cron: "0 0 9 * * *".to_string(),
            hourly_cron: "0 0 * * * *".to_string(),
            invoice_grace_days: 10,
        },
    }
}
