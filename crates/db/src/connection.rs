use crewhub_config::{DatabaseSettings, Settings};
use mongodb::{Client, Database, options::ClientOptions};
use tracing::info;

/// Opens the pooled client and pings the server before handing the
/// database handle out, so a bad URL fails at startup rather than on
/// the first scheduler tick.
pub async fn connect(settings: &Settings) -> Result<Database, mongodb::error::Error> {
    let client = Client::with_options(client_options(&settings.database).await?)?;

    client
        .database("admin")
        .run_command(bson::doc! { "ping": 1 })
        .await?;

    info!(db = %settings.database.name, "Connected to MongoDB");

    Ok(client.database(&settings.database.name))
}

async fn client_options(db: &DatabaseSettings) -> Result<ClientOptions, mongodb::error::Error> {
    let mut options = ClientOptions::parse(&db.url).await?;
    options.app_name = Some("crewhub".to_string());
    options.max_pool_size = db.max_pool_size.or(options.max_pool_size);
    options.min_pool_size = db.min_pool_size.or(options.min_pool_size);
    Ok(options)
}
