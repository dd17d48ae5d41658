use mongodb::{Database, IndexModel, options::IndexOptions};
use tracing::info;

pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    // Users
    create_indexes(
        db,
        "users",
        vec![
            index_unique(bson::doc! { "email": 1 }),
            index(bson::doc! { "role": 1, "is_deleted": 1 }),
        ],
    )
    .await?;

    // Projects
    create_indexes(
        db,
        "projects",
        vec![
            index(bson::doc! { "status": 1, "deadline": 1 }),
            index(bson::doc! { "manager": 1 }),
        ],
    )
    .await?;

    // Contracts
    create_indexes(
        db,
        "contracts",
        vec![
            index(bson::doc! { "status": 1, "end_date": 1 }),
            index(bson::doc! { "project_id": 1 }),
        ],
    )
    .await?;

    // Invoices
    create_indexes(
        db,
        "invoices",
        vec![
            index_unique(bson::doc! { "invoice_number": 1 }),
            index(bson::doc! { "status": 1, "due_date": 1 }),
            index(bson::doc! { "project_id": 1 }),
        ],
    )
    .await?;

    // Notifications. The (meta.kind, created_at) index backs the dedup
    // fingerprint lookups; the receivers index backs inbox reads.
    create_indexes(
        db,
        "notifications",
        vec![
            index(bson::doc! { "receivers": 1, "created_at": -1 }),
            index(bson::doc! { "meta.kind": 1, "created_at": -1 }),
        ],
    )
    .await?;

    info!("All indexes ensured");
    Ok(())
}

fn index(keys: bson::Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

fn index_unique(keys: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

async fn create_indexes(
    db: &Database,
    collection: &str,
    indexes: Vec<IndexModel>,
) -> Result<(), mongodb::error::Error> {
    db.collection::<bson::Document>(collection)
        .create_indexes(indexes)
        .await?;
    info!(collection, "Indexes created");
    Ok(())
}
