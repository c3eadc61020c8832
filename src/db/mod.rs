pub mod activity;
pub mod contracts;
pub mod files;
pub mod payments;
pub mod phases;
pub mod subscriptions;
pub mod summary;

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Create a SeaORM database connection pool.
pub async fn create_pool(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}
