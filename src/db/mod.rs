//! Database connection and schema
pub mod entities;
pub mod migrations;

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Opens (creating if needed) the SQLite database at `path`.
pub async fn connect_db(path: &str) -> Result<DatabaseConnection, DbErr> {
    let url = format!("sqlite://{}?mode=rwc", path);
    Database::connect(url).await
}

#[cfg(test)]
/// In-memory database for tests.
pub async fn connect_test_db() -> Result<DatabaseConnection, DbErr> {
    Database::connect("sqlite::memory:").await
}

#[cfg(test)]
/// Fresh in-memory database with every migration applied.
pub async fn migrated_test_db() -> DatabaseConnection {
    use sea_orm_migration::MigratorTrait;

    #[allow(clippy::expect_used)]
    let db = connect_test_db().await.expect("connect test db");
    #[allow(clippy::expect_used)]
    migrations::Migrator::up(&db, None)
        .await
        .expect("run migrations");
    db
}
