//! Database migration support.
//!
//! Each store embeds its own migration set from `nook_core/migrations/`.
//! Both migrators ignore versions applied by the other set, so the two
//! stores may share one database.

use sqlx::PgPool;
use sqlx::migrate::MigrateError;

/// Run the relational store migrations.
pub async fn migrate_relational(pool: &PgPool) -> Result<(), MigrateError> {
    let mut migrator = sqlx::migrate!("./migrations/relational");
    migrator.set_ignore_missing(true);
    migrator.run(pool).await
}

/// Run the document store migrations.
pub async fn migrate_documents(pool: &PgPool) -> Result<(), MigrateError> {
    let mut migrator = sqlx::migrate!("./migrations/documents");
    migrator.set_ignore_missing(true);
    migrator.run(pool).await
}
