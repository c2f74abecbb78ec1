//! Database connection and schema setup.

use anyhow::{Context, Result};
use entity::{prediction, user};
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr, EntityTrait, Schema,
    Statement,
};

use crate::config::Config;

/// Connect to the database, creating the tables first if the config asks for it.
pub(crate) async fn connect(config: &Config) -> Result<DatabaseConnection> {
    let db = Database::connect(config.database_url.as_str())
        .await
        .context("Failed to connect to the database")?;

    if config.init_schema {
        create_tables(&db)
            .await
            .context("Failed to create the database tables")?;
        tracing::info!("Database schema is in place");
    }

    Ok(db)
}

/// Create every table the entities describe, skipping the ones that already exist.
pub(crate) async fn create_tables(db: &DatabaseConnection) -> Result<(), DbErr> {
    for statement in create_table_statements(db.get_database_backend()) {
        db.execute(statement).await?;
    }
    Ok(())
}

/// `users` comes first, `predictions` references it.
fn create_table_statements(backend: DbBackend) -> Vec<Statement> {
    let schema = Schema::new(backend);
    vec![
        create_table(&schema, backend, user::Entity),
        create_table(&schema, backend, prediction::Entity),
    ]
}

fn create_table<E: EntityTrait>(schema: &Schema, backend: DbBackend, entity: E) -> Statement {
    backend.build(&schema.create_table_from_entity(entity).if_not_exists().to_owned())
}
