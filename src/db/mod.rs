use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};

pub mod stats;
pub mod transaction;
pub mod user;

const CREATE_TABLES_SQL: &str = include_str!("../../migrations/create_tables.sql");

/// Initialize the SQLite connection pool and create tables
pub async fn init_db(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Apply the schema; every statement is idempotent
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(CREATE_TABLES_SQL).execute(pool).await?;
    Ok(())
}
