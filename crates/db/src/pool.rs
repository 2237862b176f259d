//! Connection pool management and schema bootstrap
//!
//! Uses a sqlx `MySqlPool` with an explicit connection bound. When every
//! connection is checked out, callers queue for up to `acquire_timeout_ms`
//! before the acquire fails with `PoolTimedOut`.

use std::time::Duration;

use anyhow::{anyhow, Context};
use bookshelf_kernel::settings::DatabaseSettings;
use bookshelf_kernel::Migration;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::MySqlPool;

use crate::error::DbError;

/// Build connection options from settings.
///
/// # Errors
///
/// Fails when a required credential is unset.
pub fn connect_options(settings: &DatabaseSettings) -> anyhow::Result<MySqlConnectOptions> {
    let missing = settings.missing_credentials();
    if !missing.is_empty() {
        return Err(anyhow!(
            "missing required database settings: {}",
            missing.join(", ")
        ));
    }

    let mut options = MySqlConnectOptions::new()
        .host(&settings.host)
        .port(settings.port)
        .charset("utf8mb4");

    if let Some(user) = &settings.user {
        options = options.username(user);
    }
    if let Some(password) = &settings.password {
        options = options.password(password);
    }
    if let Some(name) = &settings.name {
        options = options.database(name);
    }

    Ok(options)
}

/// Create the process-wide pool and verify the store is reachable.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<MySqlPool> {
    let options = connect_options(settings)?;

    let pool = MySqlPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_millis(settings.acquire_timeout_ms))
        .connect_with(options)
        .await
        .with_context(|| format!("failed to connect to database at {}", settings.endpoint()))?;

    tracing::info!(
        target: "bookshelf-db",
        endpoint = %settings.endpoint(),
        max_connections = settings.max_connections,
        "database pool ready"
    );

    Ok(pool)
}

/// Run each contributed schema statement once, in the order given.
///
/// Statements are expected to be idempotent; no record of applied statements
/// is kept.
pub async fn apply_migrations(
    pool: &MySqlPool,
    migrations: &[(String, Migration)],
) -> Result<(), DbError> {
    for (module, migration) in migrations {
        tracing::info!(
            target: "bookshelf-db",
            module = %module,
            migration = migration.id,
            "applying schema statement"
        );
        sqlx::raw_sql(migration.up).execute(pool).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> DatabaseSettings {
        DatabaseSettings {
            user: Some("books".to_string()),
            password: Some("secret".to_string()),
            name: Some("library".to_string()),
            ..DatabaseSettings::default()
        }
    }

    #[test]
    fn options_require_credentials() {
        let err = connect_options(&DatabaseSettings::default()).unwrap_err();
        assert!(err.to_string().contains("user"));
    }

    #[test]
    fn options_carry_host_and_database() {
        let options = connect_options(&settings()).unwrap();
        assert_eq!(options.get_host(), "localhost");
        assert_eq!(options.get_port(), 3306);
        assert_eq!(options.get_database(), Some("library"));
    }

    // Integration tests require a real database
    // Run with: DATABASE_URL=mysql://... cargo test -p bookshelf-db -- --ignored

    #[tokio::test]
    #[ignore = "requires database"]
    async fn concurrent_pool_access() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = MySqlPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .expect("pool creation failed");

        // More tasks than connections: later ones queue for a free slot
        let handles: Vec<_> = (0..10)
            .map(|i| {
                let pool = pool.clone();
                tokio::spawn(async move {
                    let result: (i64,) = sqlx::query_as("SELECT CAST(? AS SIGNED)")
                        .bind(i)
                        .fetch_one(&pool)
                        .await
                        .expect("concurrent query failed");
                    result.0
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let result = handle.await.expect("task panicked");
            assert_eq!(result, i as i64);
        }
    }
}
