use std::sync::Arc;

use anyhow::Context;
use bookshelf_app::{registry_with_store, service_info, MySqlBookStore};
use bookshelf_kernel::{settings::Settings, InitCtx};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load bookshelf settings")?;
    bookshelf_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.endpoint(),
        "bookshelf bootstrap starting"
    );

    let pool = bookshelf_db::connect(&settings.database).await?;
    let registry = registry_with_store(Arc::new(MySqlBookStore::new(pool.clone())))?;

    if settings.database.apply_schema {
        bookshelf_db::apply_migrations(&pool, &registry.collect_migrations())
            .await
            .context("schema bootstrap failed")?;
    }

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    tracing::info!("bookshelf bootstrap complete");

    let served =
        bookshelf_http::start_server(&registry, &settings, &service_info(&settings)).await;

    registry.stop_all().await?;
    pool.close().await;

    served
}
