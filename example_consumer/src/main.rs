//! Example consumer: a separate Rust project that uses dataserve-sdk as a dependency.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! Or from this directory: `cargo run`

use dataserve_sdk::{
    app_router, ensure_config_table, replace_config_rows, AppState, DataService, MySqlExecutor,
    StatementExecutor,
};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("dataserve_sdk=info")),
        )
        .init();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "mysql://root@localhost/dataserve".into());
    let pool = sqlx::mysql::MySqlPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    let executor = Arc::new(MySqlExecutor::new(pool));
    ensure_config_table(executor.as_ref()).await?;
    if std::env::var("DS_SEED_DEMO").is_ok() {
        seed_demo_namespace(executor.as_ref()).await?;
    }

    let worker_id = std::env::var("DS_WORKER_ID")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let service = DataService::builder(executor).worker_id(worker_id).build()?;
    service.reload_config().await?;

    let state = AppState::new(Arc::new(service));
    let app = app_router(state);
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".into());
    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!(
        "Example consumer listening on http://{}",
        listener.local_addr()?
    );
    axum::serve(listener, app).await?;
    Ok(())
}

/// A small `news` table plus the namespace row that exposes it, so the
/// server answers requests out of the box.
async fn seed_demo_namespace(executor: &MySqlExecutor) -> Result<(), Box<dyn std::error::Error>> {
    executor
        .execute(
            r#"
            CREATE TABLE IF NOT EXISTS news (
                id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
                name VARCHAR(255),
                content TEXT,
                creator_id BIGINT,
                user_id BIGINT,
                tenant_id BIGINT,
                is_deleted TINYINT NOT NULL DEFAULT 0,
                create_date DATETIME,
                update_date DATETIME
            )
            "#,
            &[],
        )
        .await?;
    let rows = vec![json!({
        "id": 1,
        "pid": -1,
        "namespace": "news",
        "name": "demo news",
        "type": "CRUD",
        "table_name": "news",
        "table_model": "{\"hasIsDeleted\": true}",
        "stat": 0
    })];
    replace_config_rows(executor, &rows).await?;
    tracing::info!("demo namespace seeded; POST /reload_config picks it up");
    Ok(())
}
