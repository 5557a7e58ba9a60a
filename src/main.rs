use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use interview_console::auth::jwt::JwtService;
use interview_console::config::AppConfig;
use interview_console::db;
use interview_console::routes;
use interview_console::seed;
use interview_console::state::AppState;
use interview_console::storage::{ObjectStorage, S3Storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(
        database_url = %config.redacted_database_url(),
        pool_size = config.database_max_pool_size,
        server_host = %config.server_host,
        server_port = config.server_port,
        presigning_enabled = config.s3_bucket.is_some(),
        "loaded console configuration"
    );

    let pool = db::init_pool_with_size(&config.database_url, config.database_max_pool_size)?;
    {
        let mut conn = pool.get()?;
        db::run_migrations(&mut conn)?;
    }

    if let Err(err) = seed::ensure_env_admin(&pool, &config) {
        tracing::warn!(error = %err, "seeding environment admin failed");
    }

    let storage = S3Storage::from_config(&config)
        .await?
        .map(|storage| Arc::new(storage) as Arc<dyn ObjectStorage>);
    let jwt = JwtService::from_config(&config)?;

    let listen_addr: SocketAddr =
        format!("{}:{}", config.server_host, config.server_port).parse()?;
    let state = AppState::new(pool, config, storage, jwt);
    let router = routes::create_router(state).layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(listen_addr).await?;
    tracing::info!("listening on {}", listen_addr);

    axum::serve(listener, router).await?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
