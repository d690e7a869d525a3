use anyhow::Context;
use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    Server,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use std::{net::SocketAddr, sync::Arc};

use todo_service::{
    create_router,
    db::{Database, SqliteDatabase},
    model::TodoRepository,
    AppState, Config,
};

// Entry point of the application
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("loading TODO_* configuration")?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    info!(url = %config.database_url, "connecting to database");
    let db = SqliteDatabase::connect(
        &config.database_url,
        config.max_connections,
        config.query_timeout(),
    )
    .await
    .context("connecting to the database")?;

    TodoRepository::new(&db)
        .ensure_schema()
        .await
        .context("creating the todos table")?;

    // Refuse to start against a database that does not answer.
    db.ping()
        .await
        .context("checking database after initialisation")?;

    // Create an Arc-wrapped instance of the application state
    let app_state = Arc::new(AppState { db: Arc::new(db) });

    // Configure CORS settings for the application
    let cors = CorsLayer::new()
        .allow_origin(
            config
                .cors_origin
                .parse::<HeaderValue>()
                .context("parsing TODO_CORS_ORIGIN")?,
        )
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE]);

    let app = create_router(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("parsing TODO_LISTEN_ADDR {:?}", config.listen_addr))?;

    info!(%addr, "server started");
    Server::try_bind(&addr)
        .with_context(|| format!("binding {addr}"))?
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
