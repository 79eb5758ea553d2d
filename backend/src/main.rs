// Viridis shared-color server: HTTP API, live viewer websocket and background
// idle/throttle tasks.

use std::process;
use std::sync::Arc;

use tracing::{error, info};

use viridis_server::app::AppState;
use viridis_server::config::ServerConfig;
use viridis_server::http;
use viridis_server::store::MemoryStore;
use viridis_server::tasks;
use viridis_server::utils::now_epoch_ms;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "invalid configuration");
            process::exit(1);
        }
    };
    let palette = match config.load_palette() {
        Ok(palette) => palette,
        Err(err) => {
            error!(%err, "failed to load palette");
            process::exit(1);
        }
    };
    info!(
        colors = palette.len(),
        cooldown_secs = config.cooldown_secs,
        idle_after_secs = config.idle_after_secs,
        "palette loaded"
    );

    let store = Arc::new(MemoryStore::new());
    let app_state = AppState::new(config.engine_config(), palette, store, now_epoch_ms());

    let idle_engine = app_state.engine.clone();
    tokio::spawn(async move {
        tasks::idle_watch_task(idle_engine).await;
    });

    let sweep_engine = app_state.engine.clone();
    tokio::spawn(async move {
        tasks::throttle_sweep_task(sweep_engine).await;
    });

    let app = http::router(app_state);

    info!(addr = %config.addr, "starting server");
    axum::Server::bind(&config.addr)
        .serve(app.into_make_service())
        .await
        .expect("server failed");
}
