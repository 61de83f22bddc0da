use mimalloc::MiMalloc;
use std::time::Duration;
use tokio::task;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use table_reserve::{app, config::Config, AppState};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.app.rust_log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Table Reserve API");

    let state = AppState::new(config.clone()).await?;
    info!("Database connected");

    // Фоновая зачистка просроченных удержаний
    let sweeper = state.sweeper.clone();
    let sweep_interval = Duration::from_secs(config.hold.sweep_interval_secs);
    task::spawn(async move {
        loop {
            if let Err(e) = sweeper.run_once().await {
                error!("Hold sweep failed: {:?}", e);
            }
            tokio::time::sleep(sweep_interval).await;
        }
    });

    let app = app(state);

    let addr = format!("{}:{}", config.app.host, config.app.port);
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
