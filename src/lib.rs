pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod models;
pub mod promptpay;
pub mod services;

#[cfg(test)]
pub(crate) mod test_support;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::services::cleanup::HoldSweeper;
use crate::services::events::EventService;
use crate::services::payments::PaymentService;
use crate::services::reservations::ReservationService;
use crate::services::slips::SlipStorage;

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub db: database::Database,
    pub config: Config,
    pub events: EventService,
    pub reservations: ReservationService,
    pub payments: PaymentService,
    pub sweeper: HoldSweeper,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Arc<Self>> {
        let db = database::Database::new(&config.database.url, config.database.pool_size).await?;

        db.run_migrations().await?;

        let slips = SlipStorage::new(&config.payment.slip_dir);
        let state = Arc::new(Self {
            events: EventService::new(db.clone()),
            reservations: ReservationService::new(db.clone(), config.hold.clone()),
            payments: PaymentService::new(
                db.clone(),
                slips,
                config.payment.promptpay_id.clone(),
            ),
            sweeper: HoldSweeper::new(db.clone()),
            db,
            config,
        });

        Ok(state)
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Table Reserve API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
