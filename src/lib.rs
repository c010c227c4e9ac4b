pub mod config;
pub mod db;
pub mod plugins;
pub mod res;
pub mod rooms;
pub mod search;
pub mod tags;

mod appresult;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

use std::sync::Arc;

use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::info;

use db::{RoomEntry, Store};
use plugins::Plugins;
use rooms::{DiagnosticSink, ErrorRoom, LogDiagnostics, RelayDispatcher, RoomRegistry};

pub use appresult::{AppError, AppResult};
pub use config::Config;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub plugins: Arc<Plugins>,
    pub diagnostics: Arc<dyn DiagnosticSink>,
}

impl AppState {
    /// Connects the configured store, if any, and wires everything on top of it.
    pub async fn build(config: &Config) -> AppResult<AppState> {
        let store = match &config.database_url {
            Some(url) => Some(Store::connect(url, config.storage_timeout).await?),
            None => {
                info!("no DATABASE_URL, registrations are kept in memory and index/search are off");
                None
            }
        };

        Self::with_store(config, store).await
    }

    pub async fn with_store(config: &Config, store: Option<Store>) -> AppResult<AppState> {
        let registry = Arc::new(RoomRegistry::new(store));
        let relay = Arc::new(RelayDispatcher::new(registry.clone(), config.relay_timeout)?);

        let diagnostics: Arc<dyn DiagnosticSink> = match &config.error_room_url {
            Some(url) => {
                let entry = RoomEntry::new(&config.error_room_key, "error stream", url);
                if let Some(store) = registry.store() {
                    let (userbase_id, room_id) =
                        config.error_room_key.split_once(':').unwrap_or(("", ""));
                    store.upsert_room(&entry, userbase_id, room_id).await?;
                }
                registry.put(entry);
                Arc::new(ErrorRoom::new(relay.clone(), &config.error_room_key))
            }
            None => Arc::new(LogDiagnostics),
        };

        let plugins = Plugins::build(config, relay);
        plugins.refresh().await?;
        info!(rooms = registry.len(), "plugins ready");

        Ok(AppState {
            plugins: Arc::new(plugins),
            diagnostics,
        })
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/healthcheck", get(healthcheck))
        .route("/{plugin}", post(plugins::handle))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthcheck() -> &'static str {
    "ok"
}
