use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, warn};

use crate::AppError;

use super::{msg::OutboundMessage, relay::RelayDispatcher};

/// Where request failures get reported.
///
/// Implementations never return or retry their own failures: a report that cannot be
/// delivered is logged and dropped, so a broken error room cannot feed back into itself.
#[async_trait]
pub trait DiagnosticSink: Send + Sync {
    async fn report(&self, source: &str, err: &AppError);
}

/// Logs only. Used when no error room is configured.
pub struct LogDiagnostics;

#[async_trait]
impl DiagnosticSink for LogDiagnostics {
    async fn report(&self, source: &str, err: &AppError) {
        error!(source, %err, "request failed");
    }
}

/// Relays failures to a dedicated error room.
pub struct ErrorRoom {
    relay: Arc<RelayDispatcher>,
    key: String,
}

impl ErrorRoom {
    pub fn new(relay: Arc<RelayDispatcher>, key: impl Into<String>) -> Self {
        Self { relay, key: key.into() }
    }
}

#[async_trait]
impl DiagnosticSink for ErrorRoom {
    async fn report(&self, source: &str, err: &AppError) {
        error!(source, %err, "request failed");

        let msg = OutboundMessage::text(format!("{source} failed: {err}"));
        if let Err(e) = self.relay.relay_to(&self.key, &msg).await {
            warn!(key = %self.key, error = %e, "failed to report to error room");
        }
    }
}
