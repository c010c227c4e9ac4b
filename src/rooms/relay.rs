use std::{sync::Arc, time::Duration};

use tracing::{debug, info};

use crate::{db::RoomEntry, AppError, AppResult};

use super::{msg::{InboundMessage, OutboundMessage}, registry::RoomRegistry};

/// Sends outbound messages to registered rooms. One attempt per message, no retries.
pub struct RelayDispatcher {
    registry: Arc<RoomRegistry>,
    client: reqwest::Client,
}

impl RelayDispatcher {
    pub fn new(registry: Arc<RoomRegistry>, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("failed to build http client: {e}")))?;

        Ok(Self { registry, client })
    }

    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// Picks the explicit target when it is registered, else the room the message came from.
    pub fn resolve(&self, target: &str, origin: &str) -> AppResult<RoomEntry> {
        if !target.is_empty() {
            if let Some(room) = self.registry.get(target) {
                return Ok(room);
            }
            debug!(target, origin, "target room not registered, falling back to origin");
        }

        let wanted = if target.is_empty() { origin } else { target };
        self.registry
            .get(origin)
            .ok_or_else(|| AppError::TargetResolution(wanted.to_owned()))
    }

    /// Relays `msg` to `target`, falling back to the room `origin` was posted from.
    pub async fn relay(
        &self,
        origin: &InboundMessage,
        target: &str,
        msg: &OutboundMessage,
    ) -> AppResult<()> {
        let room = self.resolve(target, &origin.context)?;
        self.deliver(&room, msg).await
    }

    /// Relays to exactly `key`, without any fallback.
    pub async fn relay_to(&self, key: &str, msg: &OutboundMessage) -> AppResult<()> {
        let room = self
            .registry
            .get(key)
            .ok_or_else(|| AppError::TargetResolution(key.to_owned()))?;
        self.deliver(&room, msg).await
    }

    pub async fn deliver(&self, room: &RoomEntry, msg: &OutboundMessage) -> AppResult<()> {
        self.post(&room.url, msg).await?;
        info!(key = %room.key, "message relayed");
        Ok(())
    }

    /// POSTs `msg` as JSON. Transport errors and non-2xx replies are both delivery failures.
    pub async fn post(&self, url: &str, msg: &OutboundMessage) -> AppResult<()> {
        let resp = self
            .client
            .post(url)
            .json(msg)
            .send()
            .await
            .map_err(|e| AppError::Delivery { url: url.to_owned(), reason: e.to_string() })?;

        let status = resp.status();
        if !status.is_success() {
            let reply = resp.text().await.unwrap_or_default();
            return Err(AppError::Delivery {
                url: url.to_owned(),
                reason: format!("returned {status}: {}", reply.trim()),
            });
        }

        Ok(())
    }
}
