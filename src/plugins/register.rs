use std::{collections::HashMap, sync::{Arc, LazyLock}};

use regex::Regex;
use tracing::info;

use crate::{
    db::RoomEntry,
    rooms::{InboundMessage, OutboundMessage, RelayDispatcher},
    AppError, AppResult,
};

use super::Params;

static ASSIGN_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]*=[ \t]*").expect("assignment pattern is valid"));

/// Reads `key=value` pairs out of a message. Keys are lowercased; values keep any `=` after
/// the first one. Words without `=` are ignored.
pub fn parse_options(message: &str) -> HashMap<String, String> {
    ASSIGN_RX
        .replace_all(message, "=")
        .split_whitespace()
        .filter_map(|field| field.split_once('='))
        .map(|(k, v)| (k.to_lowercase(), v.to_owned()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub userbase_id: String,
    pub room_id: String,
    pub entry: RoomEntry,
}

impl Registration {
    /// Key precedence: explicit `key=`, then the whole context when the `room` param is set,
    /// then `userbase:sender` for a personal room.
    pub fn parse(params: &Params, rmsg: &InboundMessage) -> AppResult<Registration> {
        let (userbase_id, room_id) = rmsg.scope()?;
        let mut options = parse_options(&rmsg.message);

        let url = options
            .remove("url")
            .filter(|u| !u.is_empty())
            .ok_or_else(|| AppError::Registration(format!("missing url in {:?}", rmsg.message)))?;

        let key = match options.remove("key").filter(|k| !k.is_empty()) {
            Some(key) => key,
            None if params.is_set("room") => rmsg.context.clone(),
            None => format!("{userbase_id}:{}", rmsg.sender.id),
        };

        Ok(Registration {
            userbase_id: userbase_id.to_owned(),
            room_id: room_id.to_owned(),
            entry: RoomEntry {
                key,
                name: options.remove("name").unwrap_or_default(),
                url,
            },
        })
    }
}

/// Registers rooms: validates the webhook, persists it and refreshes the registry.
pub struct RegisterPlugin {
    relay: Arc<RelayDispatcher>,
}

impl RegisterPlugin {
    pub fn new(relay: Arc<RelayDispatcher>) -> Self {
        Self { relay }
    }

    pub async fn handle(
        &self,
        params: &Params,
        rmsg: &InboundMessage,
    ) -> AppResult<Option<OutboundMessage>> {
        let registration = Registration::parse(params, rmsg)?;
        self.register(&registration).await?;
        Ok(None)
    }

    pub async fn register(&self, registration: &Registration) -> AppResult<()> {
        let Registration { userbase_id, room_id, entry } = registration;
        // a url that can't take a message is not worth registering
        let hello =
            OutboundMessage::text(format!("Room registration invoked with key {}", entry.key));
        self.relay.post(&entry.url, &hello).await?;

        let registry = self.relay.registry();
        match registry.store() {
            Some(store) => {
                store.upsert_room(entry, userbase_id, room_id).await?;
                registry.refresh().await?;
            }
            None => registry.put(entry.clone()),
        }

        info!(key = %entry.key, name = %entry.name, "room registered");
        Ok(())
    }
}
