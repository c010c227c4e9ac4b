use tracing::{debug, info};

use crate::{
    db::{Store, TagRecord},
    rooms::{InboundMessage, OutboundMessage},
    tags::{extract, tokenize},
    AppResult, Config,
};

use super::Params;

/// Extracts tags from inbound messages and stores them for search.
pub struct IndexPlugin {
    store: Store,
    density: f64,
    min_words: usize,
    ignored_senders: Vec<String>,
    /// Bookmark mode: untagged messages are never stored, whatever the request says.
    always_require_tag: bool,
}

impl IndexPlugin {
    pub fn new(store: Store, config: &Config, always_require_tag: bool) -> Self {
        Self {
            store,
            density: config.tag_density,
            min_words: config.min_words,
            ignored_senders: config.ignored_senders.clone(),
            always_require_tag,
        }
    }

    pub async fn handle(
        &self,
        params: &Params,
        rmsg: &InboundMessage,
    ) -> AppResult<Option<OutboundMessage>> {
        if rmsg.message.trim().is_empty() || self.ignored_senders.contains(&rmsg.sender.id) {
            return Ok(None);
        }

        let scope = rmsg.scope()?;
        let require_tag = self.always_require_tag || !params.flag("disableHashCheck");

        let extracted = extract(&rmsg.message, self.density, require_tag);
        if extracted.is_empty() {
            debug!(context = %rmsg.context, "nothing to index");
            return Ok(None);
        }
        if extracted.tags.is_empty() && tokenize(&rmsg.message).len() < self.min_words {
            debug!(context = %rmsg.context, "untagged message too short to index");
            return Ok(None);
        }

        let record = TagRecord::new(&rmsg.sender.id, scope, extracted, &rmsg.message);
        self.store.insert_tag_record(&record).await?;
        info!(id = %record.id, tags = ?record.tags, keywords = ?record.keywords, "message indexed");

        Ok(None)
    }
}
