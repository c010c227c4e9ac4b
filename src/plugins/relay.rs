use std::sync::Arc;

use crate::{
    rooms::{InboundMessage, OutboundMessage, RelayDispatcher},
    AppResult,
};

use super::Params;

pub struct RelayPlugin {
    relay: Arc<RelayDispatcher>,
}

impl RelayPlugin {
    pub fn new(relay: Arc<RelayDispatcher>) -> Self {
        Self { relay }
    }

    /// Forwards the message to `target`, naming the `source` room it came from.
    pub async fn handle(
        &self,
        params: &Params,
        rmsg: &InboundMessage,
    ) -> AppResult<Option<OutboundMessage>> {
        let source = params.get("source");
        let source_name = match self.relay.registry().name_of(source) {
            Some(name) if !name.is_empty() => name,
            Some(_) => source.to_owned(),
            None => "Unknown".to_owned(),
        };

        let smsg =
            OutboundMessage::text(format!("Message from room {source_name}: {}?", rmsg.message));
        self.relay.relay(rmsg, params.get("target"), &smsg).await?;

        Ok(Some(smsg))
    }

    pub async fn refresh(&self) -> AppResult<()> {
        self.relay.registry().refresh().await?;
        Ok(())
    }
}
