use std::sync::Arc;

use crate::{
    db::Store,
    rooms::{InboundMessage, OutboundMessage, RelayDispatcher},
    search::{QuerySpec, SearchEngine, SearchScope},
    AppResult,
};

use super::Params;

pub struct SearchPlugin {
    engine: SearchEngine,
    limit: usize,
}

impl SearchPlugin {
    pub fn new(store: Store, relay: Arc<RelayDispatcher>, limit: usize) -> Self {
        Self {
            engine: SearchEngine::new(store, relay),
            limit,
        }
    }

    /// Results go to `target`, or to the requester's own registered room
    /// (`userbase:sender`) when no target is given.
    pub async fn handle(
        &self,
        params: &Params,
        rmsg: &InboundMessage,
    ) -> AppResult<Option<OutboundMessage>> {
        let (userbase_id, _) = rmsg.scope()?;

        let target = match params.get("target") {
            "" => format!("{userbase_id}:{}", rmsg.sender.id),
            target => target.to_owned(),
        };
        let scope = SearchScope::from_param(params.get("scope"));

        let Some(query) = QuerySpec::parse(&rmsg.message, scope, target, self.limit) else {
            return Ok(None);
        };

        self.engine.search(&query, rmsg).await?;
        Ok(None)
    }
}
