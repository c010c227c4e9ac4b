use std::sync::Arc;

use time::{macros::format_description, OffsetDateTime};
use tracing::debug;

use crate::{
    db::{RecordFilter, Store},
    rooms::{InboundMessage, OutboundMessage, RelayDispatcher},
    tags::{parse_query, QueryMode},
    AppResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    /// Only the requester's own messages.
    SelfOnly,
    /// Everything indexed in the room.
    #[default]
    Room,
}

impl SearchScope {
    pub fn from_param(value: &str) -> Self {
        match value {
            "self" | "me" | "mine" | "myself" => SearchScope::SelfOnly,
            _ => SearchScope::Room,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub mode: QueryMode,
    pub terms: Vec<String>,
    pub scope: SearchScope,
    pub target_key: String,
    pub limit: usize,
}

impl QuerySpec {
    /// `None` when the message holds nothing to search for.
    pub fn parse(
        message: &str,
        scope: SearchScope,
        target_key: impl Into<String>,
        limit: usize,
    ) -> Option<QuerySpec> {
        let (mode, terms) = parse_query(message);
        if terms.is_empty() {
            return None;
        }

        Some(QuerySpec {
            mode,
            terms,
            scope,
            target_key: target_key.into(),
            limit,
        })
    }
}

pub struct SearchEngine {
    store: Store,
    relay: Arc<RelayDispatcher>,
}

impl SearchEngine {
    pub fn new(store: Store, relay: Arc<RelayDispatcher>) -> Self {
        Self { store, relay }
    }

    /// Runs the query in the scope of `rmsg` and relays the rendered results to the query's
    /// target. Nothing is relayed when nothing matched.
    pub async fn search(
        &self,
        query: &QuerySpec,
        rmsg: &InboundMessage,
    ) -> AppResult<Option<String>> {
        let (userbase_id, room_id) = rmsg.scope()?;
        let filter = RecordFilter {
            userbase_id,
            room_id,
            sender_id: match query.scope {
                SearchScope::SelfOnly => Some(rmsg.sender.id.as_str()),
                SearchScope::Room => None,
            },
        };

        // one extra row tells us whether the results were cut off
        let rows = self
            .store
            .query_tag_records(filter, &query.terms, query.mode, query.limit.saturating_add(1))
            .await?;
        debug!(
            terms = ?query.terms,
            mode = ?query.mode,
            scope = ?query.scope,
            found = rows.len(),
            "search done"
        );

        let Some(text) = render(&rows, query.limit) else {
            return Ok(None);
        };

        self.relay
            .relay(rmsg, &query.target_key, &OutboundMessage::text(text.clone()))
            .await?;
        Ok(Some(text))
    }
}

/// Formats up to `limit` rows under a count header. `None` for no rows.
pub fn render(rows: &[(OffsetDateTime, String)], limit: usize) -> Option<String> {
    if rows.is_empty() {
        return None;
    }

    let mut out = if rows.len() > limit {
        format!("showing {limit} results, try refining search:\n")
    } else {
        format!("showing {} results:\n", rows.len())
    };

    for (ts, message) in rows.iter().take(limit) {
        out.push_str(&format!("\n{} >\n{}\n", format_timestamp(*ts), message));
    }

    Some(out)
}

fn format_timestamp(ts: OffsetDateTime) -> String {
    ts.format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
        .unwrap_or_else(|_| ts.to_string())
}
