mod index;
mod register;
mod relay;
mod search;

use std::{collections::HashMap, fmt, sync::Arc};

use axum::{
    debug_handler,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::warn;

use crate::{
    rooms::{DiagnosticSink, InboundMessage, OutboundMessage, RelayDispatcher},
    AppError, AppResult, AppState, Config,
};

pub use index::IndexPlugin;
pub use register::{parse_options, RegisterPlugin, Registration};
pub use relay::RelayPlugin;
pub use search::SearchPlugin;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PluginKind {
    Bookmark,
    Index,
    Search,
    Relay,
    Register,
}

impl PluginKind {
    pub fn name(&self) -> &'static str {
        use PluginKind::*;
        match self {
            Bookmark => "bookmark",
            Index => "index",
            Search => "search",
            Relay => "relay",
            Register => "register",
        }
    }
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Query-string parameters of a plugin call.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Params(HashMap<String, String>);

impl Params {
    /// The value of `key`, or `""` when absent.
    pub fn get(&self, key: &str) -> &str {
        self.0.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn is_set(&self, key: &str) -> bool {
        !self.get(key).is_empty()
    }

    pub fn flag(&self, key: &str) -> bool {
        matches!(self.get(key), "1" | "t" | "T" | "true" | "TRUE" | "True")
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Params(iter.into_iter().collect())
    }
}

pub enum Plugin {
    Bookmark(IndexPlugin),
    Index(IndexPlugin),
    Search(SearchPlugin),
    Relay(RelayPlugin),
    Register(RegisterPlugin),
}

impl Plugin {
    pub async fn handle(
        &self,
        params: &Params,
        rmsg: &InboundMessage,
    ) -> AppResult<Option<OutboundMessage>> {
        use Plugin::*;
        match self {
            Bookmark(p) | Index(p) => p.handle(params, rmsg).await,
            Search(p) => p.handle(params, rmsg).await,
            Relay(p) => p.handle(params, rmsg).await,
            Register(p) => p.handle(params, rmsg).await,
        }
    }

    pub async fn refresh(&self) -> AppResult<()> {
        match self {
            Plugin::Relay(p) => p.refresh().await,
            _ => Ok(()),
        }
    }
}

/// The plugins mounted for this process. Storage-backed ones are left out without a store.
pub struct Plugins {
    plugins: HashMap<PluginKind, Plugin>,
}

impl Plugins {
    pub fn build(config: &Config, relay: Arc<RelayDispatcher>) -> Plugins {
        let mut plugins = HashMap::new();

        if let Some(store) = relay.registry().store() {
            let bookmark = IndexPlugin::new(store.clone(), config, true);
            let index = IndexPlugin::new(store.clone(), config, false);
            let search = SearchPlugin::new(store.clone(), relay.clone(), config.result_limit);
            plugins.insert(PluginKind::Bookmark, Plugin::Bookmark(bookmark));
            plugins.insert(PluginKind::Index, Plugin::Index(index));
            plugins.insert(PluginKind::Search, Plugin::Search(search));
        }
        plugins.insert(PluginKind::Relay, Plugin::Relay(RelayPlugin::new(relay.clone())));
        plugins.insert(PluginKind::Register, Plugin::Register(RegisterPlugin::new(relay)));

        Plugins { plugins }
    }

    pub fn get(&self, kind: PluginKind) -> AppResult<&Plugin> {
        self.plugins
            .get(&kind)
            .ok_or_else(|| AppError::PluginUnavailable(kind.to_string()))
    }

    pub fn is_mounted(&self, kind: PluginKind) -> bool {
        self.plugins.contains_key(&kind)
    }

    pub async fn refresh(&self) -> AppResult<()> {
        for plugin in self.plugins.values() {
            plugin.refresh().await?;
        }
        Ok(())
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn handle(
    Path(kind): Path<PluginKind>,
    Query(params): Query<Params>,
    State(plugins): State<Arc<Plugins>>,
    State(diagnostics): State<Arc<dyn DiagnosticSink>>,
    Json(rmsg): Json<InboundMessage>,
) -> AppResult<Response> {
    let result = match plugins.get(kind) {
        Ok(plugin) => plugin.handle(&params, &rmsg).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(Some(smsg)) => Ok(Json(smsg).into_response()),
        Ok(None) => Ok(StatusCode::OK.into_response()),
        Err(err) => {
            if err.is_delivery() {
                diagnostics.report(kind.name(), &err).await;
            } else {
                warn!(plugin = %kind, %err, "request failed");
            }
            Err(err)
        }
    }
}
