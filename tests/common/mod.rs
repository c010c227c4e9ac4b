#![allow(dead_code)]

use axum::http::StatusCode;
use roomrelay::{app, db::Store, rooms::InboundMessage, AppState, Config};
use tokio::net::TcpListener;

pub use roomrelay::testing::Sink;

/// The relay service running on an ephemeral port.
pub struct Service {
    pub base: String,
    client: reqwest::Client,
}

impl Service {
    pub async fn start(config: Config, store: Option<Store>) -> Service {
        let state = AppState::with_store(&config, store).await.unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app(state)).await.unwrap() });

        Service {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
        }
    }

    pub async fn post(&self, path: &str, rmsg: &InboundMessage) -> (StatusCode, String) {
        let resp = self
            .client
            .post(format!("{}{path}", self.base))
            .json(rmsg)
            .send()
            .await
            .unwrap();
        let status = StatusCode::from_u16(resp.status().as_u16()).unwrap();
        (status, resp.text().await.unwrap())
    }

    pub async fn send(
        &self,
        path: &str,
        message: impl Into<String>,
        context: &str,
        sender: &str,
    ) -> (StatusCode, String) {
        self.post(path, &InboundMessage::new(message, context, sender)).await
    }

    pub async fn get(&self, path: &str) -> (StatusCode, String) {
        let resp = self.client.get(format!("{}{path}", self.base)).send().await.unwrap();
        let status = StatusCode::from_u16(resp.status().as_u16()).unwrap();
        (status, resp.text().await.unwrap())
    }
}
