use std::sync::{Arc, Mutex};

use axum::{http::StatusCode, routing::post, Router};
use tokio::net::TcpListener;

use crate::rooms::OutboundMessage;

/// A local webhook endpoint that records every body posted to it.
pub struct Sink {
    pub url: String,
    received: Arc<Mutex<Vec<String>>>,
}

impl Sink {
    pub async fn start() -> Sink {
        Self::with_status(StatusCode::OK).await
    }

    pub async fn with_status(status: StatusCode) -> Sink {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        let app = Router::new().route(
            "/hook",
            post(move |body: String| {
                let sink = sink.clone();
                async move {
                    sink.lock().unwrap().push(body);
                    status
                }
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        Sink {
            url: format!("http://{addr}/hook"),
            received,
        }
    }

    pub fn bodies(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.bodies()
            .iter()
            .map(|b| serde_json::from_str(b).unwrap())
            .collect()
    }
}
