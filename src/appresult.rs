use axum::{http::StatusCode, response::{IntoResponse, Response}};
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("missing userbase:room for scope in context {0:?}")]
    MissingScope(String),

    #[error("target room to send results missing for {0:?}")]
    TargetResolution(String),

    #[error("http post to {url} failed with error {reason}")]
    Delivery { url: String, reason: String },

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("failed to encode payload with error {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("invalid registration: {0}")]
    Registration(String),

    #[error("plugin {0} is not available")]
    PluginUnavailable(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        use AppError::*;
        match self {
            MissingScope(_) | TargetResolution(_) | Registration(_) => StatusCode::BAD_REQUEST,
            PluginUnavailable(_) => StatusCode::NOT_FOUND,
            Delivery { .. } => StatusCode::BAD_GATEWAY,
            Storage(_) | Encoding(_) | Config(_) | Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_delivery(&self) -> bool {
        matches!(self, AppError::Delivery { .. })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), format!("{self}\r\n")).into_response()
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        Self::Other(anyhow::Error::msg(err))
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        Self::Other(anyhow::Error::msg(err.to_owned()))
    }
}
