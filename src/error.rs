use crate::models::Provider;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("store error: {0}")]
    Store(String),

    #[error("gateway error: {0}")]
    Gateway(String),

    #[error("gateway {0} is not configured")]
    GatewayDisabled(Provider),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Gateway(err.to_string())
    }
}

impl From<Error> for (axum::http::StatusCode, String) {
    fn from(err: Error) -> Self {
        use axum::http::StatusCode;
        match err {
            Error::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            Error::Gateway(msg) => (StatusCode::BAD_GATEWAY, format!("Gateway error: {msg}")),
            Error::GatewayDisabled(provider) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Gateway {provider} is not configured"),
            ),
            Error::Store(msg) => (StatusCode::INTERNAL_SERVER_ERROR, format!("Store error: {msg}")),
            Error::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Internal error: {msg}"))
            }
        }
    }
}

impl axum::response::IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let (status, body): (axum::http::StatusCode, String) = self.into();
        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
