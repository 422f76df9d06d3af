use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),

    #[error("invalid units: {0} (expected standard, metric or imperial)")]
    InvalidUnits(String),

    #[error("response body is not json")]
    NotJson,

    #[error("logger setup failed: {0}")]
    Logger(String),
}
