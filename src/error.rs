use core::result::Result as StdResult;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Serenity(#[from] serenity::Error),
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("GET {url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid api data: {0}")]
    InvalidData(String),
    #[error("config: {0}")]
    Config(String),
}

pub type Result<T = ()> = StdResult<T, Error>;

impl Error {
    pub fn invalid(what: impl Into<String>) -> Self {
        Self::InvalidData(what.into())
    }
}
