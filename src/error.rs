use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("feed build error: {0}")]
    Feed(#[from] rss::Error),

    #[error("feed encoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("invalid stock code: {0:?}")]
    InvalidCode(String),

    #[error("invalid user config: {0}")]
    InvalidUser(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
