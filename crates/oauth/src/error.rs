use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Url(#[from] url::ParseError),

    /// The token endpoint answered with an OAuth2 error object.
    #[error("oauth2 provider rejected the request: {error}")]
    Provider {
        error: String,
        description: Option<String>,
    },

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn provider(error: impl Into<String>, description: Option<String>) -> Self {
        Self::Provider {
            error: error.into(),
            description,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
