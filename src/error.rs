// src/error.rs
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Backend answered with a non-2xx status.
    #[error("API error: {status} - {body} (url={url})")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },
    /// Backend answered 2xx but the body was not JSON.
    #[error("invalid JSON in {status} response (url={url}): {source}")]
    InvalidJson {
        url: String,
        status: StatusCode,
        #[source]
        source: serde_json::Error,
    },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("upload needs at least one file")]
    NoFiles,
    #[error("invalid MIME type {mime:?} for {file_name}")]
    InvalidMime {
        file_name: String,
        mime: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ApiError {
    /// True when the server was reached and its response was rejected.
    pub fn is_request_error(&self) -> bool {
        matches!(self, Self::Status { .. } | Self::InvalidJson { .. })
    }

    pub fn is_transport_error(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } | Self::InvalidJson { status, .. } => Some(*status),
            Self::Transport { source, .. } => source.status(),
            Self::NoFiles | Self::InvalidMime { .. } => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Message cannot be empty")]
    EmptyMessage,
    #[error(transparent)]
    Api(#[from] ApiError),
}
