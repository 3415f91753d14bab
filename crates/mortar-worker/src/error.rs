#![forbid(unsafe_code)]

use thiserror::Error;

/// Worker-internal errors.
///
/// These only travel between internal helpers; every public surface absorbs
/// them into a fallback (synthesized response, default version, skipped key).
/// Nothing here is fatal to the worker.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Network error: {0}")]
    Net(#[from] mortar_net::NetError),

    #[error("Malformed manifest: {0}")]
    Manifest(String),

    #[error("Json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

pub type WorkerResult<T> = Result<T, WorkerError>;
