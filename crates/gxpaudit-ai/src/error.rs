use thiserror::Error;

/// Failure of a collaborator call made before the parsing pipeline runs.
///
/// Malformed model output is never reported here; it becomes a degraded
/// result instead.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("empty response: {0}")]
    EmptyResponse(String),

    #[error("no images provided")]
    NoImages,

    #[error("{0} is not supported by this generator")]
    Unsupported(&'static str),
}
