use thiserror::Error;

/// Errors produced by the lookup/caching/selection engine.
///
/// The recoverable variants are reported to the presentation sink as
/// non-fatal and the selection is reset so the user can retry.
/// `Critical` signals a protocol breach by the host (an out-of-sequence
/// or malformed selection) and is reported fatally instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level failure reaching the weather API.
    #[error("Failed to request weather data: {0}")]
    RequestFailed(String),

    /// The response body was not well-formed JSON.
    #[error("Failed to decode weather data: {0}")]
    DecodeFailed(String),

    /// Well-formed JSON carrying a non-success application status.
    #[error("Weather API returned error {code}: {message}")]
    Api { code: i64, message: String },

    /// City display name not found in the index.
    #[error("Unknown city: {0}")]
    ResolutionFailed(String),

    /// A required field was missing from an otherwise well-formed response.
    #[error("Malformed weather payload: missing {0}")]
    MalformedPayload(&'static str),

    /// State-machine invariant violated by the host.
    #[error("Unexpected selection: {0}")]
    Critical(String),
}

impl Error {
    pub fn is_critical(&self) -> bool {
        matches!(self, Error::Critical(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::DecodeFailed(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::RequestFailed(err.to_string())
    }
}
