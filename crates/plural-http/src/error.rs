/// Failures produced by the HTTP services in this crate
#[derive(thiserror::Error, Debug)]
pub enum HttpServiceError {
    /// Building the [`http::Request`] failed
    #[error("HTTP error: {:?}", .0)]
    Http(#[from] http::Error),
    /// The request did not complete within the configured timeout
    #[error("Request timed out")]
    TimedOut,
    /// The response body could not be decoded
    #[error("Decode error: {:?}", .0)]
    Decode(Box<dyn std::error::Error + Send + Sync + 'static>),
    /// Reading or writing a body failed
    #[error("Body error: {:?}", .0)]
    Body(Box<dyn std::error::Error + Send + Sync + 'static>),
    /// No connection could be established
    #[error("Connect error: {:?}", .0)]
    Connect(Box<dyn std::error::Error + Send + Sync + 'static>),
    /// Anything the categories above do not cover
    #[error("Unexpected HTTP error: {:?}", .0)]
    Unexpected(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl HttpServiceError {
    /// Whether the failure happened while connecting
    pub const fn is_connect(&self) -> bool {
        matches!(self, HttpServiceError::Connect(_))
    }
    /// Whether the request timed out
    pub const fn is_timeout(&self) -> bool {
        matches!(self, HttpServiceError::TimedOut)
    }
}
