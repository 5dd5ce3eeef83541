use thiserror::Error;

/// Why a page of search results could not be obtained.
#[derive(Debug, Error)]
pub enum CmsError {
    /// Transport level failure (DNS, TLS, timeout, connection reset).
    #[error("request to the CMS failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The CMS answered with a non-success status.
    #[error("CMS request failed with status {0}")]
    Status(u16),

    /// The body was not a search response.
    #[error("invalid CMS response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The aggregation pass was abandoned by its caller.
    #[error("aggregation cancelled")]
    Cancelled,
}

impl CmsError {
    /// Upstream status worth forwarding to our own callers, if any.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            CmsError::Status(code) => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CmsError>;
