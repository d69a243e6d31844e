/// Transport-level failures talking to the answer service.
///
/// All variants surface to the user the same way; the distinction is kept
/// for logging.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// Short label used in log records
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::Http(_) => "http",
            ClientError::Status { .. } => "status",
            ClientError::Decode(_) => "decode",
        }
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
