/// Errors raised while talking to the sighting backend, photo storage, or local files.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with an `{ "error": ... }` body. Displays the message as-is.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Photo upload failed: {0}")]
    Upload(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("{0}")]
    Validation(String),
}

impl ApiError {
    /// Whether the backend itself refused the request (as opposed to a transport failure).
    pub fn is_rejection(&self) -> bool {
        matches!(self, ApiError::Rejected { .. })
    }
}
