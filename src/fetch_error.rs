#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Server returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("Response truncated: expected metadata block and header row")]
    Truncated,
    #[error("Failed to parse response CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to parse timestamp: {0}")]
    DateTimeError(String),
    #[error("Data row has no timestamp column")]
    MissingTimestamp,
}
