#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request to relay failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The relay answered with a non-success status. The body is not read.
    #[error("Network response was not ok ({0})")]
    Status(reqwest::StatusCode),

    #[error("could not decode relay stream: {0}")]
    Decode(String),
}
