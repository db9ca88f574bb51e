pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid label config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid label config: {message}")]
    InvalidConfig { message: String },
}
