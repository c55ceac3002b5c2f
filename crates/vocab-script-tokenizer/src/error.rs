use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenizerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Unsupported tokenizer model: {0}")]
    UnsupportedModel(String),

    #[error("Malformed tokenizer state: {0}")]
    MalformedState(String),

    #[error("Failed to decode token {id}: {message}")]
    Decode { id: u32, message: String },

    #[error("Special token '{0}' has no id after filtering")]
    UnresolvedSpecialToken(String),
}

pub type Result<T> = std::result::Result<T, TokenizerError>;
