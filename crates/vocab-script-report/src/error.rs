use thiserror::Error;
use vocab_script_tokenizer::TokenizerError;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Template error: {0}")]
    Template(String),

    #[error("Token error: {0}")]
    Token(#[from] TokenizerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
