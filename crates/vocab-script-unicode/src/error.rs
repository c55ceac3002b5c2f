use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScriptDataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse line {line}: {content}")]
    Parse { line: usize, content: String },

    #[error("code point U+{codepoint:04X} assigned twice (lines {first_line} and {second_line})")]
    Overlap {
        codepoint: u32,
        first_line: usize,
        second_line: usize,
    },
}

pub type Result<T> = std::result::Result<T, ScriptDataError>;
