use thiserror::Error;

#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Usage error: {0}")]
    Usage(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Execution error: {0}")]
    Execution(String),
    #[error("Query error: {0}")]
    Query(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SweepError>;
