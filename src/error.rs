use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReporterError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("GitHub API error: {0}")]
    GitHub(String),
}

pub type Result<T> = std::result::Result<T, ReporterError>;
