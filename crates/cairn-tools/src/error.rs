use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Session store error: {0}")]
    Store(#[from] cairn_session::Error),
}

pub type Result<T> = std::result::Result<T, ToolError>;
