use thiserror::Error;

/// Main error type for Chatbox
#[derive(Error, Debug)]
pub enum ChatboxError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
