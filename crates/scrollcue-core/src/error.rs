use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid draw keyframe: {0}")]
    InvalidKeyframe(String),

    #[error("Invalid root margin: {0}")]
    InvalidMargin(String),

    #[error("Invalid easing: {0}")]
    InvalidEasing(String),

    #[error("Scenario error: {0}")]
    Scenario(String),
}

pub type Result<T> = std::result::Result<T, Error>;
