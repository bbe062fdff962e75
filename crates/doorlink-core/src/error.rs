use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Validation errors
    #[error("Invalid credential: {message}")]
    InvalidCredential { message: String },

    #[error("Invalid device identity: {message}")]
    InvalidIdentity { message: String },

    #[error("Invalid node role: {value}")]
    InvalidRole { value: String },

    // Wire errors
    #[error("Frame too large: {size} bytes exceeds limit of {max}")]
    FrameTooLarge { size: usize, max: usize },

    #[error("Invalid frame: {message}")]
    InvalidFrame { message: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
