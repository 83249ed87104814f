use std::fmt;

#[derive(Debug)]
pub enum AppError {
    InvalidRequest(String),
    UploadError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            AppError::UploadError(msg) => write!(f, "Upload error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
