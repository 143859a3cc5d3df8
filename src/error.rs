// src/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("camera error: {0}")]
    Camera(String),

    #[error("hand detector error: {0}")]
    Detector(String),

    #[error("malformed detector response: {0}")]
    Protocol(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to write array file: {0}")]
    Npy(#[from] ndarray_npy::WriteNpyError),

    #[error("failed to write coordinate table: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
