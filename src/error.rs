//! Error taxonomy for pixmap construction and access

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PixmapError {
    /// Wrong argument type or arity, bad dimensions, bad color channels
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("cannot create pixmap, file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("cannot decode image: {0}")]
    Decode(String),
    #[error("cannot encode image: {0}")]
    Encode(String),
    #[error("cannot create pixmap, out of memory ({bytes} bytes requested)")]
    OutOfMemory { bytes: u128 },
    #[error("pixmap disposed")]
    Disposed,
    #[error("pixmap already disposed")]
    AlreadyDisposed,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid composition: {0}")]
    Config(String),
    #[cfg(feature = "viewer")]
    #[error("display error: {0}")]
    Display(String),
}

impl PixmapError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, PixmapError>;
