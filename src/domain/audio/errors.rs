//! Audio Context - Errors

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AudioError {
    #[error("Invalid WAV: {0}")]
    InvalidWav(String),

    #[error("Unsupported PCM encoding: {0}")]
    UnsupportedEncoding(String),
}
