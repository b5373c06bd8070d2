//! 应用层错误定义

use thiserror::Error;

use crate::application::ports::{CacheError, FetchError};

/// 音频加载错误
///
/// 合并请求的所有等待者共享同一个结果，因此需要 Clone
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Empty response: {0}")]
    EmptyResponse(String),

    #[error("Load cancelled: {0}")]
    Cancelled(String),

    #[error("Cache error: {0}")]
    CacheError(String),
}

impl From<FetchError> for LoadError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::HttpStatus { status, url } => Self::HttpStatus { status, url },
            FetchError::Timeout => Self::Timeout,
            FetchError::NetworkError(msg) => Self::NetworkError(msg),
            FetchError::InvalidResponse(msg) => Self::NetworkError(msg),
        }
    }
}

impl From<CacheError> for LoadError {
    fn from(err: CacheError) -> Self {
        Self::CacheError(err.to_string())
    }
}

/// 引擎层错误
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}
