//! Audio Fetcher Port - 网络音频获取
//!
//! 以字节块流的形式返回响应体，便于渐进读取与进度上报

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use thiserror::Error;

/// 获取错误
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

pub type ByteStream = BoxStream<'static, Result<Vec<u8>, FetchError>>;

/// 流式响应
pub struct FetchResponse {
    /// Content-Length，未知时为 None
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub body: ByteStream,
}

impl std::fmt::Debug for FetchResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchResponse")
            .field("content_length", &self.content_length)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Audio Fetcher Port
#[async_trait]
pub trait AudioFetcherPort: Send + Sync {
    /// 发起 GET 请求；非 2xx 状态返回 `FetchError::HttpStatus`
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError>;
}
