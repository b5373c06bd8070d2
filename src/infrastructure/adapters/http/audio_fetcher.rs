//! HTTP Audio Fetcher - 通过 HTTP 下载音频
//!
//! 实现 AudioFetcherPort，响应体按 chunk 流式返回

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use std::time::Duration;

use crate::application::ports::{AudioFetcherPort, FetchError, FetchResponse};
use crate::config::NetworkConfig;

pub struct HttpAudioFetcher {
    client: Client,
}

impl HttpAudioFetcher {
    pub fn new(config: &NetworkConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| FetchError::NetworkError(e.to_string()))?;

        Ok(Self { client })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if e.is_connect() {
        FetchError::NetworkError(format!("Cannot connect: {}", e))
    } else {
        FetchError::NetworkError(e.to_string())
    }
}

#[async_trait]
impl AudioFetcherPort for HttpAudioFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        tracing::debug!(url = %url, "Fetching audio");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let content_length = response.content_length();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        tracing::debug!(
            url = %url,
            content_length = ?content_length,
            content_type = ?content_type,
            "Audio response received"
        );

        let body = stream::unfold(Some(response), |state| async move {
            let mut response: Response = state?;
            match response.chunk().await {
                Ok(Some(chunk)) => Some((Ok(chunk.to_vec()), Some(response))),
                Ok(None) => None,
                Err(e) => Some((Err(map_reqwest_error(e)), None)),
            }
        })
        .boxed();

        Ok(FetchResponse {
            content_length,
            content_type,
            body,
        })
    }
}
