//! # HTTP クライアント
//!
//! API トランスポートが使用する HTTP 通信を抽象化する。
//! テストでは [`MockHttpClient`](crate::mock::MockHttpClient) に差し替える。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;

use crate::error::TransportError;

/// HTTP レスポンス
///
/// ステータスコードと生のボディのみを保持する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body:   String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// ボディを JSON として解釈する
    ///
    /// JSON でない場合はエラーにせず `None` を返す。
    /// エラーレスポンスがプレーンテキストで返ってくる場合に備える。
    pub fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.body).ok()
    }
}

/// HTTP クライアントトレイト
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// JSON ボディで POST する
    ///
    /// ステータスコードに関わらずレスポンスを返す。
    /// 接続失敗やタイムアウトのみをエラーとする。
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, TransportError>;
}

/// reqwest による HTTP クライアント実装
#[derive(Debug, Clone, Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// リクエストタイムアウト付きのクライアントを作成する
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(HttpResponse { status, body })
    }
}
