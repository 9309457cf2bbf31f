//! # テスト用モック
//!
//! トランスポートと HTTP クライアントのインメモリ実装。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! mailgate-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use mailgate_domain::{Email, Envelope, SentMessage};

use crate::{
    error::TransportError,
    transport::{
        MailTransport,
        http::{HttpClient, HttpResponse},
    },
};

// ===== MockMailTransport =====

/// 送信内容を記録するトランスポート
///
/// [`failing`](Self::failing) で作成した場合は常に HTTP エラーを、
/// [`unreachable`](Self::unreachable) で作成した場合は常に通信エラーを返す。
#[derive(Clone, Default)]
pub struct MockMailTransport {
    sent:    Arc<Mutex<Vec<(Email, Envelope)>>>,
    failure: Option<Failure>,
}

#[derive(Clone)]
enum Failure {
    Rejected { status: u16, message: String },
    Network(String),
}

impl MockMailTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// プロバイダに拒否されたかのように失敗するトランスポート
    pub fn failing(status: u16, message: impl Into<String>) -> Self {
        Self {
            sent:    Arc::default(),
            failure: Some(Failure::Rejected {
                status,
                message: message.into(),
            }),
        }
    }

    /// 接続できないかのように失敗するトランスポート
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self {
            sent:    Arc::default(),
            failure: Some(Failure::Network(message.into())),
        }
    }

    /// 送信されたメールとエンベロープ
    pub fn sent(&self) -> Vec<(Email, Envelope)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for MockMailTransport {
    fn name(&self) -> String {
        "mock://".to_string()
    }

    async fn send_with_envelope(
        &self,
        email: &Email,
        envelope: &Envelope,
    ) -> Result<SentMessage, TransportError> {
        match &self.failure {
            Some(Failure::Rejected { status, message }) => {
                return Err(TransportError::http(*status, message.clone(), ""));
            }
            Some(Failure::Network(message)) => {
                return Err(TransportError::network(message.clone()));
            }
            None => {}
        }

        let mut sent = self.sent.lock().unwrap();
        sent.push((email.clone(), envelope.clone()));

        Ok(SentMessage {
            message_id: format!("mock-{}", sent.len()),
            envelope:   envelope.clone(),
            transport:  self.name(),
        })
    }
}

// ===== MockHttpClient =====

enum Reply {
    Response(HttpResponse),
    Error(String),
}

/// キューに積んだ応答を順に返す HTTP クライアント
///
/// キューが空の場合は 200 と空の JSON を返す。
#[derive(Clone, Default)]
pub struct MockHttpClient {
    replies:  Arc<Mutex<VecDeque<Reply>>>,
    requests: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, response: HttpResponse) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Reply::Response(response));
    }

    /// 通信エラーを積む
    pub fn push_error(&self, message: impl Into<String>) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Reply::Error(message.into()));
    }

    /// 受け取ったリクエスト（URL とボディ）
    pub fn requests(&self) -> Vec<(String, serde_json::Value)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, TransportError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), body.clone()));

        match self.replies.lock().unwrap().pop_front() {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::Error(message)) => Err(TransportError::network(message)),
            None => Ok(HttpResponse::new(200, "{}")),
        }
    }
}
