//! Null トランスポート
//!
//! メールを実際に送信せず、ログ出力のみ行う。
//! テスト環境や通知無効化時に使用する（`null://null`）。

use async_trait::async_trait;
use mailgate_domain::{Email, Envelope, SentMessage};
use uuid::Uuid;

use super::MailTransport;
use crate::error::TransportError;

/// Null トランスポート（ログ出力のみ）
#[derive(Debug, Clone, Default)]
pub struct NullTransport;

#[async_trait]
impl MailTransport for NullTransport {
    fn name(&self) -> String {
        "null://".to_string()
    }

    async fn send_with_envelope(
        &self,
        email: &Email,
        envelope: &Envelope,
    ) -> Result<SentMessage, TransportError> {
        tracing::info!(
            sender = %envelope.sender(),
            recipients = envelope.recipients().len(),
            subject = %email.subject,
            "Null: メール送信をスキップ"
        );

        Ok(SentMessage {
            message_id: Uuid::now_v7().to_string(),
            envelope:   envelope.clone(),
            transport:  self.name(),
        })
    }
}
