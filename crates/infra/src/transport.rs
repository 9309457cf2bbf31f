//! # メールトランスポート
//!
//! メールの送信手段を抽象化するインフラストラクチャモジュール。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: [`MailTransport`] trait でメール送信を抽象化
//! - **3 つの実装**: UniOne API（本番用）、SMTP（Mailpit 開発用）、Null（テスト・無効化用）
//! - **DSN 切替**: `MAILER_DSN` のスキームでランタイム選択（[`create_transport`]）
//! - **単発送信**: 1 回の呼び出しで 1 回だけ送信を試みる。リトライしない

mod factory;
pub mod http;
mod null;
mod smtp;
pub mod unione;

use async_trait::async_trait;
pub use factory::create_transport;
use mailgate_domain::{Email, Envelope, SentMessage};
use mailgate_shared::{
    event_log::{error as log_error, event},
    log_business_event,
};
pub use null::NullTransport;
pub use smtp::SmtpTransport;
use tracing::Instrument as _;
pub use unione::UniOneApiTransport;

use crate::error::{TransportError, TransportErrorKind};

/// メール送信トレイト
///
/// 各トランスポートは [`send_with_envelope`](MailTransport::send_with_envelope) のみを実装する。
/// エンベロープの導出とビジネスイベントの記録は [`send`](MailTransport::send) が共通で行う。
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// トランスポートの表示名（認証情報は含めない）
    fn name(&self) -> String;

    /// 指定したエンベロープでメールを送信する
    async fn send_with_envelope(
        &self,
        email: &Email,
        envelope: &Envelope,
    ) -> Result<SentMessage, TransportError>;

    /// メールを送信する
    ///
    /// `envelope` が `None` の場合はメッセージから導出する。
    async fn send(
        &self,
        email: &Email,
        envelope: Option<&Envelope>,
    ) -> Result<SentMessage, TransportError> {
        let envelope = match envelope {
            Some(envelope) => envelope.clone(),
            None => Envelope::from_email(email)?,
        };
        let transport = self.name();

        let span = tracing::info_span!("mail_send", mail.transport = %transport);
        span.in_scope(|| {
            tracing::debug!(
                sender = %envelope.sender(),
                recipients = envelope.recipients().len(),
                subject = %email.subject,
                "メール送信を開始"
            );
        });
        let result = self
            .send_with_envelope(email, &envelope)
            .instrument(span)
            .await;

        match &result {
            Ok(sent) => log_business_event!(
                event.category = event::category::MAIL,
                event.action = event::action::MAIL_SENT,
                event.result = event::result::SUCCESS,
                mail.transport = %transport,
                mail.message_id = %sent.message_id,
                mail.recipients = envelope.recipients().len(),
                "メール送信成功"
            ),
            Err(e) => {
                let (category, kind) = error_context(e);
                log_business_event!(
                    event.category = event::category::MAIL,
                    event.action = event::action::MAIL_FAILED,
                    event.result = event::result::FAILURE,
                    mail.transport = %transport,
                    mail.recipients = envelope.recipients().len(),
                    error.category = category,
                    error.kind = kind,
                    error = %e,
                    "メール送信失敗"
                );
            }
        }

        result
    }
}

/// ログ用のエラーカテゴリと種別
fn error_context(error: &TransportError) -> (&'static str, &'static str) {
    match error.kind() {
        TransportErrorKind::Http { .. } => (
            log_error::category::EXTERNAL_SERVICE,
            log_error::kind::PROVIDER_REJECTED,
        ),
        TransportErrorKind::Network(_) | TransportErrorKind::Smtp(_) => (
            log_error::category::EXTERNAL_SERVICE,
            log_error::kind::NETWORK,
        ),
        TransportErrorKind::InvalidMessage(_) => (
            log_error::category::VALIDATION,
            log_error::kind::INVALID_MESSAGE,
        ),
        TransportErrorKind::InvalidDsn(_) | TransportErrorKind::UnsupportedScheme { .. } => (
            log_error::category::CONFIGURATION,
            log_error::kind::INVALID_DSN,
        ),
        TransportErrorKind::Serialization(_) => (
            log_error::category::INTERNAL,
            log_error::kind::SERIALIZATION,
        ),
    }
}
