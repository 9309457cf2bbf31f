//! # インフラ層エラー定義
//!
//! メールトランスポートで発生するエラーを表現する。
//!
//! ## 設計方針
//!
//! - **単一の失敗経路**: プロバイダが送信を拒否した場合は [`TransportErrorKind::Http`] のみ。
//!   リトライや部分成功は扱わず、呼び出し元へ即座に返す
//! - **SpanTrace 自動捕捉**: `From` 実装や convenience constructor で
//!   エラー生成時の呼び出し経路を自動記録する
//!
//! ## 構造
//!
//! `std::io::Error` と同じ struct + enum パターンを採用:
//! - [`TransportError`]: エラー種別（[`TransportErrorKind`]）と [`SpanTrace`] を保持するラッパー
//! - [`TransportErrorKind`]: エラーの具体的な種別

use std::fmt;

use derive_more::Display;
use mailgate_domain::MailError;
use thiserror::Error;
use tracing_error::SpanTrace;

/// トランスポートで発生するエラー
///
/// エラー種別に応じた処理には [`kind()`](TransportError::kind) を使用する:
///
/// ```ignore
/// match error.kind() {
///     TransportErrorKind::Http { status, .. } => { /* プロバイダの拒否 */ }
///     _ => { /* その他 */ }
/// }
/// ```
#[derive(Display)]
#[display("{kind}")]
pub struct TransportError {
    kind:       TransportErrorKind,
    span_trace: SpanTrace,
}

/// トランスポートエラーの種別
#[derive(Debug, Error)]
pub enum TransportErrorKind {
    /// プロバイダがリクエストを拒否した
    ///
    /// `message` はプロバイダのメッセージとコードを埋め込んだ文言
    /// （例: `Unable to send an email: Invalid API key (code 102).`）。
    /// `body` は診断用に保持する生のレスポンスボディ。
    #[error("{message}")]
    Http {
        status:  u16,
        message: String,
        body:    String,
    },

    /// 接続失敗、タイムアウトなどの通信エラー
    #[error("ネットワークエラー: {0}")]
    Network(String),

    /// リクエストボディのシリアライズ失敗
    #[error("シリアライズエラー: {0}")]
    Serialization(#[source] serde_json::Error),

    /// DSN の形式不正、必須項目の欠落
    #[error("DSN が不正です: {0}")]
    InvalidDsn(String),

    /// 対応していない DSN スキーム
    #[error("サポートされていないトランスポートです: {scheme}")]
    UnsupportedScheme { scheme: String },

    /// メッセージまたはエンベロープが不正
    #[error("メッセージが不正です: {0}")]
    InvalidMessage(#[source] MailError),

    /// SMTP 送信の失敗
    #[error("SMTP エラー: {0}")]
    Smtp(String),
}

// ===== TransportError のメソッド =====

impl TransportError {
    /// エラー種別を取得する
    pub fn kind(&self) -> &TransportErrorKind {
        &self.kind
    }

    /// SpanTrace を取得する
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    /// TransportError を分解して種別と SpanTrace を取り出す
    pub fn into_parts(self) -> (TransportErrorKind, SpanTrace) {
        (self.kind, self.span_trace)
    }

    /// プロバイダが送信を拒否したエラーかどうか
    pub fn is_rejected_by_provider(&self) -> bool {
        matches!(self.kind, TransportErrorKind::Http { .. })
    }

    fn capture(kind: TransportErrorKind) -> Self {
        Self {
            kind,
            span_trace: SpanTrace::capture(),
        }
    }

    // ===== Convenience constructors =====

    /// プロバイダ拒否エラーを生成する
    pub fn http(status: u16, message: impl Into<String>, body: impl Into<String>) -> Self {
        Self::capture(TransportErrorKind::Http {
            status,
            message: message.into(),
            body: body.into(),
        })
    }

    /// 通信エラーを生成する
    pub fn network(msg: impl Into<String>) -> Self {
        Self::capture(TransportErrorKind::Network(msg.into()))
    }

    /// DSN 不正エラーを生成する
    pub fn invalid_dsn(msg: impl Into<String>) -> Self {
        Self::capture(TransportErrorKind::InvalidDsn(msg.into()))
    }

    /// 未対応スキームエラーを生成する
    pub fn unsupported_scheme(scheme: impl Into<String>) -> Self {
        Self::capture(TransportErrorKind::UnsupportedScheme {
            scheme: scheme.into(),
        })
    }

    /// SMTP エラーを生成する
    pub fn smtp(msg: impl Into<String>) -> Self {
        Self::capture(TransportErrorKind::Smtp(msg.into()))
    }
}

// ===== トレイト実装 =====

impl fmt::Debug for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportError")
            .field("kind", &self.kind)
            .field("span_trace", &self.span_trace)
            .finish()
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.kind.source()
    }
}

// ===== From 実装（SpanTrace 自動キャプチャ） =====

impl From<serde_json::Error> for TransportError {
    fn from(source: serde_json::Error) -> Self {
        Self::capture(TransportErrorKind::Serialization(source))
    }
}

impl From<MailError> for TransportError {
    fn from(source: MailError) -> Self {
        Self::capture(TransportErrorKind::InvalidMessage(source))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(source: reqwest::Error) -> Self {
        Self::capture(TransportErrorKind::Network(source.to_string()))
    }
}
