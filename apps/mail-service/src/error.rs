//! # Mail Service エラー定義
//!
//! Mail Service 固有のエラーと、HTTP レスポンスへの変換を定義する。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mailgate_domain::MailError;
use mailgate_infra::{TransportError, TransportErrorKind};
use mailgate_shared::{ErrorResponse, event_log::error as log_error};
use thiserror::Error;

/// Mail Service で発生するエラー
#[derive(Debug, Error)]
pub enum MailServiceError {
    /// 不正なリクエスト
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),

    /// メッセージの検証エラー
    #[error("検証エラー: {0}")]
    Validation(#[from] MailError),

    /// トランスポートでの送信失敗
    #[error("送信エラー: {0}")]
    Transport(#[from] TransportError),
}

impl IntoResponse for MailServiceError {
    fn into_response(self) -> Response {
        let body = match &self {
            MailServiceError::BadRequest(msg) => ErrorResponse::bad_request(msg.clone()),
            MailServiceError::Validation(e) => ErrorResponse::validation_error(e.to_string()),
            MailServiceError::Transport(e) => match e.kind() {
                TransportErrorKind::InvalidMessage(inner) => {
                    ErrorResponse::validation_error(inner.to_string())
                }
                TransportErrorKind::Http { .. } => ErrorResponse::mail_delivery_failed(e.to_string()),
                _ => {
                    tracing::error!(
                        error.category = log_error::category::EXTERNAL_SERVICE,
                        error = %e,
                        span_trace = %e.span_trace(),
                        "メール送信で内部エラー"
                    );
                    ErrorResponse::internal_error()
                }
            },
        };

        let status =
            StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(body)).into_response()
    }
}
