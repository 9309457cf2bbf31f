//! # メール送信ハンドラ
//!
//! ## エンドポイント
//!
//! - `POST /internal/mail/send` - メールを 1 通送信する
//!
//! 添付ファイルの内容は Base64 で受け取る。

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use mailgate_domain::{Attachment, Email, Mailbox};
use mailgate_infra::MailTransport;
use mailgate_shared::ApiResponse;
use serde::{Deserialize, Serialize};

use crate::error::MailServiceError;

/// メール API の共有状態
pub struct MailState {
    pub transport: Arc<dyn MailTransport>,
}

// --- リクエスト/レスポンス型 ---

/// メール送信リクエスト
#[derive(Debug, Deserialize)]
pub struct SendMailRequest {
    pub from:        Mailbox,
    pub sender:      Option<Mailbox>,
    #[serde(default)]
    pub to:          Vec<Mailbox>,
    #[serde(default)]
    pub cc:          Vec<Mailbox>,
    #[serde(default)]
    pub bcc:         Vec<Mailbox>,
    #[serde(default)]
    pub reply_to:    Vec<Mailbox>,
    #[serde(default)]
    pub subject:     String,
    pub text:        Option<String>,
    pub html:        Option<String>,
    /// カスタムヘッダー（指定順に送信する）
    #[serde(default)]
    pub headers:     Vec<HeaderRequest>,
    #[serde(default)]
    pub attachments: Vec<AttachmentRequest>,
}

/// カスタムヘッダー
#[derive(Debug, Deserialize)]
pub struct HeaderRequest {
    pub name:  String,
    pub value: String,
}

/// 添付ファイル
#[derive(Debug, Deserialize)]
pub struct AttachmentRequest {
    /// Base64 エンコードされた内容
    pub content:      String,
    #[serde(default)]
    pub content_type: String,
    pub filename:     Option<String>,
    #[serde(default)]
    pub inline:       bool,
    pub content_id:   Option<String>,
}

/// 送信結果 DTO
#[derive(Debug, Serialize)]
pub struct SentMailDto {
    pub message_id: String,
    pub transport:  String,
}

impl AttachmentRequest {
    fn into_attachment(self) -> Result<Attachment, MailServiceError> {
        let body = STANDARD.decode(self.content.trim()).map_err(|e| {
            MailServiceError::BadRequest(format!("添付ファイルの Base64 が不正です: {e}"))
        })?;

        let attachment = if self.inline {
            let Some(content_id) = self.content_id else {
                return Err(MailServiceError::BadRequest(
                    "インライン画像には content_id が必要です".to_string(),
                ));
            };
            Attachment::inline(body, self.content_type, content_id)
        } else {
            Attachment::new(body, self.content_type)
        };

        Ok(match self.filename {
            Some(filename) => attachment.with_filename(filename),
            None => attachment,
        })
    }
}

impl SendMailRequest {
    fn into_email(self) -> Result<Email, MailServiceError> {
        let mut builder = Email::builder().from(self.from).subject(self.subject);

        if let Some(sender) = self.sender {
            builder = builder.sender(sender);
        }
        for mailbox in self.to {
            builder = builder.to(mailbox);
        }
        for mailbox in self.cc {
            builder = builder.cc(mailbox);
        }
        for mailbox in self.bcc {
            builder = builder.bcc(mailbox);
        }
        for mailbox in self.reply_to {
            builder = builder.reply_to(mailbox);
        }
        if let Some(text) = self.text {
            builder = builder.text(text);
        }
        if let Some(html) = self.html {
            builder = builder.html(html);
        }
        for header in self.headers {
            builder = builder.header(header.name, header.value);
        }
        for attachment in self.attachments {
            builder = builder.attach(attachment.into_attachment()?);
        }

        Ok(builder.build()?)
    }
}

// --- ハンドラ ---

/// POST /internal/mail/send
///
/// 1 回だけ送信を試みる。プロバイダが拒否した場合は 502 を返す。
pub async fn send_mail(
    State(state): State<Arc<MailState>>,
    payload: Result<Json<SendMailRequest>, JsonRejection>,
) -> Result<impl IntoResponse, MailServiceError> {
    let Json(request) = payload.map_err(|e| MailServiceError::BadRequest(e.body_text()))?;
    let email = request.into_email()?;
    let sent = state.transport.send(&email, None).await?;

    let response = ApiResponse::new(SentMailDto {
        message_id: sent.message_id,
        transport:  sent.transport,
    });
    Ok((StatusCode::OK, Json(response)))
}
