//! # UniOne API トランスポート
//!
//! UniOne（旧 UniSender Go）のトランザクションメール API を使用してメールを送信する。
//!
//! ## リクエスト
//!
//! ```text
//! POST https://one.unisender.com/{locale}/transactional/api/v1/email/send.json
//! ```
//!
//! ```json
//! {
//!   "api_key": "...",
//!   "username": "...",
//!   "message": {
//!     "body": { "html": "<p>...</p>", "text": "..." },
//!     "subject": "...",
//!     "from_email": "alice@example.com",
//!     "from_name": "Alice",
//!     "recipients": [{ "email": "bob@example.com", "type": "to", "name": "Bob" }],
//!     "attachments": [{ "type": "application/pdf", "name": "a.pdf", "content": "<base64>" }],
//!     "images": [{ "type": "image/png", "name": "logo", "content": "<base64>" }],
//!     "headers": ["Reply-To: support@example.com"]
//!   }
//! }
//! ```
//!
//! ## レスポンス
//!
//! - 200: `job_id` をメッセージ ID として返す
//! - それ以外: `status: "error"` であれば `message` と `code` を埋め込んだエラー、
//!   そうでなければ `code` のみのエラー。リトライは行わない

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use mailgate_domain::{Attachment, Email, Envelope, Mailbox, SentMessage};
use mailgate_shared::event_log::error as log_error;
use serde::Serialize;

use super::{
    MailTransport,
    http::{HttpClient, HttpResponse},
};
use crate::error::TransportError;

const HOST: &str = "one.unisender.com";
const METHOD: &str = "/transactional/api/v1/email/send.json";
const DEFAULT_LOCALE: &str = "en";

/// 構造化フィールドとして送るため `headers` に含めないヘッダー
const BYPASSED_HEADERS: [&str; 6] = ["from", "to", "cc", "bcc", "subject", "content-type"];

// --- リクエストペイロード ---

/// UniOne API リクエストボディ
///
/// API キーを含むため `Debug` は実装しない。
#[derive(Serialize)]
pub struct UniOnePayload {
    pub api_key:  String,
    pub username: String,
    pub message:  UniOneMessage,
}

#[derive(Debug, Serialize)]
pub struct UniOneMessage {
    pub body:        UniOneBody,
    pub subject:     String,
    pub from_email:  String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_name:   Option<String>,
    pub recipients:  Vec<UniOneRecipient>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<UniOneAttachment>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images:      Vec<UniOneAttachment>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub headers:     Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct UniOneBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UniOneRecipient {
    pub email: String,
    #[serde(rename = "type")]
    pub kind:  RecipientType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name:  Option<String>,
}

/// 宛先種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientType {
    To,
    Cc,
    Bcc,
}

impl RecipientType {
    /// エンベロープの宛先をメッセージの cc / bcc リストと照合して分類する
    ///
    /// bcc を cc より先に判定する。どちらにも含まれなければ to。
    pub fn classify(recipient: &Mailbox, email: &Email) -> Self {
        let contains = |list: &[Mailbox]| {
            list.iter()
                .any(|m| m.address.eq_ignore_case(&recipient.address))
        };

        if contains(&email.bcc) {
            Self::Bcc
        } else if contains(&email.cc) {
            Self::Cc
        } else {
            Self::To
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UniOneAttachment {
    #[serde(rename = "type")]
    pub content_type: String,
    pub name:         String,
    pub content:      String,
}

impl UniOneAttachment {
    fn from_attachment(attachment: &Attachment) -> Self {
        let name = attachment
            .file_name()
            .or_else(|| {
                attachment
                    .is_inline()
                    .then(|| attachment.content_id.clone())
                    .flatten()
            })
            .unwrap_or_default();

        Self {
            content_type: attachment.mime_type().to_string(),
            name,
            content: STANDARD.encode(&attachment.body),
        }
    }
}

// --- トランスポート ---

/// UniOne API トランスポート
pub struct UniOneApiTransport {
    api_key:  String,
    username: String,
    locale:   String,
    host:     String,
    client:   Arc<dyn HttpClient>,
}

impl UniOneApiTransport {
    /// 新しい UniOne API トランスポートを作成する
    ///
    /// # 引数
    ///
    /// - `api_key`: UniOne の API キー
    /// - `username`: UniOne のユーザー名
    /// - `client`: HTTP クライアント
    pub fn new(
        api_key: impl Into<String>,
        username: impl Into<String>,
        client: Arc<dyn HttpClient>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            username: username.into(),
            locale: DEFAULT_LOCALE.to_string(),
            host: HOST.to_string(),
            client,
        }
    }

    /// ロケールを設定する（空文字列の場合は既定の `en` のまま）
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        let locale = locale.into();
        if !locale.is_empty() {
            self.locale = locale;
        }
        self
    }

    /// ホストを上書きする（`default` または空文字列の場合は既定ホストのまま）
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        let host = host.into();
        if !host.is_empty() && host != "default" {
            self.host = host;
        }
        self
    }

    /// スキームを除いたエンドポイント
    pub fn endpoint(&self) -> String {
        format!("{}/{}{}", self.host, self.locale, METHOD)
    }

    /// リクエストペイロードを構築する
    pub fn build_payload(&self, email: &Email, envelope: &Envelope) -> UniOnePayload {
        let sender = envelope.sender();

        let recipients = envelope
            .recipients()
            .iter()
            .map(|recipient| UniOneRecipient {
                email: recipient.address.to_string(),
                kind:  RecipientType::classify(recipient, email),
                name:  recipient.has_name().then(|| recipient.name.clone()),
            })
            .collect();

        let (images, attachments): (Vec<_>, Vec<_>) =
            email.attachments.iter().partition(|a| a.is_inline());

        let headers = email
            .all_headers()
            .iter()
            .filter(|header| !BYPASSED_HEADERS.iter().any(|name| header.is(name)))
            .map(ToString::to_string)
            .collect();

        UniOnePayload {
            api_key:  self.api_key.clone(),
            username: self.username.clone(),
            message:  UniOneMessage {
                body: UniOneBody {
                    html: email.html_body.clone(),
                    text: email.text_body.clone(),
                },
                subject: email.subject.clone(),
                from_email: sender.address.to_string(),
                from_name: sender.has_name().then(|| sender.name.clone()),
                recipients,
                attachments: attachments
                    .into_iter()
                    .map(UniOneAttachment::from_attachment)
                    .collect(),
                images: images
                    .into_iter()
                    .map(UniOneAttachment::from_attachment)
                    .collect(),
                headers,
            },
        }
    }
}

impl fmt::Display for UniOneApiTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unione+api://{}", self.endpoint())
    }
}

/// レスポンスを解釈し、成功時は job_id を返す
pub fn interpret_response(response: &HttpResponse) -> Result<String, TransportError> {
    let json = response.json();
    let field = |key: &str| json.as_ref().and_then(|body| body.get(key)).and_then(scalar);

    if response.status != 200 {
        let code = field("code").unwrap_or_else(|| response.status.to_string());
        let message = if field("status").as_deref() == Some("error") {
            format!(
                "Unable to send an email: {} (code {code}).",
                field("message").unwrap_or_default()
            )
        } else {
            format!("Unable to send an email (code {code}).")
        };

        return Err(TransportError::http(
            response.status,
            message,
            response.body.clone(),
        ));
    }

    field("job_id").ok_or_else(|| {
        TransportError::http(
            response.status,
            "Unable to send an email: missing job_id in response.",
            response.body.clone(),
        )
    })
}

/// 文字列または数値を文字列として取り出す
fn scalar(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait]
impl MailTransport for UniOneApiTransport {
    fn name(&self) -> String {
        self.to_string()
    }

    async fn send_with_envelope(
        &self,
        email: &Email,
        envelope: &Envelope,
    ) -> Result<SentMessage, TransportError> {
        let payload = self.build_payload(email, envelope);

        tracing::debug!(
            endpoint = %self.endpoint(),
            recipients = payload.message.recipients.len(),
            attachments = payload.message.attachments.len(),
            images = payload.message.images.len(),
            "UniOne API にメール送信リクエストを発行"
        );

        let body = serde_json::to_value(&payload)?;
        let url = format!("https://{}", self.endpoint());
        let response = self.client.post_json(&url, &body).await?;

        let job_id = interpret_response(&response).inspect_err(|e| {
            tracing::error!(
                error.category = log_error::category::EXTERNAL_SERVICE,
                error.kind = log_error::kind::PROVIDER_REJECTED,
                http.status = response.status,
                response.body = %response.body,
                error = %e,
                "UniOne API がメール送信を拒否"
            );
        })?;

        Ok(SentMessage {
            message_id: job_id,
            envelope:   envelope.clone(),
            transport:  self.name(),
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::{error::TransportErrorKind, mock::MockHttpClient};

    fn mailbox(raw: &str) -> Mailbox {
        raw.parse().unwrap()
    }

    fn transport(client: MockHttpClient) -> UniOneApiTransport {
        UniOneApiTransport::new("KEY", "USER", Arc::new(client))
    }

    fn payload_json(email: &Email) -> serde_json::Value {
        let envelope = Envelope::from_email(email).unwrap();
        let payload = transport(MockHttpClient::new()).build_payload(email, &envelope);
        serde_json::to_value(&payload).unwrap()
    }

    // ===== エンドポイント =====

    #[test]
    fn test_既定ロケールのエンドポイントと表示名() {
        let transport = transport(MockHttpClient::new());

        assert_eq!(
            transport.endpoint(),
            "one.unisender.com/en/transactional/api/v1/email/send.json"
        );
        assert_eq!(
            transport.name(),
            "unione+api://one.unisender.com/en/transactional/api/v1/email/send.json"
        );
    }

    #[rstest]
    #[case("ru", "default", "one.unisender.com/ru/transactional/api/v1/email/send.json")]
    #[case("", "", "one.unisender.com/en/transactional/api/v1/email/send.json")]
    #[case("en", "eu1.unione.io", "eu1.unione.io/en/transactional/api/v1/email/send.json")]
    fn test_ロケールとホストをエンドポイントに反映する(
        #[case] locale: &str,
        #[case] host: &str,
        #[case] expected: &str,
    ) {
        let transport = transport(MockHttpClient::new())
            .with_locale(locale)
            .with_host(host);
        assert_eq!(transport.endpoint(), expected);
    }

    // ===== ペイロード =====

    #[test]
    fn test_最小構成のペイロード() {
        let email = Email::builder()
            .from(mailbox("alice@example.com"))
            .to(mailbox("bob@example.com"))
            .subject("Hello")
            .text("Hi Bob")
            .build()
            .unwrap();

        assert_eq!(
            payload_json(&email),
            json!({
                "api_key": "KEY",
                "username": "USER",
                "message": {
                    "body": { "text": "Hi Bob" },
                    "subject": "Hello",
                    "from_email": "alice@example.com",
                    "recipients": [{ "email": "bob@example.com", "type": "to" }]
                }
            })
        );
    }

    #[test]
    fn test_宛先をto_cc_bccに分類し表示名を付与する() {
        let email = Email::builder()
            .from(mailbox("Alice <alice@example.com>"))
            .to(mailbox("Bob <bob@example.com>"))
            .cc(mailbox("carol@example.com"))
            .bcc(mailbox("Dave <dave@example.com>"))
            .subject("Hello")
            .html("<p>Hi</p>")
            .text("Hi")
            .build()
            .unwrap();

        let json = payload_json(&email);

        assert_eq!(json["message"]["from_name"], "Alice");
        assert_eq!(json["message"]["body"], json!({ "html": "<p>Hi</p>", "text": "Hi" }));
        assert_eq!(
            json["message"]["recipients"],
            json!([
                { "email": "bob@example.com", "type": "to", "name": "Bob" },
                { "email": "carol@example.com", "type": "cc" },
                { "email": "dave@example.com", "type": "bcc", "name": "Dave" }
            ])
        );
    }

    #[test]
    fn test_bccはccより優先して判定する() {
        let email = Email::builder()
            .from(mailbox("alice@example.com"))
            .cc(mailbox("bob@example.com"))
            .bcc(mailbox("BOB@example.com"))
            .text("Hi")
            .build()
            .unwrap();

        assert_eq!(
            RecipientType::classify(&mailbox("bob@example.com"), &email),
            RecipientType::Bcc
        );
    }

    #[test]
    fn test_明示したエンベロープの宛先はメッセージに無ければtoになる() {
        let email = Email::builder()
            .from(mailbox("alice@example.com"))
            .to(mailbox("bob@example.com"))
            .cc(mailbox("carol@example.com"))
            .text("Hi")
            .build()
            .unwrap();
        let envelope = Envelope::new(
            mailbox("Bounce <bounce@example.com>"),
            vec![mailbox("carol@example.com"), mailbox("archive@example.com")],
        )
        .unwrap();

        let payload = transport(MockHttpClient::new()).build_payload(&email, &envelope);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["message"]["from_email"], "bounce@example.com");
        assert_eq!(json["message"]["from_name"], "Bounce");
        assert_eq!(
            json["message"]["recipients"],
            json!([
                { "email": "carol@example.com", "type": "cc" },
                { "email": "archive@example.com", "type": "to" }
            ])
        );
    }

    #[test]
    fn test_添付ファイルとインライン画像を振り分ける() {
        let email = Email::builder()
            .from(mailbox("alice@example.com"))
            .to(mailbox("bob@example.com"))
            .html("<img src=\"cid:logo\">")
            .attach(Attachment::new(b"%PDF".to_vec(), "application/pdf").with_filename("invoice.pdf"))
            .attach(Attachment::inline(b"PNG".to_vec(), "image/png", "logo"))
            .attach(Attachment::new(b"a,b".to_vec(), "text/csv; name=\"report.csv\""))
            .build()
            .unwrap();

        let json = payload_json(&email);

        assert_eq!(
            json["message"]["attachments"],
            json!([
                { "type": "application/pdf", "name": "invoice.pdf", "content": "JVBERg==" },
                { "type": "text/csv", "name": "report.csv", "content": "YSxi" }
            ])
        );
        assert_eq!(
            json["message"]["images"],
            json!([{ "type": "image/png", "name": "logo", "content": "UE5H" }])
        );
    }

    #[test]
    fn test_名前を特定できない添付ファイルは空文字列の名前になる() {
        let email = Email::builder()
            .from(mailbox("alice@example.com"))
            .to(mailbox("bob@example.com"))
            .text("Hi")
            .attach(Attachment::new(b"x".to_vec(), "application/octet-stream"))
            .build()
            .unwrap();

        let json = payload_json(&email);

        assert_eq!(json["message"]["attachments"][0]["name"], "");
        assert!(json["message"].get("images").is_none());
    }

    #[test]
    fn test_構造化済みのヘッダーを除いてヘッダーを渡す() {
        let email = Email::builder()
            .from(mailbox("alice@example.com"))
            .reply_to(mailbox("support@example.com"))
            .to(mailbox("bob@example.com"))
            .cc(mailbox("carol@example.com"))
            .bcc(mailbox("dave@example.com"))
            .subject("Hello")
            .text("Hi")
            .header("X-Campaign", "spring")
            .header("content-type", "text/plain")
            .build()
            .unwrap();

        let json = payload_json(&email);

        assert_eq!(
            json["message"]["headers"],
            json!(["Reply-To: support@example.com", "X-Campaign: spring"])
        );
    }

    // ===== レスポンス解釈 =====

    #[test]
    fn test_成功レスポンスのjob_idを返す() {
        let response = HttpResponse::new(200, r#"{"status":"success","job_id":"X"}"#);
        assert_eq!(interpret_response(&response).unwrap(), "X");
    }

    #[test]
    fn test_数値のjob_idも受け付ける() {
        let response = HttpResponse::new(200, r#"{"job_id":12345}"#);
        assert_eq!(interpret_response(&response).unwrap(), "12345");
    }

    #[test]
    fn test_job_idのない成功レスポンスはエラー() {
        let response = HttpResponse::new(200, r#"{"status":"success"}"#);
        let err = interpret_response(&response).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unable to send an email: missing job_id in response."
        );
    }

    #[test]
    fn test_エラーレスポンスはメッセージとコードを埋め込む() {
        let response = HttpResponse::new(
            400,
            r#"{"status":"error","message":"Invalid API key","code":102}"#,
        );

        let err = interpret_response(&response).unwrap_err();

        assert_eq!(
            err.to_string(),
            "Unable to send an email: Invalid API key (code 102)."
        );
        match err.kind() {
            TransportErrorKind::Http { status, body, .. } => {
                assert_eq!(*status, 400);
                assert!(body.contains("Invalid API key"));
            }
            other => panic!("Http を期待したが {other:?} を受け取った"),
        }
    }

    #[rstest]
    #[case(401, r#"{"status":"error","message":"User not found"}"#, "Unable to send an email: User not found (code 401).")]
    #[case(500, r#"{"status":"error","message":"Internal","code":null}"#, "Unable to send an email: Internal (code 500).")]
    fn test_status_errorでコードがなければhttpステータスを使う(
        #[case] status: u16,
        #[case] body: &str,
        #[case] expected: &str,
    ) {
        let err = interpret_response(&HttpResponse::new(status, body)).unwrap_err();
        assert_eq!(err.to_string(), expected);
    }

    #[rstest]
    #[case(500, r#"{"code":"500"}"#, "Unable to send an email (code 500).")]
    #[case(403, r#"{"status":"fail","code":204}"#, "Unable to send an email (code 204).")]
    #[case(503, "Service Unavailable", "Unable to send an email (code 503).")]
    #[case(201, r#"{"job_id":"X"}"#, "Unable to send an email (code 201).")]
    fn test_status_errorでないエラーレスポンスはコードのみ(
        #[case] status: u16,
        #[case] body: &str,
        #[case] expected: &str,
    ) {
        let err = interpret_response(&HttpResponse::new(status, body)).unwrap_err();
        assert_eq!(err.to_string(), expected);
    }

    // ===== 送信 =====

    #[tokio::test]
    async fn test_送信成功でjob_idをメッセージidとして返す() {
        let client = MockHttpClient::new();
        client.push_response(HttpResponse::new(200, r#"{"status":"success","job_id":"1ZymBc"}"#));
        let transport = transport(client.clone()).with_locale("ru");

        let email = Email::builder()
            .from(mailbox("alice@example.com"))
            .to(mailbox("bob@example.com"))
            .subject("Hello")
            .text("Hi")
            .build()
            .unwrap();

        let sent = transport.send(&email, None).await.unwrap();

        assert_eq!(sent.message_id, "1ZymBc");
        assert_eq!(
            sent.transport,
            "unione+api://one.unisender.com/ru/transactional/api/v1/email/send.json"
        );

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].0,
            "https://one.unisender.com/ru/transactional/api/v1/email/send.json"
        );
        assert_eq!(requests[0].1["api_key"], "KEY");
        assert_eq!(requests[0].1["message"]["recipients"][0]["email"], "bob@example.com");
    }

    #[tokio::test]
    async fn test_送信失敗は一度だけ試行してエラーを返す() {
        let client = MockHttpClient::new();
        client.push_response(HttpResponse::new(
            401,
            r#"{"status":"error","message":"User not found","code":114}"#,
        ));
        client.push_response(HttpResponse::new(200, r#"{"job_id":"never"}"#));
        let transport = transport(client.clone());

        let email = Email::builder()
            .from(mailbox("alice@example.com"))
            .to(mailbox("bob@example.com"))
            .text("Hi")
            .build()
            .unwrap();

        let err = transport.send(&email, None).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "Unable to send an email: User not found (code 114)."
        );
        assert_eq!(client.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_通信エラーはそのまま返す() {
        let client = MockHttpClient::new();
        client.push_error("connection refused");
        let transport = transport(client);

        let email = Email::builder()
            .from(mailbox("alice@example.com"))
            .to(mailbox("bob@example.com"))
            .text("Hi")
            .build()
            .unwrap();

        let err = transport.send(&email, None).await.unwrap_err();

        assert!(matches!(err.kind(), TransportErrorKind::Network(_)));
    }
}
