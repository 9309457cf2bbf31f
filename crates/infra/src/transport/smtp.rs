//! SMTP トランスポート
//!
//! lettre の `AsyncSmtpTransport` を使用してメールを送信する。
//! 開発環境では Mailpit（ローカル SMTP サーバー）に接続する。
//!
//! Bcc はヘッダーに出さず、エンベロープの宛先としてのみ渡す。

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport,
    AsyncTransport,
    Message,
    Tokio1Executor,
    message::{
        Attachment as LettreAttachment,
        Mailbox as LettreMailbox,
        MultiPart,
        MultiPartBuilder,
        SinglePart,
        header::{ContentType, HeaderName, HeaderValue},
    },
    transport::smtp::authentication::Credentials,
};
use mailgate_domain::{Attachment, Email, Envelope, Mailbox, SentMessage};
use uuid::Uuid;

use super::MailTransport;
use crate::error::TransportError;

/// lettre のビルダーが自動で設定するため、カスタムヘッダーとして渡さないもの
const MANAGED_HEADERS: [&str; 10] = [
    "from",
    "sender",
    "reply-to",
    "to",
    "cc",
    "bcc",
    "subject",
    "content-type",
    "mime-version",
    "message-id",
];

/// SMTP トランスポート
///
/// `lettre::AsyncSmtpTransport<Tokio1Executor>` をラップする。
/// Mailpit（開発）や SMTP リレーで使用する。
pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    host:      String,
    port:      u16,
}

impl SmtpTransport {
    /// 新しい SMTP トランスポートを作成する
    ///
    /// # 引数
    ///
    /// - `host`: SMTP サーバーのホスト名（例: "localhost"）
    /// - `port`: SMTP サーバーのポート番号（例: 1025 for Mailpit）
    /// - `credentials`: 認証情報（ユーザー名, パスワード）。不要なら `None`
    pub fn new(host: &str, port: u16, credentials: Option<(String, String)>) -> Self {
        // builder_dangerous: TLS なしで接続（Mailpit 等のローカル SMTP 向け）
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port);
        if let Some((user, password)) = credentials {
            builder = builder.credentials(Credentials::new(user, password));
        }

        Self {
            transport: builder.build(),
            host: host.to_string(),
            port,
        }
    }
}

/// 本文パート（単一パートまたはマルチパート）
enum Content {
    Single(SinglePart),
    Multi(MultiPart),
}

impl Content {
    fn wrap(self, parent: MultiPartBuilder) -> MultiPart {
        match self {
            Self::Single(part) => parent.singlepart(part),
            Self::Multi(part) => parent.multipart(part),
        }
    }
}

fn to_lettre_mailbox(mailbox: &Mailbox) -> Result<LettreMailbox, TransportError> {
    let address = mailbox
        .address
        .as_str()
        .parse()
        .map_err(|e| TransportError::smtp(format!("アドレス不正 {}: {e}", mailbox.address)))?;
    let name = mailbox.has_name().then(|| mailbox.name.clone());
    Ok(LettreMailbox::new(name, address))
}

fn to_lettre_part(attachment: &Attachment) -> Result<SinglePart, TransportError> {
    let content_type = ContentType::parse(&attachment.content_type).map_err(|e| {
        TransportError::smtp(format!("Content-Type 不正 {}: {e}", attachment.content_type))
    })?;
    let body = attachment.body.clone();

    let part = match (&attachment.content_id, attachment.is_inline()) {
        (Some(content_id), true) => {
            LettreAttachment::new_inline(content_id.clone()).body(body, content_type)
        }
        _ => LettreAttachment::new(attachment.file_name().unwrap_or_default())
            .body(body, content_type),
    };
    Ok(part)
}

/// [`Email`] を lettre の [`Message`] に変換する
///
/// multipart/mixed（添付） > multipart/related（インライン画像）> multipart/alternative（本文）
/// の順に必要な分だけ入れ子にする。
pub(crate) fn build_message(
    email: &Email,
    envelope: &Envelope,
    message_id: &str,
) -> Result<Message, TransportError> {
    let mut builder = Message::builder()
        .subject(&email.subject)
        .message_id(Some(format!("<{message_id}@{}>", sender_domain(envelope))));

    for mailbox in &email.from {
        builder = builder.from(to_lettre_mailbox(mailbox)?);
    }
    if let Some(sender) = &email.sender {
        builder = builder.sender(to_lettre_mailbox(sender)?);
    }
    for mailbox in &email.reply_to {
        builder = builder.reply_to(to_lettre_mailbox(mailbox)?);
    }
    for mailbox in &email.to {
        builder = builder.to(to_lettre_mailbox(mailbox)?);
    }
    for mailbox in &email.cc {
        builder = builder.cc(to_lettre_mailbox(mailbox)?);
    }

    for header in email
        .headers
        .iter()
        .filter(|h| !MANAGED_HEADERS.iter().any(|name| h.is(name)))
    {
        let name = HeaderName::new_from_ascii(header.name.clone())
            .map_err(|e| TransportError::smtp(format!("ヘッダー名不正 {}: {e}", header.name)))?;
        builder = builder.raw_header(HeaderValue::new(name, header.value.clone()));
    }

    let lettre_envelope = lettre::address::Envelope::new(
        Some(to_lettre_mailbox(envelope.sender())?.email),
        envelope
            .recipients()
            .iter()
            .map(|m| to_lettre_mailbox(m).map(|m| m.email))
            .collect::<Result<Vec<_>, _>>()?,
    )
    .map_err(|e| TransportError::smtp(format!("エンベロープ構築失敗: {e}")))?;
    builder = builder.envelope(lettre_envelope);

    let mut content = match (&email.text_body, &email.html_body) {
        (Some(text), Some(html)) => {
            Content::Multi(MultiPart::alternative_plain_html(text.clone(), html.clone()))
        }
        (None, Some(html)) => Content::Single(SinglePart::html(html.clone())),
        (text, None) => Content::Single(SinglePart::plain(text.clone().unwrap_or_default())),
    };

    let (inlines, attachments): (Vec<_>, Vec<_>) =
        email.attachments.iter().partition(|a| a.is_inline());

    if !inlines.is_empty() {
        let mut related = content.wrap(MultiPart::related());
        for attachment in inlines {
            related = related.singlepart(to_lettre_part(attachment)?);
        }
        content = Content::Multi(related);
    }

    if !attachments.is_empty() {
        let mut mixed = content.wrap(MultiPart::mixed());
        for attachment in attachments {
            mixed = mixed.singlepart(to_lettre_part(attachment)?);
        }
        content = Content::Multi(mixed);
    }

    let message = match content {
        Content::Single(part) => builder.singlepart(part),
        Content::Multi(part) => builder.multipart(part),
    };

    message.map_err(|e| TransportError::smtp(format!("メッセージ構築失敗: {e}")))
}

fn sender_domain(envelope: &Envelope) -> &str {
    envelope
        .sender()
        .address
        .as_str()
        .rsplit_once('@')
        .map_or("localhost", |(_, domain)| domain)
}

#[async_trait]
impl MailTransport for SmtpTransport {
    fn name(&self) -> String {
        format!("smtp://{}:{}", self.host, self.port)
    }

    async fn send_with_envelope(
        &self,
        email: &Email,
        envelope: &Envelope,
    ) -> Result<SentMessage, TransportError> {
        let message_id = Uuid::now_v7().to_string();
        let message = build_message(email, envelope, &message_id)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| TransportError::smtp(format!("SMTP 送信失敗: {e}")))?;

        Ok(SentMessage {
            message_id,
            envelope: envelope.clone(),
            transport: self.name(),
        })
    }
}
