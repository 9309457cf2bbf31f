//! # メールメッセージ
//!
//! 送信対象となるメールメッセージのドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **構造化ヘッダー**: From / To / Cc / Bcc / Subject はフィールドとして保持し、
//!   [`Email::all_headers`] で送信時のヘッダー一覧に展開する
//! - **カスタムヘッダー**: それ以外のヘッダーは挿入順を保持する
//! - **MIME 非依存**: MIME エンコードは各トランスポートの責務とする

use derive_more::Display;

use crate::{MailError, address::Mailbox};

/// 添付ファイルの Content-Type 既定値
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// 添付ファイルの配置（Content-Disposition）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum Disposition {
    /// 通常の添付ファイル
    #[default]
    #[display("attachment")]
    Attachment,
    /// 本文に埋め込むインライン画像
    #[display("inline")]
    Inline,
}

/// 添付ファイル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// 添付ファイルの本体（デコード済みバイト列）
    pub body:         Vec<u8>,
    /// Content-Type（例: `application/pdf`、`image/png; name="logo.png"`）
    pub content_type: String,
    /// ファイル名
    pub filename:     Option<String>,
    /// 配置
    pub disposition:  Disposition,
    /// Content-ID（インライン画像の参照名）
    pub content_id:   Option<String>,
}

impl Attachment {
    /// 通常の添付ファイルを作成する
    pub fn new(body: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        Self {
            body:         body.into(),
            content_type: normalize_content_type(content_type.into()),
            filename:     None,
            disposition:  Disposition::Attachment,
            content_id:   None,
        }
    }

    /// インライン画像を作成する
    pub fn inline(
        body: impl Into<Vec<u8>>,
        content_type: impl Into<String>,
        content_id: impl Into<String>,
    ) -> Self {
        Self {
            body:         body.into(),
            content_type: normalize_content_type(content_type.into()),
            filename:     None,
            disposition:  Disposition::Inline,
            content_id:   Some(content_id.into()),
        }
    }

    /// ファイル名を設定する
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// インライン画像かどうか
    pub fn is_inline(&self) -> bool {
        self.disposition == Disposition::Inline
    }

    /// パラメータを除いた MIME タイプ（例: `image/png`）
    pub fn mime_type(&self) -> &str {
        self.content_type
            .split(';')
            .next()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .trim()
    }

    /// ファイル名を返す
    ///
    /// 明示的なファイル名がなければ Content-Type の `name=` パラメータを参照する。
    pub fn file_name(&self) -> Option<String> {
        if let Some(filename) = &self.filename {
            return Some(filename.clone());
        }

        self.content_type.split(';').skip(1).find_map(|param| {
            let (key, value) = param.split_once('=')?;
            if !key.trim().eq_ignore_ascii_case("name") {
                return None;
            }
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
            (!value.is_empty()).then(|| value.to_string())
        })
    }
}

fn normalize_content_type(content_type: String) -> String {
    if content_type.trim().is_empty() {
        DEFAULT_CONTENT_TYPE.to_string()
    } else {
        content_type
    }
}

/// メールヘッダー
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("{name}: {value}")]
pub struct Header {
    pub name:  String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name:  name.into(),
            value: value.into(),
        }
    }

    /// ヘッダー名が一致するか（大文字小文字を区別しない）
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// メールメッセージ
///
/// [`Email::builder`] で構築する。送信元と本文（text / html のいずれか）は必須。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Email {
    pub from:        Vec<Mailbox>,
    pub sender:      Option<Mailbox>,
    pub reply_to:    Vec<Mailbox>,
    pub to:          Vec<Mailbox>,
    pub cc:          Vec<Mailbox>,
    pub bcc:         Vec<Mailbox>,
    pub subject:     String,
    pub text_body:   Option<String>,
    pub html_body:   Option<String>,
    /// カスタムヘッダー（挿入順）
    pub headers:     Vec<Header>,
    pub attachments: Vec<Attachment>,
}

impl Email {
    /// ビルダーを作成する
    pub fn builder() -> EmailBuilder {
        EmailBuilder::default()
    }

    /// 送信時のヘッダー一覧を返す
    ///
    /// 構造化フィールド（From, Sender, Reply-To, To, Cc, Bcc, Subject）を先頭に、
    /// カスタムヘッダーを挿入順に続ける。
    pub fn all_headers(&self) -> Vec<Header> {
        let mut headers = vec![Header::new("From", join_mailboxes(&self.from))];

        if let Some(sender) = &self.sender {
            headers.push(Header::new("Sender", sender.to_string()));
        }

        for (name, mailboxes) in [
            ("Reply-To", &self.reply_to),
            ("To", &self.to),
            ("Cc", &self.cc),
            ("Bcc", &self.bcc),
        ] {
            if !mailboxes.is_empty() {
                headers.push(Header::new(name, join_mailboxes(mailboxes)));
            }
        }

        headers.push(Header::new("Subject", self.subject.clone()));
        headers.extend(self.headers.iter().cloned());
        headers
    }
}

fn join_mailboxes(mailboxes: &[Mailbox]) -> String {
    mailboxes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// [`Email`] のビルダー
#[derive(Debug, Default)]
pub struct EmailBuilder {
    email: Email,
}

impl EmailBuilder {
    pub fn from(mut self, mailbox: impl Into<Mailbox>) -> Self {
        self.email.from.push(mailbox.into());
        self
    }

    pub fn sender(mut self, mailbox: impl Into<Mailbox>) -> Self {
        self.email.sender = Some(mailbox.into());
        self
    }

    pub fn reply_to(mut self, mailbox: impl Into<Mailbox>) -> Self {
        self.email.reply_to.push(mailbox.into());
        self
    }

    pub fn to(mut self, mailbox: impl Into<Mailbox>) -> Self {
        self.email.to.push(mailbox.into());
        self
    }

    pub fn cc(mut self, mailbox: impl Into<Mailbox>) -> Self {
        self.email.cc.push(mailbox.into());
        self
    }

    pub fn bcc(mut self, mailbox: impl Into<Mailbox>) -> Self {
        self.email.bcc.push(mailbox.into());
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.email.subject = subject.into();
        self
    }

    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.email.text_body = Some(body.into());
        self
    }

    pub fn html(mut self, body: impl Into<String>) -> Self {
        self.email.html_body = Some(body.into());
        self
    }

    /// カスタムヘッダーを追加する
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.email.headers.push(Header::new(name, value));
        self
    }

    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.email.attachments.push(attachment);
        self
    }

    /// メッセージを構築する
    ///
    /// # エラー
    ///
    /// - 送信元（From）が未指定
    /// - 本文（text / html）がどちらも未指定
    /// - 件名、表示名、ヘッダー名またはヘッダー値に改行が含まれる
    /// - ヘッダー名が空
    pub fn build(self) -> Result<Email, MailError> {
        let email = self.email;

        if email.from.is_empty() {
            return Err(MailError::Validation("送信元（From）は必須です".to_string()));
        }

        if email.text_body.is_none() && email.html_body.is_none() {
            return Err(MailError::Validation(
                "本文（text または html）は必須です".to_string(),
            ));
        }

        if contains_line_break(&email.subject) {
            return Err(MailError::Validation(
                "件名に改行は使用できません".to_string(),
            ));
        }

        if let Some(mailbox) = email
            .from
            .iter()
            .chain(&email.sender)
            .chain(&email.reply_to)
            .chain(&email.to)
            .chain(&email.cc)
            .chain(&email.bcc)
            .find(|m| contains_line_break(&m.name))
        {
            return Err(MailError::Validation(format!(
                "表示名に改行は使用できません: {}",
                mailbox.address
            )));
        }

        if let Some(header) = email
            .headers
            .iter()
            .find(|h| {
                h.name.trim().is_empty()
                    || contains_line_break(&h.name)
                    || contains_line_break(&h.value)
            })
        {
            return Err(MailError::Validation(format!(
                "ヘッダーの形式が不正です: {:?}",
                header.name
            )));
        }

        Ok(email)
    }
}

fn contains_line_break(value: &str) -> bool {
    value.contains(['\r', '\n'])
}
