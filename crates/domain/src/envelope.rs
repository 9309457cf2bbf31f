//! # エンベロープ
//!
//! 送信時の正式な送信者と宛先集合を表現する。
//! メッセージの見た目上のヘッダー（To / Cc）とは独立しており、
//! Bcc 宛先もここに含まれる。

use crate::{
    MailError,
    address::Mailbox,
    message::Email,
};

/// エンベロープ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    sender:     Mailbox,
    recipients: Vec<Mailbox>,
}

impl Envelope {
    /// エンベロープを作成する
    ///
    /// 宛先が空の場合は `MailError::Validation` を返す。
    pub fn new(sender: Mailbox, recipients: Vec<Mailbox>) -> Result<Self, MailError> {
        if recipients.is_empty() {
            return Err(MailError::Validation(
                "エンベロープには少なくとも 1 件の宛先が必要です".to_string(),
            ));
        }

        Ok(Self { sender, recipients })
    }

    /// メッセージからエンベロープを導出する
    ///
    /// - 送信者: `sender` があればそれ、なければ最初の `from`
    /// - 宛先: `to` → `cc` → `bcc` の順。同一アドレスは最初の出現のみ残す
    pub fn from_email(email: &Email) -> Result<Self, MailError> {
        let sender = email
            .sender
            .as_ref()
            .or_else(|| email.from.first())
            .cloned()
            .ok_or_else(|| MailError::Validation("送信者を特定できません".to_string()))?;

        let mut recipients: Vec<Mailbox> = Vec::new();
        for mailbox in email.to.iter().chain(&email.cc).chain(&email.bcc) {
            if !recipients
                .iter()
                .any(|existing| existing.address.eq_ignore_case(&mailbox.address))
            {
                recipients.push(mailbox.clone());
            }
        }

        Self::new(sender, recipients)
    }

    pub fn sender(&self) -> &Mailbox {
        &self.sender
    }

    pub fn recipients(&self) -> &[Mailbox] {
        &self.recipients
    }
}

/// 送信済みメッセージ
///
/// 送信成功時にトランスポートが返す結果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// メッセージ ID（UniOne の場合は job_id）
    pub message_id: String,
    /// 実際に使用したエンベロープ
    pub envelope:   Envelope,
    /// 送信に使用したトランスポートの表示名
    pub transport:  String,
}
