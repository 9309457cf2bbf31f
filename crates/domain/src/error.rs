//! # ドメイン層エラー定義
//!
//! メールメッセージの構築時に発生するエラーを表現する。
//!
//! ## 設計方針
//!
//! - **型による分類**: エラーの種類を列挙型で明示し、パターンマッチで処理可能に
//! - **thiserror 活用**: `#[error(...)]` マクロでエラーメッセージを自動生成
//!
//! ## 使用例
//!
//! ```rust
//! use mailgate_domain::MailError;
//!
//! fn validate_subject(subject: &str) -> Result<(), MailError> {
//!     if subject.contains('\n') {
//!         return Err(MailError::Validation("件名に改行は使用できません".to_string()));
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// メールメッセージの構築で発生するエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MailError {
    /// バリデーションエラー
    ///
    /// 入力値がメッセージの制約に違反している場合に使用する。
    ///
    /// # 例
    ///
    /// - 不正な形式のメールアドレス
    /// - 送信元（From）が未指定
    /// - 本文（text / html）がどちらも未指定
    /// - エンベロープの宛先が空
    #[error("バリデーションエラー: {0}")]
    Validation(String),
}
