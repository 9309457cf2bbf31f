//! # Mailgate ドメイン層
//!
//! メール送信の対象となるメッセージモデルを定義する。
//!
//! ## 設計方針
//!
//! このクレートはトランスポート（UniOne API、SMTP など）に依存しない
//! 純粋なデータモデルのみを提供する。MIME エンコードや HTTP 通信は
//! インフラ層の責務とする。
//!
//! ## 依存関係の方向
//!
//! ```text
//! mail-service → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`address`] - メールアドレスとメールボックス
//! - [`message`] - メールメッセージ、ヘッダー、添付ファイル
//! - [`envelope`] - エンベロープと送信結果
//! - [`error`] - ドメイン層エラー
//!
//! ## 使用例
//!
//! ```rust
//! use mailgate_domain::{Email, Envelope, Mailbox};
//!
//! let from: Mailbox = "Alice <alice@example.com>".parse().unwrap();
//! let to: Mailbox = "bob@example.com".parse().unwrap();
//!
//! let email = Email::builder()
//!     .from(from)
//!     .to(to)
//!     .subject("こんにちは")
//!     .text("本文")
//!     .build()
//!     .unwrap();
//!
//! let envelope = Envelope::from_email(&email).unwrap();
//! assert_eq!(envelope.recipients().len(), 1);
//! ```

pub mod address;
pub mod envelope;
pub mod error;
pub mod message;

pub use address::{Address, Mailbox};
pub use envelope::{Envelope, SentMessage};
pub use error::MailError;
pub use message::{Attachment, Disposition, Email, EmailBuilder, Header};
