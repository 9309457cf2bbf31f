//! # mailgate-infra
//!
//! メール送信のインフラストラクチャ層。
//!
//! ## モジュール構成
//!
//! - [`transport`]: メールトランスポート（UniOne API / SMTP / Null）
//! - [`dsn`]: `MAILER_DSN` の解析
//! - [`error`]: トランスポートエラー
//! - `mock`: テスト用モック（`test-utils` feature）

pub mod dsn;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod transport;

pub use dsn::Dsn;
pub use error::{TransportError, TransportErrorKind};
pub use transport::{MailTransport, create_transport};
