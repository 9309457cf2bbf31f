//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! - 各ハンドラはサブモジュールに配置し、ここで re-export する
//! - ハンドラは薄く保ち、送信処理はトランスポートに委譲する

pub mod health;
pub mod mail;

pub use health::health_check;
pub use mail::{MailState, send_mail};
