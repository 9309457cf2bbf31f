//! # Mail Service 設定
//!
//! 環境変数から Mail Service サーバーの設定を読み込む。

use std::{env, time::Duration};

use thiserror::Error;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 13010;
const DEFAULT_DSN: &str = "null://null";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// 設定読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} の値が不正です: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

/// Mail Service サーバーの設定
#[derive(Clone)]
pub struct MailServiceConfig {
    /// バインドアドレス
    pub host:         String,
    /// ポート番号
    pub port:         u16,
    /// メールトランスポートの DSN（認証情報を含む）
    pub mailer_dsn:   String,
    /// API トランスポートの HTTP タイムアウト
    pub http_timeout: Duration,
}

impl MailServiceConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            host:         lookup("MAIL_SERVICE_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port:         parse_or(&lookup, "MAIL_SERVICE_PORT", DEFAULT_PORT)?,
            mailer_dsn:   lookup("MAILER_DSN").unwrap_or_else(|| DEFAULT_DSN.to_string()),
            http_timeout: Duration::from_secs(parse_or(
                &lookup,
                "MAILER_HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?),
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
    }
}

/// DSN は API キーを含むため出力しない
impl std::fmt::Debug for MailServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailServiceConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("mailer_dsn", &"***")
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}
