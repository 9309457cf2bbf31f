//! # メールアドレス
//!
//! メールアドレスと表示名付きメールボックスの値オブジェクトを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 例 |
//! |---|------------|----|
//! | [`Address`] | メールアドレス | `alice@example.com` |
//! | [`Mailbox`] | メールボックス（表示名 + アドレス） | `Alice <alice@example.com>` |

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::MailError;

/// アドレスの最大長
const MAX_ADDRESS_LENGTH: usize = 255;

/// メールアドレス（値オブジェクト）
///
/// 生成時にバリデーションを実行し、不正な値の作成を防ぐ。
/// シリアライズ時は単純な文字列として扱う。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// メールアドレスを作成する
    ///
    /// # バリデーション
    ///
    /// - 空文字列ではない
    /// - `local@domain` の形式（`@` はちょうど 1 つ、両側が空でない）
    /// - 空白文字を含まない
    /// - 最大 255 文字
    pub fn new(value: impl Into<String>) -> Result<Self, MailError> {
        let value = value.into();

        if value.is_empty() {
            return Err(MailError::Validation(
                "メールアドレスは必須です".to_string(),
            ));
        }

        if value.len() > MAX_ADDRESS_LENGTH {
            return Err(MailError::Validation(format!(
                "メールアドレスは{MAX_ADDRESS_LENGTH}文字以内である必要があります"
            )));
        }

        let Some((local, domain)) = value.split_once('@') else {
            return Err(MailError::Validation(format!(
                "メールアドレスの形式が不正です: {value}"
            )));
        };

        if local.is_empty()
            || domain.is_empty()
            || domain.contains('@')
            || value.chars().any(char::is_whitespace)
        {
            return Err(MailError::Validation(format!(
                "メールアドレスの形式が不正です: {value}"
            )));
        }

        Ok(Self(value))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 大文字小文字を区別せずに比較する
    ///
    /// 宛先種別（to / cc / bcc）の判定に使用する。
    pub fn eq_ignore_case(&self, other: &Address) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = MailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.trim())
    }
}

impl TryFrom<String> for Address {
    type Error = MailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

/// メールボックス
///
/// アドレスと表示名の組。表示名は空文字列を許容し、
/// 空の場合はペイロードから省略される。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mailbox {
    pub address: Address,
    pub name:    String,
}

impl Mailbox {
    /// 表示名なしのメールボックスを作成する
    pub fn new(address: Address) -> Self {
        Self {
            address,
            name: String::new(),
        }
    }

    /// 表示名付きのメールボックスを作成する
    pub fn with_name(address: Address, name: impl Into<String>) -> Self {
        Self {
            address,
            name: name.into(),
        }
    }

    /// 表示名を持つかどうか
    pub fn has_name(&self) -> bool {
        !self.name.is_empty()
    }
}

impl From<Address> for Mailbox {
    fn from(address: Address) -> Self {
        Self::new(address)
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_name() {
            write!(f, "{} <{}>", self.name, self.address)
        } else {
            write!(f, "{}", self.address)
        }
    }
}

/// `alice@example.com` と `Alice <alice@example.com>` の両形式を受け付ける
impl FromStr for Mailbox {
    type Err = MailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        let Some(open) = s.rfind('<') else {
            return Ok(Self::new(s.parse()?));
        };

        let Some(inner) = s[open + 1..].strip_suffix('>') else {
            return Err(MailError::Validation(format!(
                "メールボックスの形式が不正です: {s}"
            )));
        };

        let name = s[..open].trim().trim_matches('"').trim();
        if name.contains(['\r', '\n']) {
            return Err(MailError::Validation(format!(
                "表示名に改行は使用できません: {name:?}"
            )));
        }
        Ok(Self::with_name(inner.parse()?, name))
    }
}

impl Serialize for Mailbox {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Mailbox {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
