//! # ヘルスチェック共通型

use serde::{Deserialize, Serialize};

/// ヘルスチェックレスポンス
///
/// `status` はサービスの稼働状態、`version` は Cargo.toml のバージョン、
/// `transport` は設定されているメールトランスポートの表示名を示す。
///
/// ## 使用例
///
/// ```
/// use mailgate_shared::HealthResponse;
///
/// let response = HealthResponse::healthy("0.1.0", "null://");
/// assert_eq!(response.status, "healthy");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// 稼働状態（`"healthy"` または `"unhealthy"`）
    pub status:    String,
    /// アプリケーションバージョン
    pub version:   String,
    /// メールトランスポート（API キー等の認証情報は含まない）
    pub transport: String,
}

impl HealthResponse {
    pub fn healthy(version: impl Into<String>, transport: impl Into<String>) -> Self {
        Self {
            status:    "healthy".to_string(),
            version:   version.into(),
            transport: transport.into(),
        }
    }
}
