//! # ヘルスチェックハンドラ
//!
//! ```text
//! GET /health
//! ```
//!
//! ```json
//! { "status": "healthy", "version": "0.1.0", "transport": "null://" }
//! ```

use std::sync::Arc;

use axum::{Json, extract::State};
use mailgate_shared::HealthResponse;

use super::MailState;

/// ヘルスチェックエンドポイント
///
/// 設定されているトランスポートの表示名も返す。認証情報は含まない。
pub async fn health_check(State(state): State<Arc<MailState>>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(
        env!("CARGO_PKG_VERSION"),
        state.transport.name(),
    ))
}
