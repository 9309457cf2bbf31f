//! # Mail Service ライブラリ
//!
//! ルーターとハンドラを公開する。結合テストから利用する。

pub mod config;
pub mod error;
pub mod handler;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use handler::{MailState, health_check, send_mail};
use tower_http::trace::TraceLayer;

/// ルーターを構築する
pub fn app(state: Arc<MailState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/internal/mail/send", post(send_mail))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
