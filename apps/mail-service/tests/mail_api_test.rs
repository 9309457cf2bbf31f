//! # Mail Service ルーターのテスト
//!
//! モックトランスポートを使い、リクエストの変換とエラーレスポンスを検証する。

use std::sync::Arc;

use axum::{Router, body::Body};
use http::{Request, StatusCode, header::CONTENT_TYPE};
use mailgate_domain::Disposition;
use mailgate_infra::mock::MockMailTransport;
use mailgate_mail_service::{app, handler::MailState};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};
use tower::ServiceExt;

fn test_app(transport: MockMailTransport) -> Router {
    app(Arc::new(MailState {
        transport: Arc::new(transport),
    }))
}

fn send_request(body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/internal/mail/send")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_ヘルスチェックはトランスポート名を返す() {
    let response = test_app(MockMailTransport::new())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["transport"], "mock://");
}

#[tokio::test]
async fn test_リクエストをメールに変換して送信する() {
    let transport = MockMailTransport::new();
    let app = test_app(transport.clone());

    let response = app
        .oneshot(send_request(&json!({
            "from": "Alice <alice@example.com>",
            "to": ["bob@example.com"],
            "cc": ["carol@example.com"],
            "bcc": ["dave@example.com"],
            "subject": "Report",
            "text": "See attached.",
            "html": "<p>See attached.<img src=\"cid:logo\"></p>",
            "headers": [
                { "name": "X-Campaign", "value": "autumn" },
                { "name": "List-Unsubscribe", "value": "<mailto:unsub@example.com>" },
                { "name": "Auto-Submitted", "value": "auto-generated" }
            ],
            "attachments": [
                { "content": "JVBERi0=", "content_type": "application/pdf", "filename": "report.pdf" },
                { "content": "iVBORw==", "content_type": "image/png", "inline": true, "content_id": "logo" }
            ]
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(
        body,
        json!({ "data": { "message_id": "mock-1", "transport": "mock://" } })
    );

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    let (email, envelope) = &sent[0];
    assert_eq!(email.from[0].name, "Alice");
    assert_eq!(email.subject, "Report");
    let headers: Vec<String> = email.headers.iter().map(ToString::to_string).collect();
    assert_eq!(
        headers,
        vec![
            "X-Campaign: autumn",
            "List-Unsubscribe: <mailto:unsub@example.com>",
            "Auto-Submitted: auto-generated",
        ]
    );
    assert_eq!(email.attachments[0].body, b"%PDF-".to_vec());
    assert_eq!(email.attachments[1].disposition, Disposition::Inline);
    assert_eq!(envelope.recipients().len(), 3);
}

#[rstest]
#[case::本文なし(json!({ "from": "alice@example.com", "to": ["bob@example.com"] }))]
#[case::宛先なし(json!({ "from": "alice@example.com", "text": "Hi" }))]
#[case::不正なアドレス(json!({ "from": "alice", "to": ["bob@example.com"], "text": "Hi" }))]
#[case::不正なbase64(json!({
    "from": "alice@example.com",
    "to": ["bob@example.com"],
    "text": "Hi",
    "attachments": [{ "content": "***", "content_type": "text/plain" }]
}))]
#[case::content_idのないインライン画像(json!({
    "from": "alice@example.com",
    "to": ["bob@example.com"],
    "text": "Hi",
    "attachments": [{ "content": "iVBORw==", "content_type": "image/png", "inline": true }]
}))]
#[case::改行を含む表示名(json!({
    "from": "alice@example.com",
    "to": ["bob@example.com"],
    "reply_to": ["Eve\r\nX-Injected: 1 <eve@example.com>"],
    "text": "Hi"
}))]
#[case::空のヘッダー名(json!({
    "from": "alice@example.com",
    "to": ["bob@example.com"],
    "text": "Hi",
    "headers": [{ "name": "", "value": "x" }]
}))]
#[tokio::test]
async fn test_不正なリクエストは400を返し送信しない(#[case] request: Value) {
    let transport = MockMailTransport::new();

    let response = test_app(transport.clone())
        .oneshot(send_request(&request))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["status"], 400);
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn test_プロバイダが拒否した場合は502でメッセージを返す() {
    let transport =
        MockMailTransport::failing(401, "Unable to send an email: User not found (code 114).");

    let response = test_app(transport)
        .oneshot(send_request(&json!({
            "from": "alice@example.com",
            "to": ["bob@example.com"],
            "text": "Hi"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert_eq!(
        body["type"],
        "https://mailgate.example.com/errors/mail-delivery-failed"
    );
    assert_eq!(
        body["detail"],
        "Unable to send an email: User not found (code 114)."
    );
}

#[tokio::test]
async fn test_通信エラーは500で詳細を返さない() {
    let transport = MockMailTransport::unreachable("connect to 10.0.0.1:443 refused");

    let response = test_app(transport)
        .oneshot(send_request(&json!({
            "from": "alice@example.com",
            "to": ["bob@example.com"],
            "text": "Hi"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["type"], "https://mailgate.example.com/errors/internal-error");
    assert_eq!(body["detail"], "内部エラーが発生しました");
    assert!(!body.to_string().contains("10.0.0.1"));
}
