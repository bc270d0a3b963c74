//! # POST /upload
//!
//! 受け付ける形式:
//! - `multipart/form-data`: `type=file` と `file` パート（`type=url` と `url` も可）
//! - `application/x-www-form-urlencoded`: `type=url` と `url`
//!
//! 取り込みパイプラインでキーとコンテンツを決定し、ストレージに1回だけPUTする。

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::{Form, Json};
use emptybox_types::SaveResponse;

use crate::config::GatewayState;
use crate::error::GatewayError;
use crate::ingest::UploadForm;
use crate::storage::PublishError;

/// POST /upload: アップロード内容をストレージに保存し、生成したキーを返す。
pub async fn handle_upload(
    State(state): State<Arc<GatewayState>>,
    request: Request,
) -> Result<Json<SaveResponse>, GatewayError> {
    let result = upload(&state, request).await;

    match &result {
        Err(GatewayError::Publish(PublishError::Rejected { status, body })) => {
            tracing::info!(status, body = %body, "ストレージが保存を拒否しました");
        }
        Err(e @ GatewayError::Publish(_)) => tracing::info!(error = %e, "保存に失敗"),
        Err(e) => tracing::debug!(error = %e, "アップロードを受け付けませんでした"),
        Ok(_) => {}
    }

    result
}

async fn upload(
    state: &Arc<GatewayState>,
    request: Request,
) -> Result<Json<SaveResponse>, GatewayError> {
    let form = read_form(state, request).await?;

    let (key, resolved) = state.pipeline.prepare(form).await?;
    let bytes = resolved.content.len();

    let receipt = state.store.put(&key, resolved.content).await?;

    tracing::info!(
        key = %receipt.key,
        bytes,
        format = ?resolved.declared_format,
        "保存しました"
    );

    Ok(Json(SaveResponse::saved(receipt.key.into_string())))
}

/// Content-Typeに応じてmultipartまたはURLエンコードのフォームを読む。
async fn read_form(
    state: &Arc<GatewayState>,
    request: Request,
) -> Result<UploadForm, GatewayError> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));

    if is_multipart {
        let multipart = Multipart::from_request(request, state)
            .await
            .map_err(|e| rejection_error(e.status(), e.body_text()))?;
        UploadForm::from_multipart(multipart).await
    } else {
        let Form(fields) = Form::<HashMap<String, String>>::from_request(request, state)
            .await
            .map_err(|e| rejection_error(e.status(), e.body_text()))?;
        Ok(UploadForm::from_fields(fields))
    }
}

/// ボディ上限超過は413、それ以外は不正なリクエストとして扱う。
fn rejection_error(status: StatusCode, body_text: String) -> GatewayError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        GatewayError::PayloadTooLarge(body_text)
    } else {
        GatewayError::InvalidRequest(body_text)
    }
}

#[cfg(test)]
mod tests {
    use crate::ingest::KeyStrategy;
    use crate::test_helpers::{spawn_app, spawn_app_with_limit, start_mock_server, MemoryStore};
    use axum::http::{header, StatusCode};
    use axum::routing::get;
    use reqwest::multipart;
    use std::sync::Arc;

    fn file_form(kind: &str, name: &str, content: Vec<u8>) -> multipart::Form {
        multipart::Form::new()
            .text("type", kind.to_string())
            .part("file", multipart::Part::bytes(content).file_name(name.to_string()))
    }

    /// report.pdf のアップロードで .pdf のキーが返り、元のサイズで保存される
    #[tokio::test]
    async fn test_upload_file_end_to_end() {
        let store = Arc::new(MemoryStore::default());
        let base = spawn_app(store.clone(), KeyStrategy::FilenameHint).await;
        let content = vec![42u8; 5000];

        let response = reqwest::Client::new()
            .post(format!("{base}/upload"))
            .multipart(file_form("file", "report.pdf", content.clone()))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["msg"], "Saved");
        let filename = body["filename"].as_str().unwrap().to_string();
        assert!(filename.ends_with(".pdf"), "unexpected key: {filename}");

        let puts = store.puts();
        assert_eq!(puts.len(), 1);
        assert_eq!(puts[0].0, filename);
        assert_eq!(puts[0].1, content.len() as u64);
    }

    /// Content-Dispositionのファイル名から拡張子を引き継ぐ
    #[tokio::test]
    async fn test_upload_url_end_to_end() {
        let origin = axum::Router::new().route(
            "/photo",
            get(|| async {
                (
                    [(header::CONTENT_DISPOSITION, r#"attachment; filename="x.jpg""#)],
                    vec![0xFFu8, 0xD8, 0xFF, 0xE0, 0, 0x10],
                )
            }),
        );
        let origin_port = start_mock_server(origin).await;

        let store = Arc::new(MemoryStore::default());
        let base = spawn_app(store.clone(), KeyStrategy::FilenameHint).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/upload"))
            .form(&[
                ("type", "url".to_string()),
                ("url", format!("http://127.0.0.1:{origin_port}/photo")),
            ])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body["filename"].as_str().unwrap().ends_with(".jpg"));
        assert_eq!(store.puts()[0].1, 6);
    }

    #[tokio::test]
    async fn test_upload_file_without_part() {
        let store = Arc::new(MemoryStore::default());
        let base = spawn_app(store.clone(), KeyStrategy::FilenameHint).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/upload"))
            .multipart(multipart::Form::new().text("type", "file"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["msg"], "Invalid Request");
        assert!(store.puts().is_empty());
    }

    #[tokio::test]
    async fn test_upload_unknown_or_missing_type() {
        let store = Arc::new(MemoryStore::default());
        let base = spawn_app(store.clone(), KeyStrategy::FilenameHint).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{base}/upload"))
            .multipart(file_form("torrent", "a.png", b"png".to_vec()))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = client
            .post(format!("{base}/upload"))
            .form(&[("url", "http://example.com/a.png")])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        assert!(store.puts().is_empty());
    }

    #[tokio::test]
    async fn test_upload_url_unreachable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead_port = listener.local_addr().unwrap().port();
        drop(listener);

        let store = Arc::new(MemoryStore::default());
        let base = spawn_app(store.clone(), KeyStrategy::FilenameHint).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/upload"))
            .form(&[
                ("type", "url".to_string()),
                ("url", format!("http://127.0.0.1:{dead_port}/file")),
            ])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(store.puts().is_empty());
    }

    /// ストレージの拒否はステータスとボディをそのまま返す
    #[tokio::test]
    async fn test_upload_publish_rejected() {
        let store = Arc::new(MemoryStore::rejecting(
            403,
            "<Error><Code>AccessDenied</Code></Error>",
        ));
        let base = spawn_app(store, KeyStrategy::FilenameHint).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/upload"))
            .multipart(file_form("file", "a.txt", b"hello".to_vec()))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            response.text().await.unwrap(),
            "<Error><Code>AccessDenied</Code></Error>"
        );
    }

    /// 判定有効時は形式から拡張子を決め、判定できなければ400
    #[tokio::test]
    async fn test_upload_sniffed() {
        let store = Arc::new(MemoryStore::default());
        let base = spawn_app(store.clone(), KeyStrategy::Sniffed).await;
        let client = reqwest::Client::new();

        let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR".to_vec();
        let response = client
            .post(format!("{base}/upload"))
            .multipart(file_form("file", "image.txt", png.clone()))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body["filename"].as_str().unwrap().ends_with(".png"));
        assert_eq!(store.puts()[0].1, png.len() as u64);

        let response = client
            .post(format!("{base}/upload"))
            .multipart(file_form("file", "image.png", b"plain text".to_vec()))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["msg"], "Unrecognized Format");
    }

    #[tokio::test]
    async fn test_stats_and_index() {
        let store = Arc::new(MemoryStore::default());
        let base = spawn_app(store.clone(), KeyStrategy::FilenameHint).await;
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        client
            .post(format!("{base}/upload"))
            .multipart(file_form("file", "a.png", b"png".to_vec()))
            .send()
            .await
            .unwrap();

        let stats: serde_json::Value = client
            .get(format!("{base}/stats"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(stats, serde_json::json!({"fileCount": 1}));

        let response = client.get(format!("{base}/")).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "http://localhost:3000"
        );
    }

    /// 上限を超えるURLエンコードのボディは413
    #[tokio::test]
    async fn test_upload_urlencoded_over_limit() {
        let store = Arc::new(MemoryStore::default());
        let base = spawn_app_with_limit(store.clone(), KeyStrategy::FilenameHint, 1024).await;
        let long_url = format!("http://example.com/{}", "a".repeat(4096));

        let response = reqwest::Client::new()
            .post(format!("{base}/upload"))
            .form(&[("type", "url".to_string()), ("url", long_url)])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["msg"], "Payload Too Large");
        assert!(store.puts().is_empty());
    }

    #[tokio::test]
    async fn test_upload_rejects_get() {
        let store = Arc::new(MemoryStore::default());
        let base = spawn_app(store, KeyStrategy::FilenameHint).await;

        let response = reqwest::get(format!("{base}/upload")).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
