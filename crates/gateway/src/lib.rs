//! # emptybox Gateway
//!
//! ファイルアップロードまたはリモートURLを受け取り、ランダムなキーで
//! S3互換オブジェクトストレージに保存するGateway。
//!
//! ## API エンドポイント
//! - `POST /upload`: ファイル / URL を保存し、生成したキーを返す
//! - `GET /stats`: バケット内のオブジェクト数
//! - `GET /`: `EMPTYBOX_SITE` へのリダイレクト

pub mod config;
pub mod endpoints;
pub mod error;
pub mod ingest;
pub mod storage;

#[cfg(feature = "vendor-aws")]
pub mod bootstrap;

#[cfg(test)]
mod test_helpers;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use config::GatewayState;
use endpoints::{handle_index, handle_stats, handle_upload};

/// ルーティングを構築する。
pub fn app(state: Arc<GatewayState>) -> Router {
    let body_limit = usize::try_from(state.max_upload_bytes).unwrap_or(usize::MAX);

    Router::new()
        .route("/", get(handle_index))
        .route("/upload", post(handle_upload))
        .route("/stats", get(handle_stats))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
