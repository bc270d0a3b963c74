//! # Gateway エラー型
//!
//! 全エンドポイントで共通のエラー型とHTTPレスポンスへの変換。
//! クライアントには `{"msg": ...}` 形式の短いメッセージのみ返し、
//! 詳細はログに残す。ストレージが拒否した場合のみ、上流のステータスと
//! ボディをそのまま返す。

use axum::http::StatusCode;
use axum::Json;
use emptybox_types::ErrorResponse;

use crate::storage::PublishError;

/// リモートURL取得のエラー型。
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// URLのパース失敗、または未対応スキーム
    #[error("不正なURL: {0}")]
    InvalidUrl(String),
    /// 接続失敗、タイムアウト、リダイレクト上限超過
    #[error("リモートホストに接続できません: {0}")]
    Unreachable(String),
    /// 2xx以外のステータス
    #[error("リモートがエラーを返しました: HTTP {0}")]
    Status(u16),
    /// 上限サイズ超過
    #[error("リモートリソースが上限サイズ {0} bytes を超えています")]
    TooLarge(u64),
}

/// Gatewayエラー型。
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// `type` フィールドの欠落・不正、または必須フィールドの欠落
    #[error("不正なリクエスト: {0}")]
    InvalidRequest(String),
    /// リモートURL取得に失敗
    #[error("リモートリソースの取得に失敗: {0}")]
    Fetch(#[from] FetchError),
    /// 先頭バイトからコンテンツ形式を判定できない
    #[error("コンテンツ形式を判定できません")]
    UnrecognizedFormat,
    /// リクエストボディの上限超過
    #[error("ペイロードサイズが上限を超えています: {0}")]
    PayloadTooLarge(String),
    /// ストレージへの保存に失敗
    #[error("ストレージ操作に失敗: {0}")]
    Publish(#[from] PublishError),
    /// 内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl GatewayError {
    /// HTTPステータスコード
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::InvalidRequest(_) | GatewayError::UnrecognizedFormat => {
                StatusCode::BAD_REQUEST
            }
            GatewayError::Fetch(FetchError::InvalidUrl(_)) => StatusCode::BAD_REQUEST,
            GatewayError::Fetch(FetchError::Unreachable(_) | FetchError::Status(_)) => {
                StatusCode::BAD_GATEWAY
            }
            GatewayError::Fetch(FetchError::TooLarge(_)) | GatewayError::PayloadTooLarge(_) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            GatewayError::Publish(PublishError::Rejected { status, .. }) => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            GatewayError::Publish(PublishError::Transport(_)) => StatusCode::BAD_GATEWAY,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// クライアントに返す短いメッセージ
    pub fn public_message(&self) -> String {
        match self {
            GatewayError::InvalidRequest(_) => "Invalid Request".to_string(),
            GatewayError::Fetch(FetchError::InvalidUrl(_)) => "Invalid URL".to_string(),
            GatewayError::Fetch(FetchError::Unreachable(_)) => "Remote Unreachable".to_string(),
            GatewayError::Fetch(FetchError::Status(code)) => {
                format!("Remote Returned HTTP {code}")
            }
            GatewayError::Fetch(FetchError::TooLarge(_)) | GatewayError::PayloadTooLarge(_) => {
                "Payload Too Large".to_string()
            }
            GatewayError::UnrecognizedFormat => "Unrecognized Format".to_string(),
            GatewayError::Publish(PublishError::Rejected { body, .. }) => body.clone(),
            GatewayError::Publish(PublishError::Transport(_)) => "Storage Unreachable".to_string(),
            GatewayError::Internal(_) => "Internal Error".to_string(),
        }
    }
}

impl axum::response::IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        match self {
            // 上流のボディをそのまま返す
            GatewayError::Publish(PublishError::Rejected { body, .. }) => {
                (status, body).into_response()
            }
            other => {
                let msg = other.public_message();
                (status, Json(ErrorResponse { msg })).into_response()
            }
        }
    }
}
