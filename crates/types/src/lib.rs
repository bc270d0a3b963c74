//! # emptybox 共有型定義
//!
//! HTTPインターフェース（`/upload`, `/stats`）でやり取りするデータ構造。
//!
//! ## レスポンス形式
//! - 成功: `{"msg": "Saved", "filename": "<key>"}`
//! - 失敗: `{"msg": "<error>"}`
//! - 統計: `{"fileCount": <n>}`

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// アップロード種別
// ---------------------------------------------------------------------------

/// `POST /upload` の `type` フィールド。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// multipartの `file` パートを直接保存する
    File,
    /// `url` フィールドのリモートリソースを取得して保存する
    Url,
}

impl UploadKind {
    /// フォーム値から種別を判定する。`"file"` と `"url"` 以外は `None`。
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "file" => Some(Self::File),
            "url" => Some(Self::Url),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// レスポンス
// ---------------------------------------------------------------------------

/// 保存成功時のレスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveResponse {
    /// 常に `"Saved"`
    pub msg: String,
    /// 生成されたオブジェクトキー
    pub filename: String,
}

impl SaveResponse {
    pub fn saved(filename: impl Into<String>) -> Self {
        Self {
            msg: "Saved".to_string(),
            filename: filename.into(),
        }
    }
}

/// エラーレスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub msg: String,
}

/// `GET /stats` のレスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    /// バケット内のオブジェクト数
    #[serde(rename = "fileCount")]
    pub file_count: u64,
}
