//! # オブジェクトストレージ
//!
//! アップロード内容の保存先を抽象化する。
//!
//! ## 実装
//! - `S3ObjectStore`: rust-s3 SDK経由（feature `vendor-aws`）
//! - `SignedObjectStore`: SDKを使わず、署名付きの生PUTを送る
//!
//! どちらも起動時に1つだけ選択し、`GatewayState` に `Arc<dyn ObjectStore>` として保持する。
//! 取り込みパイプラインは実装の違いを意識しない。

#[cfg(feature = "vendor-aws")]
pub mod s3;
pub mod signed;

#[cfg(feature = "vendor-aws")]
pub use self::s3::S3ObjectStore;
pub use signed::SignedObjectStore;

use crate::ingest::{ContentStream, StorageKey};

/// 保存成功時の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutReceipt {
    pub key: StorageKey,
    /// ストレージが返したHTTPステータス（常に200）
    pub status: u16,
}

/// 保存失敗。自動リトライは行わない。
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// ストレージが200以外を返した
    #[error("ストレージがリクエストを拒否しました: HTTP {status} - {body}")]
    Rejected { status: u16, body: String },
    /// 接続失敗、タイムアウト、署名の構築失敗
    #[error("ストレージとの通信に失敗: {0}")]
    Transport(String),
}

/// オブジェクトストレージの抽象インターフェース。
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// `key` でコンテンツを1回のPUTで保存する。
    ///
    /// 通信途中で失敗した場合、オブジェクトが作成されているかは保証されない。
    async fn put(
        &self,
        key: &StorageKey,
        content: ContentStream,
    ) -> Result<PutReceipt, PublishError>;

    /// バケット内のオブジェクト数
    async fn count(&self) -> Result<u64, PublishError>;
}

/// キーの拡張子から `Content-Type` を決める。
pub fn content_type_for(key: &StorageKey) -> String {
    mime_guess::from_path(key.as_str())
        .first_or_octet_stream()
        .to_string()
}
