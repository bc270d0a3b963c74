//! # S3互換ストレージ実装
//!
//! rust-s3 SDK経由でAWS S3, MinIO 等のS3互換APIを使用する。
//! バケットはパススタイル（`{endpoint}/{bucket}/{key}`）でアクセスする。

use super::{content_type_for, ObjectStore, PublishError, PutReceipt};
use crate::config::StoreConfig;
use crate::ingest::{ContentStream, StorageKey};

/// rust-s3 によるストレージ実装。
pub struct S3ObjectStore {
    bucket: s3::Bucket,
}

impl S3ObjectStore {
    pub fn new(bucket: s3::Bucket) -> Self {
        Self { bucket }
    }

    /// 設定からS3互換バケットを初期化する。
    pub fn init_bucket(store: &StoreConfig) -> anyhow::Result<s3::Bucket> {
        let bucket = s3::Bucket::new(&store.bucket, region(store), credentials(store)?)?
            .with_path_style();

        Ok(*bucket)
    }

    /// 設定から構築する。
    pub fn from_config(store: &StoreConfig) -> anyhow::Result<Self> {
        Ok(Self::new(Self::init_bucket(store)?))
    }
}

/// エンドポイントを指定したカスタムリージョン
pub(crate) fn region(store: &StoreConfig) -> s3::Region {
    s3::Region::Custom {
        region: store.region.clone(),
        endpoint: store.endpoint(),
    }
}

pub(crate) fn credentials(store: &StoreConfig) -> anyhow::Result<s3::creds::Credentials> {
    Ok(s3::creds::Credentials::new(
        Some(store.access_key.as_str()),
        Some(store.secret_key.as_str()),
        None,
        None,
        None,
    )?)
}

#[async_trait::async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(
        &self,
        key: &StorageKey,
        content: ContentStream,
    ) -> Result<PutReceipt, PublishError> {
        let content_type = content_type_for(key);
        let body = content.into_bytes();

        let response = match self
            .bucket
            .put_object_with_content_type(key.as_str(), &body, &content_type)
            .await
        {
            Ok(response) => response,
            Err(s3::error::S3Error::HttpFailWithBody(status, body)) => {
                return Err(PublishError::Rejected { status, body });
            }
            Err(e) => return Err(PublishError::Transport(e.to_string())),
        };

        let status = response.status_code();
        if status != 200 {
            return Err(PublishError::Rejected {
                status,
                body: String::from_utf8_lossy(response.as_slice()).into_owned(),
            });
        }

        Ok(PutReceipt {
            key: key.clone(),
            status,
        })
    }

    /// 全ページの一覧を取得して件数を合計する。
    async fn count(&self) -> Result<u64, PublishError> {
        let pages = self
            .bucket
            .list(String::new(), None)
            .await
            .map_err(|e| match e {
                s3::error::S3Error::HttpFailWithBody(status, body) => {
                    PublishError::Rejected { status, body }
                }
                other => PublishError::Transport(other.to_string()),
            })?;

        Ok(pages.iter().map(|page| page.contents.len() as u64).sum())
    }
}
