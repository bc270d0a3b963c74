//! # 署名付きPUTによるストレージ実装
//!
//! SDKを使わず、`emptybox_crypto` で署名した生のHTTP PUTを送る。
//!
//! ## リクエスト
//! ```text
//! PUT {scheme}://{bucket}.{host}/{key}
//! Host: {bucket}.{host}
//! Date: <IMF-fixdate>
//! Content-Type: <キーの拡張子から推定>
//! Authorization: AWS {access_key}:{signature}
//! ```
//! 署名のリソースパスは `/{bucket}/{key}`。

use std::time::SystemTime;

use bytes::Bytes;
use emptybox_crypto::SignedRequest;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, DATE, HOST};

use super::{content_type_for, ObjectStore, PublishError, PutReceipt};
use crate::config::StoreConfig;
use crate::ingest::{ContentStream, StorageKey};

/// URLパスとリソースパスで共通に使うキーのエンコード規則
const KEY_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// 署名付き生PUTによるストレージ実装。
pub struct SignedObjectStore {
    client: reqwest::Client,
    /// 接続先（通常は `{scheme}://{bucket}.{host}`）
    base_url: String,
    /// `Host` ヘッダ値（`{bucket}.{host}`）
    virtual_host: String,
    bucket: String,
    access_key: String,
    secret_key: String,
}

impl SignedObjectStore {
    /// タイムアウトは `client` 側で設定しておくこと。
    pub fn new(client: reqwest::Client, store: &StoreConfig) -> Self {
        let virtual_host = store.virtual_host();
        Self {
            client,
            base_url: format!("{}://{virtual_host}", store.scheme),
            virtual_host,
            bucket: store.bucket.clone(),
            access_key: store.access_key.clone(),
            secret_key: store.secret_key.clone(),
        }
    }

    /// 接続先を差し替える。`Host` ヘッダと署名は変わらない。
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// 署名付きPUTを送り、ステータスとボディを返す。
    ///
    /// `Date` ヘッダには署名に使ったものと同じ文字列を送る。
    async fn send_signed(
        &self,
        path: &str,
        resource_path: &str,
        content_type: &str,
        body: Bytes,
        now: SystemTime,
    ) -> Result<(u16, String), PublishError> {
        let date = emptybox_crypto::http_date(now);
        let signed = SignedRequest::new(&self.secret_key, "PUT", resource_path, &date, content_type)
            .map_err(|e| PublishError::Transport(format!("署名の構築に失敗: {e}")))?;

        let response = self
            .client
            .put(format!("{}{path}", self.base_url))
            .header(HOST, &self.virtual_host)
            .header(DATE, &signed.date)
            .header(CONTENT_TYPE, &signed.content_type)
            .header(AUTHORIZATION, signed.authorization(&self.access_key))
            .body(body)
            .send()
            .await
            .map_err(|e| PublishError::Transport(format!("HTTP送信失敗: {e}")))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| PublishError::Transport(format!("レスポンス読み取り失敗: {e}")))?;

        Ok((status, body))
    }

    /// 指定時刻で署名してオブジェクトを保存する。
    pub(crate) async fn put_at(
        &self,
        key: &StorageKey,
        content: ContentStream,
        now: SystemTime,
    ) -> Result<PutReceipt, PublishError> {
        let encoded = utf8_percent_encode(key.as_str(), KEY_ENCODE).to_string();
        let resource_path = format!("/{}/{encoded}", self.bucket);
        let content_type = content_type_for(key);

        let (status, body) = self
            .send_signed(
                &format!("/{encoded}"),
                &resource_path,
                &content_type,
                content.into_bytes(),
                now,
            )
            .await?;

        if status != 200 {
            return Err(PublishError::Rejected { status, body });
        }

        Ok(PutReceipt {
            key: key.clone(),
            status,
        })
    }

    /// バケットポリシーを設定する（`PUT /?policy`）。成功は2xx。
    pub async fn put_bucket_policy(
        &self,
        policy: &serde_json::Value,
    ) -> Result<(), PublishError> {
        let body = serde_json::to_vec(policy)
            .map_err(|e| PublishError::Transport(format!("ポリシーのシリアライズに失敗: {e}")))?;
        let resource_path = format!("/{}/?policy", self.bucket);

        let (status, body) = self
            .send_signed(
                "/?policy",
                &resource_path,
                "application/json",
                Bytes::from(body),
                SystemTime::now(),
            )
            .await?;

        if !(200..300).contains(&status) {
            return Err(PublishError::Rejected { status, body });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ObjectStore for SignedObjectStore {
    async fn put(
        &self,
        key: &StorageKey,
        content: ContentStream,
    ) -> Result<PutReceipt, PublishError> {
        self.put_at(key, content, SystemTime::now()).await
    }

    /// 一覧取得は実装していないため常に0を返す。
    async fn count(&self) -> Result<u64, PublishError> {
        Ok(0)
    }
}
