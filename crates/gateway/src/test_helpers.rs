//! # テスト用共通ヘルパー
//!
//! 取り込み・ストレージ・エンドポイントのテストで共有するモックサーバーとストア。

use std::sync::{Arc, Mutex};

use crate::config::{GatewayState, StoreConfig, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_SITE};
use crate::ingest::{
    ContentStream, IngestPipeline, IngestionRouter, KeyStrategy, RemoteFetcher, StorageKey,
};
use crate::storage::{ObjectStore, PublishError, PutReceipt};

/// テスト用モックHTTPサーバーを起動し、ポート番号を返す。
pub async fn start_mock_server(app: axum::Router) -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    port
}

pub fn test_store_config() -> StoreConfig {
    StoreConfig {
        scheme: "http".to_string(),
        host: "storage.test".to_string(),
        bucket: "emptybox".to_string(),
        access_key: "test-access".to_string(),
        secret_key: "test-secret".to_string(),
        region: "us-east-1".to_string(),
    }
}

/// メモリ上に (キー, バイト数) を記録するストア。
#[derive(Default)]
pub struct MemoryStore {
    puts: Mutex<Vec<(String, u64)>>,
    reject: Option<(u16, String)>,
}

impl MemoryStore {
    /// 全てのPUTを指定ステータスで拒否する。
    pub fn rejecting(status: u16, body: &str) -> Self {
        Self {
            puts: Mutex::default(),
            reject: Some((status, body.to_string())),
        }
    }

    pub fn puts(&self) -> Vec<(String, u64)> {
        self.puts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryStore {
    async fn put(
        &self,
        key: &StorageKey,
        content: ContentStream,
    ) -> Result<PutReceipt, PublishError> {
        if let Some((status, body)) = &self.reject {
            return Err(PublishError::Rejected {
                status: *status,
                body: body.clone(),
            });
        }
        self.puts
            .lock()
            .unwrap()
            .push((key.to_string(), content.len()));
        Ok(PutReceipt {
            key: key.clone(),
            status: 200,
        })
    }

    async fn count(&self) -> Result<u64, PublishError> {
        Ok(self.puts.lock().unwrap().len() as u64)
    }
}

/// `store` を保存先にしたGatewayを起動し、ベースURLを返す。
pub async fn spawn_app(store: Arc<dyn ObjectStore>, strategy: KeyStrategy) -> String {
    spawn_app_with_limit(store, strategy, DEFAULT_MAX_UPLOAD_BYTES).await
}

/// ボディ上限を指定してGatewayを起動する。
pub async fn spawn_app_with_limit(
    store: Arc<dyn ObjectStore>,
    strategy: KeyStrategy,
    max_upload_bytes: u64,
) -> String {
    let fetcher = RemoteFetcher::new(reqwest::Client::new(), max_upload_bytes);
    let pipeline = IngestPipeline::new(IngestionRouter::new(fetcher), strategy);
    let state = GatewayState::new(DEFAULT_SITE.to_string(), pipeline, store, max_upload_bytes);

    let port = start_mock_server(crate::app(Arc::new(state))).await;
    format!("http://127.0.0.1:{port}")
}
