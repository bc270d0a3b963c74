//! # Gateway設定・共有状態
//!
//! 環境変数からの設定読み込みとGatewayの共有状態の定義。
//! 設定は起動時に一度だけ検証し、リクエストごとには再検証しない。

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};

use crate::ingest::{IngestPipeline, IngestionRouter, KeyStrategy, RemoteFetcher};
use crate::storage::{ObjectStore, SignedObjectStore};

/// `EMPTYBOX_SITE` 未設定時のリダイレクト先
pub const DEFAULT_SITE: &str = "http://localhost:3000";
/// タイムアウトのデフォルト（秒）
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
/// アップロード最大サイズのデフォルト（64MiB）
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 64 * 1024 * 1024;

/// ストレージへの保存方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublisherKind {
    /// rust-s3 SDK
    Sdk,
    /// 署名付き生PUT
    Signed,
}

impl FromStr for PublisherKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sdk" => Ok(Self::Sdk),
            "signed" | "manual" => Ok(Self::Signed),
            other => Err(anyhow!("未知のpublisher: {other}（sdk または signed）")),
        }
    }
}

/// オブジェクトストレージの接続設定
#[derive(Clone)]
pub struct StoreConfig {
    /// `http` または `https`
    pub scheme: String,
    /// `host[:port]`
    pub host: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    /// SDK用リージョン
    pub region: String,
}

impl StoreConfig {
    /// パススタイル用エンドポイント（`{scheme}://{host}`）
    pub fn endpoint(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }

    /// バーチャルホスト形式の `Host` ヘッダ値（`{bucket}.{host}`）
    pub fn virtual_host(&self) -> String {
        format!("{}.{}", self.bucket, self.host)
    }
}

// シークレットキーはDebug出力に含めない
impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("scheme", &self.scheme)
            .field("host", &self.host)
            .field("bucket", &self.bucket)
            .field("access_key", &self.access_key)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

/// Gatewayの起動設定
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// `GET /` のリダイレクト先
    pub site_url: String,
    pub store: StoreConfig,
    pub publisher: PublisherKind,
    /// 先頭バイトによる形式判定を行うか
    pub sniff: bool,
    /// リモート取得・保存のタイムアウト
    pub http_timeout: Duration,
    /// リクエストボディ・リモート取得の上限（バイト）
    pub max_upload_bytes: u64,
}

impl GatewayConfig {
    /// 環境変数から構築する。
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 任意の参照関数から構築する。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let optional = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &str| {
            optional(name).ok_or_else(|| anyhow!("環境変数 {name} が設定されていません"))
        };

        let scheme = optional("EMPTYBOX_S3_SCHEME").unwrap_or_else(|| "http".to_string());
        if !matches!(scheme.as_str(), "http" | "https") {
            return Err(anyhow!(
                "EMPTYBOX_S3_SCHEME は http または https である必要があります: {scheme}"
            ));
        }

        let store = StoreConfig {
            scheme,
            host: required("EMPTYBOX_S3_HOST")?,
            bucket: required("EMPTYBOX_S3_BUCKET")?,
            access_key: required("EMPTYBOX_S3_ACCESS_KEY")?,
            secret_key: required("EMPTYBOX_S3_SECRET_KEY")?,
            region: optional("EMPTYBOX_S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
        };

        let publisher = optional("EMPTYBOX_PUBLISHER")
            .map(|v| v.parse::<PublisherKind>())
            .transpose()?
            .unwrap_or(PublisherKind::Sdk);

        let sniff = optional("EMPTYBOX_SNIFF")
            .map(|v| {
                v.trim()
                    .parse::<bool>()
                    .with_context(|| {
                        format!("EMPTYBOX_SNIFF は true/false である必要があります: {v}")
                    })
            })
            .transpose()?
            .unwrap_or(false);

        let timeout_secs = optional("EMPTYBOX_HTTP_TIMEOUT_SECS")
            .map(|v| {
                v.trim()
                    .parse::<u64>()
                    .with_context(|| format!("EMPTYBOX_HTTP_TIMEOUT_SECS が不正です: {v}"))
            })
            .transpose()?
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);

        let max_upload_bytes = optional("EMPTYBOX_MAX_UPLOAD_BYTES")
            .map(|v| {
                v.trim()
                    .parse::<u64>()
                    .with_context(|| format!("EMPTYBOX_MAX_UPLOAD_BYTES が不正です: {v}"))
            })
            .transpose()?
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        Ok(Self {
            site_url: optional("EMPTYBOX_SITE").unwrap_or_else(|| DEFAULT_SITE.to_string()),
            store,
            publisher,
            sniff,
            http_timeout: Duration::from_secs(timeout_secs),
            max_upload_bytes,
        })
    }

    pub fn key_strategy(&self) -> KeyStrategy {
        if self.sniff {
            KeyStrategy::Sniffed
        } else {
            KeyStrategy::FilenameHint
        }
    }
}

/// Gatewayの共有状態。構築後は変更しない。
pub struct GatewayState {
    /// `GET /` のリダイレクト先
    pub site_url: String,
    /// 取り込みパイプライン
    pub pipeline: IngestPipeline,
    /// 保存先（SDK / 署名付きPUT、トレイトで抽象化）
    pub store: Arc<dyn ObjectStore>,
    /// リクエストボディの上限（バイト）
    pub max_upload_bytes: u64,
}

impl GatewayState {
    /// 設定からHTTPクライアントと保存先を構築する。
    pub fn from_config(config: &GatewayConfig) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .context("HTTPクライアントの構築に失敗")?;

        let store: Arc<dyn ObjectStore> = match config.publisher {
            PublisherKind::Signed => {
                Arc::new(SignedObjectStore::new(http_client.clone(), &config.store))
            }
            #[cfg(feature = "vendor-aws")]
            PublisherKind::Sdk => {
                Arc::new(crate::storage::S3ObjectStore::from_config(&config.store)?)
            }
            #[cfg(not(feature = "vendor-aws"))]
            PublisherKind::Sdk => {
                return Err(anyhow!(
                    "EMPTYBOX_PUBLISHER=sdk には feature vendor-aws が必要です"
                ))
            }
        };

        let fetcher = RemoteFetcher::new(http_client, config.max_upload_bytes);
        let pipeline = IngestPipeline::new(IngestionRouter::new(fetcher), config.key_strategy());

        Ok(Self::new(config.site_url.clone(), pipeline, store, config.max_upload_bytes))
    }

    pub fn new(
        site_url: String,
        pipeline: IngestPipeline,
        store: Arc<dyn ObjectStore>,
        max_upload_bytes: u64,
    ) -> Self {
        Self {
            site_url,
            pipeline,
            store,
            max_upload_bytes,
        }
    }
}
