//! # バケット初期化（`--init`）
//!
//! 1. rust-s3 でバケットを作成する（パススタイル）
//! 2. 匿名ユーザーに `s3:GetObject` を許可するポリシーを署名付きPUTで設定する
//!
//! どちらかが失敗した時点で中断する。

use anyhow::{bail, Context};

use crate::config::{GatewayConfig, StoreConfig};
use crate::storage::s3::{credentials, region};
use crate::storage::SignedObjectStore;

/// バケットを作成し、公開読み取りポリシーを設定する。
pub async fn init_bucket(config: &GatewayConfig) -> anyhow::Result<()> {
    let client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .context("HTTPクライアントの構築に失敗")?;
    let policy_store = SignedObjectStore::new(client, &config.store);

    provision(&config.store, &policy_store).await
}

/// バケット作成に成功した場合のみ `policy_store` 経由でポリシーを設定する。
pub(crate) async fn provision(
    store: &StoreConfig,
    policy_store: &SignedObjectStore,
) -> anyhow::Result<()> {
    let response = ::s3::Bucket::create_with_path_style(
        &store.bucket,
        region(store),
        credentials(store)?,
        ::s3::bucket_ops::BucketConfiguration::default(),
    )
    .await
    .with_context(|| format!("バケット {} の作成に失敗", store.bucket))?;

    if response.response_code != 200 {
        bail!(
            "バケット {} の作成に失敗: HTTP {} - {}",
            store.bucket,
            response.response_code,
            response.response_text
        );
    }
    tracing::info!(bucket = %store.bucket, "バケットを作成しました");

    policy_store
        .put_bucket_policy(&public_read_policy(&store.bucket))
        .await
        .context("バケットポリシーの設定に失敗")?;
    tracing::info!(bucket = %store.bucket, "公開読み取りポリシーを設定しました");

    Ok(())
}

/// 匿名ユーザーにオブジェクトの読み取りだけを許可するポリシー
pub fn public_read_policy(bucket: &str) -> serde_json::Value {
    serde_json::json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Sid": "AddPerm",
            "Effect": "Allow",
            "Principal": "*",
            "Action": ["s3:GetObject"],
            "Resource": [format!("arn:aws:s3:::{bucket}/*")],
        }],
    })
}
