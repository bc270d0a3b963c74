//! # emptybox
//!
//! アップロードGatewayのエントリポイント。
//!
//! - `emptybox`: HTTPサーバーを起動する
//! - `emptybox --init`: バケットを作成し公開読み取りポリシーを設定して終了する

use std::sync::Arc;

use clap::Parser;
use emptybox_gateway::config::{GatewayConfig, GatewayState};

#[derive(Debug, Parser)]
#[command(name = "emptybox", about = "emptybox upload gateway")]
struct Args {
    /// 待ち受けアドレス
    #[arg(long, default_value = "127.0.0.1:8000")]
    bind: String,

    /// バケットを初期化して終了する
    #[arg(long)]
    init: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = GatewayConfig::from_env()?;

    if args.init {
        return init(&config).await;
    }

    let state = Arc::new(GatewayState::from_config(&config)?);

    tracing::info!(
        site = %config.site_url,
        endpoint = %config.store.endpoint(),
        bucket = %config.store.bucket,
        publisher = ?config.publisher,
        sniff = config.sniff,
        max_upload_bytes = config.max_upload_bytes,
        "設定を読み込みました"
    );

    let app = emptybox_gateway::app(state);

    tracing::info!("Gatewayを {} で起動します", args.bind);

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(feature = "vendor-aws")]
async fn init(config: &GatewayConfig) -> anyhow::Result<()> {
    emptybox_gateway::bootstrap::init_bucket(config).await
}

#[cfg(not(feature = "vendor-aws"))]
async fn init(_config: &GatewayConfig) -> anyhow::Result<()> {
    anyhow::bail!("--init には feature vendor-aws が必要です")
}
