//! # 取り込みパイプライン
//!
//! route → sniff（任意）→ key の順に実行し、保存するキーとコンテンツを返す。

use super::{key, sniff, IngestionRouter, ResolvedContent, StorageKey, UploadForm};
use crate::error::GatewayError;

/// キー生成方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStrategy {
    /// クライアントのファイル名ヒントから拡張子を引き継ぐ
    FilenameHint,
    /// 先頭バイトから判定した形式を拡張子にする
    Sniffed,
}

#[derive(Clone)]
pub struct IngestPipeline {
    router: IngestionRouter,
    strategy: KeyStrategy,
}

impl IngestPipeline {
    pub fn new(router: IngestionRouter, strategy: KeyStrategy) -> Self {
        Self { router, strategy }
    }

    pub fn strategy(&self) -> KeyStrategy {
        self.strategy
    }

    /// フォームからキーと保存対象のコンテンツを決定する。
    pub async fn prepare(
        &self,
        form: UploadForm,
    ) -> Result<(StorageKey, ResolvedContent), GatewayError> {
        let mut resolved = self.router.resolve(form).await?;

        let key = match self.strategy {
            KeyStrategy::FilenameHint => key::generate(resolved.filename_hint.as_deref()),
            KeyStrategy::Sniffed => {
                // sniffはストリームを先頭に戻してから返る
                let format = sniff::sniff(&mut resolved.content)?;
                let key = key::generate_with_format(&format);
                resolved.declared_format = Some(format);
                key
            }
        };

        Ok((key, resolved))
    }
}
