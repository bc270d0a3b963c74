//! # 取り込みルーター
//!
//! `type` に応じてコンテンツの取得元を選び、
//! `(ContentStream, ファイル名ヒント)` の組に正規化する。
//! ファイル名ヒントはキーのサフィックスにのみ使い、ファイルシステムのパスには使わない。

use super::{ContentStream, RemoteFetcher, UploadForm};
use crate::error::GatewayError;

/// 検証済みのアップロードリクエスト。
#[derive(Debug)]
pub enum UploadRequest {
    /// multipartで直接送られたファイル
    File {
        content: ContentStream,
        filename: Option<String>,
    },
    /// 取得対象のリモートURL
    Url { url: String },
}

/// 取り込み結果。リクエストごとに1回だけ生成・消費される。
#[derive(Debug)]
pub struct ResolvedContent {
    pub content: ContentStream,
    pub filename_hint: Option<String>,
    /// 先頭バイトから判定した形式（判定有効時のみ）
    pub declared_format: Option<String>,
}

/// アップロード元の振り分け。
#[derive(Clone)]
pub struct IngestionRouter {
    fetcher: RemoteFetcher,
}

impl IngestionRouter {
    pub fn new(fetcher: RemoteFetcher) -> Self {
        Self { fetcher }
    }

    /// フォームを検証し、コンテンツを取得する。
    pub async fn resolve(&self, form: UploadForm) -> Result<ResolvedContent, GatewayError> {
        match form.into_request()? {
            UploadRequest::File { content, filename } => Ok(ResolvedContent {
                content,
                filename_hint: filename,
                declared_format: None,
            }),
            UploadRequest::Url { url } => {
                let (content, filename_hint) = self.fetcher.fetch(&url).await?;
                Ok(ResolvedContent {
                    content,
                    filename_hint,
                    declared_format: None,
                })
            }
        }
    }
}
