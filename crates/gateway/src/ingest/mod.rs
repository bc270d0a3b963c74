//! # 取り込みパイプライン
//!
//! アップロードリクエストからストレージに渡すバイト列とキーを決定する。
//!
//! ## ステージ（順序固定）
//! 1. `router`: `type` を判定し、ファイルまたはリモートURLから `ContentStream` を得る
//! 2. `sniff`: （有効時のみ）先頭バイトから形式を判定し、ストリームを先頭に戻す
//! 3. `key`: ファイル名ヒントまたは判定した形式からオブジェクトキーを生成する
//!
//! ステージ間で受け渡すのは `ResolvedContent` のみで、リクエストをまたいで
//! 共有する可変状態はない。

pub mod content;
pub mod fetch;
pub mod form;
pub mod key;
pub mod pipeline;
pub mod router;
pub mod sniff;

pub use content::ContentStream;
pub use fetch::RemoteFetcher;
pub use form::{FilePart, UploadForm};
pub use key::StorageKey;
pub use pipeline::{IngestPipeline, KeyStrategy};
pub use router::{IngestionRouter, ResolvedContent, UploadRequest};
