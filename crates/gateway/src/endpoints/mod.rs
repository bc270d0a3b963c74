//! # Gatewayエンドポイント
//!
//! - `GET /`: メインサイトへのリダイレクト
//! - `POST /upload`: ファイル/URLのアップロード
//! - `GET /stats`: バケット内のオブジェクト数

pub mod index;
pub mod stats;
pub mod upload;

pub use index::handle_index;
pub use stats::handle_stats;
pub use upload::handle_upload;
