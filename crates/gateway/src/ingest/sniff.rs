//! # コンテンツ形式判定
//!
//! クライアントのファイル名を信用せず、先頭バイトのマジックナンバーから形式を判定する。
//! 判定後はストリームを必ず先頭に戻してから返す。

use image::ImageFormat;

use super::ContentStream;
use crate::error::GatewayError;

/// 判定に使う先頭バイト数
const SNIFF_LEN: usize = 64;

/// ストリームの形式を小文字のトークン（`png`, `jpeg`, `pdf` 等）で返す。
pub fn sniff(content: &mut ContentStream) -> Result<String, GatewayError> {
    let head = content
        .peek(SNIFF_LEN)
        .map_err(|e| GatewayError::Internal(format!("先頭バイトの読み取りに失敗: {e}")))?;

    detect(&head)
        .map(str::to_string)
        .ok_or(GatewayError::UnrecognizedFormat)
}

fn detect(head: &[u8]) -> Option<&'static str> {
    if head.starts_with(b"%PDF-") {
        return Some("pdf");
    }

    let format = image::guess_format(head).ok()?;
    let token = match format {
        ImageFormat::Png => "png",
        ImageFormat::Jpeg => "jpeg",
        ImageFormat::Gif => "gif",
        ImageFormat::WebP => "webp",
        ImageFormat::Bmp => "bmp",
        ImageFormat::Tiff => "tiff",
        ImageFormat::Ico => "ico",
        other => other.extensions_str().first().copied()?,
    };
    Some(token)
}
