//! # リモートURL取得
//!
//! `type=url` のアップロードで、指定URLに1回だけGETを送り、
//! ボディと `Content-Disposition` のファイル名を取り出す。
//! リダイレクトはreqwestのデフォルトポリシー（最大10回）に従う。

use percent_encoding::percent_decode_str;
use reqwest::header::CONTENT_DISPOSITION;

use super::ContentStream;
use crate::error::FetchError;

/// リモートURLからコンテンツを取得するクライアント。
#[derive(Clone)]
pub struct RemoteFetcher {
    client: reqwest::Client,
    /// 取得するボディの上限（バイト）
    max_bytes: u64,
}

impl RemoteFetcher {
    /// タイムアウトは `client` 側で設定しておくこと。
    pub fn new(client: reqwest::Client, max_bytes: u64) -> Self {
        Self { client, max_bytes }
    }

    /// URLを取得し、バッファ済みのストリームとファイル名ヒントを返す。
    pub async fn fetch(&self, url: &str) -> Result<(ContentStream, Option<String>), FetchError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(format!(
                "未対応のスキーム: {}",
                parsed.scheme()
            )));
        }

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| FetchError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        if response.content_length().is_some_and(|len| len > self.max_bytes) {
            return Err(FetchError::TooLarge(self.max_bytes));
        }

        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition);

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Unreachable(format!("レスポンス読み取り失敗: {e}")))?;

        if body.len() as u64 > self.max_bytes {
            return Err(FetchError::TooLarge(self.max_bytes));
        }

        tracing::debug!(url, bytes = body.len(), filename = ?filename, "リモートリソースを取得");

        Ok((ContentStream::new(body), filename))
    }
}

/// `Content-Disposition` ヘッダ値からファイル名を取り出す。
///
/// `filename*`（RFC 5987形式、percent-encoding）があれば `filename` より優先する。
pub fn filename_from_disposition(value: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    // 先頭はdisposition-type（attachment / inline）
    for param in split_params(value).into_iter().skip(1) {
        let Some((name, raw)) = param.split_once('=') else {
            continue;
        };
        match name.trim().to_ascii_lowercase().as_str() {
            "filename" => plain = Some(unquote(raw.trim())),
            "filename*" => extended = decode_ext_value(raw.trim()),
            _ => {}
        }
    }

    extended.or(plain).filter(|name| !name.is_empty())
}

/// 引用符の外にある `;` で分割する。
fn split_params(value: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut escaped = false;

    for (i, c) in value.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ';' if !quoted => {
                parts.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&value[start..]);
    parts
}

fn unquote(raw: &str) -> String {
    let Some(inner) = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
    else {
        return raw.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// `charset'lang'value` 形式をデコードする。
fn decode_ext_value(raw: &str) -> Option<String> {
    let mut parts = raw.splitn(3, '\'');
    let _charset = parts.next()?;
    let _lang = parts.next()?;
    let encoded = parts.next()?;
    Some(percent_decode_str(encoded).decode_utf8_lossy().into_owned())
}
