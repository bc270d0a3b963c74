//! # emptybox リクエスト署名
//!
//! SDKを使わずにオブジェクトストレージへ直接PUTするための署名処理。
//!
//! ## 署名方式
//! | 項目 | 内容 |
//! |------|------|
//! | 正規化文字列 | `METHOD\n\nCONTENT-TYPE\nDATE\nRESOURCE-PATH` |
//! | MAC | HMAC-SHA256(secret_key, 正規化文字列) |
//! | エンコード | Base64 (Standard, 改行なし) |
//! | ヘッダ | `Authorization: AWS {access_key}:{signature}` |
//!
//! 署名対象はメタデータのみで、ボディはハッシュしない。
//! 2行目（Content-MD5）は常に空行として残す。

use std::time::SystemTime;

use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// 署名処理のエラー型
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// HMAC鍵の初期化に失敗
    #[error("HMAC鍵の初期化に失敗しました: {0}")]
    InvalidKey(String),
}

/// Base64エンジン（Standard）
fn b64() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::STANDARD
}

/// 署名対象の正規化文字列を構築する。
pub fn canonical_string(
    method: &str,
    content_type: &str,
    date: &str,
    resource_path: &str,
) -> String {
    format!("{method}\n\n{content_type}\n{date}\n{resource_path}")
}

/// 正規化文字列に対するHMAC-SHA256署名をBase64で返す。
pub fn sign(
    secret_key: &str,
    method: &str,
    resource_path: &str,
    date: &str,
    content_type: &str,
) -> Result<String, CryptoError> {
    let canonical = canonical_string(method, content_type, date, resource_path);

    let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes())
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
    mac.update(canonical.as_bytes());

    Ok(b64().encode(mac.finalize().into_bytes()))
}

/// `Date` ヘッダ用のIMF-fixdate文字列（例: `Tue, 27 Mar 2007 19:36:42 GMT`）。
pub fn http_date(time: SystemTime) -> String {
    httpdate::fmt_http_date(time)
}

/// 署名済みリクエストのメタデータ。
///
/// `date` は署名と `Date` ヘッダの両方で同じ値を使う必要がある。
/// 値がずれるとストレージ側で署名検証に失敗する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    /// HTTPメソッド（`PUT` 等）
    pub method: String,
    /// `/{bucket}/{key}` 形式のリソースパス
    pub resource_path: String,
    /// `Date` ヘッダ値
    pub date: String,
    /// `Content-Type` ヘッダ値
    pub content_type: String,
    /// Base64エンコードされた署名
    pub signature: String,
}

impl SignedRequest {
    /// メタデータに署名して `SignedRequest` を構築する。
    pub fn new(
        secret_key: &str,
        method: &str,
        resource_path: &str,
        date: &str,
        content_type: &str,
    ) -> Result<Self, CryptoError> {
        let signature = sign(secret_key, method, resource_path, date, content_type)?;
        Ok(Self {
            method: method.to_string(),
            resource_path: resource_path.to_string(),
            date: date.to_string(),
            content_type: content_type.to_string(),
            signature,
        })
    }

    /// `Authorization` ヘッダ値を返す。
    pub fn authorization(&self, access_key: &str) -> String {
        format!("AWS {access_key}:{}", self.signature)
    }
}
