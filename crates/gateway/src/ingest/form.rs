//! # アップロードフォーム
//!
//! `multipart/form-data` と `application/x-www-form-urlencoded` の両方から
//! `type` / `url` / `file` フィールドを集め、`UploadRequest` に変換する。

use std::collections::HashMap;

use axum::extract::Multipart;
use axum::http::StatusCode;
use bytes::Bytes;
use emptybox_types::UploadKind;

use super::{ContentStream, UploadRequest};
use crate::error::GatewayError;

/// multipartの `file` パート
#[derive(Debug, Clone)]
pub struct FilePart {
    /// クライアントが送ったファイル名（未加工）
    pub filename: Option<String>,
    pub content: Bytes,
}

/// 受信したフォームフィールド。値の検証は `into_request` で行う。
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub kind: Option<String>,
    pub url: Option<String>,
    pub file: Option<FilePart>,
}

impl UploadForm {
    /// multipartボディを読み切ってフォームを構築する。
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, GatewayError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some("type") => form.kind = Some(field.text().await.map_err(multipart_error)?),
                Some("url") => form.url = Some(field.text().await.map_err(multipart_error)?),
                Some("file") => {
                    let filename = field.file_name().map(str::to_string);
                    let content = field.bytes().await.map_err(multipart_error)?;
                    form.file = Some(FilePart { filename, content });
                }
                // 未知のフィールドは読み捨てる
                _ => {}
            }
        }

        Ok(form)
    }

    /// URLエンコードされたフォームから構築する。ファイルパートは持たない。
    pub fn from_fields(mut fields: HashMap<String, String>) -> Self {
        Self {
            kind: fields.remove("type"),
            url: fields.remove("url"),
            file: None,
        }
    }

    /// `type` に応じて `UploadRequest` に変換する。
    pub fn into_request(self) -> Result<UploadRequest, GatewayError> {
        // 値は完全一致で判定する（前後の空白も許容しない）
        let kind = self
            .kind
            .as_deref()
            .ok_or_else(|| GatewayError::InvalidRequest("typeフィールドがありません".to_string()))?;

        match UploadKind::parse(kind) {
            Some(UploadKind::File) => {
                let file = self.file.ok_or_else(|| {
                    GatewayError::InvalidRequest("fileパートがありません".to_string())
                })?;
                Ok(UploadRequest::File {
                    content: ContentStream::new(file.content),
                    filename: file.filename,
                })
            }
            Some(UploadKind::Url) => {
                let url = self
                    .url
                    .map(|u| u.trim().to_string())
                    .filter(|u| !u.is_empty())
                    .ok_or_else(|| {
                        GatewayError::InvalidRequest("urlフィールドがありません".to_string())
                    })?;
                Ok(UploadRequest::Url { url })
            }
            None => Err(GatewayError::InvalidRequest(format!(
                "未知のtype: {kind:?}"
            ))),
        }
    }
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> GatewayError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        GatewayError::PayloadTooLarge(e.body_text())
    } else {
        GatewayError::InvalidRequest(format!("multipartの読み取りに失敗: {}", e.body_text()))
    }
}
