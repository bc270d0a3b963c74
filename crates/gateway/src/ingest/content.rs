//! # 巻き戻し可能なコンテンツストリーム

use std::io::{self, Read, Seek, SeekFrom};

use bytes::Bytes;

/// メモリ上にバッファされたアップロード内容。
///
/// 形式判定のために先頭を読んでも `rewind` で先頭に戻せる。
/// 所有者は常に1つで、最後に `into_bytes` でストレージへ渡される。
#[derive(Debug)]
pub struct ContentStream {
    inner: io::Cursor<Bytes>,
}

impl ContentStream {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            inner: io::Cursor::new(bytes.into()),
        }
    }

    /// 全体のバイト数
    pub fn len(&self) -> u64 {
        self.inner.get_ref().len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.inner.get_ref().is_empty()
    }

    /// 現在の読み取り位置
    pub fn position(&self) -> u64 {
        self.inner.position()
    }

    /// 先頭から最大 `limit` バイトを読み、読み取り位置を先頭に戻す。
    pub fn peek(&mut self, limit: usize) -> io::Result<Vec<u8>> {
        self.rewind()?;
        let mut head = Vec::with_capacity(limit);
        (&mut self.inner).take(limit as u64).read_to_end(&mut head)?;
        self.rewind()?;
        Ok(head)
    }

    /// 読み取り位置を先頭に戻す。
    pub fn rewind(&mut self) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(0)).map(|_| ())
    }

    /// ストリームを消費して全内容を返す。読み取り位置には依存しない。
    pub fn into_bytes(self) -> Bytes {
        self.inner.into_inner()
    }
}
