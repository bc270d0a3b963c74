//! # オブジェクトキー生成
//!
//! UUID v4 をベースに、ファイル名ヒントの拡張子を引き継いだキーを生成する。
//!
//! | ヒント | キー |
//! |--------|------|
//! | なし / 空 | `<uuid>` |
//! | `anime.png` | `<uuid>.png` |
//! | `archive.tar.gz` | `<uuid>.gz` |
//! | `.zshrc` | `<uuid>.zshrc` |
//! | `Dockerfile` | `<uuid>` |
//! | `file.` | `<uuid>.` |
//! | `.` / `..` | `<uuid>` |

use std::fmt;

use uuid::Uuid;

/// ストレージ上のオブジェクトキー。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn identifier() -> String {
    Uuid::new_v4().to_string()
}

/// ファイル名ヒントからキーを生成する。
///
/// ヒントはパス区切り（`/`, `\`）より後ろの部分だけを使う。
pub fn generate(filename_hint: Option<&str>) -> StorageKey {
    let id = identifier();

    let Some(name) = filename_hint
        .map(base_name)
        .filter(|n| !matches!(*n, "" | "." | ".."))
    else {
        return StorageKey(id);
    };

    match extension(name) {
        Some(ext) => StorageKey(format!("{id}.{ext}")),
        // 拡張子のないドットファイルは名前全体をサフィックスにする
        None if name.starts_with('.') => StorageKey(format!("{id}{name}")),
        None => StorageKey(id),
    }
}

/// 判定済みの形式トークンを拡張子としてキーを生成する。
pub fn generate_with_format(format: &str) -> StorageKey {
    StorageKey(format!("{}.{format}", identifier()))
}

fn base_name(hint: &str) -> &str {
    hint.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(hint)
}

/// 先頭以外で最も右にある `.` より後ろ。末尾の `.` は空の拡張子として返す。
fn extension(name: &str) -> Option<&str> {
    let dot = name.rfind('.')?;
    if dot == 0 {
        return None;
    }
    Some(&name[dot + 1..])
}
