//! 共享目录列举

use std::io;
use std::path::Path;

/// 列出共享目录下的直接条目（文件和子目录）
///
/// 顺序取决于文件系统，调用方不应依赖。
pub async fn list_entries(root: &Path) -> io::Result<Vec<String>> {
    let mut dir = tokio::fs::read_dir(root).await?;
    let mut names = Vec::new();
    while let Some(entry) = dir.next_entry().await? {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}
