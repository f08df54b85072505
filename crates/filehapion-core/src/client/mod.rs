//! 下载客户端
//!
//! 包含:
//! - 客户端会话（LIST 一次 + 顺序 DOWNLOAD）
//! - 按声明长度精确接收文件内容

pub mod receiver;
pub mod session;

pub use session::ClientSession;

use std::path::{Path, PathBuf};

use crate::error::TransferError;
use crate::protocol::decode_listing;

/// LIST 返回的文件目录
///
/// 只是连接时的快照，服务端目录变化后即过期。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileCatalog {
    entries: Vec<String>,
}

impl FileCatalog {
    /// 从 LIST 响应正文构建；哨兵字符串视为空目录
    pub fn from_listing(body: &str) -> Self {
        Self {
            entries: decode_listing(body),
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

/// 单个文件的下载结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Saved { path: PathBuf, bytes: u64 },
    /// 服务端返回的错误信息，例如 `ERROR File not found.`
    Rejected(String),
}

/// 中止下载队列的错误
#[derive(Debug)]
pub struct DownloadFailure {
    pub file: String,
    pub error: TransferError,
}

/// 批量下载汇总
#[derive(Debug, Default)]
pub struct DownloadReport {
    pub saved: Vec<PathBuf>,
    pub rejected: Vec<(String, String)>,
    pub failure: Option<DownloadFailure>,
}

impl DownloadReport {
    /// 队列是否完整执行（被拒绝的文件不算中止）
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

/// 下载事件回调
pub trait DownloadCallback: Send + Sync {
    /// 进度更新
    fn on_progress(&self, _file: &str, _received: u64, _total: u64) {}

    /// 文件已保存
    fn on_complete(&self, _file: &str, _path: &Path) {}

    /// 服务端拒绝了请求
    fn on_rejected(&self, _file: &str, _reason: &str) {}

    /// 下载失败，剩余队列将被中止
    fn on_error(&self, _file: &str, _error: &TransferError) {}
}

/// 忽略所有事件的回调
pub struct NoopCallback;

impl DownloadCallback for NoopCallback {}
