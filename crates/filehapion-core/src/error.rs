//! 错误类型

use std::path::PathBuf;

use crate::protocol::ProtocolError;

/// 服务端启动错误
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Shared folder does not exist: {}", .0.display())]
    SharedRootMissing(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 客户端传输错误
///
/// 任一错误都会中止剩余的下载队列。
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("Connection error: {0}")]
    Connection(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Server closed the connection")]
    Closed,

    #[error("Connection closed after {received} of {expected} bytes")]
    Truncated { received: u64, expected: u64 },

    #[error("Failed to write {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
