//! 文件接收
//!
//! 读取 `SIZE` 声明的字节数写入本地文件。每次读取不超过剩余所需字节，
//! 连接上属于后续消息的数据不会被误读。

use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

use crate::error::TransferError;
use crate::protocol::CHUNK_SIZE;

/// 从 `reader` 精确读取 `expected` 字节写入 `path`
///
/// 返回实际接收的字节数（总是等于 `expected`）。
pub async fn receive_to_file<R, F>(
    reader: &mut R,
    path: &Path,
    expected: u64,
    mut on_progress: F,
) -> Result<u64, TransferError>
where
    R: AsyncRead + Unpin,
    F: FnMut(u64),
{
    let storage_error = |source| TransferError::Storage {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::create(path).await.map_err(storage_error)?;
    let mut buf = [0u8; CHUNK_SIZE];
    let mut received: u64 = 0;

    while received < expected {
        let want = usize::try_from(expected - received).map_or(CHUNK_SIZE, |r| r.min(CHUNK_SIZE));
        let n = reader.read(&mut buf[..want]).await?;
        if n == 0 {
            return Err(TransferError::Truncated { received, expected });
        }
        file.write_all(&buf[..n]).await.map_err(storage_error)?;
        received += n as u64;
        on_progress(received);
    }

    file.flush().await.map_err(storage_error)?;
    Ok(received)
}
