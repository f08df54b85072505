//! 文件发送
//!
//! 1. 发送 `SIZE <n>`
//! 2. 等待对端任意一行确认
//! 3. 按 [`CHUNK_SIZE`] 分块从磁盘读取并发送，总量不超过已声明的大小

use anyhow::bail;
use log::debug;
use std::io;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::protocol::{CHUNK_SIZE, DownloadReply, ERR_FILE_NOT_FOUND};
use crate::wire;

/// 一次 DOWNLOAD 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// 已发送的字节数
    Sent(u64),
    NotFound,
}

/// 处理一次 DOWNLOAD 请求
///
/// 文件名直接拼接到共享目录下，不做路径清理。
pub async fn send_file<R, W>(
    root: &Path,
    name: &str,
    reader: &mut R,
    writer: &mut W,
) -> anyhow::Result<SendOutcome>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let path = root.join(name);
    let Some(file) = open_regular_file(&path).await? else {
        wire::write_line(writer, ERR_FILE_NOT_FOUND).await?;
        return Ok(SendOutcome::NotFound);
    };

    let size = file.metadata().await?.len();
    wire::write_line(writer, &DownloadReply::size_line(size)).await?;

    // 确认内容不检查，只作为同步信号
    let Some(ack) = wire::read_line(reader).await? else {
        bail!("Peer closed before acknowledging {}", name);
    };
    debug!("Received transfer acknowledgment {:?} for {}", ack, name);

    let sent = stream_chunks(file.take(size), writer).await?;
    Ok(SendOutcome::Sent(sent))
}

/// 打开普通文件；不存在或不是普通文件时返回 `None`
async fn open_regular_file(path: &Path) -> io::Result<Option<File>> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => return Ok(None),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    }

    match File::open(path).await {
        Ok(file) => Ok(Some(file)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

async fn stream_chunks<R, W>(mut source: R, writer: &mut W) -> io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = [0u8; CHUNK_SIZE];
    let mut sent: u64 = 0;
    loop {
        let n = source.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n]).await?;
        sent += n as u64;
    }
    writer.flush().await?;
    Ok(sent)
}
