//! 控制消息的行读写

use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// 读取一行，去掉结尾的 `\r\n`
///
/// 对端关闭时返回 `None`。非 UTF-8 字节按有损方式解码。
pub async fn read_line<R>(reader: &mut R) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    if reader.read_until(b'\n', &mut buf).await? == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(&buf);
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// 写入一行并刷新
pub async fn write_line<W>(writer: &mut W, line: &str) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let frame = format!("{}\n", line);
    writer.write_all(frame.as_bytes()).await?;
    writer.flush().await
}
