//! 单连接命令循环
//!
//! 欢迎语 → 循环读取命令 → 分发 → 回复；收到 EXIT、空行或对端关闭时结束。
//! 循环中的任何 IO/文件系统错误只记录日志并关闭本连接。

use log::{debug, error, info};
use std::net::SocketAddr;
use std::path::Path;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

use crate::protocol::{Command, ERR_INVALID_COMMAND, FAREWELL, GREETING, encode_listing};
use crate::server::lister::list_entries;
use crate::server::sender::{SendOutcome, send_file};
use crate::wire;

/// 处理一个客户端连接直到会话结束
pub async fn handle_connection<S>(stream: S, peer: SocketAddr, shared_root: &Path)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    info!("Connection established with {}", peer);

    if let Err(e) = run_session(stream, peer, shared_root).await {
        error!("Session with {} failed: {:#}", peer, e);
    }

    info!("Connection with {} closed", peer);
}

async fn run_session<S>(stream: S, peer: SocketAddr, shared_root: &Path) -> anyhow::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);

    wire::write_line(&mut writer, GREETING).await?;

    while let Some(line) = wire::read_line(&mut reader).await? {
        if line.trim().is_empty() {
            break;
        }

        let command = Command::parse(&line);
        debug!("Command from {}: {:?}", peer, command);

        match command {
            Command::List => {
                let entries = list_entries(shared_root).await?;
                wire::write_line(&mut writer, &encode_listing(&entries)).await?;
                // 空行标记列表结束
                wire::write_line(&mut writer, "").await?;
                debug!("Listed {} entries for {}", entries.len(), peer);
            }
            Command::Download(name) => {
                match send_file(shared_root, &name, &mut reader, &mut writer).await? {
                    SendOutcome::Sent(bytes) => {
                        info!("File '{}' sent to {} ({} bytes)", name, peer, bytes);
                    }
                    SendOutcome::NotFound => {
                        debug!("File '{}' requested by {} not found", name, peer);
                    }
                }
            }
            Command::Exit => {
                wire::write_line(&mut writer, FAREWELL).await?;
                break;
            }
            Command::Unknown(text) => {
                debug!("Invalid command from {}: {:?}", peer, text);
                wire::write_line(&mut writer, ERR_INVALID_COMMAND).await?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    /// 在内存管道上跑一次完整会话，返回服务端写出的全部字节
    async fn run_script(root: &Path, script: &[u8]) -> Vec<u8> {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let root = root.to_path_buf();
        let task = tokio::spawn(async move {
            handle_connection(server, peer(), &root).await;
        });

        let (mut rx, mut tx) = tokio::io::split(client);
        tx.write_all(script).await.unwrap();
        tx.shutdown().await.unwrap();

        let mut out = Vec::new();
        rx.read_to_end(&mut out).await.unwrap();
        task.await.unwrap();
        out
    }

    #[tokio::test]
    async fn test_invalid_command_keeps_session() {
        let root = tempfile::tempdir().unwrap();
        let out = run_script(root.path(), b"HELLO\nLIST\nEXIT\n").await;
        let text = String::from_utf8(out).unwrap();

        let expected = format!(
            "{}\nERROR Invalid command.\nNo files available.\n\nGoodbye!\n",
            GREETING
        );
        assert_eq!(text, expected);
    }

    #[tokio::test]
    async fn test_exit_stops_processing() {
        let root = tempfile::tempdir().unwrap();
        let out = run_script(root.path(), b"EXIT\nLIST\n").await;
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text, format!("{}\nGoodbye!\n", GREETING));
    }

    #[tokio::test]
    async fn test_blank_line_closes() {
        let root = tempfile::tempdir().unwrap();
        let out = run_script(root.path(), b"\nLIST\n").await;

        assert_eq!(out, format!("{}\n", GREETING).into_bytes());
    }

    #[tokio::test]
    async fn test_download_then_list() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("a.txt"), b"hello").unwrap();

        let script = b"DOWNLOAD a.txt\nREADY\nDOWNLOAD zzz\nLIST\n";
        let out = run_script(root.path(), script).await;
        let text = String::from_utf8(out).unwrap();

        let expected = format!(
            "{}\nSIZE 5\nhelloERROR File not found.\na.txt\n\n",
            GREETING
        );
        assert_eq!(text, expected);
    }
}
