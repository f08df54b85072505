//! 集成测试 - 真实 TCP 连接上的完整协议流程
//!
//! 服务端绑定 127.0.0.1 的随机端口，共享目录与下载目录均为临时目录。

use filehapion_core::protocol::{
    EMPTY_LISTING, ERR_FILE_NOT_FOUND, ERR_INVALID_COMMAND, GREETING,
};
use filehapion_core::{
    ClientSession, DownloadOutcome, NoopCallback, Server, ServerError, ServerSettings,
    TransferError,
};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

async fn start_server(root: &Path) -> SocketAddr {
    let settings = ServerSettings {
        bind_addr: "127.0.0.1".parse().unwrap(),
        port: 0,
        shared_dir: root.to_path_buf(),
    };
    let server = Server::bind(&settings).await.unwrap();
    let addr = server.local_addr().unwrap();
    server.spawn();
    addr
}

/// 原始连接，用于逐行检查服务端响应
struct RawClient {
    reader: BufReader<tokio::net::tcp::OwnedReadHalf>,
    writer: tokio::net::tcp::OwnedWriteHalf,
}

impl RawClient {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, writer) = stream.into_split();
        let mut client = Self {
            reader: BufReader::new(reader),
            writer,
        };
        assert_eq!(client.read_line().await, GREETING);
        client
    }

    async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{}\n", line).as_bytes())
            .await
            .unwrap();
    }

    async fn read_line(&mut self) -> String {
        let mut line = String::new();
        self.reader.read_line(&mut line).await.unwrap();
        line.trim_end_matches('\n').to_string()
    }
}

/// LIST 结果与目录内容一致（忽略顺序）
#[tokio::test]
async fn test_list_matches_directory() {
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("a.txt"), b"hello").unwrap();
    std::fs::write(root.path().join("b.bin"), b"").unwrap();
    std::fs::write(root.path().join("with space.md"), b"# hi").unwrap();
    std::fs::create_dir(root.path().join("folder")).unwrap();

    let addr = start_server(root.path()).await;
    let mut session = ClientSession::connect(addr).await.unwrap();
    assert_eq!(session.greeting(), GREETING);

    let listed: HashSet<String> = session
        .catalog()
        .await
        .unwrap()
        .iter()
        .map(str::to_string)
        .collect();
    let expected: HashSet<String> = ["a.txt", "b.bin", "with space.md", "folder"]
        .into_iter()
        .map(str::to_string)
        .collect();

    assert_eq!(listed, expected);
}

/// 空目录返回哨兵字符串
#[tokio::test]
async fn test_empty_root_returns_sentinel() {
    let root = tempfile::tempdir().unwrap();
    let addr = start_server(root.path()).await;

    let mut raw = RawClient::connect(addr).await;
    raw.send("LIST").await;
    assert_eq!(raw.read_line().await, EMPTY_LISTING);
    assert_eq!(raw.read_line().await, "");

    let mut session = ClientSession::connect(addr).await.unwrap();
    assert!(session.catalog().await.unwrap().is_empty());
}

/// a.txt (5 字节) 与 b.bin (0 字节) 的完整下载流程
#[tokio::test]
async fn test_download_scenario() {
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("a.txt"), b"hello").unwrap();
    std::fs::write(root.path().join("b.bin"), b"").unwrap();
    let dest = tempfile::tempdir().unwrap();

    let addr = start_server(root.path()).await;
    let mut session = ClientSession::connect(addr).await.unwrap();
    assert_eq!(session.catalog().await.unwrap().len(), 2);

    let outcome = session
        .download("a.txt", dest.path(), &NoopCallback)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        DownloadOutcome::Saved {
            path: dest.path().join("a.txt"),
            bytes: 5
        }
    );
    assert_eq!(std::fs::read(dest.path().join("a.txt")).unwrap(), b"hello");

    let outcome = session
        .download("b.bin", dest.path(), &NoopCallback)
        .await
        .unwrap();
    assert!(matches!(outcome, DownloadOutcome::Saved { bytes: 0, .. }));
    let empty = dest.path().join("b.bin");
    assert!(empty.exists());
    assert_eq!(std::fs::metadata(&empty).unwrap().len(), 0);

    assert_eq!(session.exit().await.unwrap(), "Goodbye!");
}

/// 原始字节：SIZE 声明后紧跟恰好 n 字节
#[tokio::test]
async fn test_wire_format_of_download() {
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("a.txt"), b"hello").unwrap();
    let addr = start_server(root.path()).await;

    let mut raw = RawClient::connect(addr).await;
    raw.send("DOWNLOAD a.txt").await;
    assert_eq!(raw.read_line().await, "SIZE 5");
    raw.send("READY").await;

    let mut payload = [0u8; 5];
    raw.reader.read_exact(&mut payload).await.unwrap();
    assert_eq!(&payload, b"hello");

    // 负载之后连接仍可继续使用
    raw.send("LIST").await;
    assert_eq!(raw.read_line().await, "a.txt");
    assert_eq!(raw.read_line().await, "");
}

/// 多块大文件逐字节一致
#[tokio::test]
async fn test_large_file_is_identical() {
    let root = tempfile::tempdir().unwrap();
    let content: Vec<u8> = (0..200_000u32).map(|i| (i * 31 % 256) as u8).collect();
    std::fs::write(root.path().join("big.bin"), &content).unwrap();
    std::fs::write(root.path().join("after.txt"), b"tail").unwrap();
    let dest = tempfile::tempdir().unwrap();

    let addr = start_server(root.path()).await;
    let mut session = ClientSession::connect(addr).await.unwrap();
    session.catalog().await.unwrap();

    let report = session
        .download_all(&["big.bin", "after.txt"], dest.path(), &NoopCallback)
        .await;

    assert!(report.is_complete());
    assert_eq!(report.saved.len(), 2);
    assert_eq!(std::fs::read(dest.path().join("big.bin")).unwrap(), content);
    assert_eq!(std::fs::read(dest.path().join("after.txt")).unwrap(), b"tail");
}

/// 不存在的文件：返回错误信息，不创建本地文件，连接继续可用
#[tokio::test]
async fn test_missing_file_creates_nothing() {
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("a.txt"), b"hello").unwrap();
    let dest = tempfile::tempdir().unwrap();

    let addr = start_server(root.path()).await;
    let mut session = ClientSession::connect(addr).await.unwrap();
    session.catalog().await.unwrap();

    let report = session
        .download_all(&["ghost.txt", "a.txt"], dest.path(), &NoopCallback)
        .await;

    assert!(report.is_complete());
    assert_eq!(
        report.rejected,
        vec![("ghost.txt".to_string(), ERR_FILE_NOT_FOUND.to_string())]
    );
    assert_eq!(report.saved, vec![dest.path().join("a.txt")]);
    assert!(!dest.path().join("ghost.txt").exists());
}

/// 无效命令返回固定错误，连接继续可用
#[tokio::test]
async fn test_invalid_command() {
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("a.txt"), b"hello").unwrap();
    let addr = start_server(root.path()).await;

    let mut raw = RawClient::connect(addr).await;
    raw.send("FETCH a.txt").await;
    assert_eq!(raw.read_line().await, ERR_INVALID_COMMAND);
    raw.send("list").await;
    assert_eq!(raw.read_line().await, ERR_INVALID_COMMAND);

    raw.send("LIST").await;
    assert_eq!(raw.read_line().await, "a.txt");
}

/// EXIT 后连接关闭，后续读取立即得到 EOF 或错误而不是挂起
#[tokio::test]
async fn test_exit_closes_connection() {
    let root = tempfile::tempdir().unwrap();
    let addr = start_server(root.path()).await;

    let mut raw = RawClient::connect(addr).await;
    raw.send("EXIT").await;
    assert_eq!(raw.read_line().await, "Goodbye!");

    // 写入可能仍然成功（数据进入内核缓冲区），读取必须结束
    let _ = raw.writer.write_all(b"LIST\n").await;
    let mut rest = Vec::new();
    let read = tokio::time::timeout(Duration::from_secs(5), raw.reader.read_to_end(&mut rest))
        .await
        .expect("read after EXIT must not hang");
    if let Ok(n) = read {
        assert_eq!(n, 0);
    }
}

/// 共享目录不存在时拒绝启动
#[tokio::test]
async fn test_missing_shared_root() {
    let parent = tempfile::tempdir().unwrap();
    let settings = ServerSettings {
        bind_addr: "127.0.0.1".parse().unwrap(),
        port: 0,
        shared_dir: parent.path().join("does-not-exist"),
    };

    let err = Server::bind(&settings).await.err().unwrap();
    assert!(matches!(err, ServerError::SharedRootMissing(_)));
    assert!(!parent.path().join("does-not-exist").exists());
}

/// 一个卡住的会话不影响其他连接
#[tokio::test]
async fn test_stalled_session_does_not_block_others() {
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("a.txt"), b"hello").unwrap();
    let addr = start_server(root.path()).await;

    // 请求下载后不发送确认，该会话会一直等待
    let mut stalled = RawClient::connect(addr).await;
    stalled.send("DOWNLOAD a.txt").await;
    assert_eq!(stalled.read_line().await, "SIZE 5");

    let dest = tempfile::tempdir().unwrap();
    let mut session = ClientSession::connect(addr).await.unwrap();
    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        session.download("a.txt", dest.path(), &NoopCallback),
    )
    .await
    .unwrap()
    .unwrap();
    assert!(matches!(outcome, DownloadOutcome::Saved { bytes: 5, .. }));
}

/// 传输中途断开：中止剩余队列，已完成的文件保留
#[tokio::test]
async fn test_transfer_fault_aborts_queue() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // 模拟服务端：第一个文件正常，第二个文件只发送部分内容后断开
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);
        let mut line = String::new();

        writer.write_all(b"hi\n").await.unwrap();

        reader.read_line(&mut line).await.unwrap();
        assert_eq!(line, "DOWNLOAD first.txt\n");
        writer.write_all(b"SIZE 5\n").await.unwrap();
        line.clear();
        reader.read_line(&mut line).await.unwrap();
        writer.write_all(b"hello").await.unwrap();

        line.clear();
        reader.read_line(&mut line).await.unwrap();
        assert_eq!(line, "DOWNLOAD second.txt\n");
        writer.write_all(b"SIZE 10\n").await.unwrap();
        line.clear();
        reader.read_line(&mut line).await.unwrap();
        writer.write_all(b"abc").await.unwrap();
    });

    let dest = tempfile::tempdir().unwrap();
    let mut session = ClientSession::connect(addr).await.unwrap();
    let report = session
        .download_all(
            &["first.txt", "second.txt", "third.txt"],
            dest.path(),
            &NoopCallback,
        )
        .await;

    assert_eq!(report.saved, vec![dest.path().join("first.txt")]);
    assert_eq!(std::fs::read(dest.path().join("first.txt")).unwrap(), b"hello");

    let failure = report.failure.expect("queue should abort");
    assert_eq!(failure.file, "second.txt");
    assert!(matches!(
        failure.error,
        TransferError::Truncated {
            received: 3,
            expected: 10
        }
    ));
    assert!(!dest.path().join("third.txt").exists());
}
