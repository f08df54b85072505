//! 客户端会话
//!
//! 一个会话独占一条连接：连接后 LIST 一次得到文件目录，
//! 之后在同一连接上逐个 DOWNLOAD，每次传输完成后才发出下一个请求。

use log::{debug, info, warn};
use std::net::SocketAddr;
use std::path::Path;
use tokio::io::BufReader;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::client::receiver::receive_to_file;
use crate::client::{
    DownloadCallback, DownloadFailure, DownloadOutcome, DownloadReport, FileCatalog,
};
use crate::error::TransferError;
use crate::protocol::{Command, DownloadReply, READY};
use crate::wire;

/// 与服务端的一条连接
pub struct ClientSession {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    peer: SocketAddr,
    greeting: String,
    catalog: Option<FileCatalog>,
}

impl ClientSession {
    /// 连接服务端并读取欢迎语
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self, TransferError> {
        let stream = TcpStream::connect(addr).await?;
        let peer = stream.peer_addr()?;
        let (reader, writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        let greeting = wire::read_line(&mut reader)
            .await?
            .ok_or(TransferError::Closed)?;
        info!("Connected to {}: {}", peer, greeting);

        Ok(Self {
            reader,
            writer,
            peer,
            greeting,
            catalog: None,
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    /// 获取文件目录
    ///
    /// 每个连接只发送一次 LIST，之后返回缓存结果。
    pub async fn catalog(&mut self) -> Result<&FileCatalog, TransferError> {
        let catalog = match self.catalog.take() {
            Some(catalog) => catalog,
            None => self.fetch_catalog().await?,
        };
        Ok(self.catalog.insert(catalog))
    }

    async fn fetch_catalog(&mut self) -> Result<FileCatalog, TransferError> {
        self.send(&Command::List).await?;

        let mut lines = Vec::new();
        loop {
            let line = self.read_line().await?;
            if line.is_empty() {
                break;
            }
            lines.push(line);
        }

        let catalog = FileCatalog::from_listing(&lines.join("\n"));
        debug!("Catalog from {}: {} entries", self.peer, catalog.len());
        Ok(catalog)
    }

    /// 下载单个文件到 `dest_dir`
    ///
    /// 服务端拒绝（如文件不存在）时返回 [`DownloadOutcome::Rejected`]，不会创建本地文件。
    pub async fn download<C: DownloadCallback + ?Sized>(
        &mut self,
        name: &str,
        dest_dir: &Path,
        callback: &C,
    ) -> Result<DownloadOutcome, TransferError> {
        self.send(&Command::Download(name.to_string())).await?;

        let reply = self.read_line().await?;
        let expected = match DownloadReply::parse(&reply)? {
            DownloadReply::Size(size) => size,
            DownloadReply::Rejected(message) => {
                warn!("Download of '{}' rejected: {}", name, message);
                callback.on_rejected(name, &message);
                return Ok(DownloadOutcome::Rejected(message));
            }
        };

        wire::write_line(&mut self.writer, READY).await?;

        tokio::fs::create_dir_all(dest_dir)
            .await
            .map_err(|source| TransferError::Storage {
                path: dest_dir.to_path_buf(),
                source,
            })?;
        let path = dest_dir.join(name);

        let bytes = receive_to_file(&mut self.reader, &path, expected, |received| {
            callback.on_progress(name, received, expected);
        })
        .await?;

        info!("File '{}' downloaded to {}", name, path.display());
        callback.on_complete(name, &path);
        Ok(DownloadOutcome::Saved { path, bytes })
    }

    /// 依次下载多个文件
    ///
    /// 遇到第一个连接或文件系统错误时中止剩余队列；已完成的文件保留在磁盘上。
    pub async fn download_all<S, C>(
        &mut self,
        names: &[S],
        dest_dir: &Path,
        callback: &C,
    ) -> DownloadReport
    where
        S: AsRef<str>,
        C: DownloadCallback + ?Sized,
    {
        let mut report = DownloadReport::default();

        for name in names {
            let name = name.as_ref();
            match self.download(name, dest_dir, callback).await {
                Ok(DownloadOutcome::Saved { path, .. }) => report.saved.push(path),
                Ok(DownloadOutcome::Rejected(message)) => {
                    report.rejected.push((name.to_string(), message));
                }
                Err(error) => {
                    callback.on_error(name, &error);
                    report.failure = Some(DownloadFailure {
                        file: name.to_string(),
                        error,
                    });
                    break;
                }
            }
        }

        report
    }

    /// 发送 EXIT 并关闭连接，返回服务端的告别语
    pub async fn exit(mut self) -> Result<String, TransferError> {
        self.send(&Command::Exit).await?;
        let farewell = self.read_line().await?;
        debug!("Disconnected from {}: {}", self.peer, farewell);
        Ok(farewell)
    }

    async fn send(&mut self, command: &Command) -> Result<(), TransferError> {
        wire::write_line(&mut self.writer, &command.to_string()).await?;
        Ok(())
    }

    async fn read_line(&mut self) -> Result<String, TransferError> {
        wire::read_line(&mut self.reader)
            .await?
            .ok_or(TransferError::Closed)
    }
}
