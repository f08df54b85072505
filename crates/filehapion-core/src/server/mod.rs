//! 共享服务端
//!
//! 包含:
//! - TCP 监听与连接接收
//! - 每连接一个任务的命令循环
//! - 目录列举与文件分块发送

pub mod lister;
pub mod sender;
pub mod session;

use log::{info, warn};
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::code::generate_connection_code;
use crate::config::ServerSettings;
use crate::error::ServerError;

/// 文件共享服务器
pub struct Server {
    listener: TcpListener,
    shared_root: Arc<PathBuf>,
    connection_code: String,
}

impl Server {
    /// 检查共享目录并绑定监听地址
    ///
    /// 共享目录不存在时直接失败，不会自动创建，也不会绑定端口。
    pub async fn bind(settings: &ServerSettings) -> Result<Self, ServerError> {
        let is_dir = tokio::fs::metadata(&settings.shared_dir)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(ServerError::SharedRootMissing(settings.shared_dir.clone()));
        }

        let shared_root = tokio::fs::canonicalize(&settings.shared_dir)
            .await
            .unwrap_or_else(|_| settings.shared_dir.clone());

        let listener = TcpListener::bind(settings.listen_addr()).await?;
        let connection_code = generate_connection_code();

        info!("Server started on {}", listener.local_addr()?);
        info!("Connection code: {}", connection_code);
        info!("Shared folder: {}", shared_root.display());

        Ok(Self {
            listener,
            shared_root: Arc::new(shared_root),
            connection_code,
        })
    }

    /// 实际监听地址（端口为 0 时可获取系统分配的端口）
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn connection_code(&self) -> &str {
        &self.connection_code
    }

    pub fn shared_root(&self) -> &Path {
        &self.shared_root
    }

    /// 持续接收连接，每个连接在独立任务中处理
    ///
    /// 单个会话的错误或 panic 不会影响监听循环。
    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let shared_root = Arc::clone(&self.shared_root);
                    tokio::spawn(async move {
                        session::handle_connection(stream, peer, &shared_root).await;
                    });
                }
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                }
            }
        }
    }

    /// 在后台任务中运行服务器
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
