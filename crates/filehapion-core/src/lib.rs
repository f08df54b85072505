//! FileHapion Core Library
//!
//! 局域网内点对点文件共享：一端通过 TCP 共享目录，另一端列出并下载文件。
//!
//! # 模块
//!
//! - **protocol**: 行协议命令与响应
//! - **server**: 监听、会话循环、目录列举、文件发送
//! - **client**: 客户端会话与文件接收
//! - **config**: 服务端/客户端设置
//!
//! # 使用示例
//!
//! ## 共享目录
//!
//! ```ignore
//! use filehapion_core::{Server, ServerSettings};
//!
//! let server = Server::bind(&ServerSettings::default()).await?;
//! println!("连接码: {}", server.connection_code());
//! server.run().await;
//! ```
//!
//! ## 下载文件
//!
//! ```ignore
//! use filehapion_core::{ClientSession, NoopCallback};
//!
//! let mut session = ClientSession::connect("192.168.1.20:5000").await?;
//! let names = session.catalog().await?.entries().to_vec();
//! let report = session.download_all(&names, &dest_dir, &NoopCallback).await;
//! session.exit().await?;
//! ```

pub mod client;
pub mod code;
pub mod config;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod server;
pub mod wire;

pub use client::{
    ClientSession, DownloadCallback, DownloadFailure, DownloadOutcome, DownloadReport,
    FileCatalog, NoopCallback,
};
pub use code::generate_connection_code;
pub use config::{ClientSettings, ServerSettings};
pub use error::{ServerError, TransferError};
pub use logging::LogLevel;
pub use protocol::{Command, DownloadReply, ProtocolError};
pub use server::Server;
