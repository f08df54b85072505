//! FileHapion Daemon
//!
//! 共享服务端进程，负责：
//! - 检查共享目录
//! - 监听 TCP 端口并为每个连接启动会话
//! - Ctrl-C 时退出

mod service;

use anyhow::Result;
use clap::Parser;
use filehapion_core::LogLevel;
use std::net::IpAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "filehapion-daemon", version, about = "FileHapion - 局域网文件共享服务端")]
struct Args {
    /// 监听地址 (默认: 0.0.0.0)
    #[arg(short, long)]
    bind: Option<IpAddr>,
    /// 监听端口 (默认: 5000)
    #[arg(short, long)]
    port: Option<u16>,
    /// 共享目录，必须已存在 (默认: ./shared_files)
    #[arg(short, long)]
    shared_dir: Option<PathBuf>,
    /// TOML 配置文件
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// 日志级别 (未设置 RUST_LOG 时生效)
    #[arg(short, long)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 桥接 log crate（filehapion-core 使用）到 tracing
    let _ = tracing_log::LogTracer::init();

    let default_filter = args
        .log_level
        .map_or_else(|| "info,filehapion_core=debug".to_string(), |l| l.filter_directive());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .try_init();

    let mut settings = filehapion_core::ServerSettings::load(args.config.as_deref());
    if let Some(bind) = args.bind {
        settings.bind_addr = bind;
    }
    if let Some(port) = args.port {
        settings.port = port;
    }
    if let Some(dir) = args.shared_dir {
        settings.shared_dir = dir;
    }

    tracing::info!("FileHapion Daemon starting...");

    tokio::select! {
        res = service::run_service(settings) => {
            if let Err(e) = &res {
                tracing::error!("{:#}", e);
            }
            res
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl-C, shutting down");
            Ok(())
        }
    }
}
