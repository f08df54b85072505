//! FileHapion CLI
//!
//! 命令行客户端，连接共享服务端列出并下载文件

mod client;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use filehapion_core::{ClientSession, ClientSettings, LogLevel};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "filehapion", version, about = "FileHapion - 局域网文件共享客户端")]
struct Cli {
    /// 服务端端口 (默认: 5000)
    #[arg(short, long, global = true)]
    port: Option<u16>,
    /// TOML 配置文件
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// 详细日志
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 列出共享文件
    List {
        /// 服务端地址
        host: String,
    },
    /// 下载文件
    Download {
        /// 服务端地址
        host: String,
        /// 要下载的文件名
        files: Vec<String>,
        /// 下载全部文件
        #[arg(short, long)]
        all: bool,
        /// 保存目录 (默认: 桌面)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut settings = ClientSettings::load(cli.config.as_deref());
    if let Some(port) = cli.port {
        settings.port = port;
    }

    match cli.command {
        Commands::List { host } => {
            let mut session = ClientSession::connect((host.as_str(), settings.port)).await?;
            println!("🔗 {}", session.greeting());

            let catalog = session.catalog().await?;
            if catalog.is_empty() {
                println!("   没有可用文件");
            } else {
                for (i, name) in catalog.iter().enumerate() {
                    println!("   [{}] {}", i, name);
                }
            }
            session.exit().await?;
        }
        Commands::Download {
            host,
            files,
            all,
            output,
        } => {
            let dest = output.unwrap_or(settings.download_dir);
            let mut session = ClientSession::connect((host.as_str(), settings.port)).await?;
            println!("🔗 {}", session.greeting());

            let catalog = session.catalog().await?;
            let queue: Vec<String> = if all {
                catalog.entries().to_vec()
            } else {
                for name in files.iter().filter(|name| !catalog.contains(name)) {
                    eprintln!("⚠️  {} 不在服务端文件列表中", name);
                }
                files
            };
            if queue.is_empty() {
                bail!("请至少指定一个要下载的文件，或使用 --all");
            }

            println!("📥 下载 {} 个文件到 {}", queue.len(), dest.display());
            let report = session
                .download_all(&queue, &dest, &client::ConsoleProgress)
                .await;

            println!(
                "完成: {} 个已保存, {} 个被拒绝",
                report.saved.len(),
                report.rejected.len()
            );
            if let Some(failure) = report.failure {
                bail!("下载 {} 时中止: {}", failure.file, failure.error);
            }
            session.exit().await?;
        }
    }

    Ok(())
}

/// 初始化日志系统
///
/// 默认只输出警告；`--verbose` 时输出调试日志；设置 RUST_LOG 时以其为准。
fn init_logging(verbose: bool) {
    // 桥接 log crate（filehapion-core 使用）到 tracing
    let _ = tracing_log::LogTracer::init();

    let level = if verbose { LogLevel::Debug } else { LogLevel::Warn };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(level.filter_directive())),
        )
        .try_init();
}
