//! Core Service - 启动共享服务器

use anyhow::{Context, Result};
use filehapion_core::{Server, ServerError, ServerSettings};

pub async fn run_service(settings: ServerSettings) -> Result<()> {
    let server = match Server::bind(&settings).await {
        Ok(server) => server,
        Err(ServerError::SharedRootMissing(dir)) => {
            eprintln!("❌ 共享目录不存在: {}", dir.display());
            eprintln!("   请先手动创建该目录后再启动");
            anyhow::bail!("shared folder '{}' does not exist", dir.display());
        }
        Err(e) => {
            return Err(e)
                .with_context(|| format!("failed to listen on {}", settings.listen_addr()));
        }
    };

    let addr = server.local_addr()?;
    println!("📂 共享目录: {}", server.shared_root().display());
    println!("🌐 监听地址: {}", addr);
    println!("🔑 连接码: {}", server.connection_code());

    server.run().await;
    Ok(())
}
