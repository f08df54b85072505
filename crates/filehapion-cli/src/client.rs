//! 下载进度输出

use filehapion_core::{DownloadCallback, TransferError};
use std::io::Write;
use std::path::Path;

/// 在终端打印下载进度的回调
pub struct ConsoleProgress;

impl DownloadCallback for ConsoleProgress {
    fn on_progress(&self, file: &str, received: u64, total: u64) {
        let percent = if total == 0 {
            100.0
        } else {
            received as f64 / total as f64 * 100.0
        };
        print!("\r   {} {:>5.1}% ({}/{} bytes)", file, percent, received, total);
        let _ = std::io::stdout().flush();
    }

    fn on_complete(&self, file: &str, path: &Path) {
        println!("\r✅ {} -> {}", file, path.display());
    }

    fn on_rejected(&self, file: &str, reason: &str) {
        eprintln!("❌ {}: {}", file, reason);
    }

    fn on_error(&self, file: &str, error: &TransferError) {
        println!();
        eprintln!("❌ 下载 {} 失败: {}", file, error);
    }
}
