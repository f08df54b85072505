//! 服务端与客户端配置
//!
//! 配置可以从 TOML 文件加载，未出现的字段使用默认值。

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use crate::protocol::{DEFAULT_BIND, DEFAULT_PORT};

/// 默认共享目录（相对于当前工作目录）
pub const DEFAULT_SHARED_DIR: &str = "shared_files";

/// 服务端设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// 监听地址
    pub bind_addr: IpAddr,
    /// 监听端口
    pub port: u16,
    /// 共享目录，必须事先存在
    pub shared_dir: PathBuf,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND,
            port: DEFAULT_PORT,
            shared_dir: PathBuf::from(DEFAULT_SHARED_DIR),
        }
    }
}

impl ServerSettings {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    /// 加载设置（未指定文件或读取失败时使用默认值）
    pub fn load(path: Option<&Path>) -> Self {
        load_or_default(path)
    }
}

/// 客户端设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// 服务端端口
    pub port: u16,
    /// 下载目录
    pub download_dir: PathBuf,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            download_dir: default_download_dir(),
        }
    }
}

impl ClientSettings {
    pub fn load(path: Option<&Path>) -> Self {
        load_or_default(path)
    }
}

/// 默认下载目录：用户桌面
fn default_download_dir() -> PathBuf {
    dirs::desktop_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Desktop")))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn load_or_default<T>(path: Option<&Path>) -> T
where
    T: Default + for<'de> Deserialize<'de>,
{
    let Some(path) = path else {
        return T::default();
    };

    match fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", path);
                return settings;
            }
            Err(e) => {
                warn!("Failed to parse settings: {}, using defaults", e);
            }
        },
        Err(e) => {
            warn!("Failed to read settings file: {}, using defaults", e);
        }
    }
    T::default()
}
