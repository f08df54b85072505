//! 文件交换文本协议
//!
//! 控制消息均为以 `\n` 结尾的 UTF-8 单行文本，文件内容为原始字节。
//!
//! | 客户端 → 服务端      | 服务端 → 客户端                                  |
//! |----------------------|--------------------------------------------------|
//! | (连接)               | 欢迎语                                           |
//! | `LIST`               | 换行分隔的文件名 + 空行，或 `No files available.` |
//! | `DOWNLOAD <name>`    | `SIZE <n>` 后跟 `n` 字节，或 `ERROR File not found.` |
//! | (SIZE 之后任意文本)  | —                                                |
//! | `EXIT`               | `Goodbye!` 然后关闭                              |
//! | (其他)               | `ERROR Invalid command.`                         |

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

/// 默认监听端口
pub const DEFAULT_PORT: u16 = 5000;

/// 默认监听地址（所有网卡）
pub const DEFAULT_BIND: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// 文件流式传输的分块大小
pub const CHUNK_SIZE: usize = 1024;

pub const GREETING: &str = "Connected to server. You can now browse and download files.";
pub const FAREWELL: &str = "Goodbye!";

/// 空目录时 LIST 返回的哨兵字符串
///
/// 与同名的真实文件无法区分，保留原有行为。
pub const EMPTY_LISTING: &str = "No files available.";

pub const ERR_FILE_NOT_FOUND: &str = "ERROR File not found.";
pub const ERR_INVALID_COMMAND: &str = "ERROR Invalid command.";

/// 客户端收到 SIZE 后发送的确认令牌（服务端不检查内容）
pub const READY: &str = "READY";

const SIZE_PREFIX: &str = "SIZE";

/// 客户端命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Download(String),
    Exit,
    Unknown(String),
}

impl Command {
    /// 解析一行命令
    ///
    /// 动词区分大小写；`DOWNLOAD` 只按第一个空格切分，文件名可以包含空格。
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        match line {
            "LIST" => Command::List,
            "EXIT" => Command::Exit,
            _ => match line.split_once(' ') {
                Some(("DOWNLOAD", name)) => Command::Download(name.to_string()),
                _ => Command::Unknown(line.to_string()),
            },
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::List => write!(f, "LIST"),
            Command::Download(name) => write!(f, "DOWNLOAD {}", name),
            Command::Exit => write!(f, "EXIT"),
            Command::Unknown(text) => write!(f, "{}", text),
        }
    }
}

/// 协议解析错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("Malformed size announcement: {0}")]
    MalformedSize(String),
}

/// DOWNLOAD 的第一条响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadReply {
    /// `SIZE <n>`，随后是 n 字节的文件内容
    Size(u64),
    /// 非 SIZE 响应，内容原样作为错误信息
    Rejected(String),
}

impl DownloadReply {
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let Some(rest) = line.strip_prefix(SIZE_PREFIX) else {
            return Ok(DownloadReply::Rejected(line.to_string()));
        };

        rest.trim()
            .parse::<u64>()
            .map(DownloadReply::Size)
            .map_err(|_| ProtocolError::MalformedSize(line.to_string()))
    }

    pub fn size_line(size: u64) -> String {
        format!("{} {}", SIZE_PREFIX, size)
    }
}

/// 将目录条目编码为 LIST 响应正文（不含结尾空行）
pub fn encode_listing<S: AsRef<str>>(entries: &[S]) -> String {
    if entries.is_empty() {
        return EMPTY_LISTING.to_string();
    }
    entries
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n")
}

/// 解析 LIST 响应正文
///
/// 哨兵字符串被解析为空列表。
pub fn decode_listing(body: &str) -> Vec<String> {
    if body == EMPTY_LISTING {
        return Vec::new();
    }
    body.split('\n')
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
