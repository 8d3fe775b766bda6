//! 内容识别：流式 SHA-512 + 注册表反查文件名
use sha2::{Digest, Sha512};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

use crate::registry::ModRegistry;

/// 读取块大小；大 jar 分块喂给哈希，不整读进内存
pub(crate) const CHUNK_SIZE: usize = 64 * 1024;

/// 识别失败的原因（均不是错误，只影响"可疑"标记与日志）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownReason {
    /// 注册表返回非 200
    NotRegistered,
    /// 请求失败（超时、连接被拒等）或响应体无法解读
    RegistryFailed,
    /// 本地文件无法读取
    Unreadable,
}

/// 单个文件的识别结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identification {
    /// 注册表中的真实文件名
    Known(String),
    Unknown(UnknownReason),
}

impl Identification {
    pub fn is_known(&self) -> bool {
        matches!(self, Identification::Known(_))
    }
}

/// 识别器接口（流水线只依赖这一层）
pub trait Identify {
    fn identify(&self, path: &Path) -> Identification;
}

/// 计算文件内容的 SHA-512（小写十六进制，128 字符）
pub fn sha512_file(path: &Path) -> io::Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha512::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 { break; }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// 基于注册表的内容识别器
pub struct ContentIdentifier<R> {
    registry: R,
}

impl<R: ModRegistry> ContentIdentifier<R> {
    pub fn new(registry: R) -> Self {
        Self { registry }
    }
}

impl<R: ModRegistry> Identify for ContentIdentifier<R> {
    fn identify(&self, path: &Path) -> Identification {
        let digest = match sha512_file(path) {
            Ok(d) => d,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot hash file, treating as unknown");
                return Identification::Unknown(UnknownReason::Unreadable);
            }
        };

        match self.registry.lookup(&digest) {
            Ok(Some(name)) => {
                debug!(path = %path.display(), resolved = %name, "identified");
                Identification::Known(name)
            }
            Ok(None) => Identification::Unknown(UnknownReason::NotRegistered),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "registry lookup failed, treating as unknown");
                Identification::Unknown(UnknownReason::RegistryFailed)
            }
        }
    }
}
