//! 扫描选项与统计信息（模块）
use std::fmt;
use std::time::Duration;

/// 远端作弊名单（JSON）默认地址
pub const DEFAULT_CONFIG_URL: &str =
    "https://raw.githubusercontent.com/Grummmy/WitherEye/refs/heads/main/data.json";
/// Modrinth API 默认根地址
pub const DEFAULT_REGISTRY_URL: &str = "https://api.modrinth.com";
/// Everything HTTP 服务默认端口
pub const DEFAULT_DAEMON_PORT: u16 = 80;
/// 单次出站请求的默认超时
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// 本地搜索服务（Everything HTTP server）地址
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonAddress {
    pub host: String,
    pub port: u16,
}

impl DaemonAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }

    /// 仅替换端口（端口探测失败后由操作者输入）
    pub fn with_port(&self, port: u16) -> Self {
        Self { host: self.host.clone(), port }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }
}

impl Default for DaemonAddress {
    fn default() -> Self {
        Self::new("localhost", DEFAULT_DAEMON_PORT)
    }
}

impl fmt::Display for DaemonAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// 扫描选项
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// 远端配置（作弊名单、启动器名单）地址
    pub config_url: String,
    /// 模组注册表根地址（拼接 /v2/version_file/<sha512>）
    pub registry_url: String,
    /// 本地搜索服务地址
    pub daemon: DaemonAddress,
    /// 每个出站 HTTP 请求的截止时间
    pub http_timeout: Duration,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            config_url: DEFAULT_CONFIG_URL.to_string(),
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            daemon: DaemonAddress::default(),
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

/// 扫描统计信息（便于 CLI 打印）
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanStats {
    /// 搜索服务报告的总条目数
    pub total: u64,
    /// 实际处理的候选数（被取消时小于 total）
    pub processed: u64,
    /// 识别成功（注册表返回文件名）
    pub identified: u64,
    /// 尝试识别但未知
    pub unknown: u64,
    /// 未满足识别前置条件而跳过识别
    pub skipped_identification: u64,
    pub findings: u64,
    pub suspicious: u64,
    /// 是否提前结束（取消或接收端关闭）
    pub cancelled: bool,
}
