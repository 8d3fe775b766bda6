//! 远端配置（作弊名单 / 启动器名单）加载
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Result, ScanError};

const SERVICE: &str = "config source";

/// 远端 JSON 的原始结构
#[derive(Debug, Clone, Deserialize)]
struct Payload {
    cheats: Vec<String>,
    #[serde(rename = "minecraft-launchers")]
    launchers: Vec<String>,
    /// 合并名单，核心流程不使用
    #[serde(default)]
    all: Vec<String>,
}

/// 单次运行内不可变的配置快照
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    pub cheat_names: Vec<String>,
    pub launcher_names: Vec<String>,
    pub all: Vec<String>,
}

impl Configuration {
    pub fn new<C, L>(cheats: C, launchers: L) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        L: IntoIterator,
        L::Item: Into<String>,
    {
        Self {
            cheat_names: normalize(cheats.into_iter().map(Into::into)),
            launcher_names: normalize(launchers.into_iter().map(Into::into)),
            all: Vec::new(),
        }
    }

    /// 从 JSON 字节解码
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let p: Payload = serde_json::from_slice(bytes).map_err(|e| ScanError::malformed(SERVICE, e))?;
        Ok(Self {
            cheat_names: normalize(p.cheats),
            launcher_names: normalize(p.launchers),
            all: normalize(p.all),
        })
    }
}

/// 去除首尾空白、丢弃空项、保序去重（忽略大小写）
fn normalize(names: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for n in names {
        let n = n.trim();
        if n.is_empty() { continue; }
        if out.iter().any(|o| o.eq_ignore_ascii_case(n)) { continue; }
        out.push(n.to_string());
    }
    out
}

/// 配置来源
pub trait ConfigSource {
    fn load(&self) -> Result<Configuration>;
}

/// 通过 HTTP GET 拉取配置
pub struct HttpConfigSource {
    client: Client,
    url: String,
}

impl HttpConfigSource {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self { client, url: url.into() }
    }
}

impl ConfigSource for HttpConfigSource {
    fn load(&self) -> Result<Configuration> {
        debug!(url = %self.url, "fetching configuration");
        let resp = self.client.get(&self.url).send().map_err(|e| ScanError::unavailable(SERVICE, e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ScanError::unavailable(SERVICE, format!("HTTP {status} from {}", self.url)));
        }
        let body = resp.bytes().map_err(|e| ScanError::unavailable(SERVICE, e))?;
        let config = Configuration::from_json(&body)?;
        info!(
            cheats = config.cheat_names.len(),
            launchers = config.launcher_names.len(),
            "configuration loaded"
        );
        Ok(config)
    }
}
