//! 本地设置文件加载（TOML），叠加在默认选项之上
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::options::ScanOptions;

/// 设置文件结构；所有字段可选
///
/// ```toml
/// config_url = "https://example.org/data.json"
/// registry_url = "https://api.modrinth.com"
/// http_timeout_secs = 15
///
/// [daemon]
/// host = "127.0.0.1"
/// port = 8080
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub config_url: Option<String>,
    #[serde(default)]
    pub registry_url: Option<String>,
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,
    #[serde(default)]
    pub daemon: DaemonSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonSettings {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

impl Settings {
    pub fn parse(txt: &str) -> Result<Self> {
        toml::from_str(txt).context("parse settings")
    }

    /// 把已设置的字段覆盖到 `opts`
    pub fn apply(&self, opts: &mut ScanOptions) {
        if let Some(u) = &self.config_url { opts.config_url = u.clone(); }
        if let Some(u) = &self.registry_url { opts.registry_url = u.clone(); }
        if let Some(s) = self.http_timeout_secs { opts.http_timeout = Duration::from_secs(s.max(1)); }
        if let Some(h) = &self.daemon.host { opts.daemon.host = h.clone(); }
        if let Some(p) = self.daemon.port { opts.daemon.port = p; }
    }
}

/// 从文件读取设置
pub fn load_settings(path: &Path) -> Result<Settings> {
    let txt = std::fs::read_to_string(path)
        .with_context(|| format!("read settings file {}", path.display()))?;
    Settings::parse(&txt).with_context(|| format!("invalid settings file {}", path.display()))
}
