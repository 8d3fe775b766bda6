//! jarwatch 核心库
//!
//! 设计要点：
//! - 远端配置（作弊名单 / 启动器名单）每次运行拉取一次，编译为只读的 `PatternSet`。
//! - 候选来自本地 Everything 索引，按索引顺序逐个分类，不并行、不重排、不去重。
//! - 位于启动器目录（非库目录）的 jar 先做 SHA-512 并向 Modrinth 反查真实文件名；
//!   反查失败只会把命中项标记为"可疑"，不会中断扫描。
//! - 配置源 / 搜索索引失败、匹配配置退化属于致命错误，不输出部分结果。

mod config;
mod error;
mod events;
mod findings;
mod http;
mod identify;
mod options;
mod patterns;
mod query;
mod registry;
mod scan;
mod search;
mod settings;
mod types;

#[cfg(test)]
mod testing;

pub use config::{ConfigSource, Configuration, HttpConfigSource};
pub use error::{Result, ScanError};
pub use events::{CancelToken, Reporter, ScanEvent};
pub use findings::Finding;
pub use http::build_client;
pub use identify::{sha512_file, ContentIdentifier, Identification, Identify, UnknownReason};
pub use options::{
    DaemonAddress, ScanOptions, ScanStats, DEFAULT_CONFIG_URL, DEFAULT_DAEMON_PORT, DEFAULT_HTTP_TIMEOUT,
    DEFAULT_REGISTRY_URL,
};
pub use patterns::PatternSet;
pub use query::{SearchQuery, Term};
pub use registry::{ModRegistry, ModrinthRegistry};
pub use scan::{plan_scan, scan_and_report, spawn_scan, Classified, Pipeline, ScanPlan};
pub use search::{daemon_reachable, search_url, EverythingClient, SearchIndex};
pub use settings::{load_settings, DaemonSettings, Settings};
pub use types::{join_path, Candidate, EntryType, SearchResults};
