//! 本地搜索服务（Everything HTTP server）适配器
use reqwest::blocking::Client;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Result, ScanError};
use crate::options::DaemonAddress;
use crate::query::SearchQuery;
use crate::types::{Candidate, SearchResults};

const SERVICE: &str = "search index";

/// 搜索服务 JSON 响应
#[derive(Debug, Deserialize)]
struct Response {
    #[serde(rename = "totalResults")]
    total_results: u64,
    #[serde(default)]
    results: Vec<Candidate>,
}

/// 搜索索引
pub trait SearchIndex {
    fn query(&self, query: &SearchQuery) -> Result<SearchResults>;
}

/// 通过 HTTP 访问 Everything
pub struct EverythingClient {
    client: Client,
    daemon: DaemonAddress,
}

impl EverythingClient {
    pub fn new(client: Client, daemon: DaemonAddress) -> Self {
        Self { client, daemon }
    }

    pub fn daemon(&self) -> &DaemonAddress {
        &self.daemon
    }
}

impl SearchIndex for EverythingClient {
    fn query(&self, query: &SearchQuery) -> Result<SearchResults> {
        let url = search_url(&self.daemon, query)?;
        debug!(%url, "querying search index");

        let resp = self.client.get(url).send().map_err(|e| ScanError::unavailable(SERVICE, e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ScanError::unavailable(SERVICE, format!("HTTP {status} from {}", self.daemon)));
        }
        let body = resp.bytes().map_err(|e| ScanError::unavailable(SERVICE, e))?;
        let results = decode_results(&body)?;
        info!(total = results.total, returned = results.candidates.len(), "search index answered");
        Ok(results)
    }
}

/// 服务是否在线：任何 HTTP 响应（不论状态码）都算可达
pub fn daemon_reachable(client: &Client, daemon: &DaemonAddress) -> bool {
    match client.get(daemon.base_url()).send() {
        Ok(resp) => {
            debug!(daemon = %daemon, status = %resp.status(), "probe answered");
            true
        }
        Err(e) => {
            debug!(daemon = %daemon, error = %e, "probe failed");
            false
        }
    }
}

/// `http://host:port/?s=<表达式>&j=1&path_column=1`
pub fn search_url(daemon: &DaemonAddress, query: &SearchQuery) -> Result<Url> {
    Url::parse_with_params(
        &daemon.base_url(),
        &[("s", query.expression().as_str()), ("j", "1"), ("path_column", "1")],
    )
    .map_err(|e| ScanError::unavailable(SERVICE, format!("invalid daemon address {daemon}: {e}")))
}

/// 解码 JSON 响应体
pub fn decode_results(bytes: &[u8]) -> Result<SearchResults> {
    let r: Response = serde_json::from_slice(bytes).map_err(|e| ScanError::malformed(SERVICE, e))?;
    Ok(SearchResults { total: r.total_results, candidates: r.results })
}
