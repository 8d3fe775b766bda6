//! 模组注册表（Modrinth version_file 接口）
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, ScanError};

const SERVICE: &str = "mod registry";

#[derive(Debug, Deserialize)]
struct VersionFile {
    #[serde(default)]
    files: Vec<FileEntry>,
}

#[derive(Debug, Deserialize)]
struct FileEntry {
    filename: Option<String>,
}

/// 按内容摘要查询文件名
///
/// - `Ok(Some(name))`：注册表认识该文件
/// - `Ok(None)`：非 200 响应（包括 404），视为未知
/// - `Err(_)`：传输失败或 200 响应体无法解读
pub trait ModRegistry {
    fn lookup(&self, digest: &str) -> Result<Option<String>>;
}

pub struct ModrinthRegistry {
    client: Client,
    base_url: String,
}

impl ModrinthRegistry {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self { client, base_url: base_url.into() }
    }

    pub fn version_file_url(&self, digest: &str) -> String {
        format!("{}/v2/version_file/{digest}?algorithm=sha512", self.base_url.trim_end_matches('/'))
    }
}

impl ModRegistry for ModrinthRegistry {
    fn lookup(&self, digest: &str) -> Result<Option<String>> {
        let url = self.version_file_url(digest);
        let resp = self.client.get(&url).send().map_err(|e| ScanError::unavailable(SERVICE, e))?;
        if resp.status() != StatusCode::OK {
            debug!(status = %resp.status(), "registry does not know digest");
            return Ok(None);
        }
        let body = resp.bytes().map_err(|e| ScanError::unavailable(SERVICE, e))?;
        decode_filename(&body).map(Some)
    }
}

/// 取 `files[0].filename`
pub fn decode_filename(bytes: &[u8]) -> Result<String> {
    let v: VersionFile = serde_json::from_slice(bytes).map_err(|e| ScanError::malformed(SERVICE, e))?;
    v.files
        .into_iter()
        .next()
        .and_then(|f| f.filename)
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| ScanError::malformed(SERVICE, "response has no files[0].filename"))
}
