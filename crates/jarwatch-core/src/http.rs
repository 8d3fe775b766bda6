//! 共享的阻塞 HTTP 客户端
use reqwest::blocking::Client;
use std::time::Duration;

use crate::error::{Result, ScanError};

/// 构建带超时的客户端；各适配器共用同一实例
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("jarwatch/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ScanError::unavailable("http client", e))
}
