//! 错误分类（对运行而言均为致命错误）
use thiserror::Error;

/// 扫描过程中可能出现的致命错误
///
/// 注意：内容识别失败（未找到、网络抖动、文件不可读）不属于错误，
/// 而是 `Identification::Unknown`，见 identify.rs。
#[derive(Debug, Error)]
pub enum ScanError {
    /// 远端服务不可达（传输失败或非成功状态码）
    #[error("{service} unavailable: {reason}")]
    Unavailable { service: &'static str, reason: String },

    /// 响应内容与期望结构不符
    #[error("malformed response from {service}: {reason}")]
    Malformed { service: &'static str, reason: String },

    /// 匹配配置退化（名称列表为空等）
    #[error("invalid pattern configuration: {0}")]
    InvalidPattern(String),
}

impl ScanError {
    pub(crate) fn unavailable(service: &'static str, reason: impl ToString) -> Self {
        Self::Unavailable { service, reason: reason.to_string() }
    }

    pub(crate) fn malformed(service: &'static str, reason: impl ToString) -> Self {
        Self::Malformed { service, reason: reason.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
