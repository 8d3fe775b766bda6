//! 公共类型（对外暴露）
use serde::Deserialize;
use std::path::MAIN_SEPARATOR;

/// 搜索结果条目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Folder,
}

/// 搜索服务返回的单个候选（未分类）
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
}

impl Candidate {
    pub fn new(name: impl Into<String>, path: impl Into<String>, entry_type: EntryType) -> Self {
        Self { name: name.into(), path: path.into(), entry_type }
    }

    pub fn file(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, path, EntryType::File)
    }

    pub fn folder(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, path, EntryType::Folder)
    }

    /// 磁盘上的完整路径（目录 + 分隔符 + 文件名）
    pub fn full_path(&self) -> String {
        join_path(&self.path, &self.name)
    }
}

/// 一次查询的结果：总数 + 按索引顺序排列的候选
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    pub total: u64,
    pub candidates: Vec<Candidate>,
}

/// 按平台分隔符拼接目录与文件名（与 Everything 的 path 列保持一致）
pub fn join_path(folder: &str, name: &str) -> String {
    let mut out = String::with_capacity(folder.len() + 1 + name.len());
    out.push_str(folder);
    out.push(MAIN_SEPARATOR);
    out.push_str(name);
    out
}
