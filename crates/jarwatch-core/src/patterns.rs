//! 匹配器集合：作弊名 / 库目录 / 启动器目录
use regex::{Regex, RegexBuilder};
use std::ops::Range;

use crate::config::Configuration;
use crate::error::{Result, ScanError};

/// 库目录关键字（需出现在启动器名之后）
const LIBRARY_WORDS: &[&str] = &["lib", "libs", "library", "libraries"];
/// 除启动器名外，下载目录同样视为"模组可能出现的位置"
const DOWNLOADS_WORD: &str = "downloads";

/// 由一份配置快照编译得到的三个匹配器，构建后只读
///
/// 词边界只按 ASCII 判断（`[0-9A-Za-z_]` 为单词字符），非 ASCII 字母不与名称粘连。
/// 作弊名另外把驼峰切换（小写后接大写）视为边界，`WurstClient` 中可命中 `wurst`。
#[derive(Debug, Clone)]
pub struct PatternSet {
    /// 不含边界的名称备选，边界由 `word_bounded` 校验
    cheat: Regex,
    library: Regex,
    launcher_path: Regex,
}

impl PatternSet {
    /// 编译配置；任一名单为空时拒绝（空的备选分支会退化为"全匹配"或"全不匹配"）
    pub fn compile(config: &Configuration) -> Result<Self> {
        if config.cheat_names.is_empty() {
            return Err(ScanError::InvalidPattern("cheat name list is empty".into()));
        }
        if config.launcher_names.is_empty() {
            return Err(ScanError::InvalidPattern("launcher name list is empty".into()));
        }

        // 长名优先，同一位置先尝试最长的名称
        let mut by_length: Vec<&str> = config.cheat_names.iter().map(String::as_str).collect();
        by_length.sort_by(|a, b| b.len().cmp(&a.len()));
        let cheats = alternation(by_length.into_iter());
        let launchers = alternation(config.launcher_names.iter().map(String::as_str));
        let libs = alternation(LIBRARY_WORDS.iter().copied());
        let launcher_or_downloads = alternation(
            config.launcher_names.iter().map(String::as_str).chain([DOWNLOADS_WORD]),
        );

        Ok(Self {
            cheat: build(&format!(r"(?:{cheats})"))?,
            library: build(&format!(r"(?-u:\b)(?:{launchers})(?-u:\b).*(?-u:\b)(?:{libs})(?-u:\b)"))?,
            launcher_path: build(&format!(r"(?-u:\b)(?:{launcher_or_downloads})(?-u:\b)"))?,
        })
    }

    /// 名称中第一个作弊名命中的位置
    pub fn cheat_match(&self, name: &str) -> Option<Range<usize>> {
        self.cheat_hits(name).next()
    }

    /// 文本中所有作弊名命中的位置（用于高亮完整路径）
    pub fn cheat_spans(&self, text: &str) -> Vec<Range<usize>> {
        self.cheat_hits(text).collect()
    }

    /// 逐个候选位置查找，两端都满足边界的才算命中；不满足时从下一个字符继续
    fn cheat_hits<'t>(&'t self, text: &'t str) -> impl Iterator<Item = Range<usize>> + 't {
        let mut pos = 0;
        std::iter::from_fn(move || {
            while pos <= text.len() {
                let m = self.cheat.find_at(text, pos)?;
                if word_bounded(text.as_bytes(), m.start(), m.end()) {
                    pos = m.end();
                    return Some(m.range());
                }
                pos = m.start() + text[m.start()..].chars().next().map_or(1, char::len_utf8);
            }
            None
        })
    }

    /// 路径是否位于某启动器的库目录下
    pub fn is_library_path(&self, path: &str) -> bool {
        self.library.is_match(path)
    }

    /// 路径是否位于某启动器目录或下载目录下
    pub fn is_launcher_path(&self, path: &str) -> bool {
        self.launcher_path.is_match(path)
    }
}

fn is_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// `at` 处（`before` 与 `after` 之间）是否为边界：ASCII 词边界，或小写到大写的驼峰切换
fn boundary(before: Option<u8>, after: Option<u8>) -> bool {
    match (before, after) {
        (Some(b), Some(a)) => is_word(b) != is_word(a) || (b.is_ascii_lowercase() && a.is_ascii_uppercase()),
        (Some(x), None) | (None, Some(x)) => is_word(x),
        (None, None) => false,
    }
}

fn word_bounded(text: &[u8], start: usize, end: usize) -> bool {
    let prev = start.checked_sub(1).map(|i| text[i]);
    let last = end.checked_sub(1).map(|i| text[i]);
    boundary(prev, text.get(start).copied()) && boundary(last, text.get(end).copied())
}

/// 名称按字面量处理，转义后以 | 连接
fn alternation<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.map(regex::escape).collect::<Vec<_>>().join("|")
}

fn build(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| ScanError::InvalidPattern(e.to_string()))
}
