//! 命中项（流水线输出单元）
use std::ops::Range;

/// 一条需要上报的结果：解析后的文件名命中了作弊名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// 展示用文件名（识别成功时为注册表文件名）
    pub display_name: String,
    /// 所在目录（始终是磁盘上的原目录）
    pub folder: String,
    /// 目录 + 展示用文件名
    pub full_path: String,
    /// 磁盘上的真实路径（用于"在文件管理器中定位"）
    pub disk_path: String,
    /// 文件名中命中的作弊名（原样大小写）
    pub matched_name: String,
    /// full_path 中所有作弊名出现的字节区间，按位置升序、互不重叠
    pub spans: Vec<Range<usize>>,
    /// 尝试识别但未能识别
    pub suspicious: bool,
}

impl Finding {
    /// 把 full_path 切分为 (片段, 是否高亮)，供渲染器逐段着色
    pub fn segments(&self) -> Vec<(&str, bool)> {
        let mut out = Vec::with_capacity(self.spans.len() * 2 + 1);
        let mut at = 0usize;
        for s in &self.spans {
            if s.start > at { out.push((&self.full_path[at..s.start], false)); }
            out.push((&self.full_path[s.clone()], true));
            at = s.end;
        }
        if at < self.full_path.len() { out.push((&self.full_path[at..], false)); }
        out
    }
}
