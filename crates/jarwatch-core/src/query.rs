//! Everything 搜索表达式（结构化构建，序列化交给适配器）
use std::fmt;

/// Fabric / Forge 在启动器目录中自带的加载器子目录，不属于用户模组
const LOADER_DIRS: &[&str] = &[".fabric", ".forge"];
/// 与启动器无关、但常出现外来 jar 的位置
const LOOSE_LOCATIONS: &[&str] = &["download", "$Recycle.Bin"];

/// 搜索表达式中的一个项
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// `ext:<e>`
    Extension(String),
    /// `path:<p>`
    Path(String),
    /// `!path:<p>`
    NotPath(String),
    /// 项之间为"与"，用尖括号分组：`<a b c>`
    All(Vec<Term>),
    /// 项之间为"或"：`a|b|c`
    Any(Vec<Term>),
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Extension(e) => write!(f, "ext:{e}"),
            Term::Path(p) => write!(f, "path:{p}"),
            Term::NotPath(p) => write!(f, "!path:{p}"),
            Term::All(terms) => {
                f.write_str("<")?;
                write_joined(f, terms, " ")?;
                f.write_str(">")
            }
            Term::Any(terms) => write_joined(f, terms, "|"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, terms: &[Term], sep: &str) -> fmt::Result {
    for (i, t) in terms.iter().enumerate() {
        if i > 0 { f.write_str(sep)?; }
        write!(f, "{t}")?;
    }
    Ok(())
}

/// 顶层查询：各项之间为"与"，以空格连接
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub terms: Vec<Term>,
}

impl SearchQuery {
    /// 构建 jar 扫描查询：
    /// 启动器目录下的 mod 路径（排除加载器子目录），或下载目录 / 回收站中的任意 jar
    pub fn for_launchers<S: AsRef<str>>(launchers: &[S]) -> Self {
        let mut in_launcher: Vec<Term> = LOADER_DIRS.iter().map(|d| Term::NotPath(d.to_string())).collect();
        in_launcher.push(Term::Path("mod".into()));
        in_launcher.push(Term::Any(launchers.iter().map(|l| Term::Path(l.as_ref().to_string())).collect()));

        let loose = Term::All(vec![Term::Any(
            LOOSE_LOCATIONS.iter().map(|l| Term::Path(l.to_string())).collect(),
        )]);

        Self {
            terms: vec![
                Term::Extension("jar".into()),
                Term::Any(vec![Term::All(in_launcher), loose]),
            ],
        }
    }

    /// 序列化为 Everything 查询字符串
    pub fn expression(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_joined(f, &self.terms, " ")
    }
}
