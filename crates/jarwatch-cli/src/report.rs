//! 渲染器：交互式（进度条 + 可定位的条目）与批处理（逐行输出）
use anyhow::{Context, Result};
use console::Style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use jarwatch_core::{Finding, Reporter, ScanEvent, ScanStats};
use std::io::{BufRead, Write};

use crate::reveal::reveal;

const SUSPICIOUS_MARK: &str = "[?]";
const FOLDER_PREFIX: &str = "    ┗╸ ";

/// 着色方案；`colors = false` 时输出纯文本
#[derive(Debug, Clone)]
pub struct Palette {
    plain: Style,
    emphasis: Style,
    warn: Style,
    warn_emphasis: Style,
    dim: Style,
}

impl Palette {
    pub fn new(colors: bool) -> Self {
        let base = Style::new().force_styling(colors);
        Self {
            plain: base.clone(),
            emphasis: base.clone().reverse(),
            warn: base.clone().yellow(),
            warn_emphasis: base.clone().yellow().reverse(),
            dim: base.dim(),
        }
    }

    /// 高亮 full_path 中所有作弊名；可疑项整体使用警示色
    pub fn path(&self, f: &Finding) -> String {
        let (plain, hit) = if f.suspicious { (&self.warn, &self.warn_emphasis) } else { (&self.plain, &self.emphasis) };
        f.segments()
            .into_iter()
            .map(|(s, emphasized)| if emphasized { hit.apply_to(s).to_string() } else { plain.apply_to(s).to_string() })
            .collect()
    }

    pub fn folder(&self, f: &Finding) -> String {
        format!("{FOLDER_PREFIX}{}", self.dim.apply_to(&f.folder))
    }

    pub fn marker(&self, f: &Finding) -> String {
        if f.suspicious { format!("{} ", self.warn.apply_to(SUSPICIOUS_MARK)) } else { String::new() }
    }
}

fn summary(stats: &ScanStats) -> String {
    let mut s = format!(
        "Scanned {}/{} entries: {} match(es), {} suspicious; registry identified {}, unidentified {}",
        stats.processed, stats.total, stats.findings, stats.suspicious, stats.identified, stats.unknown
    );
    if stats.cancelled { s.push_str(" (interrupted)"); }
    s
}

/// 批处理渲染器：每个命中两行，结束时输出汇总；不显示进度
pub struct BatchReporter<W: Write> {
    out: W,
    palette: Palette,
}

impl<W: Write> BatchReporter<W> {
    pub fn new(out: W, colors: bool) -> Self {
        Self { out, palette: Palette::new(colors) }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for BatchReporter<W> {
    fn handle(&mut self, event: &ScanEvent) -> Result<()> {
        match event {
            ScanEvent::Progress { .. } => {}
            ScanEvent::Finding(f) => {
                writeln!(self.out, "{}{}", self.palette.marker(f), self.palette.path(f)).context("write finding")?;
                writeln!(self.out, "{}", self.palette.folder(f)).context("write finding")?;
            }
            ScanEvent::Finished(stats) => {
                writeln!(self.out).context("write summary")?;
                writeln!(self.out, "{}", summary(stats)).context("write summary")?;
                self.out.flush().context("flush output")?;
            }
        }
        Ok(())
    }
}

/// 交互式渲染器：顶部实时 `processed / total`，命中项编号追加，结束后可按编号定位文件
pub struct InteractiveReporter {
    bar: ProgressBar,
    palette: Palette,
    entries: Vec<Finding>,
}

impl InteractiveReporter {
    pub fn new() -> Result<Self> {
        let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stdout());
        bar.set_style(
            ProgressStyle::with_template(" {pos} / {len} [{bar:40.green/dim}] {msg}")
                .context("progress template")?
                .progress_chars("##-"),
        );
        bar.set_message("loading...");
        Ok(Self { bar, palette: Palette::new(console::colors_enabled()), entries: Vec::new() })
    }

    pub fn entries(&self) -> &[Finding] {
        &self.entries
    }

    /// 扫描结束后的定位循环：输入编号打开文件管理器，空行或 EOF 退出
    pub fn reveal_prompt<R: BufRead, O: Write>(&self, input: &mut R, out: &mut O) -> Result<()> {
        if self.entries.is_empty() { return Ok(()); }
        loop {
            write!(out, "Entry number to reveal in file manager (Enter to quit): ")?;
            out.flush()?;
            let mut line = String::new();
            if input.read_line(&mut line)? == 0 { return Ok(()); }
            let t = line.trim();
            if t.is_empty() { return Ok(()); }
            match pick_entry(&self.entries, t) {
                Some(f) => reveal(&f.disk_path),
                None => writeln!(out, "No entry {t}.")?,
            }
        }
    }
}

/// 用户输入的编号从 1 开始
fn pick_entry<'a>(entries: &'a [Finding], answer: &str) -> Option<&'a Finding> {
    let n: usize = answer.parse().ok()?;
    n.checked_sub(1).and_then(|i| entries.get(i))
}

impl Reporter for InteractiveReporter {
    fn handle(&mut self, event: &ScanEvent) -> Result<()> {
        match event {
            ScanEvent::Progress { processed, total } => {
                self.bar.set_length(*total);
                self.bar.set_position(*processed);
                self.bar.set_message("scanning");
            }
            ScanEvent::Finding(f) => {
                self.entries.push(f.clone());
                let line = format!(
                    "{:>3}) {}{}\n     {}",
                    self.entries.len(),
                    self.palette.marker(f),
                    self.palette.path(f),
                    self.palette.folder(f)
                );
                self.bar.println(line);
            }
            ScanEvent::Finished(stats) => {
                self.bar.finish_with_message(summary(stats));
            }
        }
        Ok(())
    }
}
