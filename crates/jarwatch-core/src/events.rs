//! 扫描事件、渲染接口与协作式取消
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::findings::Finding;
use crate::options::ScanStats;

/// 流水线发出的事件，顺序与候选顺序一致
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// 已处理 processed 个（含未命中的候选），共 total 个
    Progress { processed: u64, total: u64 },
    Finding(Finding),
    /// 扫描结束（正常完成或被取消）
    Finished(ScanStats),
}

/// 渲染器：被动消费事件，不影响流水线控制流
pub trait Reporter {
    fn handle(&mut self, event: &ScanEvent) -> anyhow::Result<()>;
}

/// 取消标记（可跨线程共享）
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
