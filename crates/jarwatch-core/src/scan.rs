//! 分类流水线与调度（串行 / 后台线程 + 通道）
use crossbeam_channel as channel;
use std::path::Path;
use std::thread::JoinHandle;
use tracing::{debug, info};

use crate::config::ConfigSource;
use crate::error::Result;
use crate::events::{CancelToken, Reporter, ScanEvent};
use crate::findings::Finding;
use crate::identify::{Identification, Identify};
use crate::options::ScanStats;
use crate::patterns::PatternSet;
use crate::query::SearchQuery;
use crate::search::SearchIndex;
use crate::types::{join_path, Candidate, EntryType, SearchResults};

/// 事件通道容量（渲染端慢于流水线时形成背压）
const EVENT_CHANNEL_CAP: usize = 256;

/// 单个候选的分类结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    /// None 表示未满足识别前置条件，未调用识别器
    pub identification: Option<Identification>,
    pub finding: Option<Finding>,
}

/// 分类流水线：纯函数式地把候选映射为命中项
pub struct Pipeline<'a, I: ?Sized> {
    patterns: &'a PatternSet,
    identifier: &'a I,
}

impl<'a, I: Identify + ?Sized> Pipeline<'a, I> {
    pub fn new(patterns: &'a PatternSet, identifier: &'a I) -> Self {
        Self { patterns, identifier }
    }

    /// 识别前置条件：普通文件、位于启动器/下载目录、且不在启动器库目录中
    pub fn should_identify(&self, c: &Candidate) -> bool {
        c.entry_type == EntryType::File
            && self.patterns.is_launcher_path(&c.path)
            && !self.patterns.is_library_path(&c.path)
    }

    /// 分类单个候选
    pub fn classify(&self, c: &Candidate) -> Classified {
        let disk_path = c.full_path();
        let mut resolved = c.name.clone();
        let mut found = true;

        let identification = if self.should_identify(c) {
            let id = self.identifier.identify(Path::new(&disk_path));
            match &id {
                Identification::Known(n) => resolved = n.clone(),
                Identification::Unknown(_) => found = false,
            }
            Some(id)
        } else {
            None
        };

        let Some(hit) = self.patterns.cheat_match(&resolved) else {
            return Classified { identification, finding: None };
        };

        let full_path = join_path(&c.path, &resolved);
        let spans = self.patterns.cheat_spans(&full_path);
        let finding = Finding {
            matched_name: resolved[hit].to_string(),
            display_name: resolved,
            folder: c.path.clone(),
            full_path,
            disk_path,
            spans,
            suspicious: !found,
        };
        Classified { identification, finding: Some(finding) }
    }

    /// 按顺序处理全部候选，逐个发出事件
    /// - `emit` 返回 false 表示接收端已不再需要结果，流水线随即停止
    /// - 每个候选都会发出一次 Progress，无论是否命中
    pub fn run(
        &self,
        results: &SearchResults,
        cancel: &CancelToken,
        emit: &mut dyn FnMut(ScanEvent) -> bool,
    ) -> ScanStats {
        let mut stats = ScanStats { total: results.total, ..ScanStats::default() };

        for (i, c) in results.candidates.iter().enumerate() {
            if cancel.is_cancelled() { stats.cancelled = true; break; }

            let out = self.classify(c);
            stats.processed += 1;
            match &out.identification {
                None => stats.skipped_identification += 1,
                Some(Identification::Known(_)) => stats.identified += 1,
                Some(Identification::Unknown(_)) => stats.unknown += 1,
            }
            debug!(name = %c.name, path = %c.path, identification = ?out.identification, hit = out.finding.is_some(), "classified");

            if let Some(f) = out.finding {
                stats.findings += 1;
                if f.suspicious { stats.suspicious += 1; }
                if !emit(ScanEvent::Finding(f)) { stats.cancelled = true; break; }
            }
            let progress = ScanEvent::Progress { processed: i as u64 + 1, total: results.total };
            if !emit(progress) { stats.cancelled = true; break; }
        }

        let _ = emit(ScanEvent::Finished(stats.clone()));
        stats
    }
}

/// 扫描前置步骤的产物：编译好的匹配器 + 搜索结果
#[derive(Debug, Clone)]
pub struct ScanPlan {
    pub patterns: PatternSet,
    pub results: SearchResults,
}

/// 拉取配置、编译匹配器、查询索引；任一步失败即终止本次运行
pub fn plan_scan(source: &dyn ConfigSource, index: &dyn SearchIndex) -> Result<ScanPlan> {
    let config = source.load()?;
    let patterns = PatternSet::compile(&config)?;
    let query = SearchQuery::for_launchers(&config.launcher_names);
    debug!(expression = %query, "built search query");
    let results = index.query(&query)?;
    Ok(ScanPlan { patterns, results })
}

/// 串行路径：流水线与渲染在同一线程
pub fn scan_and_report<I: Identify + ?Sized>(
    plan: &ScanPlan,
    identifier: &I,
    reporter: &mut dyn Reporter,
    cancel: &CancelToken,
) -> anyhow::Result<ScanStats> {
    let pipeline = Pipeline::new(&plan.patterns, identifier);
    let mut failure: Option<anyhow::Error> = None;
    let stats = pipeline.run(&plan.results, cancel, &mut |ev| match reporter.handle(&ev) {
        Ok(()) => true,
        Err(e) => {
            failure.get_or_insert(e);
            false
        }
    });
    if let Some(e) = failure {
        return Err(e);
    }
    info!(processed = stats.processed, findings = stats.findings, suspicious = stats.suspicious, "scan finished");
    Ok(stats)
}

/// 后台线程路径：流水线在独立线程运行，事件经有界通道交给渲染端
/// - 接收端被丢弃或 `cancel` 被置位后，流水线在下一个候选前停止
pub fn spawn_scan<I>(
    plan: ScanPlan,
    identifier: I,
    cancel: CancelToken,
) -> (channel::Receiver<ScanEvent>, JoinHandle<ScanStats>)
where
    I: Identify + Send + 'static,
{
    let (tx, rx) = channel::bounded::<ScanEvent>(EVENT_CHANNEL_CAP);
    let handle = std::thread::spawn(move || {
        let pipeline = Pipeline::new(&plan.patterns, &identifier);
        let stats = pipeline.run(&plan.results, &cancel, &mut |ev| tx.send(ev).is_ok());
        info!(processed = stats.processed, findings = stats.findings, cancelled = stats.cancelled, "scan finished");
        stats
    });
    (rx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::error::ScanError;
    use crate::identify::UnknownReason;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    /// 按完整路径返回预设结果，并记录调用
    #[derive(Default)]
    struct FakeIdentifier {
        answers: HashMap<String, Identification>,
        calls: RefCell<Vec<PathBuf>>,
    }

    impl FakeIdentifier {
        fn knows(mut self, folder: &str, name: &str, resolved: &str) -> Self {
            self.answers.insert(join_path(folder, name), Identification::Known(resolved.into()));
            self
        }
    }

    impl Identify for FakeIdentifier {
        fn identify(&self, path: &Path) -> Identification {
            self.calls.borrow_mut().push(path.to_path_buf());
            self.answers
                .get(path.to_string_lossy().as_ref())
                .cloned()
                .unwrap_or(Identification::Unknown(UnknownReason::NotRegistered))
        }
    }

    /// 线程安全版本，供 spawn_scan 使用
    #[derive(Clone, Default)]
    struct SharedIdentifier {
        calls: Arc<Mutex<usize>>,
    }

    impl Identify for SharedIdentifier {
        fn identify(&self, _path: &Path) -> Identification {
            *self.calls.lock().unwrap() += 1;
            Identification::Unknown(UnknownReason::NotRegistered)
        }
    }

    fn patterns() -> PatternSet {
        PatternSet::compile(&Configuration::new(["wurst", "meteor"], ["curseforge"])).unwrap()
    }

    fn results(candidates: Vec<Candidate>) -> SearchResults {
        SearchResults { total: candidates.len() as u64, candidates }
    }

    fn collect(pipeline: &Pipeline<'_, impl Identify>, r: &SearchResults) -> (Vec<ScanEvent>, ScanStats) {
        let mut events = Vec::new();
        let stats = pipeline.run(r, &CancelToken::new(), &mut |ev| {
            events.push(ev);
            true
        });
        (events, stats)
    }

    fn findings(events: &[ScanEvent]) -> Vec<Finding> {
        events
            .iter()
            .filter_map(|e| match e {
                ScanEvent::Finding(f) => Some(f.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn unidentified_cheat_in_launcher_dir_is_suspicious() {
        let p = patterns();
        let id = FakeIdentifier::default();
        let out = Pipeline::new(&p, &id).classify(&Candidate::file("WurstClient.jar", "/curseforge/mods"));
        let f = out.finding.unwrap();
        assert_eq!(f.display_name, "WurstClient.jar");
        assert_eq!(f.matched_name, "Wurst");
        assert!(f.suspicious);
        assert_eq!(out.identification, Some(Identification::Unknown(UnknownReason::NotRegistered)));
    }

    #[test]
    fn outside_launcher_dirs_is_not_identified_nor_suspicious() {
        let p = patterns();
        let id = FakeIdentifier::default();
        let out = Pipeline::new(&p, &id).classify(&Candidate::file("WurstClient.jar", "/cf/mods"));
        assert!(id.calls.borrow().is_empty());
        assert!(!out.finding.unwrap().suspicious);
    }

    #[test]
    fn registry_name_replaces_obfuscated_name() {
        let p = patterns();
        let id = FakeIdentifier::default().knows("/curseforge/mods", "abc123.jar", "wurst-7.39.jar");
        let out = Pipeline::new(&p, &id).classify(&Candidate::file("abc123.jar", "/curseforge/mods"));
        let f = out.finding.unwrap();
        assert_eq!(f.display_name, "wurst-7.39.jar");
        assert_eq!(f.full_path, join_path("/curseforge/mods", "wurst-7.39.jar"));
        assert_eq!(f.disk_path, join_path("/curseforge/mods", "abc123.jar"));
        assert_eq!(f.folder, "/curseforge/mods");
        assert!(!f.suspicious);
    }

    #[test]
    fn registry_name_can_clear_a_cheat_looking_file() {
        let p = patterns();
        let id = FakeIdentifier::default().knows("/curseforge/mods", "wurst.jar", "sodium-0.5.jar");
        let out = Pipeline::new(&p, &id).classify(&Candidate::file("wurst.jar", "/curseforge/mods"));
        assert!(out.finding.is_none());
    }

    #[test]
    fn library_dirs_skip_identification() {
        let p = patterns();
        let id = FakeIdentifier::default();
        let pipe = Pipeline::new(&p, &id);
        let c = Candidate::file("somejar.jar", "/curseforge/libraries");
        assert!(p.is_launcher_path(&c.path));
        let out = pipe.classify(&c);
        assert!(out.identification.is_none());
        assert!(out.finding.is_none());
        assert!(id.calls.borrow().is_empty());
    }

    #[test]
    fn library_cheat_is_reported_but_not_suspicious() {
        let p = patterns();
        let id = FakeIdentifier::default();
        let out = Pipeline::new(&p, &id).classify(&Candidate::file("meteor.jar", "/curseforge/libraries"));
        assert!(id.calls.borrow().is_empty());
        assert!(!out.finding.unwrap().suspicious);
    }

    #[test]
    fn folders_never_reach_identifier() {
        let p = patterns();
        let id = FakeIdentifier::default();
        let pipe = Pipeline::new(&p, &id);
        let r = results(vec![
            Candidate::folder("wurst.jar", "/curseforge/mods"),
            Candidate::folder("x.jar", "/Downloads"),
        ]);
        let (events, stats) = collect(&pipe, &r);
        assert!(id.calls.borrow().is_empty());
        assert_eq!(stats.skipped_identification, 2);
        let f = findings(&events);
        assert_eq!(f.len(), 1);
        assert!(!f[0].suspicious);
    }

    #[test]
    fn progress_is_emitted_for_every_candidate_in_order() {
        let p = patterns();
        let id = FakeIdentifier::default();
        let r = results(vec![
            Candidate::file("a.jar", "/x"),
            Candidate::file("wurst.jar", "/Downloads"),
            Candidate::file("b.jar", "/x"),
        ]);
        let (events, stats) = collect(&Pipeline::new(&p, &id), &r);
        let progress: Vec<u64> = events
            .iter()
            .filter_map(|e| match e {
                ScanEvent::Progress { processed, total } => {
                    assert_eq!(*total, 3);
                    Some(*processed)
                }
                _ => None,
            })
            .collect();
        assert_eq!(progress, vec![1, 2, 3]);
        // Finding 先于它自己的 Progress
        assert!(matches!(events[1], ScanEvent::Finding(_)));
        assert!(matches!(events[2], ScanEvent::Progress { processed: 2, .. }));
        assert!(matches!(events.last(), Some(ScanEvent::Finished(_))));
        assert_eq!(stats.processed, 3);
        assert_eq!(stats.findings, 1);
        assert_eq!(stats.suspicious, 1);
        assert_eq!(stats.unknown, 1);
    }

    #[test]
    fn findings_keep_candidate_order_without_dedup() {
        let p = patterns();
        let id = FakeIdentifier::default();
        let r = results(vec![
            Candidate::file("meteor.jar", "/x"),
            Candidate::file("wurst.jar", "/x"),
            Candidate::file("meteor.jar", "/x"),
        ]);
        let (events, _) = collect(&Pipeline::new(&p, &id), &r);
        let names: Vec<String> = findings(&events).into_iter().map(|f| f.display_name).collect();
        assert_eq!(names, vec!["meteor.jar", "wurst.jar", "meteor.jar"]);
    }

    #[test]
    fn rerun_is_idempotent() {
        let p = patterns();
        let id = FakeIdentifier::default().knows("/curseforge/mods", "x.jar", "meteor-client.jar");
        let r = results(vec![
            Candidate::file("x.jar", "/curseforge/mods"),
            Candidate::file("Wurst.jar", "/Downloads"),
            Candidate::folder("meteor", "/curseforge"),
        ]);
        let pipe = Pipeline::new(&p, &id);
        let (a, sa) = collect(&pipe, &r);
        let (b, sb) = collect(&pipe, &r);
        assert_eq!(a, b);
        assert_eq!(sa, sb);
    }

    #[test]
    fn spans_index_cheat_names_in_full_path() {
        let p = patterns();
        let id = FakeIdentifier::default();
        let r = results(vec![
            Candidate::file("Wurst-Client.jar", "/games/wurst/curseforge/mods"),
            Candidate::file("METEOR.jar", "/Downloads"),
        ]);
        let (events, _) = collect(&Pipeline::new(&p, &id), &r);
        let fs = findings(&events);
        assert_eq!(fs.len(), 2);
        for f in fs {
            assert!(!f.spans.is_empty());
            for s in &f.spans {
                let hit = &f.full_path[s.clone()];
                assert!(["wurst", "meteor"].iter().any(|n| hit.eq_ignore_ascii_case(n)), "{hit}");
            }
            let name_start = f.full_path.len() - f.display_name.len();
            assert!(f.spans.iter().any(|s| s.start >= name_start));
        }
    }

    #[test]
    fn suspicious_iff_identification_attempted_and_unknown() {
        let p = patterns();
        let id = FakeIdentifier::default().knows("/curseforge/mods", "meteor.jar", "meteor-client-0.5.jar");
        let pipe = Pipeline::new(&p, &id);
        let cases = vec![
            Candidate::file("meteor.jar", "/curseforge/mods"),
            Candidate::file("wurst.jar", "/curseforge/mods"),
            Candidate::file("wurst.jar", "/opt/games"),
            Candidate::folder("wurst.jar", "/curseforge/mods"),
        ];
        for c in cases {
            let out = pipe.classify(&c);
            let attempted_unknown = matches!(out.identification, Some(Identification::Unknown(_)));
            assert_eq!(out.finding.unwrap().suspicious, attempted_unknown, "{c:?}");
        }
    }

    #[test]
    fn cancelled_token_stops_before_next_candidate() {
        let p = patterns();
        let id = FakeIdentifier::default();
        let r = results(vec![Candidate::file("a.jar", "/x"), Candidate::file("b.jar", "/x")]);
        let cancel = CancelToken::new();
        cancel.cancel();
        let stats = Pipeline::new(&p, &id).run(&r, &cancel, &mut |_| true);
        assert_eq!(stats.processed, 0);
        assert!(stats.cancelled);
    }

    #[test]
    fn closed_receiver_stops_pipeline() {
        let p = patterns();
        let id = FakeIdentifier::default();
        let r = results(vec![Candidate::file("a.jar", "/x"), Candidate::file("b.jar", "/x")]);
        let stats = Pipeline::new(&p, &id).run(&r, &CancelToken::new(), &mut |_| false);
        assert_eq!(stats.processed, 1);
        assert!(stats.cancelled);
    }

    struct StaticConfig(Configuration);

    impl ConfigSource for StaticConfig {
        fn load(&self) -> Result<Configuration> {
            Ok(self.0.clone())
        }
    }

    struct RecordingIndex {
        expression: RefCell<Option<String>>,
        results: SearchResults,
    }

    impl SearchIndex for RecordingIndex {
        fn query(&self, query: &SearchQuery) -> Result<SearchResults> {
            *self.expression.borrow_mut() = Some(query.expression());
            Ok(self.results.clone())
        }
    }

    #[test]
    fn plan_builds_query_from_launchers() {
        let source = StaticConfig(Configuration::new(["wurst"], ["curseforge"]));
        let index = RecordingIndex { expression: RefCell::new(None), results: results(vec![]) };
        let plan = plan_scan(&source, &index).unwrap();
        assert!(plan.results.candidates.is_empty());
        let expr = index.expression.borrow().clone().unwrap();
        assert!(expr.contains("path:curseforge"));
    }

    #[test]
    fn empty_cheats_abort_before_querying() {
        let source = StaticConfig(Configuration::new(Vec::<String>::new(), ["curseforge"]));
        let index = RecordingIndex { expression: RefCell::new(None), results: results(vec![]) };
        let err = plan_scan(&source, &index).unwrap_err();
        assert!(matches!(err, ScanError::InvalidPattern(_)));
        assert!(index.expression.borrow().is_none());
    }

    struct VecReporter(Vec<ScanEvent>);

    impl Reporter for VecReporter {
        fn handle(&mut self, event: &ScanEvent) -> anyhow::Result<()> {
            self.0.push(event.clone());
            Ok(())
        }
    }

    #[test]
    fn sequential_scan_feeds_reporter() {
        let plan = ScanPlan { patterns: patterns(), results: results(vec![Candidate::file("wurst.jar", "/x")]) };
        let mut rep = VecReporter(Vec::new());
        let stats = scan_and_report(&plan, &FakeIdentifier::default(), &mut rep, &CancelToken::new()).unwrap();
        assert_eq!(stats.findings, 1);
        assert_eq!(rep.0.len(), 3);
    }

    struct FailingReporter;

    impl Reporter for FailingReporter {
        fn handle(&mut self, _event: &ScanEvent) -> anyhow::Result<()> {
            anyhow::bail!("stdout closed")
        }
    }

    #[test]
    fn reporter_failure_is_propagated() {
        let plan = ScanPlan { patterns: patterns(), results: results(vec![Candidate::file("a.jar", "/x")]) };
        let err = scan_and_report(&plan, &FakeIdentifier::default(), &mut FailingReporter, &CancelToken::new()).unwrap_err();
        assert!(err.to_string().contains("stdout closed"));
    }

    #[test]
    fn threaded_scan_delivers_events_in_order() {
        let plan = ScanPlan {
            patterns: patterns(),
            results: results(vec![
                Candidate::file("wurst.jar", "/curseforge/mods"),
                Candidate::file("plain.jar", "/curseforge/mods"),
                Candidate::file("meteor.jar", "/opt"),
            ]),
        };
        let id = SharedIdentifier::default();
        let calls = Arc::clone(&id.calls);
        let (rx, handle) = spawn_scan(plan, id, CancelToken::new());
        let events: Vec<ScanEvent> = rx.iter().collect();
        let stats = handle.join().unwrap();

        assert_eq!(*calls.lock().unwrap(), 2);
        assert_eq!(stats.processed, 3);
        let names: Vec<String> = findings(&events).into_iter().map(|f| f.display_name).collect();
        assert_eq!(names, vec!["wurst.jar", "meteor.jar"]);
        assert!(matches!(events.last(), Some(ScanEvent::Finished(s)) if s.findings == 2));
    }

    #[test]
    fn dropping_receiver_ends_threaded_scan() {
        let candidates = (0..2000).map(|i| Candidate::file(format!("f{i}.jar"), "/x")).collect();
        let plan = ScanPlan { patterns: patterns(), results: results(candidates) };
        let (rx, handle) = spawn_scan(plan, SharedIdentifier::default(), CancelToken::new());
        drop(rx);
        let stats = handle.join().unwrap();
        assert!(stats.cancelled);
        assert!(stats.processed < 2000);
    }
}
