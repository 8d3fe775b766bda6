use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use jarwatch_core::{
    build_client, daemon_reachable, load_settings, plan_scan, scan_and_report, spawn_scan, CancelToken,
    ContentIdentifier, EverythingClient, HttpConfigSource, Identify, ModrinthRegistry, Reporter, ScanOptions,
    ScanPlan, ScanStats,
};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{error, info};

mod probe;
mod report;
mod reveal;

use report::{BatchReporter, InteractiveReporter};

/// 命令行入口（基于 clap）
#[derive(Parser, Debug)]
#[command(name = "jarwatch", version, about = "Flag cheat jars in Minecraft launcher folders")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 查询本地 Everything 索引并分类所有 jar
    Scan {
        /// 输出方式：interactive（进度 + 可定位条目）或 batch（纯文本）
        #[arg(long, default_value = "interactive", value_parser = ["interactive", "batch"])]
        mode: String,

        /// Everything HTTP 服务主机（默认 localhost）
        #[arg(long)]
        host: Option<String>,

        /// Everything HTTP 服务端口（默认 80）
        #[arg(long)]
        port: Option<u16>,

        /// 设置文件（TOML），覆盖默认的远端地址与超时
        #[arg(long)]
        settings: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // 初始化日志（支持通过 RUST_LOG 控制等级，例如 info、debug）
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { mode, host, port, settings } => {
            let opts = build_options(host, port, settings.as_deref())?;
            let interactive = mode == "interactive";
            info!(daemon = %opts.daemon, mode = %mode, "starting scan");

            let stats = run_scan(opts, interactive).map_err(|e| {
                error!(error = %e, "scan aborted");
                e
            })?;
            info!(processed = stats.processed, findings = stats.findings, suspicious = stats.suspicious, "done");
        }
    }

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    // 日志写 stderr，避免与结果输出交错
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// 默认值 ← 设置文件 ← 命令行参数
fn build_options(host: Option<String>, port: Option<u16>, settings: Option<&std::path::Path>) -> Result<ScanOptions> {
    let mut opts = ScanOptions::default();
    if let Some(path) = settings {
        load_settings(path)?.apply(&mut opts);
    }
    if let Some(h) = host { opts.daemon.host = h; }
    if let Some(p) = port { opts.daemon.port = p; }
    Ok(opts)
}

fn run_scan(mut opts: ScanOptions, interactive: bool) -> Result<ScanStats> {
    let client = build_client(opts.http_timeout)?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    opts.daemon = probe::resolve_daemon(
        &opts.daemon,
        interactive,
        |d| daemon_reachable(&client, d),
        &mut stdin.lock(),
        &mut stdout,
    )?;
    if interactive {
        let _ = console::Term::stdout().clear_screen();
    }

    let source = HttpConfigSource::new(client.clone(), opts.config_url.clone());
    let index = EverythingClient::new(client.clone(), opts.daemon.clone());
    let plan = plan_scan(&source, &index).context("prepare scan")?;
    let identifier = ContentIdentifier::new(ModrinthRegistry::new(client, opts.registry_url.clone()));

    if interactive {
        run_interactive(plan, identifier)
    } else {
        let mut reporter = BatchReporter::new(stdout.lock(), console::colors_enabled());
        scan_and_report(&plan, &identifier, &mut reporter, &CancelToken::new())
    }
}

/// 流水线在后台线程运行，主线程负责渲染；渲染失败时取消扫描
fn run_interactive<I>(plan: ScanPlan, identifier: I) -> Result<ScanStats>
where
    I: Identify + Send + 'static,
{
    let cancel = CancelToken::new();
    let mut reporter = InteractiveReporter::new()?;
    let (rx, handle) = spawn_scan(plan, identifier, cancel.clone());

    let rendered: Result<()> = rx.iter().try_for_each(|ev| reporter.handle(&ev));
    if rendered.is_err() { cancel.cancel(); }
    drop(rx);

    let stats = handle.join().map_err(|_| anyhow!("scan thread panicked"))?;
    rendered?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    reporter.reveal_prompt(&mut stdin.lock(), &mut stdout)?;
    stdout.flush().ok();
    Ok(stats)
}
