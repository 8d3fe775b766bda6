//! 启动探测：确认 Everything HTTP 服务可达，否则向操作者询问端口
use anyhow::{bail, Result};
use jarwatch_core::DaemonAddress;
use std::io::{BufRead, Write};
use tracing::{info, warn};

/// 探测服务；交互模式下循环询问端口直到可达，批处理模式下直接失败
pub fn resolve_daemon<R, W, P>(
    daemon: &DaemonAddress,
    interactive: bool,
    probe: P,
    input: &mut R,
    out: &mut W,
) -> Result<DaemonAddress>
where
    R: BufRead,
    W: Write,
    P: Fn(&DaemonAddress) -> bool,
{
    let mut current = daemon.clone();
    loop {
        if probe(&current) {
            info!(daemon = %current, "search daemon reachable");
            return Ok(current);
        }
        warn!(daemon = %current, "search daemon unreachable");
        if !interactive {
            bail!("search index unavailable: no Everything HTTP server at {current}");
        }

        writeln!(out, "Please make sure the Everything HTTP server is running.")?;
        write!(out, "If the port is not {}, enter it, or press Enter to try again: ", current.port)?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            bail!("search index unavailable at {current} and no port was entered");
        }
        match parse_port_answer(&line) {
            PortAnswer::Retry => {}
            PortAnswer::Port(p) => current = current.with_port(p),
            PortAnswer::Invalid => writeln!(out, "Invalid input.")?,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum PortAnswer {
    Retry,
    Port(u16),
    Invalid,
}

fn parse_port_answer(line: &str) -> PortAnswer {
    let t = line.trim();
    if t.is_empty() { return PortAnswer::Retry; }
    match t.parse::<u16>() {
        Ok(p) if p > 0 => PortAnswer::Port(p),
        _ => PortAnswer::Invalid,
    }
}
