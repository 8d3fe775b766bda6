//! 在系统文件管理器中定位文件（尽力而为，失败只记日志）
use std::path::Path;
use std::process::{Child, Command};
use std::thread;
use tracing::debug;

/// 各平台的"定位"命令
fn reveal_command(path: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("explorer");
        c.arg("/select,").arg(path);
        c
    } else if cfg!(target_os = "macos") {
        let mut c = Command::new("open");
        c.arg("-R").arg(path);
        c
    } else {
        // xdg-open 无法选中文件，只能打开所在目录
        let folder = Path::new(path).parent().unwrap_or_else(|| Path::new(path));
        let mut c = Command::new("xdg-open");
        c.arg(folder);
        c
    }
}

/// 启动后由独立线程回收子进程，不阻塞提示循环
pub fn reveal(path: &str) {
    match reveal_command(path).spawn() {
        Ok(child) => {
            debug!(path, "reveal requested");
            thread::spawn(move || reap(child));
        }
        Err(e) => debug!(path, error = %e, "reveal failed"),
    }
}

fn reap(mut child: Child) {
    match child.wait() {
        Ok(status) => debug!(%status, "file manager exited"),
        Err(e) => debug!(error = %e, "wait for file manager failed"),
    }
}
