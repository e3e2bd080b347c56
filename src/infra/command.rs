//! 命令执行器
//!
//! 提供统一的命令执行接口，支持：
//! - 超时控制（超时后强制终止整个进程组并回收）
//! - stdout/stderr 分离捕获
//! - 关闭 stdin，避免子进程等待输入

use std::path::Path;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{error, warn};

/// 进程退出后等待输出管道关闭的最长时间
const OUTPUT_DRAIN_GRACE: Duration = Duration::from_secs(2);

/// 命令执行器
pub struct CommandRunner;

/// 命令执行错误
#[derive(Debug)]
pub enum CommandError {
    /// 命令启动失败
    SpawnFailed(std::io::Error),
    /// 等待命令完成失败
    WaitFailed(std::io::Error),
}

impl CommandError {
    /// 可执行文件是否不存在
    pub fn is_not_found(&self) -> bool {
        matches!(self, CommandError::SpawnFailed(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::SpawnFailed(e) => write!(f, "Failed to spawn command: {}", e),
            CommandError::WaitFailed(e) => write!(f, "Failed to wait for command: {}", e),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommandError::SpawnFailed(e) | CommandError::WaitFailed(e) => Some(e),
        }
    }
}

/// 命令执行结果
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// 退出码（被信号终止或超时时为 None）
    pub exit_code: Option<i32>,
    /// 是否因超时而终止
    pub timed_out: bool,
}

impl CommandOutput {
    /// 构造一个已完成的输出（测试和 mock 使用）
    pub fn completed(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code: Some(exit_code),
            timed_out: false,
        }
    }

    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// stdout 与 stderr 拼接，用于文本分类
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (false, false) => format!("{}\n{}", self.stdout, self.stderr),
            (false, true) => self.stdout.clone(),
            _ => self.stderr.clone(),
        }
    }
}

impl CommandRunner {
    /// 执行命令并捕获全部输出
    ///
    /// # Arguments
    /// * `program` - 要执行的程序
    /// * `args` - 命令行参数
    /// * `work_dir` - 工作目录
    /// * `timeout` - 超时时间
    ///
    /// 子进程在独立的进程组中运行；返回前整个进程组都会被终止，
    /// 后台遗留的孙进程不会继续持有输出管道。
    /// 超时不是错误：进程组被终止并回收后返回 `timed_out = true`
    pub async fn run_captured(
        program: &str,
        args: &[&str],
        work_dir: &Path,
        timeout: Duration,
    ) -> Result<CommandOutput, CommandError> {
        let mut command = Command::new(program);
        command
            .args(args)
            .current_dir(work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(CommandError::SpawnFailed)?;
        let group = ProcessGroup::of(&child);

        let stdout = OutputReader::spawn(child.stdout.take());
        let stderr = OutputReader::spawn(child.stderr.take());

        // 等待命令完成，支持超时
        let (exit_code, timed_out) = tokio::select! {
            status = child.wait() => {
                let status = status.map_err(CommandError::WaitFailed)?;
                (status.code(), false)
            }
            _ = tokio::time::sleep(timeout) => {
                error!(program = %program, "Command timed out after {:?}", timeout);
                group.kill(program);
                // kill 会等待进程实际终止
                if let Err(e) = child.kill().await {
                    warn!(program = %program, error = %e, "Failed to kill timed out process");
                }
                (None, true)
            }
        };

        // 清理退出后仍在后台运行的孙进程
        group.kill(program);

        Ok(CommandOutput {
            stdout: stdout.finish().await,
            stderr: stderr.finish().await,
            exit_code,
            timed_out,
        })
    }
}

/// 子进程所在的进程组（组 ID 即子进程 PID）
struct ProcessGroup(Option<u32>);

impl ProcessGroup {
    fn of(child: &Child) -> Self {
        Self(child.id())
    }

    #[cfg(unix)]
    fn kill(&self, program: &str) {
        let Some(pgid) = self.0 else { return };
        let result = unsafe { libc::killpg(pgid as libc::pid_t, libc::SIGKILL) };
        if result == -1 {
            let err = std::io::Error::last_os_error();
            // ESRCH: 组内进程已全部退出
            if err.raw_os_error() != Some(libc::ESRCH) {
                warn!(program = %program, error = %err, "Failed to kill process group");
            }
        }
    }

    #[cfg(not(unix))]
    fn kill(&self, _program: &str) {}
}

/// 后台读取输出管道，已读内容写入共享缓冲区
struct OutputReader {
    buffer: Arc<Mutex<Vec<u8>>>,
    task: JoinHandle<()>,
}

impl OutputReader {
    fn spawn<R>(stream: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = buffer.clone();
        let task = tokio::spawn(async move {
            let Some(mut stream) = stream else { return };
            let mut chunk = [0u8; 8192];
            loop {
                match stream.read(&mut chunk).await {
                    Ok(0) => break,
                    Ok(n) => {
                        if let Ok(mut buf) = sink.lock() {
                            buf.extend_from_slice(&chunk[..n]);
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to read process output");
                        break;
                    }
                }
            }
        });
        Self { buffer, task }
    }

    /// 等待管道关闭；超过宽限期则放弃等待，保留已读取的内容
    async fn finish(mut self) -> String {
        match tokio::time::timeout(OUTPUT_DRAIN_GRACE, &mut self.task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Output reader task failed"),
            Err(_) => {
                warn!("Output pipe still open after process exit, keeping partial output");
                self.task.abort();
            }
        }
        let bytes = match self.buffer.lock() {
            Ok(buf) => buf.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_captured_success() {
        let dir = tempfile::tempdir().unwrap();
        let output = CommandRunner::run_captured(
            "sh",
            &["-c", "echo hello; echo oops >&2"],
            dir.path(),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert!(output.success());
        assert_eq!(output.stdout, "hello\n");
        assert_eq!(output.stderr, "oops\n");
    }

    #[tokio::test]
    async fn test_run_captured_nonzero_exit_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let output = CommandRunner::run_captured(
            "sh",
            &["-c", "exit 3"],
            dir.path(),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert!(!output.success());
        assert_eq!(output.exit_code, Some(3));
        assert!(!output.timed_out);
    }

    #[tokio::test]
    async fn test_run_captured_timeout_kills_process() {
        let dir = tempfile::tempdir().unwrap();
        let started = std::time::Instant::now();
        let output = CommandRunner::run_captured(
            "sh",
            &["-c", "exec sleep 30"],
            dir.path(),
            Duration::from_millis(300),
        )
        .await
        .unwrap();

        assert!(output.timed_out);
        assert_eq!(output.exit_code, None);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_background_child_does_not_swallow_output() {
        let dir = tempfile::tempdir().unwrap();
        let started = std::time::Instant::now();
        let output = CommandRunner::run_captured(
            "sh",
            &["-c", "echo hi; sleep 20 &"],
            dir.path(),
            Duration::from_secs(10),
        )
        .await
        .unwrap();

        assert_eq!(output.exit_code, Some(0));
        assert_eq!(output.stdout, "hi\n");
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_timeout_kills_grandchildren_and_keeps_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let started = std::time::Instant::now();
        let output = CommandRunner::run_captured(
            "sh",
            &["-c", "echo partial; sleep 20"],
            dir.path(),
            Duration::from_millis(500),
        )
        .await
        .unwrap();

        assert!(output.timed_out);
        assert_eq!(output.stdout, "partial\n");
        assert!(started.elapsed() < Duration::from_millis(1500));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_background_child_is_terminated_after_exit() {
        let dir = tempfile::tempdir().unwrap();
        let output = CommandRunner::run_captured(
            "sh",
            &["-c", "sleep 20 & echo $!"],
            dir.path(),
            Duration::from_secs(10),
        )
        .await
        .unwrap();

        let pid: libc::pid_t = output.stdout.trim().parse().unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        // 信号 0 只检查进程是否存在；被 kill 后只剩僵尸进程或已被回收
        let alive = unsafe { libc::kill(pid, 0) } == 0;
        let zombie = std::fs::read_to_string(format!("/proc/{}/stat", pid))
            .map(|stat| stat.contains(") Z "))
            .unwrap_or(true);
        assert!(!alive || zombie);
    }

    #[tokio::test]
    async fn test_run_captured_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = CommandRunner::run_captured(
            "nonexistent_command_12345",
            &[],
            dir.path(),
            Duration::from_secs(5),
        )
        .await;

        match result {
            Err(e) => assert!(e.is_not_found()),
            Ok(_) => panic!("expected spawn failure"),
        }
    }

    #[test]
    fn test_combined_output() {
        assert_eq!(CommandOutput::completed(0, "a", "").combined(), "a");
        assert_eq!(CommandOutput::completed(1, "", "b").combined(), "b");
        assert_eq!(CommandOutput::completed(1, "a", "b").combined(), "a\nb");
    }
}
