use std::{fmt, process::Stdio};

use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process::Command,
};
use tracing::{debug, info, trace, warn};

use crate::error::{ExecError, ExecResult};

/// Longest stderr excerpt (and stdout tail) kept in a [`ExecError::CommandFailed`].
const MAX_DIAGNOSTIC: usize = 4096;

/// How a command's output lines reach the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    /// Max line length before truncation.
    pub max_line_length: usize,
    /// Log stdout at INFO level (false = DEBUG).
    pub stdout_info: bool,
    /// Log stderr at WARN level (false = DEBUG).
    pub stderr_warn: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            max_line_length: 4096,
            stdout_info: true,
            stderr_warn: true,
        }
    }
}

impl LogConfig {
    /// For commands whose stdout is parsed rather than read by an operator.
    pub fn query() -> Self {
        Self {
            stdout_info: false,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    fn as_str(&self) -> &'static str {
        match self {
            Stream::Stdout => "stdout",
            Stream::Stderr => "stderr",
        }
    }
}

/// One external command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    /// Program to execute (e.g. `"roachprod"`, `"/usr/local/bin/cockroach"`).
    pub(crate) program: String,
    pub(crate) args: Vec<String>,
    pub(crate) log: LogConfig,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            log: LogConfig::default(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_log(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn argv(&self) -> &[String] {
        &self.args
    }

    /// Rules:
    /// - `program` is not empty or whitespace-only.
    pub fn validate(&self) -> ExecResult<()> {
        if self.program.trim().is_empty() {
            return Err(ExecError::InvalidSpec("command program is empty".into()));
        }
        Ok(())
    }

    fn build(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.stdin(Stdio::null());
        cmd.kill_on_drop(true);
        cmd
    }

    fn spawn_error(&self, source: std::io::Error) -> ExecError {
        ExecError::Spawn {
            command: self.to_string(),
            source,
        }
    }

    /// Run to completion and return stdout; a non-zero exit is an error.
    ///
    /// Every output line is forwarded to the log as it arrives. Dropping the
    /// returned future kills the child.
    pub async fn output(&self) -> ExecResult<String> {
        self.validate()?;
        trace!(program = %self.program, args = ?self.args, "spawning command");

        let mut child = self
            .build()
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let (out, err, status) = tokio::try_join!(
            self.forward(stdout, Stream::Stdout),
            self.forward(stderr, Stream::Stderr),
            child.wait(),
        )?;

        if !status.success() {
            return Err(ExecError::CommandFailed {
                command: self.to_string(),
                code: status.code(),
                output: diagnostics(&err, &out),
            });
        }
        debug!(command = %self, "command finished");
        Ok(out)
    }

    /// Run to completion with stdout redirected into `file`.
    pub async fn output_to(&self, file: std::fs::File) -> ExecResult<()> {
        self.validate()?;
        trace!(program = %self.program, args = ?self.args, "spawning command with captured stdout");

        let mut child = self
            .build()
            .stdout(Stdio::from(file))
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;
        let stderr = child.stderr.take();

        let (err, status) = tokio::try_join!(self.forward(stderr, Stream::Stderr), child.wait())?;

        if !status.success() {
            return Err(ExecError::CommandFailed {
                command: self.to_string(),
                code: status.code(),
                output: diagnostics(&err, ""),
            });
        }
        Ok(())
    }

    /// Log each line of `reader` and return everything read.
    async fn forward<R>(&self, reader: Option<R>, stream: Stream) -> std::io::Result<String>
    where
        R: AsyncRead + Unpin,
    {
        let Some(reader) = reader else {
            return Ok(String::new());
        };
        let mut reader = BufReader::new(reader);
        let mut collected = String::new();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            collected.push_str(&line);
            self.log_line(stream, line.trim_end());
        }
        Ok(collected)
    }

    fn log_line(&self, stream: Stream, line: &str) {
        let line = truncate(line, self.log.max_line_length);
        let program = self.program.as_str();
        match stream {
            Stream::Stdout if self.log.stdout_info => {
                info!(program, stream = stream.as_str(), "{line}")
            }
            Stream::Stderr if self.log.stderr_warn => {
                warn!(program, stream = stream.as_str(), "{line}")
            }
            _ => debug!(program, stream = stream.as_str(), "{line}"),
        }
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

fn truncate(line: &str, max: usize) -> &str {
    match line.char_indices().nth(max) {
        Some((cut, _)) => &line[..cut],
        None => line,
    }
}

/// Head of stderr followed by the tail of stdout, both bounded.
fn diagnostics(stderr: &str, stdout: &str) -> String {
    let head = excerpt(stderr);
    let out_tail = tail(stdout);
    match (head.is_empty(), out_tail.is_empty()) {
        (_, true) => head,
        (true, false) => out_tail,
        (false, false) => format!("{head}\n{out_tail}"),
    }
}

fn excerpt(text: &str) -> String {
    let text = text.trim();
    match text.char_indices().nth(MAX_DIAGNOSTIC) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn tail(text: &str) -> String {
    let text = text.trim();
    let len = text.chars().count();
    if len <= MAX_DIAGNOSTIC {
        return text.to_string();
    }
    match text.char_indices().nth(len - MAX_DIAGNOSTIC) {
        Some((cut, _)) => format!("...{}", &text[cut..]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_argv() {
        let cmd = CommandLine::new("roachprod")
            .arg("run")
            .args(["u-c:1", "--", "ls"]);
        assert_eq!(cmd.to_string(), "roachprod run u-c:1 -- ls");
        assert_eq!(cmd.argv().len(), 4);
    }

    #[test]
    fn empty_program_is_rejected() {
        assert!(matches!(
            CommandLine::new("  ").validate(),
            Err(ExecError::InvalidSpec(_))
        ));
    }

    #[test]
    fn diagnostics_are_bounded() {
        let long = "e".repeat(MAX_DIAGNOSTIC + 10);
        let out = excerpt(&long);
        assert!(out.ends_with("..."));
        assert_eq!(out.len(), MAX_DIAGNOSTIC + 3);

        let long = format!("{}last", "o".repeat(MAX_DIAGNOSTIC));
        let out = tail(&long);
        assert!(out.starts_with("..."));
        assert!(out.ends_with("last"));
        assert_eq!(out.len(), MAX_DIAGNOSTIC + 3);

        assert_eq!(diagnostics("", ""), "");
        assert_eq!(diagnostics("boom\n", "progress\n"), "boom\nprogress");
        assert_eq!(truncate("abcdef", 3), "abc");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_stdout_and_reports_failures() {
        let out = CommandLine::new("sh")
            .args(["-c", "echo hello"])
            .output()
            .await
            .unwrap();
        assert_eq!(out, "hello\n");

        let err = CommandLine::new("sh")
            .args(["-c", "echo boom >&2; exit 3"])
            .output()
            .await
            .unwrap_err();
        match err {
            ExecError::CommandFailed { code, output, .. } => {
                assert_eq!(code, Some(3));
                assert_eq!(output, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failure_keeps_what_the_tool_printed_on_stdout() {
        let err = CommandLine::new("sh")
            .args(["-c", "echo 'ERROR: quota exceeded in us-east1'; exit 3"])
            .output()
            .await
            .unwrap_err();

        assert!(matches!(err, ExecError::CommandFailed { code: Some(3), .. }));
        assert!(
            err.to_string()
                .ends_with("exit code 3: ERROR: quota exceeded in us-east1")
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn interleaved_streams_are_both_collected() {
        let err = CommandLine::new("sh")
            .args(["-c", "echo step-1; echo warn >&2; echo step-2; exit 1"])
            .with_log(LogConfig::query())
            .output()
            .await
            .unwrap_err();
        match err {
            ExecError::CommandFailed { output, .. } => assert_eq!(output, "warn\nstep-1\nstep-2"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stdout_can_go_to_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        let file = std::fs::File::create(&path).unwrap();

        CommandLine::new("sh")
            .args(["-c", "echo line-1; echo line-2"])
            .output_to(file)
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "line-1\nline-2\n");
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let err = CommandLine::new("/definitely/not/here")
            .output()
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::Spawn { .. }));
    }
}
