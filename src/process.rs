//! Blocking execution of external coverage tools
//!
//! All tool invocations go through [`CommandRunner`] so the pipeline never
//! touches `std::process` directly and tests can substitute a recorder.
//! Arguments travel as an argv vector; no shell is involved.

use std::ffi::OsString;
use std::fmt;
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::{CoverageError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A program plus its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<OsString>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Arguments as lossy strings, mostly for assertions and logs
    pub fn arg_strings(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// Value following `flag`, if present
    pub fn value_of(&self, flag: &str) -> Option<String> {
        let args = self.arg_strings();
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1).cloned())
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(&arg.to_string_lossy()))?;
        }
        Ok(())
    }
}

fn quote(s: &str) -> String {
    if !s.is_empty() && !s.contains(|c: char| c.is_whitespace() || c == '"') {
        s.to_string()
    } else {
        format!("\"{}\"", s.replace('"', "\\\""))
    }
}

/// Outcome of a completed tool run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Convert a nonzero exit into [`CoverageError::ExternalToolFailure`]
    pub fn check(self, tool: &str) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            let stderr = String::from_utf8_lossy(&self.stderr);
            if !stderr.trim().is_empty() {
                warn!(tool, stderr = %stderr.trim(), "tool reported errors");
            }
            Err(CoverageError::ExternalToolFailure {
                tool: tool.to_string(),
                exit_code: self.exit_code,
            })
        }
    }
}

/// Runs an external command to completion
pub trait CommandRunner {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput> {
        (**self).run(command)
    }
}

/// Runs commands with `std::process`, optionally bounded by a timeout
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    timeout: Option<Duration>,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    fn spawn(command: &ToolCommand) -> Result<Child> {
        Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| CoverageError::Spawn {
                program: command.program.clone(),
                source,
            })
    }

    fn wait_bounded(
        command: &ToolCommand,
        mut child: Child,
        limit: Duration,
    ) -> Result<ToolOutput> {
        // Drain pipes on helper threads so a chatty tool cannot block on a full pipe
        let stdout = child.stdout.take().map(spawn_reader);
        let stderr = child.stderr.take().map(spawn_reader);

        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if started.elapsed() >= limit {
                warn!(program = %command.program, "timeout expired, killing tool");
                child.kill()?;
                child.wait()?;
                return Err(CoverageError::Timeout {
                    program: command.program.clone(),
                    seconds: limit.as_secs(),
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        Ok(ToolOutput {
            exit_code: status.code().unwrap_or(1),
            stdout: join_reader(stdout),
            stderr: join_reader(stderr),
        })
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        // A read error leaves whatever was captured so far
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn join_reader(handle: Option<thread::JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

impl CommandRunner for SystemRunner {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput> {
        debug!(command = %command, "running external tool");
        let child = Self::spawn(command)?;

        let output = match self.timeout {
            Some(limit) => Self::wait_bounded(command, child, limit)?,
            None => {
                let output = child.wait_with_output()?;
                ToolOutput {
                    // Signal termination has no code
                    exit_code: output.status.code().unwrap_or(1),
                    stdout: output.stdout,
                    stderr: output.stderr,
                }
            }
        };

        debug!(program = %command.program, exit_code = output.exit_code, "tool finished");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_quotes_spaces() {
        let cmd = ToolCommand::new("grcov")
            .arg("/tmp/my dir")
            .args(["-o", "/tmp/out/lcov.info"]);
        assert_eq!(cmd.to_string(), "grcov \"/tmp/my dir\" -o /tmp/out/lcov.info");
    }

    #[test]
    fn test_value_of() {
        let cmd = ToolCommand::new("grcov").args(["dir", "-o", "out", "-t", "ade"]);
        assert_eq!(cmd.value_of("-o").as_deref(), Some("out"));
        assert_eq!(cmd.value_of("-t").as_deref(), Some("ade"));
        assert_eq!(cmd.value_of("--llvm"), None);
    }

    #[test]
    fn test_check_nonzero() {
        let output = ToolOutput {
            exit_code: 3,
            ..Default::default()
        };
        let err = output.check("llvm-cov").unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_check_success() {
        assert!(ToolOutput::default().check("grcov").is_ok());
    }

    #[test]
    fn test_spawn_failure() {
        let err = SystemRunner::new()
            .run(&ToolCommand::new("/nonexistent/covgate-no-such-tool"))
            .unwrap_err();
        assert!(matches!(err, CoverageError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_stdout_and_exit_code() {
        let output = SystemRunner::new()
            .run(&ToolCommand::new("sh").args(["-c", "echo hello; exit 4"]))
            .unwrap();
        assert_eq!(output.exit_code, 4);
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_tool() {
        let runner = SystemRunner::with_timeout(Some(Duration::from_millis(200)));
        let err = runner
            .run(&ToolCommand::new("sleep").arg("5"))
            .unwrap_err();
        assert!(matches!(err, CoverageError::Timeout { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_bounded_run_captures_output() {
        let runner = SystemRunner::with_timeout(Some(Duration::from_secs(10)));
        let output = runner
            .run(&ToolCommand::new("sh").args(["-c", "echo bounded"]))
            .unwrap();
        assert!(output.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "bounded");
    }
}
