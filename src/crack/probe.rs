//! One password test against the real archive tool.
//!
//! The tool runs `t` while a timer counts down. Whichever finishes first
//! decides the [`Attempt`]. A run that exits and closes both pipes in time is
//! classified from its captured output. An expired timer kills the child's
//! whole process group and reports [`Attempt::TimedOut`].

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, warn};

use crate::error::{CrackError, Result};
use crate::tool::markers::{OutputClassifier, Verdict};
use crate::tool::ArchiveTool;

/// Raw outcome of one test, before any acceptance policy is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Finished(Verdict),
    /// Still running when the budget ran out; the child was killed.
    TimedOut,
}

/// Tests a single password against an archive.
pub trait PasswordTester {
    fn test(&self, archive: &Path, password: &str) -> impl Future<Output = Result<Attempt>> + Send;
}

/// [`PasswordTester`] backed by the archive tool's `t` command.
#[derive(Debug, Clone)]
pub struct ToolProbe {
    tool: ArchiveTool,
    classifier: OutputClassifier,
    budget: Duration,
}

impl ToolProbe {
    pub fn new(tool: ArchiveTool, budget: Duration) -> Self {
        Self {
            tool,
            classifier: OutputClassifier::default(),
            budget,
        }
    }

    pub fn with_classifier(mut self, classifier: OutputClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    fn spawn_error(&self, source: std::io::Error) -> CrackError {
        CrackError::Spawn {
            program: self.tool.program().to_path_buf(),
            source,
        }
    }
}

async fn drain<R: AsyncRead + Unpin>(reader: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut reader) = reader {
        reader.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

impl PasswordTester for ToolProbe {
    async fn test(&self, archive: &Path, password: &str) -> Result<Attempt> {
        let mut child = self
            .tool
            .test_command(archive, password)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;
        let pid = child.id();

        let mut stdout = tokio::spawn(drain(child.stdout.take()));
        let mut stderr = tokio::spawn(drain(child.stderr.take()));

        // Exit and both pipes closing all count against the budget.
        let run = async {
            let status = child.wait().await.map_err(|e| self.spawn_error(e))?;
            let (out, err) = tokio::join!(&mut stdout, &mut stderr);
            let mut combined = out?.map_err(|e| self.spawn_error(e))?;
            combined.extend(err?.map_err(|e| self.spawn_error(e))?);
            Ok::<_, CrackError>((status, combined))
        };

        let outcome = tokio::time::timeout(self.budget, run).await;
        match outcome {
            Ok(finished) => {
                let (status, combined) = finished?;
                let verdict = self.classifier.classify(&String::from_utf8_lossy(&combined));
                debug!(archive = %archive.display(), ?status, ?verdict, "test finished");
                Ok(Attempt::Finished(verdict))
            }
            Err(_) => {
                stdout.abort();
                stderr.abort();
                kill_process_group(pid);
                // kill() also reaps the child, so nothing is left behind. A
                // child that already exited was reaped by wait().
                if !matches!(child.try_wait(), Ok(Some(_))) {
                    if let Err(e) = child.kill().await {
                        warn!(archive = %archive.display(), error = %e, "failed to kill timed out test");
                    }
                }
                debug!(archive = %archive.display(), budget = ?self.budget, "test still running at deadline");
                Ok(Attempt::TimedOut)
            }
        }
    }
}

/// Kills everything the tool started. The test command runs in its own
/// process group, so wrapper scripts take their children down with them.
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    let Some(pid) = pid.and_then(|p| libc::pid_t::try_from(p).ok()) else {
        return;
    };
    // SAFETY: plain syscall on a process group id we created.
    let rc = unsafe { libc::killpg(pid, libc::SIGKILL) };
    if rc != 0 {
        debug!(pid, error = %std::io::Error::last_os_error(), "killpg failed");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}
