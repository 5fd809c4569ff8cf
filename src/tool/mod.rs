//! Invocation of the external archive tool (7-Zip command line).
//!
//! Only two operations are used: `t` (integrity test under a password) and
//! `x` (extract with full paths). The tool's exit status and its captured
//! text are the only signals read back; see [`markers`] for the text side.

pub mod markers;

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

/// Handle on the archive tool executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveTool {
    program: PathBuf,
}

impl ArchiveTool {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// `t -p<password> <archive>`, stdout and stderr piped.
    ///
    /// On unix the child leads a new process group, so a timed out test can
    /// be killed together with anything it spawned.
    pub fn test_command(&self, archive: &Path, password: &str) -> Command {
        let mut cmd = self.base_command();
        #[cfg(unix)]
        cmd.process_group(0);
        cmd.arg("t")
            .arg(password_flag(password))
            .arg(archive)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    /// `x -y -p<password> -o<dir> <archive>`, output captured for error text.
    pub fn extract_command(&self, archive: &Path, password: &str, output_dir: &Path) -> Command {
        let mut out_flag = OsString::from("-o");
        out_flag.push(output_dir.as_os_str());

        let mut cmd = self.base_command();
        cmd.arg("x")
            .arg("-y")
            .arg(password_flag(password))
            .arg(out_flag)
            .arg(archive)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    fn base_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.env("LANG", "C.UTF-8").stdin(Stdio::null()).kill_on_drop(true);
        cmd
    }
}

/// `-p` followed by the password; a bare `-p` keeps the tool from prompting.
fn password_flag(password: &str) -> String {
    format!("-p{}", password)
}
