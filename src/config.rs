//! Runtime configuration.
//!
//! Values resolve in order: explicit CLI option, environment variable,
//! built-in default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{CrackError, Result};

/// Environment variable naming the archive tool binary.
pub const TOOL_ENV: &str = "ARCHCRACK_TOOL";
/// Environment variable overriding the per-password test budget, in milliseconds.
pub const TEST_TIMEOUT_ENV: &str = "ARCHCRACK_TEST_TIMEOUT_MS";

/// Binaries probed on `PATH` when no tool is configured.
const TOOL_CANDIDATES: &[&str] = &["7z", "7zz", "7za"];

/// Default dictionary file name.
pub const DICTIONARY_NAME: &str = "passwd.txt";

#[derive(Debug, Clone)]
pub struct Config {
    /// Archive tool executable.
    pub tool: PathBuf,
    /// How long a `t` run may take before it is killed and counted as accepted.
    pub test_timeout: Duration,
    /// Extraction progress cadence.
    pub tick_interval: Duration,
    pub dictionary_name: String,
    /// Directories searched for `dictionary_name`, in order.
    pub search_dirs: Vec<PathBuf>,
    /// Extra dictionary files read after the searched ones.
    pub extra_dictionaries: Vec<PathBuf>,
    /// Files above this size are read on the bounded-timeout path.
    pub large_file_threshold: u64,
    pub large_read_timeout: Duration,
    /// Where manually confirmed passwords are appended.
    pub save_manual_to: PathBuf,
}

impl Config {
    /// Builds a configuration with the given tool and all defaults.
    pub fn with_tool(tool: impl Into<PathBuf>) -> Self {
        let exe_dir = program_dir();
        let mut search_dirs = Vec::with_capacity(2);
        if let Ok(cwd) = std::env::current_dir() {
            search_dirs.push(cwd);
        }
        if let Some(dir) = &exe_dir {
            search_dirs.push(dir.clone());
        }
        let save_manual_to = exe_dir
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DICTIONARY_NAME);

        Self {
            tool: tool.into(),
            test_timeout: Duration::from_secs(2),
            tick_interval: Duration::from_secs(1),
            dictionary_name: DICTIONARY_NAME.to_string(),
            search_dirs,
            extra_dictionaries: Vec::new(),
            large_file_threshold: 10 * 1024 * 1024,
            large_read_timeout: Duration::from_secs(30),
            save_manual_to,
        }
    }

    /// Resolves tool and timeout from the CLI options and the environment.
    pub fn resolve(tool_opt: Option<PathBuf>, timeout_ms_opt: Option<u64>) -> Result<Self> {
        let tool = locate_tool(tool_opt)?;
        let mut config = Self::with_tool(tool);
        if let Some(timeout) = test_timeout_from_opt_or_env(timeout_ms_opt)? {
            config.test_timeout = timeout;
        }
        Ok(config)
    }

    /// Dictionary files to read, searched locations first.
    pub fn dictionary_paths(&self) -> Vec<PathBuf> {
        self.search_dirs
            .iter()
            .map(|dir| dir.join(&self.dictionary_name))
            .chain(self.extra_dictionaries.iter().cloned())
            .collect()
    }
}

fn program_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}

/// Picks the archive tool.
/// Priority:
/// 1. `--tool` command-line argument.
/// 2. `ARCHCRACK_TOOL` environment variable.
/// 3. The first of `7z`, `7zz`, `7za` found on `PATH`.
pub fn locate_tool(tool_opt: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(tool) = tool_opt {
        return Ok(tool);
    }
    if let Some(tool) = std::env::var_os(TOOL_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(tool));
    }
    TOOL_CANDIDATES
        .iter()
        .find_map(|name| which::which(name).ok())
        .ok_or_else(|| {
            CrackError::ToolNotFound(format!(
                "none of {} on PATH; pass --tool or set {}",
                TOOL_CANDIDATES.join(", "),
                TOOL_ENV
            ))
        })
}

/// Per-password budget from `--test-timeout-ms` or `ARCHCRACK_TEST_TIMEOUT_MS`.
/// Returns `Ok(None)` when neither is set.
pub fn test_timeout_from_opt_or_env(timeout_ms_opt: Option<u64>) -> Result<Option<Duration>> {
    let ms = match timeout_ms_opt {
        Some(ms) => ms,
        None => match std::env::var(TEST_TIMEOUT_ENV) {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|_| {
                CrackError::Config(format!("{} must be a number of milliseconds, got '{}'", TEST_TIMEOUT_ENV, raw))
            })?,
            Err(_) => return Ok(None),
        },
    };
    if ms == 0 {
        return Err(CrackError::Config("test timeout must be greater than zero".into()));
    }
    Ok(Some(Duration::from_millis(ms)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::with_tool("7z");
        assert_eq!(config.test_timeout, Duration::from_secs(2));
        assert_eq!(config.tick_interval, Duration::from_secs(1));
        assert_eq!(config.large_file_threshold, 10 * 1024 * 1024);
        assert_eq!(config.large_read_timeout, Duration::from_secs(30));
        assert!(config.save_manual_to.ends_with(DICTIONARY_NAME));
    }

    #[test]
    fn dictionary_paths_follow_search_order() {
        let mut config = Config::with_tool("7z");
        config.search_dirs = vec![PathBuf::from("/cwd"), PathBuf::from("/bin")];
        config.extra_dictionaries = vec![PathBuf::from("/extra/list.txt")];
        assert_eq!(
            config.dictionary_paths(),
            vec![
                PathBuf::from("/cwd/passwd.txt"),
                PathBuf::from("/bin/passwd.txt"),
                PathBuf::from("/extra/list.txt"),
            ]
        );
    }

    #[test]
    fn explicit_options_win() {
        assert_eq!(locate_tool(Some(PathBuf::from("/opt/7zz"))).unwrap(), PathBuf::from("/opt/7zz"));
        assert_eq!(
            test_timeout_from_opt_or_env(Some(250)).unwrap(),
            Some(Duration::from_millis(250))
        );
        assert!(matches!(test_timeout_from_opt_or_env(Some(0)), Err(CrackError::Config(_))));
    }
}
