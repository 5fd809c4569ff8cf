//! # Extraction Orchestrator
//!
//! Runs the archive tool's `x` operation with the accepted password into a
//! directory derived from the archive name, with an elapsed-time ticker
//! running beside it.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};

use crate::common::ArchiveTarget;
use crate::error::{CrackError, Result};
use crate::progress::{start_ticker, TickCallback};
use crate::tool::ArchiveTool;

/// Container suffixes removed after the final extension.
const CONTAINER_SUFFIXES: &[&str] = &[".7z", ".zip", ".rar", ".tar"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    pub success: bool,
    pub output_dir: PathBuf,
    pub elapsed: Duration,
    /// The tool's error text when `success` is false.
    pub error: Option<String>,
}

pub struct Extractor {
    tool: ArchiveTool,
    tick_interval: Duration,
    on_tick: Option<Arc<TickCallback>>,
}

impl Extractor {
    pub fn new(tool: ArchiveTool) -> Self {
        Self {
            tool,
            tick_interval: Duration::from_secs(1),
            on_tick: None,
        }
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Receives the elapsed time every tick while the tool runs.
    pub fn with_ticker<F>(mut self, on_tick: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.on_tick = Some(Arc::new(on_tick));
        self
    }

    /// Extracts `target` into `output_dir`, creating it if needed.
    ///
    /// Only a failure to create the directory is an `Err`. Tool failures,
    /// including failing to launch it, come back as an unsuccessful
    /// [`ExtractionResult`]; success is the tool's own exit status.
    pub async fn extract(&self, target: &ArchiveTarget, password: &str, output_dir: &Path) -> Result<ExtractionResult> {
        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|e| CrackError::io(e, output_dir))?;

        info!(archive = %target.first_volume.display(), out = %output_dir.display(), "extracting");
        let start = Instant::now();
        let ticker = self
            .on_tick
            .as_ref()
            .map(|cb| start_ticker(self.tick_interval, Arc::clone(cb)));

        let output = self
            .tool
            .extract_command(&target.first_volume, password, output_dir)
            .output()
            .await;

        if let Some(ticker) = ticker {
            ticker.stop().await;
        }
        let elapsed = start.elapsed();

        let error = match output {
            Ok(out) if out.status.success() => None,
            Ok(out) => Some(failure_text(&out)),
            Err(e) => Some(format!("failed to run '{}': {}", self.tool.program().display(), e)),
        };
        if let Some(err) = &error {
            warn!(archive = %target.first_volume.display(), error = %err, "extraction failed");
        }

        Ok(ExtractionResult {
            success: error.is_none(),
            output_dir: output_dir.to_path_buf(),
            elapsed,
            error,
        })
    }
}

fn failure_text(out: &Output) -> String {
    let stderr = String::from_utf8_lossy(&out.stderr);
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return format!("{}: {}", out.status, stderr);
    }
    let stdout = String::from_utf8_lossy(&out.stdout);
    let errors: Vec<&str> = stdout.lines().filter(|l| l.contains("ERROR")).collect();
    if errors.is_empty() {
        format!("archive tool exited with {}", out.status)
    } else {
        format!("{}: {}", out.status, errors.join("; "))
    }
}

fn part_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\.part\d+$").expect("static regex"))
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let cut = s.len().checked_sub(suffix.len())?;
    if s.is_char_boundary(cut) && s[cut..].eq_ignore_ascii_case(suffix) {
        Some(&s[..cut])
    } else {
        None
    }
}

/// Directory name derived from an archive file name.
///
/// Drops the final extension, then one container suffix (`.7z`, `.zip`,
/// `.rar`, `.tar`), then a `.partN` marker, so every volume of a set maps to
/// the same name: `backup.part2.rar`, `backup.7z.003` and `backup.tar.gz`
/// all give `backup`. A name that would not change gets `_extracted`.
pub fn output_dir_name(file_name: &str) -> String {
    let mut stem = match file_name.rfind('.') {
        Some(i) if i > 0 => &file_name[..i],
        _ => file_name,
    };
    if let Some(stripped) = CONTAINER_SUFFIXES
        .iter()
        .find_map(|suffix| strip_suffix_ignore_case(stem, suffix))
    {
        stem = stripped;
    }
    if let Some(m) = part_suffix_re().find(stem) {
        stem = &stem[..m.start()];
    }

    if stem.is_empty() || stem == file_name {
        format!("{}_extracted", file_name)
    } else {
        stem.to_string()
    }
}

/// `output_dir_name` placed next to the archive.
pub fn default_output_dir(archive: &Path) -> PathBuf {
    let name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    archive
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(output_dir_name(&name))
}
