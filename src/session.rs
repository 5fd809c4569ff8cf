//! Per-archive pipeline: classify, resolve volume, crack if needed, extract.
//!
//! A [`Session`] owns the dictionary for a whole batch, so passwords
//! confirmed by hand for one archive are tried on the next.

use std::future::Future;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::common::{ArchiveKind, ArchiveTarget};
use crate::crack::{CrackEngine, CrackOutcome, PasswordTester};
use crate::dictionary::{append_password, PasswordSet};
use crate::error::{CrackError, Result};
use crate::extract::{default_output_dir, ExtractionResult, Extractor};

/// Source of passwords typed in after the dictionary is exhausted.
///
/// Asking is async so an interactive implementation can wait on input
/// without blocking the runtime, and give up when the run is cancelled.
pub trait PasswordPrompt {
    /// Next password to try; `None` gives up.
    fn ask(&mut self, target: &ArchiveTarget) -> impl Future<Output = Option<String>>;

    /// Called when the last answer was wrong.
    fn rejected(&mut self, _password: &str) {}
}

/// Prompt that never answers.
pub struct NoPrompt;

impl PasswordPrompt for NoPrompt {
    async fn ask(&mut self, _target: &ArchiveTarget) -> Option<String> {
        None
    }
}

/// How the password was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Format without encryption; extracted with an empty password.
    NotRequired,
    Dictionary,
    Manual,
    Exhausted,
    Cancelled,
}

/// What happened to one archive.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveSummary {
    pub path: PathBuf,
    pub kind: ArchiveKind,
    pub first_volume: PathBuf,
    pub resolution: Resolution,
    pub password: Option<String>,
    pub tried: usize,
    pub elapsed_ms: u128,
    /// Whether a manual password was appended to the dictionary file.
    pub saved: bool,
    pub extraction: Option<ExtractionResult>,
}

impl ArchiveSummary {
    pub fn succeeded(&self) -> bool {
        match &self.extraction {
            Some(result) => result.success,
            None => self.password.is_some(),
        }
    }
}

pub struct Session<T> {
    engine: CrackEngine<T>,
    extractor: Extractor,
    dictionary: PasswordSet,
    save_manual_to: Option<PathBuf>,
    output_override: Option<PathBuf>,
    extract: bool,
}

impl<T: PasswordTester> Session<T> {
    pub fn new(engine: CrackEngine<T>, extractor: Extractor, dictionary: PasswordSet) -> Self {
        Self {
            engine,
            extractor,
            dictionary,
            save_manual_to: None,
            output_override: None,
            extract: true,
        }
    }

    /// Dictionary file that receives manually confirmed passwords.
    pub fn save_manual_to(mut self, path: Option<PathBuf>) -> Self {
        self.save_manual_to = path;
        self
    }

    /// Fixed output directory instead of the derived one.
    pub fn output_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.output_override = dir;
        self
    }

    /// Stop after the password is settled.
    pub fn extract(mut self, extract: bool) -> Self {
        self.extract = extract;
        self
    }

    pub fn dictionary(&self) -> &PasswordSet {
        &self.dictionary
    }

    pub async fn process<P: PasswordPrompt>(&mut self, path: &Path, prompt: &mut P) -> Result<ArchiveSummary> {
        let target = ArchiveTarget::resolve(path);
        if !target.kind.is_supported() {
            return Err(CrackError::Unsupported(path.to_path_buf()));
        }
        info!(
            path = %path.display(),
            kind = %target.kind,
            first_volume = %target.first_volume.display(),
            "processing archive"
        );

        let mut summary = ArchiveSummary {
            path: path.to_path_buf(),
            kind: target.kind,
            first_volume: target.first_volume.clone(),
            resolution: Resolution::NotRequired,
            password: None,
            tried: 0,
            elapsed_ms: 0,
            saved: false,
            extraction: None,
        };

        if !target.requires_password {
            summary.password = Some(String::new());
        } else {
            let report = self.engine.crack(&target, &self.dictionary).await?;
            summary.tried = report.tried;
            summary.elapsed_ms = report.elapsed.as_millis();
            match report.outcome {
                CrackOutcome::Accepted { password } => {
                    summary.resolution = Resolution::Dictionary;
                    summary.password = Some(password);
                }
                CrackOutcome::Cancelled { .. } => {
                    summary.resolution = Resolution::Cancelled;
                    return Ok(summary);
                }
                CrackOutcome::Exhausted { .. } => match self.manual_entry(&target, prompt).await? {
                    Some(password) => {
                        summary.saved = self.remember(&password);
                        summary.resolution = Resolution::Manual;
                        summary.password = Some(password);
                    }
                    None => {
                        summary.resolution = if self.engine.is_cancelled() {
                            Resolution::Cancelled
                        } else {
                            Resolution::Exhausted
                        };
                        return Ok(summary);
                    }
                },
            }
        }

        if self.extract {
            if let Some(password) = &summary.password {
                let dir = self
                    .output_override
                    .clone()
                    .unwrap_or_else(|| default_output_dir(&target.original));
                summary.extraction = Some(self.extractor.extract(&target, password, &dir).await?);
            }
        }
        Ok(summary)
    }

    async fn manual_entry<P: PasswordPrompt>(&self, target: &ArchiveTarget, prompt: &mut P) -> Result<Option<String>> {
        while let Some(password) = prompt.ask(target).await {
            if password.is_empty() || self.engine.is_cancelled() {
                break;
            }
            if self.engine.try_password(target, &password).await? {
                return Ok(Some(password));
            }
            prompt.rejected(&password);
        }
        Ok(None)
    }

    /// Adds a confirmed password to the in-memory set and the dictionary file.
    fn remember(&mut self, password: &str) -> bool {
        self.dictionary.insert(password);
        let Some(path) = &self.save_manual_to else {
            return false;
        };
        match append_password(path, password) {
            Ok(written) => written,
            Err(e) => {
                warn!(error = %e, "could not save password");
                false
            }
        }
    }
}
