//! # Crack Engine
//!
//! Sequential dictionary attack driven through a [`PasswordTester`].
//!
//! ## Attempt order
//!
//! 1. The empty password, always first.
//! 2. Every dictionary candidate in set order, one at a time.
//!
//! The first accepted attempt ends the run. Nothing is ever tested twice and
//! no two tests overlap.
//!
//! ## Acceptance
//!
//! The raw [`Attempt`] is folded into accept/reject by an [`AcceptPolicy`].
//! The default policy accepts a run that printed the success marker, a run
//! that printed no known marker at all, and a run that was still busy when
//! the time budget expired. The last rule relies on the tool rejecting a
//! wrong password almost immediately while a right one makes it go on
//! verifying the whole archive. It is a heuristic, not a guarantee: truncated
//! or localised output can fool the inconclusive rule.

pub mod probe;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info};

use crate::common::ArchiveTarget;
use crate::dictionary::PasswordSet;
use crate::error::Result;
use crate::progress::{CrackProgress, CrackProgressCallback};
use crate::tool::markers::Verdict;

pub use probe::{Attempt, PasswordTester, ToolProbe};

/// Folds a raw [`Attempt`] into accepted / rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptPolicy {
    pub accept_inconclusive: bool,
    pub accept_timeout: bool,
}

impl Default for AcceptPolicy {
    fn default() -> Self {
        Self {
            accept_inconclusive: true,
            accept_timeout: true,
        }
    }
}

impl AcceptPolicy {
    /// Only an explicit success marker counts.
    pub fn strict() -> Self {
        Self {
            accept_inconclusive: false,
            accept_timeout: false,
        }
    }

    pub fn accepts(&self, attempt: Attempt) -> bool {
        match attempt {
            Attempt::Finished(Verdict::Success) => true,
            Attempt::Finished(Verdict::Failure) => false,
            Attempt::Finished(Verdict::Inconclusive) => self.accept_inconclusive,
            Attempt::TimedOut => self.accept_timeout,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CrackOutcome {
    Accepted { password: String },
    Exhausted { tried: usize, elapsed: Duration },
    /// Stopped by the cancel flag before the dictionary ran out.
    Cancelled { tried: usize, elapsed: Duration },
}

impl CrackOutcome {
    pub fn password(&self) -> Option<&str> {
        match self {
            CrackOutcome::Accepted { password } => Some(password),
            _ => None,
        }
    }
}

/// Outcome plus the timing of the whole run.
#[derive(Debug, Clone, PartialEq)]
pub struct CrackReport {
    pub outcome: CrackOutcome,
    /// Attempts made, the empty-password probe included.
    pub tried: usize,
    pub elapsed: Duration,
}

impl CrackReport {
    /// Attempts per second. Observational only.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.tried as f64 / secs
        } else {
            0.0
        }
    }
}

pub struct CrackEngine<T> {
    tester: T,
    policy: AcceptPolicy,
    progress: Option<Arc<CrackProgressCallback>>,
    cancel: Option<Arc<AtomicBool>>,
}

impl<T: PasswordTester> CrackEngine<T> {
    pub fn new(tester: T) -> Self {
        Self {
            tester,
            policy: AcceptPolicy::default(),
            progress: None,
            cancel: None,
        }
    }

    pub fn with_policy(mut self, policy: AcceptPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Called after every dictionary attempt.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(CrackProgress) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Checked before every attempt; setting it stops the run.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn tester(&self) -> &T {
        &self.tester
    }

    /// Tests one password outside the dictionary loop (manual entry).
    pub async fn try_password(&self, target: &ArchiveTarget, password: &str) -> Result<bool> {
        let attempt = self.tester.test(&target.first_volume, password).await?;
        Ok(self.policy.accepts(attempt))
    }

    /// Runs the attack. See the module docs for ordering and acceptance.
    pub async fn crack(&self, target: &ArchiveTarget, candidates: &PasswordSet) -> Result<CrackReport> {
        let start = Instant::now();
        let archive = target.first_volume.as_path();
        info!(archive = %archive.display(), candidates = candidates.len(), "cracking");

        let finish = |outcome: CrackOutcome, tried: usize| {
            let report = CrackReport {
                outcome,
                tried,
                elapsed: start.elapsed(),
            };
            info!(
                tried = report.tried,
                elapsed = ?report.elapsed,
                per_sec = report.throughput(),
                found = report.outcome.password().is_some(),
                "crack finished"
            );
            report
        };

        if self.is_cancelled() {
            return Ok(finish(CrackOutcome::Cancelled { tried: 0, elapsed: start.elapsed() }, 0));
        }

        let mut tried = 1;
        let attempt = self.tester.test(archive, "").await?;
        debug!(?attempt, "empty password");
        if self.policy.accepts(attempt) {
            return Ok(finish(CrackOutcome::Accepted { password: String::new() }, tried));
        }

        let total = candidates.len();
        for (index, password) in candidates.iter().enumerate() {
            if self.is_cancelled() {
                let outcome = CrackOutcome::Cancelled { tried, elapsed: start.elapsed() };
                return Ok(finish(outcome, tried));
            }

            let attempt = self.tester.test(archive, password).await?;
            tried += 1;
            let accepted = self.policy.accepts(attempt);
            debug!(index, ?attempt, accepted, "dictionary attempt");
            self.report(index + 1, total, password, start);

            if accepted {
                return Ok(finish(CrackOutcome::Accepted { password: password.to_string() }, tried));
            }
        }

        let outcome = CrackOutcome::Exhausted { tried, elapsed: start.elapsed() };
        Ok(finish(outcome, tried))
    }

    /// Whether the cancel flag has been set.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn report(&self, index: usize, total: usize, password: &str, start: Instant) {
        if let Some(callback) = &self.progress {
            callback(CrackProgress {
                index,
                total,
                percent: index as f32 * 100.0 / total.max(1) as f32,
                candidate: password.to_string(),
                elapsed: start.elapsed(),
            });
        }
    }
}
