//! # Dictionary Loader
//!
//! Reads password lists (one candidate per line, UTF-8 or GBK, optional BOM,
//! LF or CRLF) from a fixed set of locations and merges them into a single
//! insertion-ordered, duplicate-free [`PasswordSet`].

use std::borrow::Cow;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use indexmap::IndexSet;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{CrackError, Result};

const BOM: char = '\u{feff}';

/// Unique password candidates in first-seen order.
///
/// The empty string is never stored: it is always probed separately.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordSet {
    inner: IndexSet<String>,
}

impl PasswordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `password`; returns `false` for duplicates and for `""`.
    pub fn insert(&mut self, password: impl Into<String>) -> bool {
        let password = password.into();
        if password.is_empty() {
            return false;
        }
        self.inner.insert(password)
    }

    pub fn contains(&self, password: &str) -> bool {
        self.inner.contains(password)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.inner.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for PasswordSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = PasswordSet::new();
        set.extend(iter);
        set
    }
}

impl<S: Into<String>> Extend<S> for PasswordSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for password in iter {
            self.insert(password);
        }
    }
}

/// One contributing dictionary file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCount {
    pub path: PathBuf,
    /// Non-blank lines in this file, before cross-file deduplication.
    pub count: usize,
}

/// Which files contributed how many candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Provenance {
    pub sources: Vec<SourceCount>,
    /// Size of the merged, de-duplicated set.
    pub total: usize,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sources.is_empty() {
            return write!(f, "No dictionary files found");
        }
        writeln!(f, "Dictionary files used:")?;
        for (i, source) in self.sources.iter().enumerate() {
            writeln!(f, "{}. {} ({} passwords)", i + 1, source.path.display(), source.count)?;
        }
        write!(f, "\n{} unique passwords after deduplication", self.total)
    }
}

/// Result of [`DictionaryLoader::load_all`].
#[derive(Debug, Default)]
pub struct LoadedDictionary {
    pub candidates: PasswordSet,
    pub provenance: Provenance,
    /// Per-file failures. Other files still contributed.
    pub errors: Vec<CrackError>,
}

impl LoadedDictionary {
    /// The "no dictionary" condition: nothing usable in any source.
    /// Callers fall back to the empty-password probe and manual entry.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct DictionaryLoader {
    paths: Vec<PathBuf>,
    large_file_threshold: u64,
    large_read_timeout: Duration,
}

impl DictionaryLoader {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            large_file_threshold: 10 * 1024 * 1024,
            large_read_timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            paths: config.dictionary_paths(),
            large_file_threshold: config.large_file_threshold,
            large_read_timeout: config.large_read_timeout,
        }
    }

    pub fn with_large_file_limits(mut self, threshold: u64, timeout: Duration) -> Self {
        self.large_file_threshold = threshold;
        self.large_read_timeout = timeout;
        self
    }

    /// Reads every configured file once and merges the results.
    pub async fn load_all(&self) -> LoadedDictionary {
        let mut loaded = LoadedDictionary::default();

        for path in unique_paths(&self.paths) {
            let lines = match self.read_lines(&path).await {
                Ok(Some(lines)) => lines,
                Ok(None) => continue,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping dictionary file");
                    loaded.errors.push(e);
                    continue;
                }
            };
            if lines.is_empty() {
                debug!(path = %path.display(), "dictionary file is empty");
                continue;
            }
            loaded.provenance.sources.push(SourceCount {
                path: path.clone(),
                count: lines.len(),
            });
            loaded.candidates.extend(lines);
        }

        loaded.provenance.total = loaded.candidates.len();
        info!(
            files = loaded.provenance.sources.len(),
            unique = loaded.provenance.total,
            "dictionary loaded"
        );
        loaded
    }

    /// `Ok(None)` when the file does not exist.
    ///
    /// Regular files above the size threshold, and special files whose size
    /// says nothing (FIFOs, devices), go through [`Self::read_bounded`].
    async fn read_lines(&self, path: &Path) -> Result<Option<Vec<String>>> {
        let meta = match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => return Ok(None),
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CrackError::io(e, path)),
        };

        let bytes = if meta.is_file() && meta.len() <= self.large_file_threshold {
            fs::read(path).map_err(|e| CrackError::io(e, path))?
        } else {
            self.read_bounded(path).await?
        };

        Ok(Some(parse_lines(&decode(&bytes))))
    }

    /// Reads on a detached thread so a read that never returns cannot hold up
    /// runtime shutdown once the timeout has given up on it.
    async fn read_bounded(&self, path: &Path) -> Result<Vec<u8>> {
        debug!(path = %path.display(), timeout = ?self.large_read_timeout, "reading large dictionary");
        let (tx, rx) = oneshot::channel();
        let owned = path.to_path_buf();
        thread::Builder::new()
            .name("dictionary-read".into())
            .spawn(move || {
                let _ = tx.send(fs::read(owned));
            })
            .map_err(|e| CrackError::io(e, path))?;

        match tokio::time::timeout(self.large_read_timeout, rx).await {
            Ok(Ok(read)) => read.map_err(|e| CrackError::io(e, path)),
            Ok(Err(_)) => Err(CrackError::io(
                std::io::Error::other("dictionary reader exited without a result"),
                path,
            )),
            Err(_) => Err(CrackError::DictionaryTimeout {
                path: path.to_path_buf(),
                timeout: self.large_read_timeout,
            }),
        }
    }
}

/// Drops paths that resolve to the same file, keeping the first occurrence.
fn unique_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = IndexSet::new();
    let mut unique = Vec::with_capacity(paths.len());
    for path in paths {
        let key = fs::canonicalize(path).unwrap_or_else(|_| path.clone());
        if seen.insert(key) {
            unique.push(path.clone());
        }
    }
    unique
}

/// Decodes dictionary bytes: UTF-8 when valid, GBK otherwise.
pub fn decode(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => encoding_rs::GBK.decode_without_bom_handling(bytes).0,
    }
}

/// Splits decoded text into candidates: strips a leading BOM and trailing
/// whitespace (including `\r`) and drops blank lines.
pub fn parse_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim_start_matches(BOM).trim_end())
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Appends a manually confirmed password to the dictionary at `path`.
///
/// Does nothing when an identical line is already present. Creates the file
/// if needed and repairs a missing trailing newline first. Returns whether
/// the password was written.
pub fn append_password(path: &Path, password: &str) -> Result<bool> {
    if password.is_empty() {
        return Ok(false);
    }
    let existing = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(CrackError::io(e, path)),
    };
    if parse_lines(&decode(&existing)).iter().any(|line| line == password) {
        return Ok(false);
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| CrackError::io(e, path))?;
    let mut record = String::with_capacity(password.len() + 2);
    if !existing.is_empty() && !existing.ends_with(b"\n") {
        record.push('\n');
    }
    record.push_str(password);
    record.push('\n');
    file.write_all(record.as_bytes()).map_err(|e| CrackError::io(e, path))?;
    Ok(true)
}
