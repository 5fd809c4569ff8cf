//! Archive discovery for batch runs.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use indexmap::IndexSet;
use regex::Regex;
use tracing::debug;
use walkdir::WalkDir;

use crate::volume::first_volume;

const ARCHIVE_SUFFIXES: &[&str] = &[
    ".zip", ".rar", ".7z", ".gz", ".tgz", ".tar.gz", ".bz2", ".tbz2", ".tar.bz2", ".tar", ".xz", ".txz",
    ".tar.xz", ".cab", ".iso", ".arj", ".lzh", ".lha", ".wim", ".swm",
];

fn volume_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\.zip\.\d+|\.z\d{2}|\.part\d+\.rar|\.r\d{2}|\.7z\.\d+|\.tar\.\d{3})$").expect("static regex")
    })
}

/// Whether a file name looks like an archive or an archive volume.
pub fn looks_like_archive(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    ARCHIVE_SUFFIXES.iter().any(|s| lower.ends_with(s)) || volume_name_re().is_match(&lower)
}

/// Archives under `dir`, one entry per multi-volume set (its first volume),
/// sorted by path. Only the top level unless `recursive`.
pub fn find_archives(dir: &Path, recursive: bool) -> Vec<PathBuf> {
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .sort_by_file_name();

    let mut found = IndexSet::new();
    for entry in walker.into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !looks_like_archive(&name) {
            continue;
        }
        let head = first_volume(entry.path());
        if found.insert(head.clone()) {
            debug!(path = %head.display(), "found archive");
        }
    }

    let mut archives: Vec<PathBuf> = found.into_iter().collect();
    archives.sort();
    archives
}
