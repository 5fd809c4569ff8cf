//! # Volume Resolver
//!
//! Finds the first volume of a numbered multi-volume set from any of its
//! members. Purely name driven: the only I/O is an existence probe on a few
//! candidate siblings, archive content is never opened.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

struct VolumePatterns {
    seven_zip: Regex,
    zip_dotted: Regex,
    zip_legacy: Regex,
    rar_part: Regex,
    rar_legacy: Regex,
}

fn patterns() -> &'static VolumePatterns {
    static PATTERNS: OnceLock<VolumePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| VolumePatterns {
        seven_zip: Regex::new(r"(?i)^(.*\.7z\.)\d{3}$").expect("static regex"),
        zip_dotted: Regex::new(r"(?i)^(.*\.zip\.)\d{3}$").expect("static regex"),
        zip_legacy: Regex::new(r"(?i)^(.*)\.z\d{2}$").expect("static regex"),
        rar_part: Regex::new(r"(?i)^(.*\.part)(\d+)(\.rar)$").expect("static regex"),
        rar_legacy: Regex::new(r"(?i)^(.*)\.r\d{2}$").expect("static regex"),
    })
}

/// Returns the path the archive tool should be given for `path`.
///
/// Rules, first match wins:
///
/// | member            | first volume      | existence checked |
/// |-------------------|-------------------|-------------------|
/// | `name.7z.NNN`     | `name.7z.001`     | no                |
/// | `name.zip.NNN`    | `name.zip.001`    | yes               |
/// | `name.zNN`        | `name.zip`        | yes               |
/// | `name.partN.rar`  | `name.part1.rar`  | padded form only  |
/// | `name.rNN`        | `name.rar`        | no                |
///
/// A checked candidate that does not exist falls through to the next rule.
/// The base of `partN.rar` ends before the last `.part`. The result is always
/// `part1`, except that a zero-padded set (`part03`) maps to `part01` when
/// only that file exists on disk. Anything unmatched, including a `.zip` head
/// with `.z01` siblings, is returned as is.
pub fn first_volume(path: &Path) -> PathBuf {
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n,
        None => return path.to_path_buf(),
    };
    let p = patterns();

    if let Some(caps) = p.seven_zip.captures(name) {
        return path.with_file_name(format!("{}001", &caps[1]));
    }

    if let Some(caps) = p.zip_dotted.captures(name) {
        let candidate = path.with_file_name(format!("{}001", &caps[1]));
        if candidate.exists() {
            return candidate;
        }
    }

    if let Some(caps) = p.zip_legacy.captures(name) {
        let candidate = path.with_file_name(format!("{}.zip", &caps[1]));
        if candidate.exists() {
            return candidate;
        }
    }

    if let Some(caps) = p.rar_part.captures(name) {
        let first = path.with_file_name(format!("{}1{}", &caps[1], &caps[3]));
        let width = caps[2].len();
        if width > 1 && !first.exists() {
            let padded = path.with_file_name(format!("{}{:0width$}{}", &caps[1], 1, &caps[3], width = width));
            if padded.exists() {
                return padded;
            }
        }
        return first;
    }

    if let Some(caps) = p.rar_legacy.captures(name) {
        return path.with_file_name(format!("{}.rar", &caps[1]));
    }

    path.to_path_buf()
}
