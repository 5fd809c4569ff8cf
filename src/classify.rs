//! # Type Classifier
//!
//! Maps a path to an [`ArchiveKind`]. Three stages run in strict order and the
//! first hit wins:
//!
//! 1. volume-name patterns on the lower-cased file name (no I/O),
//! 2. magic-byte sniffing of at most [`SNIFF_LEN`] bytes of content,
//! 3. suffix fallback over the known extensions.
//!
//! Anything else is [`ArchiveKind::Unknown`]. An unopenable file is also
//! `Unknown`; classification never returns an error.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::common::ArchiveKind;

/// Upper bound on the content prefix inspected by the sniffer.
pub const SNIFF_LEN: u64 = 8 * 1024;

/// Suffixes checked by the final stage, compound forms first.
const EXTENSIONS: &[(&str, ArchiveKind)] = &[
    (".tar.gz", ArchiveKind::Gzip),
    (".tar.bz2", ArchiveKind::Bzip2),
    (".tar.xz", ArchiveKind::Xz),
    (".zip", ArchiveKind::Zip),
    (".rar", ArchiveKind::Rar),
    (".7z", ArchiveKind::SevenZip),
    (".gz", ArchiveKind::Gzip),
    (".tgz", ArchiveKind::Gzip),
    (".bz2", ArchiveKind::Bzip2),
    (".tbz2", ArchiveKind::Bzip2),
    (".tar", ArchiveKind::Tar),
    (".xz", ArchiveKind::Xz),
    (".txz", ArchiveKind::Xz),
    (".cab", ArchiveKind::Cab),
    (".iso", ArchiveKind::Iso),
    (".arj", ArchiveKind::Arj),
    (".lzh", ArchiveKind::Lzh),
    (".lha", ArchiveKind::Lzh),
    (".wim", ArchiveKind::Wim),
    (".swm", ArchiveKind::Wim),
];

type Matcher = fn(&[u8]) -> bool;

/// Signature table in match order.
const SIGNATURES: &[(Matcher, ArchiveKind)] = &[
    (infer::archive::is_zip, ArchiveKind::Zip),
    (infer::archive::is_rar, ArchiveKind::Rar),
    (infer::archive::is_7z, ArchiveKind::SevenZip),
    (infer::archive::is_gz, ArchiveKind::Gzip),
    (infer::archive::is_bz2, ArchiveKind::Bzip2),
    (infer::archive::is_tar, ArchiveKind::Tar),
    (infer::archive::is_xz, ArchiveKind::Xz),
    (infer::archive::is_cab, ArchiveKind::Cab),
    (is_iso9660, ArchiveKind::Iso),
];

fn seven_zip_part_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.7z\.\d{3}$").expect("static regex"))
}

fn tar_part_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.tar\.\d{3}$").expect("static regex"))
}

/// ISO-9660 primary volume descriptor: `CD001` at byte 0x8001.
///
/// The descriptor lives past the default sniff window, so this only fires
/// for callers that hand [`sniff`] a longer buffer.
fn is_iso9660(buf: &[u8]) -> bool {
    buf.get(0x8001..0x8006) == Some(b"CD001".as_slice())
}

/// Classifies `path`. See the module docs for the precedence rules.
pub fn classify(path: &Path) -> ArchiveKind {
    let name = lower_file_name(path);

    if let Some(kind) = match_volume_name(&name) {
        debug!(path = %path.display(), ?kind, "classified by volume name");
        return kind;
    }

    let header = match read_prefix(path) {
        Some(bytes) => bytes,
        None => return ArchiveKind::Unknown,
    };

    if let Some(kind) = sniff(&header) {
        debug!(path = %path.display(), ?kind, "classified by signature");
        return kind;
    }

    let kind = match_extension(&name);
    debug!(path = %path.display(), ?kind, code = kind.code(), "classified by extension");
    kind
}

/// Stage 1: multi-volume name patterns. `name` must already be lower-cased.
pub fn match_volume_name(name: &str) -> Option<ArchiveKind> {
    if seven_zip_part_re().is_match(name) {
        return Some(ArchiveKind::SevenZipPart);
    }
    if name.contains(".zip.") || name.ends_with(".z01") {
        return Some(ArchiveKind::ZipPart);
    }
    if (name.contains(".part") && name.ends_with(".rar")) || name.ends_with(".r01") {
        return Some(ArchiveKind::RarPart);
    }
    if tar_part_re().is_match(name) {
        return Some(ArchiveKind::TarPart);
    }
    None
}

/// Stage 2: magic bytes.
pub fn sniff(header: &[u8]) -> Option<ArchiveKind> {
    SIGNATURES
        .iter()
        .find(|(matches, _)| matches(header))
        .map(|&(_, kind)| kind)
}

/// Stage 3: suffix table. `name` must already be lower-cased.
pub fn match_extension(name: &str) -> ArchiveKind {
    EXTENSIONS
        .iter()
        .find(|(suffix, _)| name.ends_with(suffix))
        .map(|&(_, kind)| kind)
        .unwrap_or(ArchiveKind::Unknown)
}

fn lower_file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn read_prefix(path: &Path) -> Option<Vec<u8>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "cannot open for sniffing");
            return None;
        }
    };
    let mut header = Vec::with_capacity(SNIFF_LEN as usize);
    match file.take(SNIFF_LEN).read_to_end(&mut header) {
        Ok(_) => Some(header),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "cannot read header");
            None
        }
    }
}
