//! Common utilities and types module.
// Shared archive model, formatting helpers.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Archive container kind, including the multi-volume variants the tool
/// accepts through their first volume.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveKind {
    Zip,
    Rar,
    SevenZip,
    ZipPart,
    RarPart,
    SevenZipPart,
    Gzip,
    Bzip2,
    Tar,
    TarPart,
    Xz,
    Cab,
    Iso,
    Arj,
    Lzh,
    Wim,
    /// Not a supported archive.
    Unknown,
}

impl ArchiveKind {
    /// Legacy numeric code; `Unknown` is `-1`.
    pub fn code(self) -> i32 {
        match self {
            ArchiveKind::Zip => 0,
            ArchiveKind::Rar => 1,
            ArchiveKind::SevenZip => 2,
            ArchiveKind::ZipPart => 3,
            ArchiveKind::RarPart => 4,
            ArchiveKind::SevenZipPart => 5,
            ArchiveKind::Gzip => 6,
            ArchiveKind::Bzip2 => 7,
            ArchiveKind::Tar => 8,
            ArchiveKind::TarPart => 9,
            ArchiveKind::Xz => 10,
            ArchiveKind::Cab => 11,
            ArchiveKind::Iso => 12,
            ArchiveKind::Arj => 13,
            ArchiveKind::Lzh => 14,
            ArchiveKind::Wim => 15,
            ArchiveKind::Unknown => -1,
        }
    }

    /// Whether the format can carry a password and must go through cracking.
    ///
    /// `Unknown` answers `true` so an unrecognised container is probed rather
    /// than extracted blindly without one.
    pub fn requires_password(self) -> bool {
        match self {
            ArchiveKind::Zip
            | ArchiveKind::ZipPart
            | ArchiveKind::Rar
            | ArchiveKind::RarPart
            | ArchiveKind::SevenZip
            | ArchiveKind::SevenZipPart
            | ArchiveKind::Arj
            | ArchiveKind::Lzh => true,
            ArchiveKind::Tar
            | ArchiveKind::TarPart
            | ArchiveKind::Gzip
            | ArchiveKind::Bzip2
            | ArchiveKind::Xz
            | ArchiveKind::Iso
            | ArchiveKind::Wim
            | ArchiveKind::Cab => false,
            ArchiveKind::Unknown => true,
        }
    }

    pub fn is_supported(self) -> bool {
        self != ArchiveKind::Unknown
    }

    pub fn is_multi_volume(self) -> bool {
        matches!(
            self,
            ArchiveKind::ZipPart | ArchiveKind::RarPart | ArchiveKind::SevenZipPart | ArchiveKind::TarPart
        )
    }

    /// Human readable label used in banners and summaries.
    pub fn description(self) -> &'static str {
        match self {
            ArchiveKind::Zip => "ZIP archive",
            ArchiveKind::Rar => "RAR archive",
            ArchiveKind::SevenZip => "7Z archive",
            ArchiveKind::ZipPart => "ZIP multi-volume archive",
            ArchiveKind::RarPart => "RAR multi-volume archive",
            ArchiveKind::SevenZipPart => "7Z multi-volume archive",
            ArchiveKind::Gzip => "GZIP compressed file",
            ArchiveKind::Bzip2 => "BZIP2 compressed file",
            ArchiveKind::Tar => "TAR archive",
            ArchiveKind::TarPart => "TAR multi-volume archive",
            ArchiveKind::Xz => "XZ compressed file",
            ArchiveKind::Cab => "CAB archive",
            ArchiveKind::Iso => "ISO image",
            ArchiveKind::Arj => "ARJ archive",
            ArchiveKind::Lzh => "LZH archive",
            ArchiveKind::Wim => "WIM image",
            ArchiveKind::Unknown => "unknown file type",
        }
    }
}

impl std::fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// A user-selected file resolved for processing. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveTarget {
    /// The path the user pointed at (any volume of a set).
    pub original: PathBuf,
    /// The path handed to the archive tool.
    pub first_volume: PathBuf,
    pub kind: ArchiveKind,
    pub requires_password: bool,
}

impl ArchiveTarget {
    /// Classifies `path` and resolves its first volume.
    pub fn resolve(path: &Path) -> Self {
        let kind = crate::classify::classify(path);
        let first_volume = crate::volume::first_volume(path);
        Self {
            original: path.to_path_buf(),
            first_volume,
            kind,
            requires_password: kind.requires_password(),
        }
    }

    /// True when the tool will be fed a different file than the one selected.
    pub fn redirected(&self) -> bool {
        self.first_volume != self.original
    }
}

/// Formats a byte count as `B`, `KB`, `MB`, ... with one decimal.
pub fn format_size(size: u64) -> String {
    const UNIT: u64 = 1024;
    if size < UNIT {
        return format!("{} B", size);
    }
    let mut div = UNIT;
    let mut exp = 0usize;
    let mut n = size / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    let unit = "KMGTPE".as_bytes()[exp] as char;
    format!("{:.1} {}B", size as f64 / div as f64, unit)
}

/// Formats a duration as `1h02m03s`, `2m05s` or `7s`.
pub fn format_duration(d: Duration) -> String {
    let total = d.as_secs();
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    if h > 0 {
        format!("{}h{:02}m{:02}s", h, m, s)
    } else if m > 0 {
        format!("{}m{:02}s", m, s)
    } else {
        format!("{}s", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_requirement_table() {
        let needs = [
            ArchiveKind::Zip,
            ArchiveKind::ZipPart,
            ArchiveKind::Rar,
            ArchiveKind::RarPart,
            ArchiveKind::SevenZip,
            ArchiveKind::Arj,
            ArchiveKind::Lzh,
            ArchiveKind::Unknown,
        ];
        let skips = [
            ArchiveKind::Tar,
            ArchiveKind::TarPart,
            ArchiveKind::Gzip,
            ArchiveKind::Bzip2,
            ArchiveKind::Xz,
            ArchiveKind::Iso,
            ArchiveKind::Wim,
            ArchiveKind::Cab,
        ];
        for kind in needs {
            assert!(kind.requires_password(), "{:?}", kind);
        }
        for kind in skips {
            assert!(!kind.requires_password(), "{:?}", kind);
        }
    }

    #[test]
    fn unknown_code_is_negative() {
        assert_eq!(ArchiveKind::Unknown.code(), -1);
        assert_eq!(ArchiveKind::Zip.code(), 0);
        assert_eq!(ArchiveKind::Wim.code(), 15);
    }

    #[test]
    fn sizes_and_durations() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(10 * 1024 * 1024), "10.0 MB");
        assert_eq!(format_duration(Duration::from_secs(7)), "7s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m05s");
        assert_eq!(format_duration(Duration::from_secs(3723)), "1h02m03s");
    }
}
