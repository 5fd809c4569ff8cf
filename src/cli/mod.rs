use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Detects archive formats, recovers passwords from dictionary files by
/// driving 7-Zip, and extracts the archive.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// An archive (any volume of a set) or a directory to scan. Defaults to the current directory.
    pub path: Option<PathBuf>,

    /// Extract into this directory instead of one named after the archive. Single archive only.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Additional dictionary file, read after the default locations. May be repeated.
    #[arg(short, long = "dict", value_name = "FILE")]
    pub dictionaries: Vec<PathBuf>,

    /// Name of the dictionary file looked up in the current and program directories.
    #[arg(long, default_value = crate::config::DICTIONARY_NAME)]
    pub dict_name: String,

    /// Dictionary file that receives manually entered passwords. [default: <program dir>/passwd.txt]
    #[arg(long)]
    pub save_to: Option<PathBuf>,

    /// 7-Zip executable. If not provided, reads ARCHCRACK_TOOL or searches PATH for 7z, 7zz, 7za.
    #[arg(long)]
    pub tool: Option<PathBuf>,

    /// Milliseconds a test may run before it is stopped and the password counted as correct. [default: 2000]
    #[arg(long, value_name = "MS")]
    pub test_timeout_ms: Option<u64>,

    /// Only find the password; do not extract.
    #[arg(long)]
    pub no_extract: bool,

    /// Do not ask for a password when the dictionary is exhausted.
    #[arg(long)]
    pub no_prompt: bool,

    /// Descend into subdirectories when scanning a directory.
    #[arg(short = 'r', long)]
    pub recursive: bool,

    /// List the archives found and their types, then exit.
    #[arg(long)]
    pub list: bool,

    /// Print one JSON summary line per archive on stdout.
    #[arg(long)]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Parses command-line arguments using `clap`.
pub fn run() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let args = Args::try_parse_from([
            "archcrack",
            "secret.7z",
            "-d",
            "a.txt",
            "--dict",
            "b.txt",
            "--test-timeout-ms",
            "500",
            "-vv",
            "--no-prompt",
        ])
        .unwrap();
        assert_eq!(args.path, Some(PathBuf::from("secret.7z")));
        assert_eq!(args.dictionaries, vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]);
        assert_eq!(args.test_timeout_ms, Some(500));
        assert_eq!(args.verbose, 2);
        assert!(args.no_prompt);
        assert_eq!(args.dict_name, "passwd.txt");
    }

    #[test]
    fn no_arguments_means_scan() {
        let args = Args::try_parse_from(["archcrack"]).unwrap();
        assert!(args.path.is_none());
        assert!(!args.list);
    }
}
