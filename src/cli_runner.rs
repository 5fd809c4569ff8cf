//! CLI driver: turns parsed [`Args`] into a batch of session runs and renders
//! progress and results on the terminal.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::cli::Args;
use crate::common::{format_duration, format_size, ArchiveTarget};
use crate::config::Config;
use crate::crack::{CrackEngine, ToolProbe};
use crate::dictionary::DictionaryLoader;
use crate::error::{CrackError, Result};
use crate::extract::Extractor;
use crate::progress::CrackProgress;
use crate::scan::find_archives;
use crate::session::{ArchiveSummary, NoPrompt, PasswordPrompt, Resolution, Session};
use crate::tool::ArchiveTool;

/// Runs the CLI for already parsed arguments.
pub async fn run_cli_app(args: Args) -> Result<ExitCode> {
    let root = match &args.path {
        Some(path) => path.clone(),
        None => std::env::current_dir().map_err(|e| CrackError::io(e, "."))?,
    };
    let meta = std::fs::metadata(&root).map_err(|e| CrackError::io(e, &root))?;
    let batch = meta.is_dir();
    let archives = if batch {
        find_archives(&root, args.recursive)
    } else {
        vec![root.clone()]
    };

    let out = Output { json: args.json };

    if args.list {
        for path in &archives {
            let target = ArchiveTarget::resolve(path);
            out.line(format!("{:<28} {}", target.kind.description(), path.display()));
        }
        return Ok(ExitCode::SUCCESS);
    }
    if archives.is_empty() {
        out.line(format!("No archives found in {}", root.display()));
        return Ok(ExitCode::SUCCESS);
    }
    if batch && args.output.is_some() {
        return Err(CrackError::Config("--output applies to a single archive, not a directory".into()));
    }

    let mut config = Config::resolve(args.tool.clone(), args.test_timeout_ms)?;
    config.dictionary_name = args.dict_name.clone();
    config.extra_dictionaries = args.dictionaries.clone();
    if let Some(save_to) = &args.save_to {
        config.save_manual_to = save_to.clone();
    }

    let loaded = DictionaryLoader::from_config(&config).load_all().await;
    if loaded.is_empty() {
        out.line("No passwords found in any dictionary file; trying an empty password only.".to_string());
    } else {
        out.line(loaded.provenance.to_string());
    }

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.store(true, Ordering::Relaxed);
            }
        });
    }

    let tool = ArchiveTool::new(config.tool.clone());
    let probe = ToolProbe::new(tool.clone(), config.test_timeout);
    info!(tool = %tool.program().display(), budget = ?probe.budget(), "archive tool ready");
    let engine = CrackEngine::new(probe)
        .with_progress(create_cli_progress_callback())
        .with_cancel_flag(Arc::clone(&cancel));
    let extractor = Extractor::new(tool)
        .with_tick_interval(config.tick_interval)
        .with_ticker(|elapsed| {
            eprint!("\r\x1B[2KExtracting... elapsed {}", format_duration(elapsed));
            io::stderr().flush().ok();
        });
    let mut session = Session::new(engine, extractor, loaded.candidates)
        .save_manual_to(Some(config.save_manual_to.clone()))
        .output_dir(args.output.clone())
        .extract(!args.no_extract);

    let mut terminal = TerminalPrompt {
        cancel: Arc::clone(&cancel),
    };
    let mut all_ok = true;

    for path in &archives {
        if cancel.load(Ordering::Relaxed) {
            break;
        }
        print_banner(&out, path);
        let processed = if args.no_prompt {
            session.process(path, &mut NoPrompt).await
        } else {
            session.process(path, &mut terminal).await
        };
        match processed {
            Ok(summary) => {
                all_ok &= summary.succeeded();
                report(&out, &summary);
            }
            Err(CrackError::Unsupported(path)) => {
                all_ok = false;
                out.line(format!("Unsupported file format: {}", path.display()));
            }
            Err(e) if batch => {
                all_ok = false;
                out.line(format!("Failed: {}", e));
            }
            Err(e) => return Err(e),
        }
    }

    Ok(if all_ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Human output goes to stdout, or to stderr when stdout carries JSON.
struct Output {
    json: bool,
}

impl Output {
    fn line(&self, msg: String) {
        if self.json {
            eprintln!("{}", msg);
        } else {
            println!("{}", msg);
        }
    }

    fn summary(&self, summary: &ArchiveSummary) {
        if self.json {
            match serde_json::to_string(summary) {
                Ok(line) => println!("{}", line),
                Err(e) => eprintln!("Error: cannot serialise summary: {}", e),
            }
        }
    }
}

fn print_banner(out: &Output, path: &Path) {
    let shown = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let target = ArchiveTarget::resolve(path);
    out.line(String::new());
    out.line(format!("Processing: {}", shown.display()));
    if let Ok(meta) = std::fs::metadata(path) {
        out.line(format!("Size: {}", format_size(meta.len())));
    }
    out.line(format!("Type: {}", target.kind));
    if target.kind.is_multi_volume() && target.redirected() {
        out.line(format!("Using first volume: {}", target.first_volume.display()));
    }
}

fn report(out: &Output, summary: &ArchiveSummary) {
    // Terminate the progress line left on stderr.
    eprintln!();
    match summary.resolution {
        Resolution::NotRequired => out.line("Format has no password, extracting directly".to_string()),
        Resolution::Dictionary | Resolution::Manual => {
            let found_in = if summary.resolution == Resolution::Manual { "entered" } else { "found" };
            match summary.password.as_deref() {
                Some("") => out.line("Archive has no password".to_string()),
                Some(password) => out.line(format!("Password {}: [{}]", found_in, password)),
                None => {}
            }
            out.line(format!(
                "Tried {} passwords in {}",
                summary.tried,
                format_duration(Duration::from_millis(summary.elapsed_ms as u64))
            ));
            if summary.saved {
                out.line("Password saved to the dictionary file".to_string());
            }
        }
        Resolution::Exhausted => out.line(format!("Password not found after {} attempts", summary.tried)),
        Resolution::Cancelled => out.line("Cancelled".to_string()),
    }

    if let Some(result) = &summary.extraction {
        if result.success {
            let shown: PathBuf = std::path::absolute(&result.output_dir).unwrap_or_else(|_| result.output_dir.clone());
            out.line(format!(
                "Extracted in {} to: {}",
                format_duration(result.elapsed),
                shown.display()
            ));
        } else {
            out.line(format!(
                "Extraction failed: {}",
                result.error.as_deref().unwrap_or("unknown error")
            ));
        }
    }
    out.summary(summary);
}

/// Hidden terminal input for passwords the dictionary did not have.
///
/// The read runs on its own thread; Ctrl-C abandons it, restores the
/// terminal mode and sets the shared cancel flag.
struct TerminalPrompt {
    cancel: Arc<AtomicBool>,
}

impl PasswordPrompt for TerminalPrompt {
    async fn ask(&mut self, target: &ArchiveTarget) -> Option<String> {
        let name = target
            .original
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let label = format!("Password for {} (Enter to skip): ", name);
        eprintln!();

        let tty = TtyState::save();
        let (tx, rx) = oneshot::channel();
        let spawned = std::thread::Builder::new()
            .name("password-prompt".into())
            .spawn(move || {
                let _ = tx.send(rpassword::prompt_password(label));
            });
        if let Err(e) = spawned {
            warn!(error = %e, "cannot start password prompt");
            return None;
        }

        tokio::select! {
            answer = rx => match answer {
                Ok(Ok(password)) => Some(password.trim_end_matches(['\r', '\n']).to_string()),
                _ => None,
            },
            _ = tokio::signal::ctrl_c() => {
                tty.restore();
                eprintln!();
                self.cancel.store(true, Ordering::Relaxed);
                None
            }
        }
    }

    fn rejected(&mut self, _password: &str) {
        eprintln!("Wrong password. Try again or press Enter to skip.");
    }
}

/// Terminal attributes captured before a hidden read turns echo off.
#[cfg(unix)]
struct TtyState(Option<libc::termios>);

#[cfg(unix)]
impl TtyState {
    fn save() -> Self {
        let mut attrs = std::mem::MaybeUninit::<libc::termios>::uninit();
        // SAFETY: tcgetattr initialises `attrs` when it returns 0.
        unsafe {
            if libc::tcgetattr(libc::STDIN_FILENO, attrs.as_mut_ptr()) == 0 {
                Self(Some(attrs.assume_init()))
            } else {
                Self(None)
            }
        }
    }

    fn restore(&self) {
        if let Some(attrs) = &self.0 {
            // SAFETY: `attrs` came from tcgetattr on the same descriptor.
            unsafe {
                libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, attrs);
            }
        }
    }
}

#[cfg(not(unix))]
struct TtyState;

#[cfg(not(unix))]
impl TtyState {
    fn save() -> Self {
        TtyState
    }

    fn restore(&self) {}
}

// --- utils for CLI progress -------------------------------------------------

fn create_cli_progress_callback() -> impl Fn(CrackProgress) + Send + Sync + 'static {
    let last_update = Mutex::new(None::<Instant>);

    move |state: CrackProgress| {
        let now = Instant::now();
        // Update every 100ms to avoid terminal spam, but always show the last attempt.
        let should_update = state.index >= state.total || {
            let mut last = match last_update.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            match *last {
                Some(at) if now.duration_since(at) < Duration::from_millis(100) => false,
                _ => {
                    *last = Some(now);
                    true
                }
            }
        };
        if !should_update {
            return;
        }

        // Determine terminal width (default 80)
        let term_width = term_size::dimensions().map(|(w, _)| w).unwrap_or(80);
        let mut line = format!(
            "Trying passwords... {}/{} ({:.1}%) {:.1}/s [{}]",
            state.index,
            state.total,
            state.percent,
            state.rate(),
            state.candidate
        );
        if line.chars().count() > term_width {
            line = line.chars().take(term_width.saturating_sub(1)).collect();
        }

        eprint!("\r\x1B[2K{}", line);
        io::stderr().flush().ok();
    }
}
