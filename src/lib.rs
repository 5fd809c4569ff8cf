//! # archcrack Core Library
//!
//! This crate provides the core functionality for the `archcrack` command-line
//! tool: it identifies archive formats, recovers passwords from dictionary
//! files by driving an external 7-Zip executable, and extracts the result.
//!
//! ## Key Modules
//!
//! - [`classify`]: Format detection from magic bytes and file names.
//! - [`volume`]: Maps any volume of a multi-volume set to its first volume.
//! - [`dictionary`]: Loads and deduplicates candidate passwords.
//! - [`crack`]: Tests candidates against the archive tool in order.
//! - [`extract`]: Runs the extraction with an elapsed-time ticker.
//! - [`session`]: The per-archive pipeline tying the above together.
//!
//! ## Examples
//!
//! ```no_run
//! use archcrack::common::ArchiveTarget;
//!
//! let target = ArchiveTarget::resolve(std::path::Path::new("backup.part2.rar"));
//! println!("{} -> {}", target.kind, target.first_volume.display());
//! ```

pub mod classify;
pub mod cli;
pub mod cli_runner;
pub mod common;
pub mod config;
pub mod crack;
pub mod dictionary;
pub mod error;
pub mod extract;
pub mod progress;
pub mod scan;
pub mod session;
pub mod tool;
pub mod volume;

pub use error::{CrackError, Result};
