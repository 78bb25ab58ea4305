//! Bentley - terminal logging for the cyberintel workspace
//!
//! ## Features
//!
//! - Standard logging levels (info, warn, error, debug, verbose, success)
//! - Multi-line message support with consistent prefixes
//! - Banner output for run summaries
//! - `tracing` subscriber bootstrap shared by every binary in the workspace
//! - All terminal output goes to stderr so stdout stays machine-readable
//!
//! ## Usage
//!
//! Prefer the macros (`bentley::info!`, `bentley::warn!`, ...) at call sites;
//! they expand to the plain functions below.

use colored::*;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

#[cfg(feature = "daemon-logs")]
pub mod daemon_logs;

/// Libraries that flood the log at info level while the vector index works
const NOISY_TARGETS: &[&str] = &["lance", "lance_datafusion", "lance_index", "datafusion", "ort"];

/// Core logging function that handles the actual output
pub fn log(message: &str) {
  for line in message.lines() {
    eprintln!("{line}");
  }
}

/// Format a colored prefix for log messages
fn format_prefix(color: Color, prefix: &str) -> String {
  let pad = 7usize.saturating_sub(prefix.len() + 2);
  format!("[{}]{:<pad$}", prefix.color(color).bold(), "")
}

fn log_with_prefix(color: Color, prefix: &str, message: &str) {
  let prefix = format_prefix(color, prefix);
  for line in message.lines() {
    log(&format!("{prefix} {line}"));
  }
}

/// Create a banner line of the specified length and character
pub fn banner_line(length: usize, char: char) -> String {
  char.to_string().repeat(length)
}

/// Display a message with a banner around it
pub fn as_banner<F>(log_fn: F, message: &str, width: Option<usize>, border_char: Option<char>)
where
  F: Fn(&str),
{
  let banner = banner_line(width.unwrap_or(50), border_char.unwrap_or('='));

  log_fn(&banner);
  log_fn(message);
  log_fn(&banner);
}

pub fn verbose(message: &str) {
  log_with_prefix(Color::Cyan, "verb", message);
}

/// Info level logging - general information
pub fn info(message: &str) {
  log_with_prefix(Color::Blue, "info", message);
}

/// Warning level logging - something needs attention
pub fn warn(message: &str) {
  log_with_prefix(Color::Yellow, "warn", message);
}

/// Error level logging - something went wrong
pub fn error(message: &str) {
  log_with_prefix(Color::Red, "error", message);
}

/// Debug level logging - detailed diagnostic information
pub fn debug(message: &str) {
  log_with_prefix(Color::Magenta, "debug", message);
}

/// Success level logging - something completed successfully
pub fn success(message: &str) {
  log_with_prefix(Color::Green, "sccs", message);
}

/// Announcement banner for end-of-run summaries
pub fn announce(message: &str) {
  as_banner(|msg| log(&msg.blue().bold().to_string()), message, Some(50), Some('-'));
}

/// Build the default filter directive for a binary.
///
/// `RUST_LOG` always wins when it is set. Otherwise the owning crate logs at
/// `info`, and the vector-store and inference libraries are held back to
/// `warn` (verbose) or `error` (normal).
pub fn default_filter(crate_name: &str, verbose: bool) -> String {
  let (own, noisy, rest) = if verbose { ("debug", "warn", "info") } else { ("info", "error", "warn") };

  let mut directives = vec![rest.to_string(), format!("{crate_name}={own}")];
  directives.extend(NOISY_TARGETS.iter().map(|target| format!("{target}={noisy}")));
  directives.join(",")
}

/// Install the global `tracing` subscriber. Safe to call more than once.
pub fn init_tracing(crate_name: &str, verbose: bool) {
  let filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new(default_filter(crate_name, verbose)));

  let _ = tracing_subscriber::registry()
    .with(fmt::layer().with_writer(std::io::stderr))
    .with(filter)
    .try_init();
}

/// Macros for coverage-excluded logging - these expand with LCOV_EXCL_LINE at call sites
#[macro_export]
macro_rules! info {
  ($msg:expr) => {
    $crate::info($msg); // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! warn {
  ($msg:expr) => {
    $crate::warn($msg); // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! error {
  ($msg:expr) => {
    $crate::error($msg); // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! verbose {
  ($msg:expr) => {
    $crate::verbose($msg); // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! debug {
  ($msg:expr) => {
    $crate::debug($msg); // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! success {
  ($msg:expr) => {
    $crate::success($msg); // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! announce {
  ($msg:expr) => {
    $crate::announce($msg); // LCOV_EXCL_LINE
  };
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_banner_line_repeats_character() {
    assert_eq!(banner_line(5, '-'), "-----");
    assert_eq!(banner_line(0, '='), "");
  }

  #[test]
  fn test_default_filter_quiets_noisy_targets() {
    let filter = default_filter("cyberintel", false);
    assert!(filter.starts_with("warn,"));
    assert!(filter.contains("cyberintel=info"));
    assert!(filter.contains("lance=error"));
    assert!(filter.contains("datafusion=error"));
  }

  #[test]
  fn test_default_filter_verbose() {
    let filter = default_filter("cyberintel", true);
    assert!(filter.starts_with("info,"));
    assert!(filter.contains("cyberintel=debug"));
    assert!(filter.contains("lance=warn"));
  }

  #[test]
  fn test_format_prefix_handles_long_prefix() {
    // Longer than the padding budget must not underflow
    let prefix = format_prefix(Color::Red, "verylongprefix");
    assert!(prefix.contains("verylongprefix"));
  }
}
