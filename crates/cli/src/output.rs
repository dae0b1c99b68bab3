//! Output formatting utilities
//!
//! Status lines go to stderr so that stdout in print mode carries nothing
//! but the composed command.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use shell_lib::DownloadProgress;
use std::time::Duration;

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue().bold(), message);
}

/// Highlight a name in status lines
pub fn highlight(value: &str) -> String {
    value.magenta().bold().to_string()
}

/// Download progress on stderr
///
/// A byte bar when the size is known, a spinner otherwise.
pub struct DownloadBar {
    bar: ProgressBar,
}

impl DownloadBar {
    pub fn new() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Clear the bar without a final message
    pub fn abandon(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for DownloadBar {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadProgress for DownloadBar {
    fn started(&self, total: Option<u64>) {
        self.bar.set_draw_target(ProgressDrawTarget::stderr());
        self.bar.set_message("Downloading kubectl");

        match total {
            Some(total) => {
                self.bar.set_length(total);
                self.bar.set_style(
                    ProgressStyle::with_template(
                        "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%)",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
                );
            }
            None => {
                self.bar.set_style(
                    ProgressStyle::with_template("{spinner:.cyan} {msg} {bytes}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                self.bar.enable_steady_tick(Duration::from_millis(100));
            }
        }
    }

    fn advanced(&self, bytes: u64) {
        self.bar.inc(bytes);
    }

    fn finished(&self) {
        self.bar.finish_and_clear();
    }

    fn failed(&self) {
        self.bar.finish_and_clear();
    }
}
