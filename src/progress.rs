//! Progress display module
//!
//! Styled progress bars, status messages and the final statistics table.
//! Everything here writes to stderr so stdout stays free for filtered text.

use bytesize::ByteSize;
use colored::*;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Print the application banner
pub fn print_banner() {
    let banner = r#"
╔══════════════════════════════════════════════════════════════════╗
║                                                                  ║
║   ████████╗███████╗██╗  ██╗████████╗                             ║
║   ╚══██╔══╝██╔════╝╚██╗██╔╝╚══██╔══╝                             ║
║      ██║   █████╗   ╚███╔╝    ██║                                ║
║      ██║   ██╔══╝   ██╔██╗    ██║                                ║
║      ██║   ███████╗██╔╝ ██╗   ██║                                ║
║      ╚═╝   ╚══════╝╚═╝  ╚═╝   ╚═╝   F I L T E R                  ║
║                                                                  ║
║          Bad words, domains, SHOUTING and !!!!!! punctuation     ║
║                                                  v1.0.0          ║
╚══════════════════════════════════════════════════════════════════╝
"#;

    eprintln!("{}", banner.green());
}

/// Print a section header
pub fn print_header(text: &str) {
    eprintln!("\n{} {}", "▶".green(), text.green().bold());
}

/// Print an info message
pub fn print_info(text: &str) {
    eprintln!("  {} {}", "ℹ".cyan(), text);
}

/// Print a success message
pub fn print_success(text: &str) {
    eprintln!("  {} {}", "✔".green(), text.green());
}

/// Print a warning message
pub fn print_warning(text: &str) {
    eprintln!("  {} {}", "⚠".yellow(), text.yellow());
}

/// Print an error message
pub fn print_error(text: &str) {
    eprintln!("  {} {}", "✖".red(), text.red());
}

/// Print a bullet point
pub fn print_bullet(text: &str) {
    eprintln!("  {} {}", "•".green(), text);
}

/// Create a styled progress bar counting lines
pub fn create_progress_bar(total: u64, msg: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::stderr());

    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.green/dim}] {pos}/{len} lines ({per_sec}) {msg}")
    {
        pb.set_style(style.progress_chars("█▓░"));
    }

    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));

    pb
}

/// Create a styled spinner for indeterminate progress
pub fn create_spinner(msg: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());

    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style.tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "));
    }

    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));

    pb
}

/// Processing statistics
#[derive(Debug)]
pub struct ProcessingStats {
    pub total_lines: AtomicU64,
    /// Lines with at least one match
    pub flagged_lines: AtomicU64,
    /// Lines whose text changed after replacement
    pub replaced_lines: AtomicU64,
    /// Distinct matches summed over lines
    pub matches: AtomicU64,
    pub total_bytes: AtomicU64,
    pub start_time: Instant,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self {
            total_lines: AtomicU64::new(0),
            flagged_lines: AtomicU64::new(0),
            replaced_lines: AtomicU64::new(0),
            matches: AtomicU64::new(0),
            total_bytes: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn add_line(&self, bytes: u64) {
        self.total_lines.fetch_add(1, Ordering::Relaxed);
        self.total_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn add_flagged(&self, matches: u64) {
        self.flagged_lines.fetch_add(1, Ordering::Relaxed);
        self.matches.fetch_add(matches, Ordering::Relaxed);
    }

    pub fn add_replaced(&self) {
        self.replaced_lines.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_total_lines(&self) -> u64 {
        self.total_lines.load(Ordering::Relaxed)
    }

    pub fn get_flagged_lines(&self) -> u64 {
        self.flagged_lines.load(Ordering::Relaxed)
    }

    pub fn get_replaced_lines(&self) -> u64 {
        self.replaced_lines.load(Ordering::Relaxed)
    }

    pub fn get_matches(&self) -> u64 {
        self.matches.load(Ordering::Relaxed)
    }

    pub fn get_total_bytes(&self) -> u64 {
        self.total_bytes.load(Ordering::Relaxed)
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn lines_per_second(&self) -> f64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.get_total_lines() as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Print final statistics
    pub fn print_summary(&self) {
        let total_lines = self.get_total_lines();
        let flagged = self.get_flagged_lines();

        eprintln!();
        eprintln!("{}", "═".repeat(60).green());
        eprintln!("{}", "                    FILTERING COMPLETE".green().bold());
        eprintln!("{}", "═".repeat(60).green());
        eprintln!();

        eprintln!("  {} {}", "Data processed: ".green(), ByteSize(self.get_total_bytes()));
        eprintln!("  {} {}", "Total lines:    ".green(), format_number(total_lines));
        eprintln!("  {} {}", "Flagged lines:  ".yellow(), format_number(flagged).yellow());
        eprintln!("  {} {}", "Matches:        ".yellow(), format_number(self.get_matches()));
        eprintln!("  {} {}", "Replaced lines: ".green(), format_number(self.get_replaced_lines()));
        eprintln!("  {} {:.2}%", "Flagged share:  ".green(), percentage(flagged, total_lines));

        eprintln!();
        eprintln!("  {} {}", "Duration:       ".green(), format_duration(self.elapsed()));
        eprintln!("  {} {:.2} lines/sec", "Throughput:     ".green(), self.lines_per_second());
        eprintln!();
        eprintln!("{}", "═".repeat(60).green());
    }
}

impl Default for ProcessingStats {
    fn default() -> Self {
        Self::new()
    }
}

fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

/// Format a number with thousand separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    let chars: Vec<char> = s.chars().collect();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }

    result
}

/// Format duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();

    if secs < 60 {
        format!("{:.1}s", duration.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(123), "123");
        assert_eq!(format_number(1234), "1,234");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(30)), "30.0s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "1h 1m");
    }

    #[test]
    fn test_stats() {
        let stats = ProcessingStats::new();

        stats.add_line(10);
        stats.add_line(5);
        stats.add_flagged(3);
        stats.add_replaced();

        assert_eq!(stats.get_total_lines(), 2);
        assert_eq!(stats.get_total_bytes(), 15);
        assert_eq!(stats.get_flagged_lines(), 1);
        assert_eq!(stats.get_matches(), 3);
        assert_eq!(stats.get_replaced_lines(), 1);
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(1, 4), 25.0);
    }

    #[test]
    fn test_hidden_bars_when_quiet() {
        assert!(create_progress_bar(10, "x", true).is_hidden());
        assert!(create_spinner("x", true).is_hidden());
    }
}
