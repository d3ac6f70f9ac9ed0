//! Terminal output.
//!
//! - `log!` prints a line behind a colored `[topic]` tag
//! - `debug!` does the same, but only under `--verbose`
//! - [`status`] reports dev-server build outcomes in a block that each new
//!   outcome replaces
//!
//! ```ignore
//! log!("build"; "{} modules", count);
//! debug!("resolve"; "{} -> {}", request, path.display());
//! status(Outcome::Failed, "module not found: ./missing.js");
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::{Mutex, const_mutex};
use std::{
    io::{Write, stdout},
    sync::atomic::{AtomicBool, Ordering},
    time::SystemTime,
};

static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

#[macro_export]
macro_rules! log {
    ($topic:expr; $($arg:tt)*) => {{
        $crate::logger::log($topic, &format!($($arg)*))
    }};
}

#[macro_export]
macro_rules! debug {
    ($topic:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($topic, &format!($($arg)*))
        }
    }};
}

pub fn log(topic: &str, message: &str) {
    let mut stdout = stdout().lock();
    execute!(stdout, Clear(ClearType::UntilNewLine)).ok();
    writeln!(stdout, "{} {message}", tag(topic)).ok();
    stdout.flush().ok();
}

fn tag(topic: &str) -> String {
    let tag = format!("[{topic}]");
    match topic {
        "serve" | "watch" => tag.bright_blue().bold().to_string(),
        "error" => tag.bright_red().bold().to_string(),
        "warning" => tag.bright_magenta().bold().to_string(),
        "asset" | "module" => tag.dimmed().to_string(),
        _ => tag.bright_yellow().bold().to_string(),
    }
}

/// How a dev-server build ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    /// Succeeded with warnings.
    Warn,
    Failed,
}

impl Outcome {
    fn symbol(self) -> String {
        match self {
            Self::Ok => "✓".green().to_string(),
            Self::Warn => "⚠".yellow().to_string(),
            Self::Failed => "✗".red().to_string(),
        }
    }
}

/// Lines printed by the previous [`status`] call.
static STATUS_LINES: Mutex<usize> = const_mutex(0);

/// Print a build outcome over the previous one.
pub fn status(outcome: Outcome, message: &str) {
    let mut last = STATUS_LINES.lock();
    let mut stdout = stdout().lock();

    if *last > 0 {
        let up = u16::try_from(*last).unwrap_or(u16::MAX);
        execute!(stdout, cursor::MoveUp(up), Clear(ClearType::FromCursorDown)).ok();
    }

    let stamp = format!("[{}]", clock(SystemTime::now())).dimmed().to_string();
    writeln!(stdout, "{stamp} {} {message}", outcome.symbol()).ok();
    stdout.flush().ok();

    *last = line_count(message);
}

fn line_count(message: &str) -> usize {
    message.lines().count().max(1)
}

/// `HH:MM:SS` in UTC.
fn clock(at: SystemTime) -> String {
    let secs = at
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    format!(
        "{:02}:{:02}:{:02}",
        secs / 3600 % 24,
        secs / 60 % 60,
        secs % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_line_count() {
        assert_eq!(line_count(""), 1);
        assert_eq!(line_count("3 modules, 4 assets (2.0 KiB) in 12ms"), 1);
        assert_eq!(line_count("build failed\nmodule not found: ./missing.js"), 2);
    }

    #[test]
    fn test_clock() {
        let at = SystemTime::UNIX_EPOCH + Duration::from_secs(2 * 86_400 + 13 * 3600 + 5 * 60 + 9);
        assert_eq!(clock(at), "13:05:09");
    }

    #[test]
    fn test_verbose_toggle() {
        set_verbose(true);
        assert!(is_verbose());
        set_verbose(false);
        assert!(!is_verbose());
    }
}
