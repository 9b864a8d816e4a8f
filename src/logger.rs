//! Editor session log.
//!
//! One file per run, truncated when [`init`] is called, so it only holds the
//! latest session. Nothing is written before `init`, so library code can log
//! freely when no file was opened.
//!
//! Location:
//!   Windows:  `%APPDATA%\BSEdit\bsedit.log`
//!   Linux:    `$XDG_DATA_HOME/BSEdit/bsedit.log` or `~/.local/share/BSEdit/bsedit.log`
//!   macOS:    `~/Library/Application Support/BSEdit/bsedit.log`
//!
//! With [`set_echo`] turned on every line is mirrored to stderr as well
//! (the CLI's `--verbose`).

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

/// Open log file plus where it lives.
struct Sink {
    path: PathBuf,
    file: Mutex<File>,
}

static SINK: OnceLock<Sink> = OnceLock::new();
static ECHO: AtomicBool = AtomicBool::new(false);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
    Panic,
}

impl Level {
    fn tag(self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Panic => "PANIC",
        }
    }
}

pub fn log_path() -> Option<&'static Path> {
    SINK.get().map(|sink| sink.path.as_path())
}

/// Mirror log lines to stderr.
pub fn set_echo(enabled: bool) {
    ECHO.store(enabled, Ordering::Relaxed);
}

/// Append one line. I/O errors are dropped; logging never fails an edit.
fn emit(line: &str) {
    if ECHO.load(Ordering::Relaxed) {
        eprintln!("{}", line);
    }
    if let Some(sink) = SINK.get()
        && let Ok(mut file) = sink.file.lock()
    {
        let _ = writeln!(file, "{}", line);
    }
}

/// Timestamped, level-tagged entry. Use the `log_*!` macros instead.
pub fn record(level: Level, args: fmt::Arguments<'_>) {
    emit(&format!("[{}] [{}] {}", clock(), level.tag(), args));
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logger::record($crate::logger::Level::Info, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logger::record($crate::logger::Level::Warn, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_err {
    ($($arg:tt)*) => {
        $crate::logger::record($crate::logger::Level::Error, format_args!($($arg)*))
    };
}

/// Open the default log file and hook panics into it.
pub fn init() {
    let path = data_dir().join("BSEdit").join("bsedit.log");
    if let Err(e) = init_at(&path) {
        eprintln!("[logger] cannot open {}: {}", path.display(), e);
    }
}

/// [`init`] with an explicit file. Later calls are ignored.
pub fn init_at(path: &Path) -> io::Result<()> {
    if SINK.get().is_some() {
        return Ok(());
    }
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = File::create(path)?;
    let _ = SINK.set(Sink {
        path: path.to_path_buf(),
        file: Mutex::new(file),
    });

    emit(&format!(
        "=== BSEdit {} started at unix {} ===",
        env!("CARGO_PKG_VERSION"),
        unix_now().unwrap_or_default()
    ));

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        record(Level::Panic, format_args!("{}", info));
        previous(info);
    }));
    Ok(())
}

fn data_dir() -> PathBuf {
    let var = |name: &str| std::env::var_os(name).map(PathBuf::from);
    if cfg!(target_os = "windows") {
        if let Some(dir) = var("APPDATA") {
            return dir;
        }
    } else if cfg!(target_os = "macos") {
        if let Some(home) = var("HOME") {
            return home.join("Library/Application Support");
        }
    }
    var("XDG_DATA_HOME")
        .or_else(|| var("HOME").map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn unix_now() -> Option<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .map(|d| d.as_secs())
}

/// UTC wall clock, HH:MM:SS.
fn clock() -> String {
    let Some(secs) = unix_now() else {
        return "--:--:--".into();
    };
    let day = secs % 86_400;
    format!("{:02}:{:02}:{:02}", day / 3600, day % 3600 / 60, day % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_reach_the_file_after_init() {
        let name = format!("bsedit-log-{}.log", uuid::Uuid::new_v4());
        let path = std::env::temp_dir().join(name);
        init_at(&path).unwrap();
        crate::log_warn!("pruned {} steps", 42);
        let logged_to = log_path().map(Path::to_path_buf);
        let text = fs::read_to_string(logged_to.unwrap_or(path)).unwrap();
        assert!(text.contains("[WARN] pruned 42 steps"));
    }

    #[test]
    fn clock_is_hh_mm_ss() {
        let c = clock();
        assert_eq!(c.len(), 8);
        assert_eq!(c.matches(':').count(), 2);
    }
}
