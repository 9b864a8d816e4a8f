// ============================================================================
// BSEdit CLI - inspect and replay saved sessions without the editor window
// ============================================================================
//
// Usage examples:
//   bsedit --new 32x32 -o blank.bss
//   bsedit -i stage.bss --info --print
//   bsedit -i stage.bss --undo 3 --history -o rolled_back.bss
//
// Everything runs synchronously on the current thread.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use crate::components::history::HistoryManager;
use crate::io::{load_session, save_session};
use crate::layout::Layout;
use crate::project::Session;
use crate::settings::EditorSettings;

/// BSEdit headless session tool.
#[derive(Parser, Debug)]
#[command(
    name = "bsedit",
    about = "Bonus-stage layout editor, headless session tool",
    long_about = "Create, inspect and replay .bss editor sessions.\n\n\
                  Example:\n  \
                  bsedit -i stage.bss --undo 2 --print -o stage_v2.bss"
)]
pub struct CliArgs {
    /// Start from a blank stage of the given size, e.g. 32x32.
    #[arg(long, value_name = "WxH", value_parser = parse_size, conflicts_with = "input")]
    pub new: Option<(u16, u16)>,

    /// Session file (.bss) to open.
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Undo this many steps after loading.
    #[arg(long, value_name = "N")]
    pub undo: Option<usize>,

    /// Redo this many steps (after any --undo).
    #[arg(long, value_name = "N")]
    pub redo: Option<usize>,

    /// Print stage dimensions, start marker, counts and history depth.
    #[arg(long)]
    pub info: bool,

    /// Print the grid as text, one row per line.
    #[arg(long)]
    pub print: bool,

    /// List undo and redo steps, most recent first.
    #[arg(long)]
    pub history: bool,

    /// Write the resulting session here.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Mirror log lines to stderr.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Parse "WxH" into non-zero dimensions.
pub fn parse_size(s: &str) -> Result<(u16, u16), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got '{}'", s))?;
    let w: u16 = w.trim().parse().map_err(|e| format!("bad width '{}': {}", w, e))?;
    let h: u16 = h.trim().parse().map_err(|e| format!("bad height '{}': {}", h, e))?;
    if w == 0 || h == 0 {
        return Err(format!("dimensions must be non-zero, got {}x{}", w, h));
    }
    Ok((w, h))
}

/// Run the CLI and return an OS exit code.
/// `0` = everything succeeded, `1` = any step failed.
pub fn run(args: CliArgs) -> ExitCode {
    crate::logger::set_echo(args.verbose);
    let mut settings = EditorSettings::load();

    let mut session = match open_session(&args, &settings) {
        Ok(session) => session,
        Err(msg) => {
            crate::log_err!("{}", msg);
            eprintln!("error: {}", msg);
            return ExitCode::FAILURE;
        }
    };

    if let Some(steps) = args.undo {
        match session.undo_many(steps) {
            Ok(done) if done < steps => {
                eprintln!("warning: only {} of {} steps could be undone", done, steps)
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("error: undo: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }
    if let Some(steps) = args.redo {
        match session.redo_many(steps) {
            Ok(done) if done < steps => {
                eprintln!("warning: only {} of {} steps could be redone", done, steps)
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("error: redo: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    if args.info {
        print_info(&session);
    }
    if args.print {
        print!("{}", session.layout().to_text());
    }
    if args.history {
        print_history(session.history());
    }

    if let Some(path) = &args.output {
        if let Err(e) = save_session(session.history(), path, settings.save_undo_history) {
            crate::log_err!("save {} failed: {}", path.display(), e);
            eprintln!("error: could not save '{}': {}", path.display(), e);
            return ExitCode::FAILURE;
        }
        session.mark_saved(path);
        settings.prune_missing_recent();
        settings.push_recent(path);
        settings.save();
        if args.verbose {
            eprintln!("saved {}", path.display());
        }
    }

    ExitCode::SUCCESS
}

fn open_session(args: &CliArgs, settings: &EditorSettings) -> Result<Session, String> {
    if let Some(path) = &args.input {
        let history = load_session(path, settings.max_undo_steps)
            .map_err(|e| format!("could not open '{}': {}", path.display(), e))?;
        let mut session = Session::from_history(Some(path.clone()), history);
        session.apply_settings(settings);
        return Ok(session);
    }

    let (w, h) = args
        .new
        .unwrap_or((settings.default_width, settings.default_height));
    let layout = Layout::new(w, h).map_err(|e| e.to_string())?;
    let history = HistoryManager::new(layout, settings.max_undo_steps);
    let mut session = Session::from_history(None, history);
    session.apply_settings(settings);
    Ok(session)
}

fn print_info(session: &Session) {
    let layout = session.layout();
    let start = layout.start();
    let meta = layout.meta();
    println!("name:        {}", session.display_title());
    println!("session:     {}", session.id);
    println!("size:        {}x{}", layout.width(), layout.height());
    println!(
        "start:       ({}, {}) facing {}",
        start.x,
        start.y,
        start.facing.label()
    );
    println!("spheres:     {}", layout.sphere_count());
    println!("perfect:     {}", layout.perfect_count());
    if meta.present {
        println!("palette id:  {}", meta.palette_id);
    }
    let history = session.history();
    println!(
        "history:     {} undo / {} redo ({} bytes)",
        history.depth(),
        history.redo_depth(),
        history.memory_usage()
    );
}

fn print_history(history: &HistoryManager) {
    if !history.can_undo() && !history.can_redo() {
        println!("  (no history)");
        return;
    }
    for (i, name) in history.redo_names().iter().rev().enumerate() {
        println!("  redo {:>3}  {}", history.redo_depth() - i, name);
    }
    println!("  ---- current ----");
    for (i, name) in history.undo_names().iter().enumerate() {
        println!("  undo {:>3}  {}", i + 1, name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_argument() {
        assert_eq!(parse_size("32x32"), Ok((32, 32)));
        assert_eq!(parse_size("48X16"), Ok((48, 16)));
        assert!(parse_size("0x4").is_err());
        assert!(parse_size("32").is_err());
        assert!(parse_size("ax4").is_err());
    }

    #[test]
    fn args_parse() {
        let argv = ["bsedit", "-i", "a.bss", "--undo", "2", "--info"];
        let args = CliArgs::try_parse_from(argv).unwrap();
        assert_eq!(args.input, Some(PathBuf::from("a.bss")));
        assert_eq!(args.undo, Some(2));
        assert!(args.info);
        assert!(CliArgs::try_parse_from(["bsedit", "-i", "a.bss", "--new", "8x8"]).is_err());
    }
}
