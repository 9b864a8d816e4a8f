use std::path::PathBuf;

use bsedit::components::history::{AreaKind, Command, HistoryManager, Patch};
use bsedit::error::{EditError, SessionFileError};
use bsedit::io::{load_sections, load_session, save_sections, save_session};
use bsedit::layout::{Cell, Layout, Region, SphereKind};
use bsedit::ops::clipboard::SectionLibrary;
use bsedit::ops::shapes::{ShapeFillMode, ShapeKind};
use bsedit::ops::transform::{FlipAxis, Turn};
use bsedit::project::{Session, Tool};
use bsedit::settings::EditorSettings;

fn temp_path(ext: &str) -> PathBuf {
    std::env::temp_dir().join(format!("bsedit-it-{}.{}", uuid::Uuid::new_v4(), ext))
}

fn fill_row(y: i32, kind: SphereKind) -> Command {
    Command::area(
        AreaKind::Rectangle,
        Patch::filled(Region::new(0, y, 8, 1), Cell::new(kind)),
    )
}

#[test]
fn save_point_in_discarded_branch_stays_dirty() {
    let mut history = HistoryManager::new(Layout::new(8, 8).unwrap(), 50);
    history.submit(fill_row(0, SphereKind::Blue));
    history.submit(fill_row(1, SphereKind::Blue));
    history.mark_saved();
    assert!(!history.is_dirty());

    history.undo().unwrap();
    assert!(history.is_dirty());
    history.redo().unwrap();
    assert!(!history.is_dirty());

    history.undo().unwrap();
    history.submit(fill_row(2, SphereKind::Red));
    history.undo().unwrap();
    history.submit(fill_row(1, SphereKind::Blue));
    assert_eq!(history.depth(), 2);
    assert!(history.is_dirty());

    history.mark_saved();
    assert!(!history.is_dirty());
}

#[test]
fn count_limit_drops_oldest_and_forgets_save_point() {
    let mut history = HistoryManager::new(Layout::new(8, 8).unwrap(), 3);
    for y in 0..5 {
        history.submit(fill_row(y, SphereKind::Yellow));
    }
    assert_eq!(history.depth(), 3);
    assert_eq!(history.undo_many(10), Ok(3));
    // Rows 0 and 1 were committed by pruned commands.
    assert_eq!(history.layout().count_kind(SphereKind::Yellow), 16);
    assert!(history.is_dirty());
}

#[test]
fn memory_cap_keeps_latest_command() {
    let mut history = HistoryManager::new(Layout::new(16, 16).unwrap(), 100);
    for y in 0..6 {
        history.submit(fill_row(y, SphereKind::Green));
    }
    history.set_limits(100, Some(1));
    assert_eq!(history.depth(), 1);
    assert_eq!(history.undo_names(), vec!["Rectangle"]);
}

#[test]
fn settings_drive_history_limits() {
    let settings = EditorSettings::parse("max_undo_steps=2\nmax_history_mb=0\n");
    let mut session = Session::new_blank(8, 8, &settings).unwrap();
    for y in 0..4 {
        session.submit(fill_row(y, SphereKind::Pink)).unwrap();
    }
    assert_eq!(session.history().depth(), 2);
}

#[test]
fn gesture_then_transforms_then_undo_all() {
    let settings = EditorSettings::default();
    let mut session = Session::new_blank(10, 10, &settings).unwrap();
    let blank = session.layout().clone();

    let oval = Tool::Shape(ShapeKind::Oval, ShapeFillMode::Solid);
    session.begin_gesture(oval, (1, 1), false).unwrap();
    session.update_gesture((6, 4), false);
    assert_eq!(session.flip(FlipAxis::Vertical), Err(EditError::GestureInProgress));
    assert_eq!(session.end_gesture(), Ok("Oval"));

    session.selection = Region::new(0, 0, 6, 6);
    assert_eq!(session.rotate(Turn::Left), Ok("Rotate Left"));
    session.selection = Region::new(0, 0, 6, 4);
    assert_eq!(
        session.rotate(Turn::Right),
        Err(EditError::InvalidRegion { width: 6, height: 4 })
    );
    assert_eq!(session.flip(FlipAxis::Horizontal), Ok("Flip Horizontally"));

    assert_eq!(session.history().undo_names(), vec!["Flip Horizontally", "Rotate Left", "Oval"]);
    assert_eq!(session.undo_many(3), Ok(3));
    assert_eq!(session.layout(), &blank);
    assert_eq!(session.redo(), Ok("Oval"));
}

#[test]
fn session_file_round_trip_keeps_undo() {
    let path = temp_path("bss");
    let mut session = Session::new_blank(8, 8, &EditorSettings::default()).unwrap();
    session.fill_at(0, 0).unwrap();
    session.selection = Region::new(2, 2, 3, 3);
    session.cut().unwrap();

    save_session(session.history(), &path, true).unwrap();
    session.mark_saved(&path);
    assert!(!session.is_dirty());

    let history = load_session(&path, 50).unwrap();
    let _ = std::fs::remove_file(&path);
    let mut reopened = Session::from_history(Some(path.clone()), history);
    assert_eq!(reopened.layout(), session.layout());
    assert!(!reopened.is_dirty());
    assert_eq!(reopened.undo(), Ok("Cut"));
    assert_eq!(reopened.layout().sphere_count(), 64);
}

#[test]
fn truncated_session_file_is_rejected() {
    let path = temp_path("bss");
    std::fs::write(&path, b"BSS1").unwrap();
    let result = load_session(&path, 50);
    let _ = std::fs::remove_file(&path);
    assert!(matches!(result, Err(SessionFileError::InvalidFormat(_))));
}

#[test]
fn section_library_survives_reload() {
    let path = temp_path("sls");
    let mut session = Session::new_blank(8, 8, &EditorSettings::default()).unwrap();
    session.fill_at(0, 0).unwrap();
    session.selection = Region::new(0, 0, 2, 3);

    let mut library = SectionLibrary::new();
    session.save_section(&mut library, "");
    session.save_section(&mut library, "pillar");
    save_sections(&library, &path).unwrap();

    let loaded = load_sections(&path).unwrap();
    let _ = std::fs::remove_file(&path);
    assert_eq!(loaded.names(), vec!["Section 1", "pillar"]);

    let mut other = Session::new_blank(4, 4, &EditorSettings::default()).unwrap();
    let section = loaded.find("pillar").unwrap().clone();
    assert_eq!(other.paste_section_repeating(&section), Ok("Paste Repeating"));
    assert_eq!(other.layout().sphere_count(), 16);
}
