use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::components::history::{Command, HistoryManager};
use crate::error::SessionFileError;
use crate::layout::Layout;
use crate::ops::clipboard::{Section, SectionLibrary};

// ============================================================================
// BSS SESSION FILE FORMAT
// ============================================================================

/// Magic header for session files.
const BSS_MAGIC_V1: &str = "BSS1";
/// Magic header for section library files.
const SLS_MAGIC_V1: &str = "SLS1";

/// Serializable session: the stage plus its undo stack (oldest first).
#[derive(Serialize, Deserialize)]
struct SessionFileV1 {
    magic: String,
    layout: Layout,
    undo: Vec<Command>,
}

#[derive(Serialize, Deserialize)]
struct SectionFileV1 {
    magic: String,
    sections: Vec<Section>,
}

fn write_bincode<T: Serialize>(value: &T, path: &Path) -> Result<(), SessionFileError> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    bincode::serialize_into(writer, value)?;
    Ok(())
}

/// Read a file and check its magic before decoding the rest.
fn read_checked(path: &Path, expected: &str) -> Result<Vec<u8>, SessionFileError> {
    let raw = std::fs::read(path)?;
    // bincode encodes a String as: 8-byte length prefix + UTF-8 data.
    // Our magic strings are 4 chars, so bytes 8..12 hold the magic.
    if raw.len() < 12 {
        return Err(SessionFileError::InvalidFormat("File too small".into()));
    }
    let magic = std::str::from_utf8(&raw[8..12]).unwrap_or("");
    if magic != expected {
        return Err(SessionFileError::InvalidFormat(format!(
            "Unknown magic '{}', expected '{}'",
            magic, expected
        )));
    }
    Ok(raw)
}

/// Save the current layout, and its undo stack when `include_undo` is set.
pub fn save_session(
    history: &HistoryManager,
    path: &Path,
    include_undo: bool,
) -> Result<(), SessionFileError> {
    let (layout, mut undo) = history.to_parts();
    if !include_undo {
        undo.clear();
    }
    let file = SessionFileV1 {
        magic: BSS_MAGIC_V1.to_string(),
        layout,
        undo,
    };
    write_bincode(&file, path)?;
    crate::log_info!(
        "Saved session {} ({} undo steps)",
        path.display(),
        file.undo.len()
    );
    Ok(())
}

/// Load a session file. The returned log is clean at the saved depth.
pub fn load_session(
    path: &Path,
    max_history_size: usize,
) -> Result<HistoryManager, SessionFileError> {
    let raw = read_checked(path, BSS_MAGIC_V1)?;
    let file: SessionFileV1 = bincode::deserialize(&raw)?;
    file.layout.validate()?;
    crate::log_info!(
        "Loaded session {} ({}x{}, {} undo steps)",
        path.display(),
        file.layout.width(),
        file.layout.height(),
        file.undo.len()
    );
    Ok(HistoryManager::from_parts(file.layout, file.undo, max_history_size))
}

pub fn save_sections(library: &SectionLibrary, path: &Path) -> Result<(), SessionFileError> {
    let file = SectionFileV1 {
        magic: SLS_MAGIC_V1.to_string(),
        sections: library.sections().to_vec(),
    };
    write_bincode(&file, path)
}

/// Load a section library. A missing file is an empty library.
pub fn load_sections(path: &Path) -> Result<SectionLibrary, SessionFileError> {
    if !path.exists() {
        return Ok(SectionLibrary::new());
    }
    let raw = read_checked(path, SLS_MAGIC_V1)?;
    let file: SectionFileV1 = bincode::deserialize(&raw)?;
    if let Some(bad) = file.sections.iter().find(|s| !s.is_well_formed()) {
        return Err(SessionFileError::InvalidFormat(format!(
            "section '{}' has inconsistent dimensions",
            bad.name
        )));
    }
    Ok(SectionLibrary::from_sections(file.sections))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::history::{AreaKind, Patch};
    use crate::layout::{Cell, Region, SphereKind};
    use crate::ops::clipboard::copy_region;
    use std::path::PathBuf;

    fn temp_path(ext: &str) -> PathBuf {
        std::env::temp_dir().join(format!("bsedit-{}.{}", uuid::Uuid::new_v4(), ext))
    }

    fn edited() -> HistoryManager {
        let mut history = HistoryManager::new(Layout::new(6, 4).unwrap(), 20);
        let patch = Patch::filled(Region::new(1, 1, 2, 2), Cell::new(SphereKind::Red));
        history.submit(Command::area(AreaKind::Rectangle, patch));
        history
    }

    #[test]
    fn session_keeps_history() {
        let path = temp_path("bss");
        let history = edited();
        save_session(&history, &path, true).unwrap();

        let mut loaded = load_session(&path, 20).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded.layout(), history.layout());
        assert_eq!(loaded.depth(), 1);
        assert!(!loaded.is_dirty());
        loaded.undo().unwrap();
        assert_eq!(loaded.layout(), &Layout::new(6, 4).unwrap());
    }

    #[test]
    fn session_without_history() {
        let path = temp_path("bss");
        save_session(&edited(), &path, false).unwrap();
        let loaded = load_session(&path, 20).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded.depth(), 0);
        assert_eq!(loaded.layout().count_kind(SphereKind::Red), 4);
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let path = temp_path("sls");
        save_sections(&SectionLibrary::new(), &path).unwrap();
        let result = load_session(&path, 20);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(SessionFileError::InvalidFormat(_))));
    }

    #[test]
    fn sections_round_trip() {
        let path = temp_path("sls");
        let mut library = SectionLibrary::new();
        library.add(copy_region(edited().layout(), Region::new(0, 0, 3, 3)));
        save_sections(&library, &path).unwrap();
        let loaded = load_sections(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, library);
    }

    #[test]
    fn missing_library_is_empty() {
        let loaded = load_sections(&temp_path("sls")).unwrap();
        assert!(loaded.is_empty());
    }
}
