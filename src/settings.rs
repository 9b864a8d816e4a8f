use std::path::{Path, PathBuf};

use crate::components::history::DEFAULT_MAX_HISTORY;
use crate::layout::DEFAULT_SIZE;

/// Most-recently-used list length.
pub const MAX_RECENT_FILES: usize = 10;

/// Persistent editor preferences, stored as `key=value` lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditorSettings {
    pub max_undo_steps: usize,
    /// History memory cap in megabytes; 0 disables the cap.
    pub max_history_mb: usize,
    /// Keep the undo stack inside saved session files.
    pub save_undo_history: bool,
    pub show_grid: bool,
    pub default_width: u16,
    pub default_height: u16,
    /// Most recent first.
    pub recent_files: Vec<PathBuf>,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            max_undo_steps: DEFAULT_MAX_HISTORY,
            max_history_mb: 64,
            save_undo_history: true,
            show_grid: true,
            default_width: DEFAULT_SIZE,
            default_height: DEFAULT_SIZE,
            recent_files: Vec::new(),
        }
    }
}

impl EditorSettings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/bsedit/bsedit_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\BSEdit\bsedit_settings.cfg
    /// On macOS:   ~/Library/Application Support/BSEdit/bsedit_settings.cfg
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA")
                .or_else(|_| std::env::var("USERPROFILE"))
                .ok()?;
            return Some(PathBuf::from(appdata).join("BSEdit").join("bsedit_settings.cfg"));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").ok()?;
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("BSEdit")
                    .join("bsedit_settings.cfg"),
            );
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            let config_dir = match std::env::var("XDG_CONFIG_HOME") {
                Ok(xdg) => PathBuf::from(xdg),
                Err(_) => PathBuf::from(std::env::var("HOME").ok()?).join(".config"),
            };
            Some(config_dir.join("bsedit").join("bsedit_settings.cfg"))
        }
    }

    /// Memory cap for the history manager in bytes.
    pub fn history_memory_limit(&self) -> Option<usize> {
        (self.max_history_mb > 0).then(|| self.max_history_mb.saturating_mul(1024 * 1024))
    }

    /// Move `path` to the front of the recent list.
    pub fn push_recent(&mut self, path: &Path) {
        self.recent_files.retain(|p| p != path);
        self.recent_files.insert(0, path.to_path_buf());
        self.recent_files.truncate(MAX_RECENT_FILES);
    }

    /// Drop recent entries whose file no longer exists.
    pub fn prune_missing_recent(&mut self) {
        self.recent_files.retain(|p| p.exists());
    }

    /// Parse settings text. Unknown keys and bad values fall back to defaults.
    pub fn parse(content: &str) -> Self {
        let mut s = Self::default();
        let defaults = Self::default();
        for line in content.lines() {
            let Some((key, val)) = line.split_once('=') else { continue };
            let val = val.trim();
            match key.trim() {
                "max_undo_steps" => {
                    s.max_undo_steps = val.parse().unwrap_or(defaults.max_undo_steps);
                }
                "max_history_mb" => {
                    s.max_history_mb = val.parse().unwrap_or(defaults.max_history_mb);
                }
                "save_undo_history" => {
                    s.save_undo_history = val.parse().unwrap_or(defaults.save_undo_history);
                }
                "show_grid" => {
                    s.show_grid = val.parse().unwrap_or(defaults.show_grid);
                }
                "default_width" => {
                    s.default_width = val
                        .parse()
                        .ok()
                        .filter(|&w: &u16| w > 0)
                        .unwrap_or(defaults.default_width);
                }
                "default_height" => {
                    s.default_height = val
                        .parse()
                        .ok()
                        .filter(|&h: &u16| h > 0)
                        .unwrap_or(defaults.default_height);
                }
                "recent_file" => {
                    if !val.is_empty() && s.recent_files.len() < MAX_RECENT_FILES {
                        s.recent_files.push(PathBuf::from(val));
                    }
                }
                _ => {}
            }
        }
        s
    }

    pub fn to_cfg_string(&self) -> String {
        let mut content = format!(
            "max_undo_steps={}\n\
             max_history_mb={}\n\
             save_undo_history={}\n\
             show_grid={}\n\
             default_width={}\n\
             default_height={}\n",
            self.max_undo_steps,
            self.max_history_mb,
            self.save_undo_history,
            self.show_grid,
            self.default_width,
            self.default_height,
        );
        for path in &self.recent_files {
            content.push_str(&format!("recent_file={}\n", path.display()));
        }
        content
    }

    /// Load settings from disk (returns default if file missing or corrupt)
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self) {
        let Some(path) = Self::settings_path() else { return };
        if let Err(e) = self.save_to(&path) {
            crate::log_warn!("Could not save settings to {}: {}", path.display(), e);
        }
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_cfg_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_use_defaults() {
        let s = EditorSettings::parse("show_grid=false\nunknown=1\nnot a pair\n");
        assert!(!s.show_grid);
        assert_eq!(s.max_undo_steps, 200);
        assert_eq!(s.default_width, 32);
    }

    #[test]
    fn bad_values_fall_back() {
        let text = "max_undo_steps=lots\ndefault_width=0\nsave_undo_history=maybe";
        let s = EditorSettings::parse(text);
        assert_eq!(s, EditorSettings::default());
    }

    #[test]
    fn text_round_trip() {
        let mut s = EditorSettings {
            max_undo_steps: 12,
            max_history_mb: 0,
            save_undo_history: false,
            default_height: 48,
            ..EditorSettings::default()
        };
        s.push_recent(Path::new("/stages/a.bss"));
        s.push_recent(Path::new("/stages/b.bss"));
        let parsed = EditorSettings::parse(&s.to_cfg_string());
        assert_eq!(parsed, s);
        assert_eq!(parsed.history_memory_limit(), None);
    }

    #[test]
    fn recent_list_is_capped_and_deduplicated() {
        let mut s = EditorSettings::default();
        for i in 0..15 {
            s.push_recent(Path::new(&format!("/stages/{i}.bss")));
        }
        s.push_recent(Path::new("/stages/12.bss"));
        assert_eq!(s.recent_files.len(), MAX_RECENT_FILES);
        assert_eq!(s.recent_files[0], PathBuf::from("/stages/12.bss"));
        assert_eq!(s.recent_files[1], PathBuf::from("/stages/14.bss"));
    }

    #[test]
    fn missing_recent_files_are_dropped() {
        let kept = std::env::temp_dir().join(format!("bsedit-recent-{}.bss", uuid::Uuid::new_v4()));
        std::fs::write(&kept, b"").unwrap();
        let mut s = EditorSettings::default();
        s.push_recent(&kept);
        s.push_recent(Path::new("/nonexistent/bsedit/gone.bss"));
        s.prune_missing_recent();
        let _ = std::fs::remove_file(&kept);
        assert_eq!(s.recent_files, vec![kept]);
    }
}
