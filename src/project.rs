use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::components::history::{
    AreaKind, Command, HistoryManager, MetaValue, Patch, SphereList, StrokeKind,
};
use crate::error::EditError;
use crate::layout::{Cell, Layout, Region, SphereKind};
use crate::ops::clipboard::{self, Section, SectionLibrary};
use crate::ops::fill::flood_fill;
use crate::ops::shapes::{self, ShapeFillMode, ShapeKind, ShapeRequest};
use crate::ops::substitute::{self, DEFAULT_RING_BASES};
use crate::ops::transform::{self, FlipAxis, Turn};
use crate::settings::EditorSettings;

/// Drag-based tools. Fill and start placement act on a single click and go
/// through [`Session::fill_at`] / [`Session::place_start`] instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tool {
    Pencil,
    Line,
    Shape(ShapeKind, ShapeFillMode),
}

/// An open pointer drag. Nothing reaches the history until it ends.
#[derive(Clone, Debug)]
struct Gesture {
    tool: Tool,
    start: (i32, i32),
    current: (i32, i32),
    square: bool,
    /// Secondary button: outline and interior brushes trade places.
    secondary: bool,
    stroke: SphereList,
}

impl Gesture {
    /// `(outline, interior)` brushes for this drag.
    fn brushes(&self, fg: Cell, bg: Cell) -> (Cell, Cell) {
        if self.secondary { (bg, fg) } else { (fg, bg) }
    }

    fn command(&self, fg: Cell, bg: Cell) -> Option<Command> {
        let (fg, bg) = self.brushes(fg, bg);
        match self.tool {
            Tool::Pencil => (!self.stroke.is_empty())
                .then(|| Command::spheres(StrokeKind::Draw, self.stroke.clone())),
            Tool::Line => {
                let (x1, y1) = self.start;
                let (x2, y2) = self.current;
                Some(Command::spheres(StrokeKind::Line, shapes::line_list(x1, y1, x2, y2, fg)))
            }
            Tool::Shape(kind, mode) => {
                let request = ShapeRequest::from_drag(
                    kind,
                    mode,
                    self.start,
                    self.current,
                    self.square,
                    fg,
                    Some(bg),
                );
                let raster = shapes::rasterize(&request);
                (!raster.is_empty()).then(|| raster.into_command(kind))
            }
        }
    }
}

/// Single open document: the command log plus everything the editor keeps
/// alongside it (brush, selection, clipboard, in-progress drag).
pub struct Session {
    pub id: Uuid,
    history: HistoryManager,
    /// `None` for stages never saved.
    pub path: Option<PathBuf>,
    /// Display name (derived from path or "New Stage")
    pub name: String,
    /// Foreground brush.
    pub fg: Cell,
    /// Background brush, used for shape interiors and substitutions.
    pub bg: Cell,
    /// Current selection; empty means the whole grid.
    pub selection: Region,
    clipboard: Option<Section>,
    gesture: Option<Gesture>,
}

impl Session {
    pub fn new_blank(
        width: u16,
        height: u16,
        settings: &EditorSettings,
    ) -> Result<Self, EditError> {
        let layout = Layout::new(width, height)?;
        let history = HistoryManager::new(layout, settings.max_undo_steps);
        let mut session = Self::from_history(None, history);
        session.apply_settings(settings);
        Ok(session)
    }

    pub fn from_history(path: Option<PathBuf>, history: HistoryManager) -> Self {
        let name = path
            .as_deref()
            .map(name_from_path)
            .unwrap_or_else(|| "New Stage".to_string());
        crate::log_info!("Session opened: {}", name);

        Self {
            id: Uuid::new_v4(),
            history,
            path,
            name,
            fg: Cell::new(SphereKind::Blue),
            bg: Cell::EMPTY,
            selection: Region::default(),
            clipboard: None,
            gesture: None,
        }
    }

    pub fn apply_settings(&mut self, settings: &EditorSettings) {
        self.history
            .set_limits(settings.max_undo_steps, settings.history_memory_limit());
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn layout(&self) -> &Layout {
        self.history.layout()
    }

    pub fn is_dirty(&self) -> bool {
        self.history.is_dirty()
    }

    /// Record a save to `path`.
    pub fn mark_saved(&mut self, path: &Path) {
        self.history.mark_saved();
        self.path = Some(path.to_path_buf());
        self.name = name_from_path(path);
    }

    /// Get the display title (name with dirty indicator)
    pub fn display_title(&self) -> String {
        if self.is_dirty() {
            format!("{} *", self.name)
        } else {
            self.name.clone()
        }
    }

    // ------------------------------------------------------------------
    // Gated history access
    // ------------------------------------------------------------------

    pub fn is_drawing(&self) -> bool {
        self.gesture.is_some()
    }

    fn ensure_idle(&self) -> Result<(), EditError> {
        if self.gesture.is_some() {
            return Err(EditError::GestureInProgress);
        }
        Ok(())
    }

    pub fn submit(&mut self, command: Command) -> Result<&'static str, EditError> {
        self.ensure_idle()?;
        let name = self.history.submit(command);
        crate::log_info!("{} (depth {})", name, self.history.depth());
        Ok(name)
    }

    pub fn undo(&mut self) -> Result<&'static str, EditError> {
        self.ensure_idle()?;
        self.history.undo()
    }

    pub fn redo(&mut self) -> Result<&'static str, EditError> {
        self.ensure_idle()?;
        self.history.redo()
    }

    pub fn undo_many(&mut self, steps: usize) -> Result<usize, EditError> {
        self.ensure_idle()?;
        self.history.undo_many(steps)
    }

    pub fn redo_many(&mut self, steps: usize) -> Result<usize, EditError> {
        self.ensure_idle()?;
        self.history.redo_many(steps)
    }

    // ------------------------------------------------------------------
    // Drag gestures
    // ------------------------------------------------------------------

    /// Open a drag. With `secondary` the pencil and line draw in the
    /// background brush and shapes swap outline and interior.
    pub fn begin_gesture(
        &mut self,
        tool: Tool,
        at: (i32, i32),
        secondary: bool,
    ) -> Result<(), EditError> {
        self.ensure_idle()?;
        let mut gesture = Gesture {
            tool,
            start: at,
            current: at,
            square: false,
            secondary,
            stroke: SphereList::new(),
        };
        if tool == Tool::Pencil {
            let (brush, _) = gesture.brushes(self.fg, self.bg);
            gesture.stroke.push(at.0, at.1, brush);
        }
        self.gesture = Some(gesture);
        Ok(())
    }

    /// Move the pointer of the open gesture. `square` snaps shapes to equal sides.
    pub fn update_gesture(&mut self, at: (i32, i32), square: bool) {
        let (fg, bg) = (self.fg, self.bg);
        if let Some(gesture) = self.gesture.as_mut() {
            if gesture.tool == Tool::Pencil {
                let (brush, _) = gesture.brushes(fg, bg);
                shapes::extend_stroke(&mut gesture.stroke, gesture.current, at, brush);
            }
            gesture.current = at;
            gesture.square = square;
        }
    }

    /// Committed layout with the open gesture drawn on top.
    pub fn preview(&self) -> Layout {
        let mut ghost = self.history.preview();
        if let Some(mut command) = self
            .gesture
            .as_ref()
            .and_then(|g| g.command(self.fg, self.bg))
        {
            command.apply(&mut ghost);
        }
        ghost
    }

    /// Close the gesture and submit what it drew.
    pub fn end_gesture(&mut self) -> Result<&'static str, EditError> {
        let gesture = self.gesture.take().ok_or(EditError::NoOp)?;
        let command = gesture.command(self.fg, self.bg).ok_or(EditError::NoOp)?;
        self.submit(command)
    }

    pub fn cancel_gesture(&mut self) {
        self.gesture = None;
    }

    // ------------------------------------------------------------------
    // Click tools
    // ------------------------------------------------------------------

    pub fn fill_at(&mut self, x: i32, y: i32) -> Result<&'static str, EditError> {
        self.ensure_idle()?;
        let patch = flood_fill(self.layout(), x, y, self.fg)?;
        self.submit(Command::area(AreaKind::Fill, patch))
    }

    /// Clicking the marker turns it; clicking elsewhere moves it.
    pub fn place_start(&mut self, x: i32, y: i32) -> Result<&'static str, EditError> {
        let layout = self.layout();
        let start = layout.start();
        let (x, y) = (layout.wrap_x(x), layout.wrap_y(y));
        if (x, y) == (start.x, start.y) {
            self.submit(Command::StartFacing(start.facing.next()))
        } else {
            self.submit(Command::StartPosition { x, y })
        }
    }

    pub fn set_meta(&mut self, value: MetaValue) -> Result<&'static str, EditError> {
        self.submit(Command::Meta(value))
    }

    // ------------------------------------------------------------------
    // Selection operations
    // ------------------------------------------------------------------

    fn substitute(
        &mut self,
        kind: AreaKind,
        scan: impl FnOnce(&Layout, Region) -> Result<Patch, EditError>,
    ) -> Result<&'static str, EditError> {
        self.ensure_idle()?;
        let patch = scan(self.layout(), self.selection)?;
        self.submit(Command::area(kind, patch))
    }

    pub fn replace_fg_with_bg(&mut self) -> Result<&'static str, EditError> {
        let (fg, bg) = (self.fg, self.bg);
        self.substitute(AreaKind::ReplaceFgToBg, |l, r| substitute::replace_color(l, r, fg, bg))
    }

    pub fn replace_bg_with_fg(&mut self) -> Result<&'static str, EditError> {
        let (fg, bg) = (self.fg, self.bg);
        self.substitute(AreaKind::ReplaceBgToFg, |l, r| substitute::replace_color(l, r, bg, fg))
    }

    /// Every `from` cell in the selection becomes `to`, whatever the brushes hold.
    pub fn replace_color(&mut self, from: Cell, to: Cell) -> Result<&'static str, EditError> {
        self.substitute(AreaKind::ReplaceColor, |l, r| substitute::replace_color(l, r, from, to))
    }

    pub fn swap_fg_and_bg(&mut self) -> Result<&'static str, EditError> {
        let (fg, bg) = (self.fg, self.bg);
        self.substitute(AreaKind::SwapFgBg, |l, r| substitute::swap_colors(l, r, fg, bg))
    }

    pub fn mark_rings(&mut self) -> Result<&'static str, EditError> {
        self.substitute(AreaKind::MarkRings, |l, r| {
            substitute::mark_rings(l, r, &DEFAULT_RING_BASES)
        })
    }

    pub fn flip(&mut self, axis: FlipAxis) -> Result<&'static str, EditError> {
        let command = transform::flip_selection(self.layout(), self.selection, axis);
        self.submit(command)
    }

    pub fn rotate(&mut self, turn: Turn) -> Result<&'static str, EditError> {
        let command = transform::rotate_selection(self.layout(), self.selection, turn)?;
        self.submit(command)
    }

    // ------------------------------------------------------------------
    // Clipboard
    // ------------------------------------------------------------------

    pub fn clipboard(&self) -> Option<&Section> {
        self.clipboard.as_ref()
    }

    pub fn copy(&mut self) {
        self.clipboard = Some(clipboard::copy_region(self.layout(), self.selection));
    }

    pub fn cut(&mut self) -> Result<&'static str, EditError> {
        self.ensure_idle()?;
        let (section, patch) = clipboard::cut_patch(self.layout(), self.selection);
        let name = self.submit(Command::area(AreaKind::Cut, patch))?;
        self.clipboard = Some(section);
        Ok(name)
    }

    /// Paste the clipboard at the selection corner; the selection takes its size.
    pub fn paste_once(&mut self) -> Result<&'static str, EditError> {
        let section = self.clipboard.clone().ok_or(EditError::NoOp)?;
        self.paste_section_once(&section)
    }

    pub fn paste_repeating(&mut self) -> Result<&'static str, EditError> {
        let section = self.clipboard.clone().ok_or(EditError::NoOp)?;
        self.paste_section_repeating(&section)
    }

    pub fn paste_section_once(&mut self, section: &Section) -> Result<&'static str, EditError> {
        let at = (self.selection.x, self.selection.y);
        let name = self.submit(Command::area(
            AreaKind::PasteOnce,
            clipboard::paste_once(section, at),
        ))?;
        self.selection = Region::new(at.0, at.1, section.width(), section.height());
        Ok(name)
    }

    pub fn paste_section_repeating(
        &mut self,
        section: &Section,
    ) -> Result<&'static str, EditError> {
        let patch = clipboard::paste_repeating(self.layout(), section, self.selection);
        self.submit(Command::area(AreaKind::PasteRepeating, patch))
    }

    /// Store the selection in a section library; returns the new index.
    pub fn save_section(&self, library: &mut SectionLibrary, name: &str) -> usize {
        let section = clipboard::copy_region(self.layout(), self.selection).renamed(name);
        library.add(section)
    }
}

fn name_from_path(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}
