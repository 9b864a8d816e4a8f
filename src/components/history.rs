use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet, VecDeque};

use crate::error::EditError;
use crate::layout::{Cell, Facing, Layout, Region, Rgb};
use crate::ops::transform::{self, FlipAxis, Turn};

// ============================================================================
// PATCHES - payloads of the self-inverting commands
// ============================================================================

/// Ordered `(dx, dy, cell)` list written one entry at a time, offsets taken
/// from the `x`/`y` anchor.
///
/// Used for strokes and outlines, where the order of writes matters when two
/// entries land on the same wrapped cell.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SphereList {
    pub x: i32,
    pub y: i32,
    pub points: Vec<(i32, i32, Cell)>,
    /// Coordinates already in `points`, for `push_unique`.
    #[serde(skip)]
    seen: HashSet<(i32, i32)>,
}

impl PartialEq for SphereList {
    fn eq(&self, other: &Self) -> bool {
        (self.x, self.y) == (other.x, other.y) && self.points == other.points
    }
}

impl Eq for SphereList {}

impl SphereList {
    /// List anchored at the origin, so offsets are layout coordinates.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn anchored(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }

    pub fn push(&mut self, dx: i32, dy: i32, cell: Cell) {
        self.seen.insert((dx, dy));
        self.points.push((dx, dy, cell));
    }

    /// Append unless an entry with the same offset is already present.
    pub fn push_unique(&mut self, dx: i32, dy: i32, cell: Cell) {
        // Skipped by serde; rebuilt on first use after loading.
        if self.seen.is_empty() && !self.points.is_empty() {
            self.seen = self.points.iter().map(|&(px, py, _)| (px, py)).collect();
        }
        if self.seen.insert((dx, dy)) {
            self.points.push((dx, dy, cell));
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Draw onto a layout without recording anything. Used for previews.
    pub fn write_onto(&self, layout: &mut Layout) {
        for &(dx, dy, cell) in &self.points {
            layout.set_at((self.x, self.y), (dx, dy), cell);
        }
    }

    fn memory_size(&self) -> usize {
        self.points.len() * std::mem::size_of::<(i32, i32, Cell)>()
    }
}

/// Cells keyed by local offset from an anchor.
///
/// Dense patches carry every offset of their `width × height` extent; sparse
/// ones (flood fill, substitutions) only carry the cells they change. Writes
/// go row by row, so when a patch larger than the grid aliases onto itself
/// the last offset in row order wins.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patch {
    pub x: i32,
    pub y: i32,
    pub width: u16,
    pub height: u16,
    /// Keyed `(dy, dx)` so map order is row order.
    cells: BTreeMap<(i32, i32), Cell>,
}

impl Patch {
    /// Empty sparse patch over the given extent.
    pub fn new(region: Region) -> Self {
        Self {
            x: region.x,
            y: region.y,
            width: region.width,
            height: region.height,
            cells: BTreeMap::new(),
        }
    }

    /// Every offset of the region set to `cell`.
    pub fn filled(region: Region, cell: Cell) -> Self {
        let mut patch = Self::new(region);
        for (dx, dy) in region.offsets() {
            patch.insert(dx, dy, cell);
        }
        patch
    }

    pub fn region(&self) -> Region {
        Region::new(self.x, self.y, self.width, self.height)
    }

    pub fn insert(&mut self, dx: i32, dy: i32, cell: Cell) {
        self.cells.insert((dy, dx), cell);
    }

    pub fn get(&self, dx: i32, dy: i32) -> Option<Cell> {
        self.cells.get(&(dy, dx)).copied()
    }

    /// `(dx, dy, cell)` entries, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32, Cell)> + '_ {
        self.cells.iter().map(|(&(dy, dx), &cell)| (dx, dy, cell))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Draw onto a layout without recording anything. Used for previews.
    pub fn write_onto(&self, layout: &mut Layout) {
        for (dx, dy, cell) in self.iter() {
            layout.set_at((self.x, self.y), (dx, dy), cell);
        }
    }

    fn memory_size(&self) -> usize {
        self.cells.len() * std::mem::size_of::<((i32, i32), Cell)>()
    }
}

// ============================================================================
// COMMAND
// ============================================================================

/// Kinds of sphere-list command. Only the display name differs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrokeKind {
    Draw,
    Line,
    RectangleEdge,
    DiamondEdge,
}

/// Kinds of area command. Only the display name differs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AreaKind {
    Fill,
    Rectangle,
    Diamond,
    Oval,
    Cut,
    PasteOnce,
    PasteRepeating,
    ReplaceFgToBg,
    ReplaceBgToFg,
    ReplaceColor,
    SwapFgBg,
    MarkRings,
}

/// One stage-metadata field with the value a command will swap in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetaValue {
    PaletteId(u32),
    SkyAlpha(u8),
    GlobeAlpha(u8),
    PlayfieldA(Rgb),
    PlayfieldB(Rgb),
    BgColor1(Rgb),
    BgColor2(Rgb),
    BgColor3(Rgb),
}

/// A reversible edit. Calling [`Command::apply`] twice in a row leaves the
/// layout as it was; each call also flips the payload to describe the
/// inverse edit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Spheres { kind: StrokeKind, list: SphereList },
    Area { kind: AreaKind, patch: Patch },
    StartPosition { x: u16, y: u16 },
    StartFacing(Facing),
    Meta(MetaValue),
    Flip { region: Region, axis: FlipAxis },
    /// `inverted` is toggled by every apply; the display name follows `turn`.
    Rotate { region: Region, turn: Turn, inverted: bool },
}

impl Command {
    pub fn spheres(kind: StrokeKind, list: SphereList) -> Self {
        Command::Spheres { kind, list }
    }

    pub fn area(kind: AreaKind, patch: Patch) -> Self {
        Command::Area { kind, patch }
    }

    pub fn flip(region: Region, axis: FlipAxis) -> Self {
        Command::Flip { region, axis }
    }

    /// Rotation is only defined for square regions.
    pub fn rotate(region: Region, turn: Turn) -> Result<Self, EditError> {
        if !region.is_square() {
            return Err(EditError::InvalidRegion {
                width: region.width,
                height: region.height,
            });
        }
        Ok(Command::Rotate {
            region,
            turn,
            inverted: false,
        })
    }

    pub fn apply(&mut self, layout: &mut Layout) {
        match self {
            Command::Spheres { list, .. } => apply_spheres(list, layout),
            Command::Area { patch, .. } => apply_area(patch, layout),
            Command::StartPosition { x, y } => apply_start_position(x, y, layout),
            Command::StartFacing(facing) => apply_start_facing(facing, layout),
            Command::Meta(value) => apply_meta(value, layout),
            Command::Flip { region, axis } => transform::flip(layout, *region, *axis),
            Command::Rotate {
                region,
                turn,
                inverted,
            } => {
                let effective = if *inverted { turn.opposite() } else { *turn };
                transform::rotate(layout, *region, effective);
                *inverted = !*inverted;
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Spheres { kind, .. } => match kind {
                StrokeKind::Draw => "Draw",
                StrokeKind::Line => "Line",
                StrokeKind::RectangleEdge => "Rectangle",
                StrokeKind::DiamondEdge => "Diamond",
            },
            Command::Area { kind, .. } => match kind {
                AreaKind::Fill => "Fill",
                AreaKind::Rectangle => "Rectangle",
                AreaKind::Diamond => "Diamond",
                AreaKind::Oval => "Oval",
                AreaKind::Cut => "Cut",
                AreaKind::PasteOnce => "Paste Once",
                AreaKind::PasteRepeating => "Paste Repeating",
                AreaKind::ReplaceFgToBg => "Replace FG -> BG",
                AreaKind::ReplaceBgToFg => "Replace BG -> FG",
                AreaKind::ReplaceColor => "Replace Color",
                AreaKind::SwapFgBg => "Swap FG <-> BG",
                AreaKind::MarkRings => "Mark Rings",
            },
            Command::StartPosition { .. } => "Start Position",
            Command::StartFacing(_) => "Start Angle",
            Command::Meta(value) => match value {
                MetaValue::PaletteId(_) => "Palette ID",
                MetaValue::SkyAlpha(_) => "Sky Alpha",
                MetaValue::GlobeAlpha(_) => "Globe Alpha",
                MetaValue::PlayfieldA(_) => "Playfield A",
                MetaValue::PlayfieldB(_) => "Playfield B",
                MetaValue::BgColor1(_) => "BG Color 1",
                MetaValue::BgColor2(_) => "BG Color 2",
                MetaValue::BgColor3(_) => "BG Color 3",
            },
            Command::Flip { axis, .. } => match axis {
                FlipAxis::Horizontal => "Flip Horizontally",
                FlipAxis::Vertical => "Flip Vertically",
            },
            Command::Rotate { turn, .. } => match turn {
                Turn::Left => "Rotate Left",
                Turn::Right => "Rotate Right",
            },
        }
    }

    /// Approximate heap + inline footprint, used for the history memory cap.
    pub fn memory_size(&self) -> usize {
        let payload = match self {
            Command::Spheres { list, .. } => list.memory_size(),
            Command::Area { patch, .. } => patch.memory_size(),
            _ => 0,
        };
        std::mem::size_of::<Command>() + payload
    }
}

fn apply_spheres(list: &mut SphereList, layout: &mut Layout) {
    let origin = (list.x, list.y);
    for (dx, dy, cell) in list.points.iter_mut() {
        let previous = layout.get_at(origin, (*dx, *dy));
        layout.set_at(origin, (*dx, *dy), *cell);
        *cell = previous;
    }
    list.points.reverse();
}

fn apply_area(patch: &mut Patch, layout: &mut Layout) {
    let origin = (patch.x, patch.y);
    // Read the whole footprint before writing so aliased offsets restore cleanly.
    let previous: BTreeMap<(i32, i32), Cell> = patch
        .cells
        .keys()
        .map(|&(dy, dx)| ((dy, dx), layout.get_at(origin, (dx, dy))))
        .collect();
    patch.write_onto(layout);
    patch.cells = previous;
}

fn apply_start_position(x: &mut u16, y: &mut u16, layout: &mut Layout) {
    let previous = layout.start();
    layout.set_start_position(*x as i32, *y as i32);
    *x = previous.x;
    *y = previous.y;
}

fn apply_start_facing(facing: &mut Facing, layout: &mut Layout) {
    let previous = layout.start().facing;
    layout.set_facing(*facing);
    *facing = previous;
}

fn apply_meta(value: &mut MetaValue, layout: &mut Layout) {
    let meta = layout.meta_mut();
    match value {
        MetaValue::PaletteId(v) => std::mem::swap(v, &mut meta.palette_id),
        MetaValue::SkyAlpha(v) => std::mem::swap(v, &mut meta.sky_alpha),
        MetaValue::GlobeAlpha(v) => std::mem::swap(v, &mut meta.globe_alpha),
        MetaValue::PlayfieldA(v) => std::mem::swap(v, &mut meta.playfield_a),
        MetaValue::PlayfieldB(v) => std::mem::swap(v, &mut meta.playfield_b),
        MetaValue::BgColor1(v) => std::mem::swap(v, &mut meta.bg_color1),
        MetaValue::BgColor2(v) => std::mem::swap(v, &mut meta.bg_color2),
        MetaValue::BgColor3(v) => std::mem::swap(v, &mut meta.bg_color3),
    }
}

// ============================================================================
// HISTORY MANAGER
// ============================================================================

/// Default cap on the number of undo steps.
pub const DEFAULT_MAX_HISTORY: usize = 200;

/// Owns the layout and every command applied to it.
pub struct HistoryManager {
    layout: Layout,
    undo_stack: VecDeque<Command>,
    redo_stack: VecDeque<Command>,
    max_history_size: usize,
    /// Optional memory cap in bytes.
    max_memory_bytes: Option<usize>,
    /// Running memory total across both stacks.
    total_memory: usize,
    /// Undo depth at the last save; `None` once that state is unreachable.
    saved_depth: Option<usize>,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(Layout::blank(), DEFAULT_MAX_HISTORY)
    }
}

impl HistoryManager {
    pub fn new(layout: Layout, max_history_size: usize) -> Self {
        Self {
            layout,
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_history_size: max_history_size.max(1),
            max_memory_bytes: None,
            total_memory: 0,
            saved_depth: Some(0),
        }
    }

    /// Rebuild a log from a saved layout and its undo stack (oldest first).
    /// The result is clean at the restored depth.
    pub fn from_parts(layout: Layout, undo: Vec<Command>, max_history_size: usize) -> Self {
        let mut history = Self::new(layout, max_history_size);
        history.total_memory = undo.iter().map(Command::memory_size).sum();
        history.undo_stack = undo.into();
        history.saved_depth = Some(history.undo_stack.len());
        history.prune();
        history
    }

    /// Layout plus undo stack (oldest first), the parts a session file keeps.
    pub fn to_parts(&self) -> (Layout, Vec<Command>) {
        (self.layout.clone(), self.undo_stack.iter().cloned().collect())
    }

    pub fn set_limits(&mut self, max_history_size: usize, max_memory_bytes: Option<usize>) {
        self.max_history_size = max_history_size.max(1);
        self.max_memory_bytes = max_memory_bytes;
        self.prune();
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Disposable copy for rendering an uncommitted edit.
    pub fn preview(&self) -> Layout {
        self.layout.clone()
    }

    /// Apply a new command and record it. Discards the redo branch.
    pub fn submit(&mut self, mut command: Command) -> &'static str {
        if !self.redo_stack.is_empty() {
            for cmd in self.redo_stack.drain(..) {
                self.total_memory = self.total_memory.saturating_sub(cmd.memory_size());
            }
            if self.saved_depth.is_some_and(|d| d > self.undo_stack.len()) {
                self.saved_depth = None;
            }
        }

        let name = command.name();
        command.apply(&mut self.layout);
        self.total_memory += command.memory_size();
        self.undo_stack.push_back(command);

        self.prune();
        name
    }

    pub fn undo(&mut self) -> Result<&'static str, EditError> {
        let mut command = self.undo_stack.pop_back().ok_or(EditError::EmptyHistory)?;
        let name = command.name();
        self.total_memory = self.total_memory.saturating_sub(command.memory_size());
        command.apply(&mut self.layout);
        self.total_memory += command.memory_size();
        self.redo_stack.push_back(command);
        Ok(name)
    }

    pub fn redo(&mut self) -> Result<&'static str, EditError> {
        let mut command = self.redo_stack.pop_back().ok_or(EditError::EmptyFuture)?;
        let name = command.name();
        self.total_memory = self.total_memory.saturating_sub(command.memory_size());
        command.apply(&mut self.layout);
        self.total_memory += command.memory_size();
        self.undo_stack.push_back(command);
        Ok(name)
    }

    /// Undo up to `steps` commands, stopping early when the log runs out.
    /// Returns how many ran; errors only if none could.
    pub fn undo_many(&mut self, steps: usize) -> Result<usize, EditError> {
        let mut done = 0;
        while done < steps {
            match self.undo() {
                Ok(_) => done += 1,
                Err(e) if done == 0 => return Err(e),
                Err(_) => break,
            }
        }
        Ok(done)
    }

    pub fn redo_many(&mut self, steps: usize) -> Result<usize, EditError> {
        let mut done = 0;
        while done < steps {
            match self.redo() {
                Ok(_) => done += 1,
                Err(e) if done == 0 => return Err(e),
                Err(_) => break,
            }
        }
        Ok(done)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of commands that can be undone.
    pub fn depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn is_dirty(&self) -> bool {
        self.saved_depth != Some(self.undo_stack.len())
    }

    pub fn mark_saved(&mut self) {
        self.saved_depth = Some(self.undo_stack.len());
    }

    /// Undo names, most recent first.
    pub fn undo_names(&self) -> Vec<&'static str> {
        self.undo_stack.iter().rev().map(Command::name).collect()
    }

    /// Redo names, most recent first.
    pub fn redo_names(&self) -> Vec<&'static str> {
        self.redo_stack.iter().rev().map(Command::name).collect()
    }

    /// Get the current memory usage of the history (O(1) via cached total)
    pub fn memory_usage(&self) -> usize {
        self.total_memory
    }

    /// Drop the oldest commands until both limits hold.
    fn prune(&mut self) {
        while self.undo_stack.len() > self.max_history_size {
            self.drop_oldest();
        }

        if let Some(max_bytes) = self.max_memory_bytes {
            while self.total_memory > max_bytes && self.undo_stack.len() > 1 {
                self.drop_oldest();
            }
        }
    }

    fn drop_oldest(&mut self) {
        if let Some(removed) = self.undo_stack.pop_front() {
            self.total_memory = self.total_memory.saturating_sub(removed.memory_size());
            // The saved state sat below the dropped entry and is gone for good.
            self.saved_depth = match self.saved_depth {
                Some(0) | None => None,
                Some(d) => Some(d - 1),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::SphereKind;

    fn blue() -> Cell {
        Cell::new(SphereKind::Blue)
    }

    fn dot(x: i32, y: i32, cell: Cell) -> Command {
        let mut list = SphereList::new();
        list.push(x, y, cell);
        Command::spheres(StrokeKind::Draw, list)
    }

    #[test]
    fn sphere_list_apply_twice_restores() {
        let mut layout = Layout::new(4, 4).unwrap();
        layout.set(1, 1, Cell::new(SphereKind::Red));
        let before = layout.clone();

        let mut list = SphereList::new();
        list.push(1, 1, blue());
        list.push(5, 5, Cell::new(SphereKind::Yellow)); // wraps onto (1, 1)
        list.push(2, 1, blue());
        let mut cmd = Command::spheres(StrokeKind::Line, list);

        cmd.apply(&mut layout);
        assert_eq!(layout.get(1, 1), Cell::new(SphereKind::Yellow));
        cmd.apply(&mut layout);
        assert_eq!(layout, before);
    }

    #[test]
    fn area_apply_twice_restores_with_aliasing() {
        let mut layout = Layout::new(3, 3).unwrap();
        layout.set(0, 0, Cell::new(SphereKind::Pink));
        let before = layout.clone();

        // 4 wide on a 3 wide grid: offsets 0 and 3 share a column.
        let mut patch = Patch::filled(Region::new(-1, 0, 4, 1), blue());
        patch.insert(3, 0, Cell::new(SphereKind::Green));
        let mut cmd = Command::area(AreaKind::PasteOnce, patch);

        cmd.apply(&mut layout);
        let after = layout.clone();
        cmd.apply(&mut layout);
        assert_eq!(layout, before);
        cmd.apply(&mut layout);
        assert_eq!(layout, after);
    }

    #[test]
    fn aliased_patch_writes_in_row_order() {
        let mut layout = Layout::new(2, 2).unwrap();
        // Both offsets wrap onto (0, 0); (0, 2) comes later in row order.
        let mut patch = Patch::new(Region::new(0, 0, 3, 3));
        patch.insert(0, 2, Cell::new(SphereKind::Green));
        patch.insert(2, 0, Cell::new(SphereKind::Red));
        assert_eq!(
            patch.iter().map(|(dx, dy, _)| (dx, dy)).collect::<Vec<_>>(),
            vec![(2, 0), (0, 2)]
        );
        let mut cmd = Command::area(AreaKind::PasteOnce, patch);
        cmd.apply(&mut layout);
        assert_eq!(layout.get(0, 0), Cell::new(SphereKind::Green));
        cmd.apply(&mut layout);
        assert_eq!(layout, Layout::new(2, 2).unwrap());
    }

    #[test]
    fn anchors_near_i32_max_wrap_without_overflow() {
        let mut history = HistoryManager::new(Layout::new(5, 5).unwrap(), 10);
        // i32::MAX wraps to column 2, so the two cells are columns 2 and 3.
        history.submit(Command::area(
            AreaKind::Rectangle,
            Patch::filled(Region::new(i32::MAX, 0, 2, 1), blue()),
        ));
        assert_eq!(history.layout().get(2, 0), blue());
        assert_eq!(history.layout().get(3, 0), blue());
        assert_eq!(history.layout().count_kind(SphereKind::Blue), 2);

        let mut list = SphereList::anchored(i32::MAX, i32::MAX);
        list.push(1, 1, Cell::new(SphereKind::Red));
        history.submit(Command::spheres(StrokeKind::Draw, list));
        assert_eq!(history.layout().get(3, 3), Cell::new(SphereKind::Red));

        history.undo_many(2).unwrap();
        assert_eq!(history.layout(), &Layout::new(5, 5).unwrap());
    }

    #[test]
    fn push_unique_keeps_first_entry() {
        let mut list = SphereList::new();
        for x in 0..1000 {
            list.push_unique(x % 10, 0, blue());
        }
        list.push_unique(3, 0, Cell::new(SphereKind::Red));
        assert_eq!(list.len(), 10);
        assert_eq!(list.points[3], (3, 0, blue()));

        // The seen set is not persisted and is rebuilt on the next push.
        let bytes = bincode::serialize(&list).unwrap();
        let mut loaded: SphereList = bincode::deserialize(&bytes).unwrap();
        assert_eq!(loaded, list);
        loaded.push_unique(3, 0, Cell::new(SphereKind::Red));
        loaded.push_unique(10, 0, blue());
        assert_eq!(loaded.len(), 11);
    }

    #[test]
    fn scalar_commands_swap() {
        let mut layout = Layout::blank();
        let before = layout.clone();
        let mut cmds = vec![
            Command::StartPosition { x: 3, y: 4 },
            Command::StartFacing(Facing::East),
            Command::Meta(MetaValue::PaletteId(7)),
            Command::Meta(MetaValue::BgColor2(Rgb::new(1, 2, 3))),
        ];
        for cmd in cmds.iter_mut() {
            cmd.apply(&mut layout);
        }
        assert_eq!(layout.start().x, 3);
        assert_eq!(layout.start().facing, Facing::East);
        assert_eq!(layout.meta().palette_id, 7);
        assert_eq!(layout.meta().bg_color2, Rgb::new(1, 2, 3));
        for cmd in cmds.iter_mut().rev() {
            cmd.apply(&mut layout);
        }
        assert_eq!(layout, before);
    }

    #[test]
    fn flip_mirrors_region() {
        let mut layout = Layout::new(5, 5).unwrap();
        layout.set(1, 1, blue());
        let mut cmd = Command::flip(Region::new(1, 1, 3, 2), FlipAxis::Horizontal);
        cmd.apply(&mut layout);
        assert_eq!(layout.get(3, 1), blue());
        assert_eq!(layout.get(1, 1), Cell::EMPTY);

        let mut cmd = Command::flip(Region::new(1, 1, 3, 2), FlipAxis::Vertical);
        cmd.apply(&mut layout);
        assert_eq!(layout.get(3, 2), blue());
    }

    #[test]
    fn rotate_right_moves_top_left_to_top_right() {
        let mut layout = Layout::new(4, 4).unwrap();
        layout.set(0, 0, blue());
        let mut cmd = Command::rotate(Region::new(0, 0, 3, 3), Turn::Right).unwrap();
        cmd.apply(&mut layout);
        assert_eq!(layout.get(2, 0), blue());
        assert_eq!(cmd.name(), "Rotate Right");
        cmd.apply(&mut layout);
        assert_eq!(layout.get(0, 0), blue());
        assert_eq!(layout.get(2, 0), Cell::EMPTY);
    }

    #[test]
    fn rotate_rejects_non_square() {
        assert_eq!(
            Command::rotate(Region::new(0, 0, 3, 2), Turn::Left),
            Err(EditError::InvalidRegion { width: 3, height: 2 })
        );
    }

    #[test]
    fn undo_redo_cycle() {
        let mut history = HistoryManager::new(Layout::new(4, 4).unwrap(), 10);
        assert_eq!(history.undo(), Err(EditError::EmptyHistory));
        assert_eq!(history.redo(), Err(EditError::EmptyFuture));

        history.submit(dot(0, 0, blue()));
        history.submit(dot(1, 0, blue()));
        let after_b = history.preview();
        assert_eq!(history.undo(), Ok("Draw"));
        assert_eq!(history.redo(), Ok("Draw"));
        assert_eq!(history.layout(), &after_b);
        history.undo_many(2).unwrap();
        assert_eq!(history.layout(), &Layout::new(4, 4).unwrap());
        assert_eq!(history.redo_depth(), 2);
    }

    #[test]
    fn many_stops_at_the_end() {
        let mut history = HistoryManager::new(Layout::new(4, 4).unwrap(), 10);
        history.submit(dot(0, 0, blue()));
        assert_eq!(history.undo_many(5), Ok(1));
        assert_eq!(history.undo_many(1), Err(EditError::EmptyHistory));
        assert_eq!(history.redo_many(3), Ok(1));
    }

    #[test]
    fn dirty_tracking() {
        let mut history = HistoryManager::new(Layout::new(4, 4).unwrap(), 10);
        assert!(!history.is_dirty());
        history.submit(dot(0, 0, blue()));
        assert!(history.is_dirty());
        history.mark_saved();
        assert!(!history.is_dirty());
        history.undo().unwrap();
        assert!(history.is_dirty());
        history.redo().unwrap();
        assert!(!history.is_dirty());

        // Saved state now lives on the discarded redo branch.
        history.undo().unwrap();
        history.submit(dot(2, 2, blue()));
        assert!(history.is_dirty());
        history.undo().unwrap();
        assert!(history.is_dirty());
        history.redo().unwrap();
        assert!(history.is_dirty());
        history.mark_saved();
        assert!(!history.is_dirty());
    }

    #[test]
    fn prune_by_count_shifts_saved_depth() {
        let mut history = HistoryManager::new(Layout::new(8, 1).unwrap(), 3);
        history.submit(dot(0, 0, blue()));
        history.submit(dot(1, 0, blue()));
        history.mark_saved();
        history.submit(dot(2, 0, blue()));
        history.submit(dot(3, 0, blue()));
        assert_eq!(history.depth(), 3);
        history.undo_many(2).unwrap();
        assert!(!history.is_dirty());
        assert_eq!(history.undo_names(), vec!["Draw"]);
    }

    #[test]
    fn prune_by_memory_keeps_newest() {
        let mut history = HistoryManager::new(Layout::new(8, 8).unwrap(), 100);
        let cmd_size = dot(0, 0, blue()).memory_size();
        history.set_limits(100, Some(cmd_size * 2));
        for x in 0..5 {
            history.submit(dot(x, 0, blue()));
        }
        assert_eq!(history.depth(), 2);
        assert!(history.memory_usage() <= cmd_size * 2);
    }

    #[test]
    fn from_parts_is_clean_and_undoable() {
        let mut history = HistoryManager::new(Layout::new(4, 4).unwrap(), 10);
        history.submit(dot(0, 0, blue()));
        let (layout, undo) = history.to_parts();
        let mut restored = HistoryManager::from_parts(layout, undo, 10);
        assert!(!restored.is_dirty());
        assert_eq!(restored.depth(), 1);
        restored.undo().unwrap();
        assert_eq!(restored.layout().get(0, 0), Cell::EMPTY);
    }
}
