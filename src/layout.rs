use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{EditError, SessionFileError};

/// Side length of a freshly created blank stage.
pub const DEFAULT_SIZE: u16 = 32;
/// Start marker position of a blank stage.
pub const DEFAULT_START: (u16, u16) = (0xF, 0xF);

/// Only the low 10 bits of a raw tile carry the tile code.
const TILE_MASK: u16 = 0x3FF;
/// Raw tile code of an unset tile.
pub const TILE_UNSET: u16 = 0x3FF;
/// Raw tile code of the first start tile (facing north).
const TILE_START_N: u16 = 8;
/// Bit used for the ring marker in the packed single-byte cell form.
const RING_MARKER_BIT: u8 = 0x80;

// ============================================================================
// CELLS
// ============================================================================

/// What occupies a grid position, ignoring the ring marker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SphereKind {
    #[default]
    Empty,
    Blue,
    Red,
    Bumper,
    Yellow,
    Green,
    Pink,
    Ring,
}

impl SphereKind {
    pub fn label(&self) -> &'static str {
        match self {
            SphereKind::Empty => "Empty",
            SphereKind::Blue => "Blue",
            SphereKind::Red => "Red",
            SphereKind::Bumper => "Bumper",
            SphereKind::Yellow => "Yellow",
            SphereKind::Green => "Green",
            SphereKind::Pink => "Pink",
            SphereKind::Ring => "Ring",
        }
    }

    pub fn all() -> &'static [SphereKind] {
        &[
            SphereKind::Empty,
            SphereKind::Blue,
            SphereKind::Red,
            SphereKind::Bumper,
            SphereKind::Yellow,
            SphereKind::Green,
            SphereKind::Pink,
            SphereKind::Ring,
        ]
    }

    /// Tile code used by the game's playfield layer.
    pub fn tile_code(self) -> u16 {
        self as u16
    }

    pub fn from_tile_code(code: u16) -> Option<Self> {
        SphereKind::all().get(code as usize).copied()
    }

    /// Single character used by text dumps.
    pub fn glyph(self) -> char {
        match self {
            SphereKind::Empty => '.',
            SphereKind::Blue => 'b',
            SphereKind::Red => 'r',
            SphereKind::Bumper => 'x',
            SphereKind::Yellow => 'y',
            SphereKind::Green => 'g',
            SphereKind::Pink => 'p',
            SphereKind::Ring => 'o',
        }
    }
}

/// One grid position: a sphere kind plus an orthogonal ring-marker flag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub kind: SphereKind,
    pub ring_marker: bool,
}

impl Cell {
    pub const EMPTY: Cell = Cell::new(SphereKind::Empty);

    pub const fn new(kind: SphereKind) -> Self {
        Self { kind, ring_marker: false }
    }

    pub const fn with_ring_marker(kind: SphereKind) -> Self {
        Self { kind, ring_marker: true }
    }

    /// Same kind with the ring marker set.
    pub fn marked(self) -> Self {
        Self { ring_marker: true, ..self }
    }

    /// Packed form: tile code in the low bits, ring marker in bit 7.
    pub fn to_bits(self) -> u8 {
        let marker = if self.ring_marker { RING_MARKER_BIT } else { 0 };
        self.kind as u8 | marker
    }

    pub fn from_bits(bits: u8) -> Option<Self> {
        let kind = SphereKind::from_tile_code((bits & !RING_MARKER_BIT) as u16)?;
        Some(Self {
            kind,
            ring_marker: bits & RING_MARKER_BIT != 0,
        })
    }
}

impl From<SphereKind> for Cell {
    fn from(kind: SphereKind) -> Self {
        Cell::new(kind)
    }
}

// ============================================================================
// START MARKER + STAGE METADATA
// ============================================================================

/// Direction the player faces at the start marker (2-bit angle).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    #[default]
    North,
    West,
    South,
    East,
}

impl Facing {
    pub fn from_angle(angle: u8) -> Self {
        match angle & 3 {
            0 => Facing::North,
            1 => Facing::West,
            2 => Facing::South,
            _ => Facing::East,
        }
    }

    pub fn angle(self) -> u8 {
        self as u8
    }

    /// Next facing counter-clockwise, wrapping East back to North.
    pub fn next(self) -> Self {
        Facing::from_angle(self.angle() + 1)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Facing::North => "North",
            Facing::West => "West",
            Facing::South => "South",
            Facing::East => "East",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartMarker {
    pub x: u16,
    pub y: u16,
    pub facing: Facing,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Palette block carried through edits untouched except by metadata commands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageMeta {
    /// False when the stage has no palette block at all.
    pub present: bool,
    pub palette_id: u32,
    pub sky_alpha: u8,
    pub globe_alpha: u8,
    pub playfield_a: Rgb,
    pub playfield_b: Rgb,
    pub bg_color1: Rgb,
    pub bg_color2: Rgb,
    pub bg_color3: Rgb,
}

// ============================================================================
// RAW TILE LAYERS - the shape in which a stage arrives from / leaves for disk
// ============================================================================

/// Decoded meaning of a raw playfield tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RawTile {
    Sphere(SphereKind),
    Start(Facing),
    Unset,
}

impl RawTile {
    pub fn decode(raw: u16) -> Self {
        let code = raw & TILE_MASK;
        if let Some(kind) = SphereKind::from_tile_code(code) {
            return RawTile::Sphere(kind);
        }
        if (TILE_START_N..TILE_START_N + 4).contains(&code) {
            return RawTile::Start(Facing::from_angle((code - TILE_START_N) as u8));
        }
        RawTile::Unset
    }

    pub fn encode(self) -> u16 {
        match self {
            RawTile::Sphere(kind) => kind.tile_code(),
            RawTile::Start(facing) => TILE_START_N + facing.angle() as u16,
            RawTile::Unset => TILE_UNSET,
        }
    }
}

/// A row-major layer of raw tile codes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileLayer {
    pub width: u16,
    pub height: u16,
    pub tiles: Vec<u16>,
}

impl TileLayer {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            tiles: vec![0; width as usize * height as usize],
        }
    }

    fn get(&self, x: u16, y: u16) -> u16 {
        self.tiles[y as usize * self.width as usize + x as usize]
    }

    fn set(&mut self, x: u16, y: u16, tile: u16) {
        let w = self.width as usize;
        self.tiles[y as usize * w + x as usize] = tile;
    }

    fn check_len(&self) -> Result<(), SessionFileError> {
        let expected = self.width as usize * self.height as usize;
        if self.tiles.len() != expected {
            return Err(SessionFileError::SizeMismatch {
                expected,
                actual: self.tiles.len(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// REGION
// ============================================================================

/// Rectangular area in layout coordinates. `x`/`y` may lie outside the
/// grid; every access wraps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u16,
    pub height: u16,
}

impl Region {
    pub const fn new(x: i32, y: i32, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }

    /// The whole grid.
    pub fn full(layout: &Layout) -> Self {
        Self::new(0, 0, layout.width(), layout.height())
    }

    /// Inclusive rectangle spanned by two drag corners in either order.
    pub fn from_drag(a: (i32, i32), b: (i32, i32)) -> Self {
        let span = |p: i32, q: i32| p.abs_diff(q).saturating_add(1).min(u16::MAX as u32) as u16;
        Self::new(a.0.min(b.0), a.1.min(b.1), span(a.0, b.0), span(a.1, b.1))
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn is_square(&self) -> bool {
        self.width == self.height
    }

    /// An empty selection stands for the whole grid.
    pub fn or_full(self, layout: &Layout) -> Self {
        if self.is_empty() { Region::full(layout) } else { self }
    }

    /// Local offsets `(dx, dy)` of every cell, row by row.
    pub fn offsets(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        let w = self.width as i32;
        (0..self.height as i32).flat_map(move |dy| (0..w).map(move |dx| (dx, dy)))
    }
}

// ============================================================================
// LAYOUT - the toroidal grid
// ============================================================================

/// The sphere grid of one bonus stage. Every coordinate wraps around both
/// axes, so no position is ever out of range.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    width: u16,
    height: u16,
    /// Row-major, `width * height` entries.
    cells: Vec<Cell>,
    start: StartMarker,
    meta: StageMeta,
}

impl Default for Layout {
    fn default() -> Self {
        Self::blank()
    }
}

impl Layout {
    pub fn new(width: u16, height: u16) -> Result<Self, EditError> {
        if width == 0 || height == 0 {
            return Err(EditError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            cells: vec![Cell::EMPTY; width as usize * height as usize],
            start: StartMarker {
                x: DEFAULT_START.0 % width,
                y: DEFAULT_START.1 % height,
                facing: Facing::North,
            },
            meta: StageMeta::default(),
        })
    }

    /// Empty stage of the default size.
    pub fn blank() -> Self {
        Self {
            width: DEFAULT_SIZE,
            height: DEFAULT_SIZE,
            cells: vec![Cell::EMPTY; DEFAULT_SIZE as usize * DEFAULT_SIZE as usize],
            start: StartMarker {
                x: DEFAULT_START.0,
                y: DEFAULT_START.1,
                facing: Facing::North,
            },
            meta: StageMeta::default(),
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Floored modulo: negative inputs land in `[0, width)` too.
    pub fn wrap_x(&self, x: i32) -> u16 {
        x.rem_euclid(self.width as i32) as u16
    }

    pub fn wrap_y(&self, y: i32) -> u16 {
        y.rem_euclid(self.height as i32) as u16
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> usize {
        self.wrap_y(y) as usize * self.width as usize + self.wrap_x(x) as usize
    }

    pub fn get(&self, x: i32, y: i32) -> Cell {
        self.cells[self.index(x, y)]
    }

    pub fn set(&mut self, x: i32, y: i32, cell: Cell) {
        let idx = self.index(x, y);
        self.cells[idx] = cell;
    }

    /// Index of `origin + offset`, summed in 64 bits so an anchor near the
    /// ends of the `i32` range still lands on the cell it wraps to.
    fn offset_index(&self, origin: (i32, i32), offset: (i32, i32)) -> usize {
        let x = (origin.0 as i64 + offset.0 as i64).rem_euclid(self.width as i64);
        let y = (origin.1 as i64 + offset.1 as i64).rem_euclid(self.height as i64);
        y as usize * self.width as usize + x as usize
    }

    /// Cell at an anchor plus a local offset.
    pub fn get_at(&self, origin: (i32, i32), offset: (i32, i32)) -> Cell {
        self.cells[self.offset_index(origin, offset)]
    }

    pub fn set_at(&mut self, origin: (i32, i32), offset: (i32, i32), cell: Cell) {
        let idx = self.offset_index(origin, offset);
        self.cells[idx] = cell;
    }

    /// Row-major view of every cell.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn start(&self) -> StartMarker {
        self.start
    }

    pub fn set_start_position(&mut self, x: i32, y: i32) {
        self.start.x = self.wrap_x(x);
        self.start.y = self.wrap_y(y);
    }

    pub fn set_facing(&mut self, facing: Facing) {
        self.start.facing = facing;
    }

    pub fn meta(&self) -> &StageMeta {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut StageMeta {
        &mut self.meta
    }

    /// Number of ring-marked cells. Recomputed on every call.
    pub fn perfect_count(&self) -> usize {
        self.cells.par_iter().filter(|c| c.ring_marker).count()
    }

    /// Number of blue spheres, marked or not.
    pub fn sphere_count(&self) -> usize {
        self.count_kind(SphereKind::Blue)
    }

    pub fn count_kind(&self, kind: SphereKind) -> usize {
        self.cells.par_iter().filter(|c| c.kind == kind).count()
    }

    /// Build a layout from the playfield and ring-count tile layers.
    ///
    /// Start tiles become the start marker (the cell stays empty), unset
    /// tiles become empty cells, and ring tiles in the ring layer set the
    /// marker on the overlapping playfield cell.
    pub fn from_tile_layers(
        playfield: &TileLayer,
        rings: &TileLayer,
    ) -> Result<Self, SessionFileError> {
        playfield.check_len()?;
        rings.check_len()?;
        let mut layout = Layout::new(playfield.width, playfield.height)?;

        for y in 0..playfield.height {
            for x in 0..playfield.width {
                match RawTile::decode(playfield.get(x, y)) {
                    RawTile::Sphere(kind) => layout.set(x as i32, y as i32, Cell::new(kind)),
                    RawTile::Start(facing) => {
                        layout.start = StartMarker { x, y, facing };
                    }
                    RawTile::Unset => {}
                }
            }
        }

        for y in 0..rings.height.min(playfield.height) {
            for x in 0..rings.width.min(playfield.width) {
                if RawTile::decode(rings.get(x, y)) == RawTile::Sphere(SphereKind::Ring) {
                    let cell = layout.get(x as i32, y as i32).marked();
                    layout.set(x as i32, y as i32, cell);
                }
            }
        }

        Ok(layout)
    }

    /// Inverse of [`Layout::from_tile_layers`]. The start marker overwrites
    /// the playfield tile under it; the ring layer gets the requested size
    /// and only its overlap with the playfield is written.
    pub fn to_tile_layers(&self, ring_width: u16, ring_height: u16) -> (TileLayer, TileLayer) {
        let mut playfield = TileLayer::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let cell = self.get(x as i32, y as i32);
                playfield.set(x, y, cell.kind.tile_code());
            }
        }
        playfield.set(
            self.start.x,
            self.start.y,
            RawTile::Start(self.start.facing).encode(),
        );

        let mut rings = TileLayer::new(ring_width, ring_height);
        for y in 0..ring_height.min(self.height) {
            for x in 0..ring_width.min(self.width) {
                if self.get(x as i32, y as i32).ring_marker {
                    rings.set(x, y, SphereKind::Ring.tile_code());
                }
            }
        }

        (playfield, rings)
    }

    /// Structural check for layouts that arrive through deserialization.
    pub fn validate(&self) -> Result<(), SessionFileError> {
        if self.width == 0 || self.height == 0 {
            return Err(EditError::InvalidDimensions {
                width: self.width,
                height: self.height,
            }
            .into());
        }
        let expected = self.width as usize * self.height as usize;
        if self.cells.len() != expected {
            return Err(SessionFileError::SizeMismatch {
                expected,
                actual: self.cells.len(),
            });
        }
        if self.start.x >= self.width || self.start.y >= self.height {
            return Err(SessionFileError::InvalidFormat(format!(
                "start marker ({}, {}) outside {}x{} grid",
                self.start.x, self.start.y, self.width, self.height
            )));
        }
        Ok(())
    }

    /// One text row per grid row; marked cells are upper-case.
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity((self.width as usize + 1) * self.height as usize);
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                let start = self.start;
                if x == start.x as i32 && y == start.y as i32 {
                    out.push(match start.facing {
                        Facing::North => '^',
                        Facing::West => '<',
                        Facing::South => 'v',
                        Facing::East => '>',
                    });
                    continue;
                }
                let cell = self.get(x, y);
                let glyph = cell.kind.glyph();
                out.push(if cell.ring_marker { glyph.to_ascii_uppercase() } else { glyph });
            }
            out.push('\n');
        }
        out
    }
}
