use crate::components::history::{AreaKind, Command, Patch, SphereList, StrokeKind};
use crate::layout::{Cell, Layout, Region};

/// Angular step of the oval sampler, in radians.
const OVAL_STEP: f64 = 0.04;
/// Radius divisor. Slightly above 2 so samples never reach the far edge.
const OVAL_RADIUS_DIV: f64 = 2.01;

/// Shapes drawn from a drag rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Rectangle,
    Diamond,
    Oval,
}

impl ShapeKind {
    pub fn label(&self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "Rectangle",
            ShapeKind::Diamond => "Diamond",
            ShapeKind::Oval => "Oval",
        }
    }

    pub fn all() -> &'static [ShapeKind] {
        &[ShapeKind::Rectangle, ShapeKind::Diamond, ShapeKind::Oval]
    }
}

/// How a shape is painted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShapeFillMode {
    /// Outline only, in the foreground cell.
    #[default]
    Edge,
    /// Outline in the foreground cell, interior in the background cell.
    FillWithEdge,
    /// Outline and interior in the foreground cell.
    Solid,
}

impl ShapeFillMode {
    pub fn label(&self) -> &'static str {
        match self {
            ShapeFillMode::Edge => "Edge",
            ShapeFillMode::FillWithEdge => "Fill with Edge",
            ShapeFillMode::Solid => "Fill",
        }
    }

    pub fn all() -> &'static [ShapeFillMode] {
        &[
            ShapeFillMode::Edge,
            ShapeFillMode::FillWithEdge,
            ShapeFillMode::Solid,
        ]
    }
}

/// Rasterized shape, ready to be wrapped in a command or drawn on a preview.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Raster {
    /// Ordered point list, offsets from the list's anchor.
    Outline(SphereList),
    /// Cells keyed by offset from the shape's top-left corner.
    Area(Patch),
}

impl Raster {
    pub fn is_empty(&self) -> bool {
        match self {
            Raster::Outline(list) => list.is_empty(),
            Raster::Area(patch) => patch.is_empty(),
        }
    }

    /// Draw onto a preview layout.
    pub fn write_onto(&self, layout: &mut Layout) {
        match self {
            Raster::Outline(list) => list.write_onto(layout),
            Raster::Area(patch) => patch.write_onto(layout),
        }
    }

    pub fn into_command(self, kind: ShapeKind) -> Command {
        match (self, kind) {
            (Raster::Outline(list), ShapeKind::Diamond) => {
                Command::spheres(StrokeKind::DiamondEdge, list)
            }
            (Raster::Outline(list), _) => Command::spheres(StrokeKind::RectangleEdge, list),
            (Raster::Area(patch), ShapeKind::Rectangle) => {
                Command::area(AreaKind::Rectangle, patch)
            }
            (Raster::Area(patch), ShapeKind::Diamond) => Command::area(AreaKind::Diamond, patch),
            (Raster::Area(patch), ShapeKind::Oval) => Command::area(AreaKind::Oval, patch),
        }
    }
}

/// Everything needed to rasterize one drag-rectangle shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShapeRequest {
    pub kind: ShapeKind,
    pub mode: ShapeFillMode,
    pub bounds: Region,
    pub fg: Cell,
    /// Interior cell for [`ShapeFillMode::FillWithEdge`]; `None` leaves the
    /// interior untouched.
    pub bg: Option<Cell>,
}

impl ShapeRequest {
    pub fn from_drag(
        kind: ShapeKind,
        mode: ShapeFillMode,
        start: (i32, i32),
        end: (i32, i32),
        square: bool,
        fg: Cell,
        bg: Option<Cell>,
    ) -> Self {
        Self {
            kind,
            mode,
            bounds: drag_bounds(start, end, square),
            fg,
            bg,
        }
    }
}

/// Both sides become the longer one.
pub fn snap_square(width: u16, height: u16) -> (u16, u16) {
    let side = width.max(height);
    (side, side)
}

/// Top-left corner and inclusive size of a drag between two cells.
pub fn drag_bounds(start: (i32, i32), end: (i32, i32), square: bool) -> Region {
    let mut region = Region::from_drag(start, end);
    if square {
        (region.width, region.height) = snap_square(region.width, region.height);
    }
    region
}

pub fn rasterize(request: &ShapeRequest) -> Raster {
    let ShapeRequest {
        kind,
        mode,
        bounds,
        fg,
        bg,
    } = *request;
    match kind {
        ShapeKind::Rectangle => rectangle(bounds, fg, bg, mode),
        ShapeKind::Diamond => diamond(bounds, fg, bg, mode),
        ShapeKind::Oval => Raster::Area(oval(bounds, fg, bg, mode)),
    }
}

// ============================================================================
// LINE
// ============================================================================

/// Cells of a single-width line from `(x1, y1)` to `(x2, y2)`, in that order.
///
/// Always `max(|dx|, |dy|) + 1` points with no gaps. Extents are measured
/// in 64 bits, so any pair of `i32` endpoints is accepted.
pub fn line(x1: i32, y1: i32, x2: i32, y2: i32) -> Vec<(i32, i32)> {
    if y1 == y2 {
        return walk(x1, x2).map(|x| (x, y1)).collect();
    }
    if x1 == x2 {
        return walk(y1, y2).map(|y| (x1, y)).collect();
    }

    let steep = y1.abs_diff(y2) > x1.abs_diff(x2);
    let (mut ax, mut ay, mut bx, mut by) = if steep {
        (y1, x1, y2, x2)
    } else {
        (x1, y1, x2, y2)
    };
    let reversed = ax > bx;
    if reversed {
        std::mem::swap(&mut ax, &mut bx);
        std::mem::swap(&mut ay, &mut by);
    }

    let dx = bx as i64 - ax as i64;
    let dy = ay.abs_diff(by) as i64;
    let ystep = if ay < by { 1 } else { -1 };
    // Error scaled by dx: a step happens once it reaches half a cell.
    let mut error = 0_i64;
    // Can step once past `by` after the last point.
    let mut y = ay as i64;
    let mut points = Vec::with_capacity(dx as usize + 1);
    for x in ax..=bx {
        let py = y as i32;
        points.push(if steep { (py, x) } else { (x, py) });
        error += dy;
        if 2 * error >= dx {
            y += ystep;
            error -= dx;
        }
    }

    if reversed {
        points.reverse();
    }
    points
}

/// Every integer from `from` to `to` inclusive, in that direction.
fn walk(from: i32, to: i32) -> Box<dyn Iterator<Item = i32>> {
    if from <= to {
        Box::new(from..=to)
    } else {
        Box::new((to..=from).rev())
    }
}

/// Line as a sphere list painted with `cell`.
pub fn line_list(x1: i32, y1: i32, x2: i32, y2: i32, cell: Cell) -> SphereList {
    let mut list = SphereList::new();
    for (x, y) in line(x1, y1, x2, y2) {
        list.push_unique(x, y, cell);
    }
    list
}

/// Extend a freehand stroke with the segment between two pointer samples.
pub fn extend_stroke(stroke: &mut SphereList, from: (i32, i32), to: (i32, i32), cell: Cell) {
    for (x, y) in line(from.0, from.1, to.0, to.1) {
        stroke.push_unique(x, y, cell);
    }
}

// ============================================================================
// LOCAL STENCIL - optional cells over a shape's bounding box
// ============================================================================

struct Stencil {
    width: i32,
    height: i32,
    cells: Vec<Option<Cell>>,
}

impl Stencil {
    fn new(width: u16, height: u16) -> Self {
        Self {
            width: width as i32,
            height: height as i32,
            cells: vec![None; width as usize * height as usize],
        }
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some((y * self.width + x) as usize)
    }

    fn get(&self, x: i32, y: i32) -> Option<Cell> {
        self.index(x, y).and_then(|i| self.cells[i])
    }

    fn set(&mut self, x: i32, y: i32, cell: Cell) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = Some(cell);
        }
    }

    fn draw_line(&mut self, from: (i32, i32), to: (i32, i32), cell: Cell) {
        for (x, y) in line(from.0, from.1, to.0, to.1) {
            self.set(x, y, cell);
        }
    }

    /// Per row, fill strictly between the leftmost and rightmost set cell.
    /// With `overwrite` false only unset cells are filled.
    fn fill_rows(&mut self, cell: Cell, overwrite: bool) {
        for y in 0..self.height {
            let set: Vec<i32> = (0..self.width).filter(|&x| self.get(x, y).is_some()).collect();
            let (Some(&min_x), Some(&max_x)) = (set.first(), set.last()) else {
                continue;
            };
            for x in (min_x + 1)..max_x {
                if overwrite || self.get(x, y).is_none() {
                    self.set(x, y, cell);
                }
            }
        }
    }

    fn into_patch(self, bounds: Region) -> Patch {
        let mut patch = Patch::new(bounds);
        for y in 0..self.height {
            for x in 0..self.width {
                if let Some(cell) = self.cells[(y * self.width + x) as usize] {
                    patch.insert(x, y, cell);
                }
            }
        }
        patch
    }
}

fn fill_interior(stencil: &mut Stencil, mode: ShapeFillMode, fg: Cell, bg: Option<Cell>) {
    match mode {
        ShapeFillMode::Edge => {}
        ShapeFillMode::FillWithEdge => {
            if let Some(bg) = bg {
                stencil.fill_rows(bg, false);
            }
        }
        ShapeFillMode::Solid => stencil.fill_rows(fg, true),
    }
}

// ============================================================================
// RECTANGLE / DIAMOND / OVAL
// ============================================================================

pub fn rectangle(bounds: Region, fg: Cell, bg: Option<Cell>, mode: ShapeFillMode) -> Raster {
    if bounds.is_empty() {
        return Raster::Outline(SphereList::new());
    }
    let (w, h) = (bounds.width as i32, bounds.height as i32);

    match mode {
        ShapeFillMode::Edge => {
            // Local coordinates; the list carries the corner as its anchor.
            let mut list = SphereList::anchored(bounds.x, bounds.y);
            let corners = [
                ((0, 0), (w - 1, 0)),
                ((0, 0), (0, h - 1)),
                ((0, h - 1), (w - 1, h - 1)),
                ((w - 1, 0), (w - 1, h - 1)),
            ];
            for (from, to) in corners {
                for (px, py) in line(from.0, from.1, to.0, to.1) {
                    list.push_unique(px, py, fg);
                }
            }
            Raster::Outline(list)
        }
        ShapeFillMode::FillWithEdge => {
            let mut patch = Patch::new(bounds);
            for (dx, dy) in bounds.offsets() {
                let border = dx == 0 || dy == 0 || dx == w - 1 || dy == h - 1;
                if border {
                    patch.insert(dx, dy, fg);
                } else if let Some(bg) = bg {
                    patch.insert(dx, dy, bg);
                }
            }
            Raster::Area(patch)
        }
        ShapeFillMode::Solid => Raster::Area(Patch::filled(bounds, fg)),
    }
}

/// Corner points of the diamond in local coordinates, closed.
fn diamond_vertices(w: i32, h: i32) -> [(i32, i32); 5] {
    [
        (w / 2, 0),
        (w - 1, h / 2),
        (w / 2, h - 1),
        (0, h / 2),
        (w / 2, 0),
    ]
}

pub fn diamond(bounds: Region, fg: Cell, bg: Option<Cell>, mode: ShapeFillMode) -> Raster {
    if bounds.is_empty() {
        return Raster::Outline(SphereList::new());
    }
    let vertices = diamond_vertices(bounds.width as i32, bounds.height as i32);

    if mode == ShapeFillMode::Edge {
        let mut list = SphereList::anchored(bounds.x, bounds.y);
        for pair in vertices.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            for (x, y) in line(from.0, from.1, to.0, to.1) {
                list.push_unique(x, y, fg);
            }
        }
        return Raster::Outline(list);
    }

    let mut stencil = Stencil::new(bounds.width, bounds.height);
    for pair in vertices.windows(2) {
        stencil.draw_line(pair[0], pair[1], fg);
    }
    fill_interior(&mut stencil, mode, fg, bg);
    Raster::Area(stencil.into_patch(bounds))
}

/// Oval inscribed in `bounds`, always as an area patch.
pub fn oval(bounds: Region, fg: Cell, bg: Option<Cell>, mode: ShapeFillMode) -> Patch {
    if bounds.is_empty() {
        return Patch::new(bounds);
    }
    let w = bounds.width as f64;
    let h = bounds.height as f64;
    let mut stencil = Stencil::new(bounds.width, bounds.height);

    let mut a = 0.0_f64;
    while a < 2.0 * std::f64::consts::PI {
        let x = (a.cos() * (w / OVAL_RADIUS_DIV) + w / 2.0) as i32;
        let y = (a.sin() * (h / OVAL_RADIUS_DIV) + h / 2.0) as i32;
        stencil.set(x, y, fg);
        a += OVAL_STEP;
    }

    fill_interior(&mut stencil, mode, fg, bg);
    stencil.into_patch(bounds)
}
