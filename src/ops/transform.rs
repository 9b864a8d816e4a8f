// ============================================================================
// REGION TRANSFORMS - flip / rotate a rectangular part of the layout in place
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::components::history::Command;
use crate::error::EditError;
use crate::layout::{Layout, Region};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlipAxis {
    Horizontal,
    Vertical,
}

/// Quarter turn direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Turn {
    Left,
    Right,
}

impl Turn {
    pub fn opposite(self) -> Self {
        match self {
            Turn::Left => Turn::Right,
            Turn::Right => Turn::Left,
        }
    }
}

/// Region size clipped to the grid so no cell is visited twice.
fn clipped_size(layout: &Layout, region: Region) -> (i32, i32) {
    (
        region.width.min(layout.width()) as i32,
        region.height.min(layout.height()) as i32,
    )
}

/// Mirror the region's columns (horizontal) or rows (vertical).
/// Values are read from a copy of the pre-flip layout.
pub fn flip(layout: &mut Layout, region: Region, axis: FlipAxis) {
    let copy = layout.clone();
    let origin = (region.x, region.y);
    let (w, h) = clipped_size(layout, region);
    for dy in 0..h {
        for dx in 0..w {
            let (sx, sy) = match axis {
                FlipAxis::Horizontal => (w - dx - 1, dy),
                FlipAxis::Vertical => (dx, h - dy - 1),
            };
            let cell = copy.get_at(origin, (sx, sy));
            layout.set_at(origin, (dx, dy), cell);
        }
    }
}

/// Quarter-turn a square region. A non-square region is treated as its
/// largest top-left square.
pub fn rotate(layout: &mut Layout, region: Region, turn: Turn) {
    let copy = layout.clone();
    let origin = (region.x, region.y);
    let (w, h) = clipped_size(layout, region);
    let side = w.min(h);
    for dy in 0..side {
        for dx in 0..side {
            let (tx, ty) = match turn {
                Turn::Right => (side - dy - 1, dx),
                Turn::Left => (dy, side - dx - 1),
            };
            let cell = copy.get_at(origin, (dx, dy));
            layout.set_at(origin, (tx, ty), cell);
        }
    }
}

/// Flip command for a selection; an empty selection means the whole grid.
pub fn flip_selection(layout: &Layout, selection: Region, axis: FlipAxis) -> Command {
    Command::flip(selection.or_full(layout), axis)
}

/// Rotate command for a selection; an empty selection means the whole grid,
/// which must then be square itself.
pub fn rotate_selection(
    layout: &Layout,
    selection: Region,
    turn: Turn,
) -> Result<Command, EditError> {
    Command::rotate(selection.or_full(layout), turn)
}
