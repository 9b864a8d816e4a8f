use rayon::prelude::*;

use crate::components::history::Patch;
use crate::error::EditError;
use crate::layout::{Cell, Layout, Region, SphereKind};

/// Base kinds that "Mark Rings" acts on when the caller has no preference.
pub const DEFAULT_RING_BASES: [SphereKind; 2] = [SphereKind::Blue, SphereKind::Red];

/// Scan a region and build a sparse patch from a per-cell rule.
/// An empty selection covers the whole grid.
fn substitute<F>(layout: &Layout, selection: Region, rule: F) -> Result<Patch, EditError>
where
    F: Fn(Cell) -> Option<Cell> + Sync,
{
    let region = selection.or_full(layout);
    let offsets: Vec<(i32, i32)> = region.offsets().collect();
    let origin = (region.x, region.y);
    let changes: Vec<(i32, i32, Cell)> = offsets
        .par_iter()
        .filter_map(|&(dx, dy)| rule(layout.get_at(origin, (dx, dy))).map(|cell| (dx, dy, cell)))
        .collect();

    if changes.is_empty() {
        return Err(EditError::NoOp);
    }
    let mut patch = Patch::new(region);
    for (dx, dy, cell) in changes {
        patch.insert(dx, dy, cell);
    }
    Ok(patch)
}

/// Every cell exactly equal to `from` becomes `to`.
pub fn replace_color(
    layout: &Layout,
    selection: Region,
    from: Cell,
    to: Cell,
) -> Result<Patch, EditError> {
    if from == to {
        return Err(EditError::NoOp);
    }
    substitute(layout, selection, |cell| (cell == from).then_some(to))
}

/// Cells equal to `a` become `b` and the other way round, in one pass.
pub fn swap_colors(
    layout: &Layout,
    selection: Region,
    a: Cell,
    b: Cell,
) -> Result<Patch, EditError> {
    if a == b {
        return Err(EditError::NoOp);
    }
    substitute(layout, selection, |cell| {
        if cell == a {
            Some(b)
        } else if cell == b {
            Some(a)
        } else {
            None
        }
    })
}

/// Set the ring marker on unmarked cells whose kind is one of `bases`.
pub fn mark_rings(
    layout: &Layout,
    selection: Region,
    bases: &[SphereKind],
) -> Result<Patch, EditError> {
    substitute(layout, selection, |cell| {
        (!cell.ring_marker && bases.contains(&cell.kind)).then(|| cell.marked())
    })
}
