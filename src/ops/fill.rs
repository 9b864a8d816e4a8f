use std::collections::VecDeque;

use crate::components::history::Patch;
use crate::error::EditError;
use crate::layout::{Cell, Layout, Region};

/// Replace the 4-connected region around `(x, y)` with `cell`.
///
/// Neighbors wrap around both edges. The result is a sparse patch anchored at
/// the origin with the extent of the whole grid; only cells of the region are
/// present. Fails with `NoOp` when the start cell already holds `cell`.
pub fn flood_fill(layout: &Layout, x: i32, y: i32, cell: Cell) -> Result<Patch, EditError> {
    let target = layout.get(x, y);
    if target == cell {
        return Err(EditError::NoOp);
    }

    let w = layout.width() as usize;
    let h = layout.height() as usize;
    let start = (layout.wrap_x(x) as i32, layout.wrap_y(y) as i32);

    let mut patch = Patch::new(Region::full(layout));
    let mut visited = vec![false; w * h];
    let mut queue = VecDeque::new();

    visited[start.1 as usize * w + start.0 as usize] = true;
    queue.push_back(start);

    while let Some((cx, cy)) = queue.pop_front() {
        patch.insert(cx, cy, cell);

        let neighbors = [(cx - 1, cy), (cx + 1, cy), (cx, cy - 1), (cx, cy + 1)];
        for (nx, ny) in neighbors {
            let nx = layout.wrap_x(nx) as i32;
            let ny = layout.wrap_y(ny) as i32;
            let idx = ny as usize * w + nx as usize;
            if !visited[idx] && layout.get(nx, ny) == target {
                visited[idx] = true;
                queue.push_back((nx, ny));
            }
        }
    }

    Ok(patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::SphereKind;

    #[test]
    fn fills_whole_empty_grid() {
        let layout = Layout::new(6, 5).unwrap();
        let patch = flood_fill(&layout, -2, 7, Cell::new(SphereKind::Blue)).unwrap();
        assert_eq!(patch.len(), 30);
        assert_eq!(patch.region(), Region::new(0, 0, 6, 5));
    }

    #[test]
    fn same_value_is_noop() {
        let layout = Layout::new(4, 4).unwrap();
        assert_eq!(flood_fill(&layout, 1, 1, Cell::EMPTY), Err(EditError::NoOp));
    }

    #[test]
    fn region_crosses_the_edge() {
        // Wall in column 2 splits a 5-wide ring; columns 3, 4, 0, 1 connect across x = 0.
        let mut layout = Layout::new(5, 3).unwrap();
        for y in 0..3 {
            layout.set(2, y, Cell::new(SphereKind::Red));
        }
        let patch = flood_fill(&layout, 0, 0, Cell::new(SphereKind::Blue)).unwrap();
        assert_eq!(patch.len(), 12);
        assert_eq!(patch.get(4, 1), Some(Cell::new(SphereKind::Blue)));
        assert_eq!(patch.get(2, 1), None);
    }

    #[test]
    fn marker_makes_a_different_value() {
        let mut layout = Layout::new(3, 1).unwrap();
        layout.set(1, 0, Cell::with_ring_marker(SphereKind::Empty));
        let patch = flood_fill(&layout, 0, 0, Cell::new(SphereKind::Pink)).unwrap();
        assert_eq!(patch.len(), 2);
        assert_eq!(patch.get(1, 0), None);
    }
}
