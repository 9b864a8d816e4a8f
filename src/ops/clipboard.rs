// ============================================================================
// CLIPBOARD - in-process cut / copy / paste and the saved section library
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::components::history::Patch;
use crate::layout::{Cell, Layout, Region};

/// A dense, named rectangle of cells kept for pasting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    width: u16,
    height: u16,
    /// Row-major, `width * height` entries.
    cells: Vec<Cell>,
}

impl Section {
    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Cell at a local offset, tiling past the edges.
    pub fn get(&self, dx: i32, dy: i32) -> Cell {
        let x = dx.rem_euclid(self.width as i32) as usize;
        let y = dy.rem_euclid(self.height as i32) as usize;
        self.cells[y * self.width as usize + x]
    }

    /// Non-empty and with exactly `width * height` cells.
    pub fn is_well_formed(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.cells.len() == self.width as usize * self.height as usize
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Copy the selection (or the whole grid when empty) into a section.
pub fn copy_region(layout: &Layout, selection: Region) -> Section {
    let region = selection.or_full(layout);
    let cells = region
        .offsets()
        .map(|(dx, dy)| layout.get_at((region.x, region.y), (dx, dy)))
        .collect();
    Section {
        name: String::new(),
        width: region.width,
        height: region.height,
        cells,
    }
}

/// Copy of the selection plus the patch that clears it to empty cells.
pub fn cut_patch(layout: &Layout, selection: Region) -> (Section, Patch) {
    let region = selection.or_full(layout);
    (copy_region(layout, region), Patch::filled(region, Cell::EMPTY))
}

/// The whole section placed with its top-left corner at `at`.
pub fn paste_once(section: &Section, at: (i32, i32)) -> Patch {
    let region = Region::new(at.0, at.1, section.width, section.height);
    let mut patch = Patch::new(region);
    for (dx, dy) in region.offsets() {
        patch.insert(dx, dy, section.get(dx, dy));
    }
    patch
}

/// The section tiled over the selection (or the whole grid when empty).
pub fn paste_repeating(layout: &Layout, section: &Section, selection: Region) -> Patch {
    let region = selection.or_full(layout);
    let mut patch = Patch::new(region);
    for (dx, dy) in region.offsets() {
        patch.insert(dx, dy, section.get(dx, dy));
    }
    patch
}

// ============================================================================
// SECTION LIBRARY
// ============================================================================

/// Ordered list of saved sections, persisted as a `.sls` file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionLibrary {
    sections: Vec<Section>,
}

impl SectionLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sections(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Name offered for the next section, e.g. "Section 3".
    pub fn next_default_name(&self) -> String {
        format!("Section {}", self.sections.len() + 1)
    }

    /// Append a section; an unnamed one gets the default name. Returns its index.
    pub fn add(&mut self, mut section: Section) -> usize {
        if section.name.trim().is_empty() {
            section.name = self.next_default_name();
        }
        self.sections.push(section);
        self.sections.len() - 1
    }

    pub fn remove(&mut self, index: usize) -> Option<Section> {
        (index < self.sections.len()).then(|| self.sections.remove(index))
    }

    pub fn get(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    pub fn find(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.name.as_str()).collect()
    }
}
