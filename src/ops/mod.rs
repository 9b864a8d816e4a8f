// ============================================================================
// OPS - pure functions that turn gestures into command payloads
// ============================================================================
//
//   shapes.rs     - line / rectangle / diamond / oval rasterizer
//   fill.rs       - wrap-aware flood fill
//   transform.rs  - flip and quarter-turn of a region
//   substitute.rs - replace / swap / mark-rings scans
//   clipboard.rs  - cut, copy, paste and the section library
// ============================================================================

pub mod clipboard;
pub mod fill;
pub mod shapes;
pub mod substitute;
pub mod transform;
