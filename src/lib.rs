//! Editing engine for toroidal bonus-stage sphere layouts.
//!
//! The [`layout::Layout`] grid wraps on both axes. Edits are computed by the
//! pure functions in [`ops`], wrapped in self-inverting
//! [`components::history::Command`]s and applied through the
//! [`components::history::HistoryManager`], which owns the grid.
//! [`project::Session`] adds the brush, selection, clipboard and the
//! one-gesture-at-a-time gate on top.

#[macro_use]
pub mod logger;
pub mod cli;
pub mod components;
pub mod error;
pub mod io;
pub mod layout;
pub mod ops;
pub mod project;
pub mod settings;
