//! Palette Explorer Library
//!
//! Core modules for the palette explorer: palette and template registries,
//! chart builders that emit Plotly figure descriptions, the patch engine for
//! incremental chart updates, and per-page selection state.

pub mod config;
pub mod dashboard;
pub mod pipeline;
pub mod plotly;
