//! Plotly figure descriptions, their builders, and incremental patches

pub mod builders;
pub mod chart;
pub mod patch;

pub use chart::ChartDescription;
pub use patch::{apply, color_patch, compute_patch, FieldPath, Patch, PatchOp, PathSegment};
