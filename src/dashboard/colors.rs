//! Color handling shared by the registries and the chart builders
//!
//! This module provides:
//! - CSS color parsing (`#RRGGBB`, `#RGB`, `rgb(r, g, b)`, a few names), used
//!   to validate palette and template files
//! - The discrete color policy: cycle when a scale has fewer colors than
//!   categories, truncate when it has more
//! - Plotly's normalized continuous colorscale form `[[0.0, c0], ..., [1.0, cN]]`

use super::error::{DashboardError, Result};
use super::palettes::ColorScale;
use serde_json::{json, Value};

/// Parse a CSS color string to an RGB array
///
/// Supports formats:
/// - `#RRGGBB` and `#RRGGBBAA` (alpha ignored)
/// - `#RGB`
/// - `rgb(r, g, b)` and `rgba(r, g, b, a)` (alpha ignored)
/// - `white`, `black`
pub fn parse_css_color(color: &str) -> Option<[u8; 3]> {
    let color = color.trim();

    if let Some(hex) = color.strip_prefix('#') {
        return parse_hex(hex);
    }

    let lower = color.to_ascii_lowercase();
    if let Some(args) = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))
    {
        let args = args.strip_suffix(')')?;
        let parts: Vec<&str> = args.split(',').map(|p| p.trim()).collect();
        if parts.len() != 3 && parts.len() != 4 {
            return None;
        }
        let r = parts[0].parse::<u8>().ok()?;
        let g = parts[1].parse::<u8>().ok()?;
        let b = parts[2].parse::<u8>().ok()?;
        return Some([r, g, b]);
    }

    match lower.as_str() {
        "white" => Some([255, 255, 255]),
        "black" => Some([0, 0, 0]),
        _ => None,
    }
}

fn parse_hex(hex: &str) -> Option<[u8; 3]> {
    match hex.len() {
        6 | 8 => {
            let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
            let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
            let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
            Some([r, g, b])
        }
        3 => {
            let mut rgb = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                rgb[i] = v * 17;
            }
            Some(rgb)
        }
        _ => None,
    }
}

/// Resolve `n` discrete colors from a scale
///
/// Category `i` receives `scale[i % len]`: the scale cycles when it has fewer
/// colors than categories and is truncated when it has more.
pub fn discrete_colors(scale: &ColorScale, n: usize) -> Result<Vec<String>> {
    if scale.is_empty() {
        return Err(DashboardError::PaletteMismatch {
            palette: scale.name.clone(),
            required: 1,
            available: 0,
        });
    }
    Ok((0..n)
        .map(|i| scale.colors[i % scale.colors.len()].clone())
        .collect())
}

/// Same policy as `discrete_colors`, for a plain color list
pub fn cycle_colors(colors: &[String], n: usize) -> Vec<String> {
    if colors.is_empty() {
        return Vec::new();
    }
    (0..n).map(|i| colors[i % colors.len()].clone()).collect()
}

/// Build Plotly's normalized colorscale from a scale's colors
///
/// Requires at least two colors: a continuous scale needs two ends.
pub fn continuous_colorscale(scale: &ColorScale) -> Result<Value> {
    if scale.len() < 2 {
        return Err(DashboardError::PaletteMismatch {
            palette: scale.name.clone(),
            required: 2,
            available: scale.len(),
        });
    }
    Ok(normalized_stops(&scale.colors))
}

/// `[[0.0, c0], [1/(n-1), c1], ..., [1.0, cN]]` for a list of at least 2 colors
pub(crate) fn normalized_stops(colors: &[String]) -> Value {
    let last = colors.len().saturating_sub(1).max(1) as f64;
    Value::Array(
        colors
            .iter()
            .enumerate()
            .map(|(i, c)| json!([i as f64 / last, c]))
            .collect(),
    )
}
