//! Palette registry for loading and accessing color scales
//!
//! Loads palettes from palettes.json (embedded at compile time) and provides
//! access by category and name. The registry is built once and is read-only
//! for the rest of the process lifetime.
//!
//! Palette categories:
//! - `cyclical`: Scales whose ends meet (angles, hours of the day)
//! - `diverging`: Gradient with a neutral midpoint (e.g., for +/- deviations)
//! - `qualitative`: Discrete colors for distinct categories
//! - `sequential`: Gradient from low to high values
//!
//! Every base scale `X` is accompanied by its reversal `X_r`.

use super::colors::parse_css_color;
use super::error::{DashboardError, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Embedded palettes.json content
const PALETTES_JSON: &str = include_str!("../../palettes.json");

/// Suffix Plotly uses for reversed scales
pub const REVERSED_SUFFIX: &str = "_r";

/// Categories searched by `find_continuous`, in lookup order
const CONTINUOUS: [PaletteCategory; 3] = [
    PaletteCategory::Sequential,
    PaletteCategory::Diverging,
    PaletteCategory::Cyclical,
];

/// Global palette registry, built on first access
static PALETTE_REGISTRY: Lazy<std::result::Result<PaletteRegistry, String>> =
    Lazy::new(|| PaletteRegistry::from_json(PALETTES_JSON).map_err(|e| e.to_string()));

/// Get the process-wide palette registry
///
/// Fails with a configuration error if the embedded palettes.json is invalid.
/// Call this once at startup so a broken palette file fails early.
pub fn palette_registry() -> Result<&'static PaletteRegistry> {
    PALETTE_REGISTRY
        .as_ref()
        .map_err(|e| DashboardError::Config(e.clone()))
}

/// Palette category as defined in palettes.json
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteCategory {
    Cyclical,
    Diverging,
    Qualitative,
    Sequential,
}

impl PaletteCategory {
    pub const ALL: [PaletteCategory; 4] = [
        PaletteCategory::Cyclical,
        PaletteCategory::Diverging,
        PaletteCategory::Qualitative,
        PaletteCategory::Sequential,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaletteCategory::Cyclical => "cyclical",
            PaletteCategory::Diverging => "diverging",
            PaletteCategory::Qualitative => "qualitative",
            PaletteCategory::Sequential => "sequential",
        }
    }
}

impl fmt::Display for PaletteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaletteCategory {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        PaletteCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DashboardError::not_found("palette category", s))
    }
}

/// A named, ordered list of colors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorScale {
    pub name: String,
    #[serde(rename = "type")]
    pub category: PaletteCategory,
    pub colors: Vec<String>,
}

impl ColorScale {
    pub fn new(name: impl Into<String>, category: PaletteCategory, colors: Vec<String>) -> Self {
        ColorScale {
            name: name.into(),
            category,
            colors,
        }
    }

    /// Get the number of colors in this scale
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Check if the scale is empty (never true for registry scales)
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// The `_r` variant of this scale
    pub fn reversed(&self) -> ColorScale {
        let name = match self.name.strip_suffix(REVERSED_SUFFIX) {
            Some(base) => base.to_string(),
            None => format!("{}{}", self.name, REVERSED_SUFFIX),
        };
        let mut colors = self.colors.clone();
        colors.reverse();
        ColorScale {
            name,
            category: self.category,
            colors,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(DashboardError::Config("palette with empty name".into()));
        }
        if self.colors.is_empty() {
            return Err(DashboardError::Config(format!(
                "palette '{}' has no colors",
                self.name
            )));
        }
        for color in &self.colors {
            if color.trim().is_empty() || parse_css_color(color).is_none() {
                return Err(DashboardError::Config(format!(
                    "palette '{}' has invalid color '{}'",
                    self.name, color
                )));
            }
        }
        Ok(())
    }
}

/// Registry of all available color scales
#[derive(Debug, Clone, Default)]
pub struct PaletteRegistry {
    /// All scales by (category, exact name)
    palettes: HashMap<(PaletteCategory, String), ColorScale>,
    /// Names per category, in registry order (for listing)
    names: HashMap<PaletteCategory, Vec<String>>,
}

impl PaletteRegistry {
    /// Load palettes from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let definitions: Vec<ColorScale> = serde_json::from_str(json)
            .map_err(|e| DashboardError::Config(format!("Failed to parse palettes JSON: {}", e)))?;
        Self::from_scales(definitions)
    }

    /// Build the registry from base scales, adding the reversed variants
    pub fn from_scales(definitions: Vec<ColorScale>) -> Result<Self> {
        let mut registry = Self::default();
        let mut seen = HashSet::new();

        for def in definitions {
            def.validate()?;
            if def.name.ends_with(REVERSED_SUFFIX) {
                return Err(DashboardError::Config(format!(
                    "palette '{}' must be listed without the '{}' suffix",
                    def.name, REVERSED_SUFFIX
                )));
            }
            if !seen.insert((def.category, def.name.clone())) {
                return Err(DashboardError::Config(format!(
                    "duplicate {} palette '{}'",
                    def.category, def.name
                )));
            }

            let reversed = def.reversed();
            for scale in [def, reversed] {
                registry
                    .names
                    .entry(scale.category)
                    .or_default()
                    .push(scale.name.clone());
                registry
                    .palettes
                    .insert((scale.category, scale.name.clone()), scale);
            }
        }

        log::debug!(
            "PaletteRegistry: Loaded {} scales ({} cyclical, {} diverging, {} qualitative, {} sequential)",
            registry.palettes.len(),
            registry.list(PaletteCategory::Cyclical).len(),
            registry.list(PaletteCategory::Diverging).len(),
            registry.list(PaletteCategory::Qualitative).len(),
            registry.list(PaletteCategory::Sequential).len(),
        );

        Ok(registry)
    }

    /// List palette names of a category, in registry order
    pub fn list(&self, category: PaletteCategory) -> &[String] {
        self.names
            .get(&category)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// List palette names of a category given by name
    pub fn list_palettes(&self, category: &str) -> Result<&[String]> {
        Ok(self.list(category.parse()?))
    }

    /// Get a scale by category and exact name
    pub fn get(&self, category: PaletteCategory, name: &str) -> Result<&ColorScale> {
        self.palettes
            .get(&(category, name.to_string()))
            .ok_or_else(|| DashboardError::not_found("palette", format!("{}.{}", category, name)))
    }

    /// Get a scale by category name and exact palette name
    pub fn get_palette(&self, category: &str, name: &str) -> Result<&ColorScale> {
        self.get(category.parse()?, name)
    }

    /// Find a continuous scale by case-insensitive name
    ///
    /// Searches sequential, then diverging, then cyclical scales. This is the
    /// lookup used by pages that accept any named continuous scale.
    pub fn find_continuous(&self, name: &str) -> Result<&ColorScale> {
        CONTINUOUS
            .into_iter()
            .flat_map(|category| {
                self.list(category)
                    .iter()
                    .filter(|n| n.eq_ignore_ascii_case(name))
                    .map(move |n| (category, n))
            })
            .next()
            .and_then(|(category, n)| self.palettes.get(&(category, n.clone())))
            .ok_or_else(|| DashboardError::not_found("continuous palette", name))
    }

    /// Lowercased names of every continuous base scale, without duplicates
    ///
    /// These are the names `find_continuous` accepts besides `_r` variants.
    pub fn named_colorscales(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        CONTINUOUS
            .into_iter()
            .flat_map(|category| self.list(category))
            .filter(|n| !n.ends_with(REVERSED_SUFFIX))
            .map(|n| n.to_lowercase())
            .filter(|n| seen.insert(n.clone()))
            .collect()
    }

    /// Total number of scales, reversed variants included
    pub fn len(&self) -> usize {
        self.palettes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.palettes.is_empty()
    }
}
