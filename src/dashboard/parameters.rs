//! Page definitions with parameter domains and defaults from pages.json
//!
//! This module parses pages.json at compile time to extract, per page, the
//! default palette and template and the adjustable parameters with their
//! domains and default values. Defaults are defined in ONE place (pages.json);
//! no fallback values are hardcoded elsewhere.

use super::error::{DashboardError, Result};
use super::palettes::{palette_registry, ColorScale, PaletteCategory};
use super::templates::template_registry;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// pages.json embedded at compile time
const PAGES_JSON: &str = include_str!("../../pages.json");

static PAGE_REGISTRY: Lazy<std::result::Result<PageRegistry, String>> =
    Lazy::new(|| PageRegistry::from_json(PAGES_JSON).map_err(|e| e.to_string()));

/// Get the process-wide page registry
pub fn page_registry() -> Result<&'static PageRegistry> {
    PAGE_REGISTRY
        .as_ref()
        .map_err(|e| DashboardError::Config(e.clone()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    Cyclical,
    Diverging,
    Qualitative,
    Sequential,
    Contour,
    Templates,
}

impl Page {
    pub const ALL: [Page; 6] = [
        Page::Cyclical,
        Page::Diverging,
        Page::Qualitative,
        Page::Sequential,
        Page::Contour,
        Page::Templates,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Page::Cyclical => "cyclical",
            Page::Diverging => "diverging",
            Page::Qualitative => "qualitative",
            Page::Sequential => "sequential",
            Page::Contour => "contour",
            Page::Templates => "templates",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Page {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        Page::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| DashboardError::not_found("page", s))
    }
}

/// Adjustable parameter names, as the UI sends them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParamName {
    Opacity,
    Hole,
    Transpose,
    Reversed,
    Interval,
    ColoringMethod,
    ShowValues,
    Range,
}

impl ParamName {
    pub const ALL: [ParamName; 8] = [
        ParamName::Opacity,
        ParamName::Hole,
        ParamName::Transpose,
        ParamName::Reversed,
        ParamName::Interval,
        ParamName::ColoringMethod,
        ParamName::ShowValues,
        ParamName::Range,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParamName::Opacity => "opacity",
            ParamName::Hole => "hole",
            ParamName::Transpose => "transpose",
            ParamName::Reversed => "reversed",
            ParamName::Interval => "interval",
            ParamName::ColoringMethod => "coloringMethod",
            ParamName::ShowValues => "showValues",
            ParamName::Range => "range",
        }
    }
}

impl fmt::Display for ParamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamName {
    type Err = DashboardError;

    /// Unknown names have no field mapping, hence `UnknownPatchTarget`
    fn from_str(s: &str) -> Result<Self> {
        ParamName::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| DashboardError::UnknownPatchTarget(s.to_string()))
    }
}

/// A parameter value as received from the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
    Range(u32, u32),
}

impl ParamValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integers, and numbers without a fractional part
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Integer(i) => Some(*i),
            ParamValue::Number(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Integer(i) => Some(*i as f64),
            ParamValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_range(&self) -> Option<(u32, u32)> {
        match self {
            ParamValue::Range(low, high) => Some((*low, *high)),
            _ => None,
        }
    }
}

/// The single control that fired for one UI event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub param: String,
    pub value: ParamValue,
}

impl Trigger {
    pub fn new(param: impl Into<String>, value: ParamValue) -> Self {
        Trigger {
            param: param.into(),
            value,
        }
    }
}

/// Contour coloring method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColoringMethod {
    #[default]
    Fill,
    Heatmap,
}

impl ColoringMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColoringMethod::Fill => "fill",
            ColoringMethod::Heatmap => "heatmap",
        }
    }
}

impl FromStr for ColoringMethod {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fill" => Ok(ColoringMethod::Fill),
            "heatmap" => Ok(ColoringMethod::Heatmap),
            other => Err(DashboardError::invalid_param(
                ParamName::ColoringMethod.as_str(),
                format!("'{}' is not one of fill, heatmap", other),
            )),
        }
    }
}

/// Active view of the templates page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateView {
    #[default]
    Colorway,
    Colorscale,
}

/// Which palettes a page offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum PaletteScope {
    Category(PaletteCategory),
    /// Any sequential, diverging or cyclical scale, matched case-insensitively
    Continuous,
}

impl TryFrom<String> for PaletteScope {
    type Error = DashboardError;

    fn try_from(value: String) -> Result<Self> {
        if value == "continuous" {
            return Ok(PaletteScope::Continuous);
        }
        Ok(PaletteScope::Category(value.parse()?))
    }
}

impl PaletteScope {
    pub fn resolve(&self, name: &str) -> Result<&'static ColorScale> {
        let registry = palette_registry()?;
        match self {
            PaletteScope::Category(category) => registry.get(*category, name),
            PaletteScope::Continuous => registry.find_continuous(name),
        }
    }
}

/// Declared domain of an adjustable parameter
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ParamDomain {
    Boolean,
    Integer {
        min: i64,
        max: i64,
    },
    Number {
        min: f64,
        max: f64,
        #[serde(default)]
        max_exclusive: bool,
        #[serde(default)]
        step: Option<f64>,
    },
    Enumerated {
        values: Vec<String>,
    },
    /// `[low, high]` color positions, 1-based and inclusive
    Range {
        min_span: u32,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParamDef {
    pub name: ParamName,
    pub domain: ParamDomain,
    pub default: ParamValue,
    /// Chart the parameter patches; none for state-only parameters
    #[serde(default)]
    pub chart: Option<String>,
}

impl ParamDef {
    /// Validate `value` against the domain and return its normalized form
    ///
    /// `palette_len` bounds range parameters.
    pub fn check(&self, value: &ParamValue, palette_len: Option<usize>) -> Result<ParamValue> {
        let name = self.name.as_str();
        match &self.domain {
            ParamDomain::Boolean => value
                .as_bool()
                .map(ParamValue::Bool)
                .ok_or_else(|| DashboardError::invalid_param(name, "expected a boolean")),

            ParamDomain::Integer { min, max } => {
                let v = value
                    .as_i64()
                    .ok_or_else(|| DashboardError::invalid_param(name, "expected an integer"))?;
                if v < *min || v > *max {
                    return Err(DashboardError::invalid_param(
                        name,
                        format!("{} is outside [{}, {}]", v, min, max),
                    ));
                }
                Ok(ParamValue::Integer(v))
            }

            ParamDomain::Number {
                min,
                max,
                max_exclusive,
                step,
            } => {
                let v = value
                    .as_f64()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| DashboardError::invalid_param(name, "expected a number"))?;
                let above_max = if *max_exclusive { v >= *max } else { v > *max };
                if v < *min || above_max {
                    let close = if *max_exclusive { ')' } else { ']' };
                    return Err(DashboardError::invalid_param(
                        name,
                        format!("{} is outside [{}, {}{}", v, min, max, close),
                    ));
                }
                if let Some(step) = step {
                    let k = (v - min) / step;
                    if (k - k.round()).abs() > 1e-9 {
                        return Err(DashboardError::invalid_param(
                            name,
                            format!("{} is not a multiple of {}", v, step),
                        ));
                    }
                }
                Ok(ParamValue::Number(v))
            }

            ParamDomain::Enumerated { values } => {
                let v = value
                    .as_str()
                    .ok_or_else(|| DashboardError::invalid_param(name, "expected a string"))?;
                if !values.iter().any(|allowed| allowed == v) {
                    return Err(DashboardError::invalid_param(
                        name,
                        format!("'{}' is not one of {}", v, values.join(", ")),
                    ));
                }
                Ok(ParamValue::Text(v.to_string()))
            }

            ParamDomain::Range { min_span } => {
                let (low, high) = value.as_range().ok_or_else(|| {
                    DashboardError::invalid_param(name, "expected [low, high]")
                })?;
                let len = palette_len.ok_or_else(|| {
                    DashboardError::invalid_param(name, "no palette to select colors from")
                })?;
                if low < 1 || low >= high || high as usize > len {
                    return Err(DashboardError::invalid_param(
                        name,
                        format!("[{}, {}] must satisfy 1 <= low < high <= {}", low, high, len),
                    ));
                }
                if high - low < *min_span {
                    return Err(DashboardError::invalid_param(
                        name,
                        format!("[{}, {}] spans less than {}", low, high, min_span),
                    ));
                }
                Ok(ParamValue::Range(low, high))
            }
        }
    }

    /// Default value, with ranges clamped to palettes shorter than the default
    pub fn default_for(&self, palette_len: Option<usize>) -> ParamValue {
        match (&self.domain, &self.default, palette_len) {
            (ParamDomain::Range { .. }, ParamValue::Range(low, high), Some(len)) => {
                let len = len as u32;
                ParamValue::Range((*low).min(len), (*high).min(len))
            }
            _ => self.default.clone(),
        }
    }
}

/// Defaults and adjustable parameters of one page
#[derive(Debug, Clone, Deserialize)]
pub struct PageConfig {
    pub page: Page,
    #[serde(default)]
    pub palettes: Option<PaletteScope>,
    /// Default palette
    #[serde(default)]
    pub palette: Option<String>,
    /// Default template
    pub template: String,
    /// Default view (templates page only)
    #[serde(default)]
    pub view: Option<TemplateView>,
    #[serde(default)]
    pub params: Vec<ParamDef>,
    /// Charts that receive user-chosen colors
    #[serde(default)]
    pub apply_colors: Vec<String>,
}

impl PageConfig {
    pub fn param(&self, name: ParamName) -> Option<&ParamDef> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Resolve a palette name among the palettes this page offers
    pub fn resolve_palette(&self, name: &str) -> Result<&'static ColorScale> {
        match &self.palettes {
            Some(scope) => scope.resolve(name),
            None => Err(DashboardError::invalid_param(
                "palette",
                format!("page '{}' has no palette selection", self.page),
            )),
        }
    }

    /// Default value of every adjustable parameter
    pub fn defaults(&self, palette_len: Option<usize>) -> BTreeMap<ParamName, ParamValue> {
        self.params
            .iter()
            .map(|p| (p.name, p.default_for(palette_len)))
            .collect()
    }

    fn validate(&self) -> Result<()> {
        template_registry()?.get_template(&self.template)?;

        let palette_len = match (&self.palettes, &self.palette) {
            (Some(_), Some(name)) => Some(self.resolve_palette(name)?.len()),
            (None, None) => None,
            _ => {
                return Err(DashboardError::Config(format!(
                    "page '{}' must declare both palettes and a default palette, or neither",
                    self.page
                )))
            }
        };

        for def in &self.params {
            def.check(&def.default_for(palette_len), palette_len)
                .map_err(|e| {
                    DashboardError::Config(format!(
                        "page '{}': bad default for '{}': {}",
                        self.page, def.name, e
                    ))
                })?;
        }
        Ok(())
    }
}

/// All page definitions from pages.json
#[derive(Debug, Clone)]
pub struct PageRegistry {
    pages: Vec<PageConfig>,
}

impl PageRegistry {
    /// Parse pages.json and check every default against the palette and
    /// template registries
    pub fn from_json(json: &str) -> Result<Self> {
        let pages: Vec<PageConfig> = serde_json::from_str(json)
            .map_err(|e| DashboardError::Config(format!("Failed to parse pages JSON: {}", e)))?;

        for (i, page) in pages.iter().enumerate() {
            if pages[..i].iter().any(|p| p.page == page.page) {
                return Err(DashboardError::Config(format!(
                    "duplicate page '{}'",
                    page.page
                )));
            }
            page.validate()?;
        }

        log::debug!("PageRegistry: Loaded {} pages", pages.len());
        Ok(Self { pages })
    }

    pub fn get(&self, page: Page) -> Result<&PageConfig> {
        self.pages
            .iter()
            .find(|p| p.page == page)
            .ok_or_else(|| DashboardError::not_found("page", page.as_str()))
    }

    pub fn pages(&self) -> &[PageConfig] {
        &self.pages
    }
}
