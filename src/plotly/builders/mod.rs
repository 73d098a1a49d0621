//! Chart builders
//!
//! One builder per chart kind. A builder is a pure function of a dataset, its
//! column bindings, a color scale and a template (plus the builder's own
//! parameters, carried as struct fields) to a self-contained
//! `ChartDescription`.

pub mod area;
pub mod box_plot;
pub mod choropleth;
pub mod contour;
pub mod heatmap;
pub mod pie;
pub mod polar;
pub mod scatter;
pub mod swatch;
pub mod treemap;

use super::chart::ChartDescription;
use crate::dashboard::dataset::Dataset;
use crate::dashboard::error::{DashboardError, Result};
use crate::dashboard::palettes::ColorScale;
use crate::dashboard::templates::Template;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;

pub use area::AreaGradientBuilder;
pub use box_plot::BoxPlotBuilder;
pub use choropleth::ChoroplethBuilder;
pub use contour::ContourBuilder;
pub use heatmap::HeatmapBuilder;
pub use pie::PieBuilder;
pub use polar::{BarPolarBuilder, PolarSwatchesBuilder};
pub use scatter::{ScatterBuilder, ScatterByCategoryBuilder};
pub use swatch::{SwatchBarBuilder, SwatchSource};
pub use treemap::TreemapBuilder;

/// Role a dataset column plays in a chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    X,
    Y,
    Z,
    Color,
    Size,
    Names,
    Values,
    Locations,
    Label,
    Parent,
    R,
    Theta,
    Hover,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Column bound to each role
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings(BTreeMap<Role, String>);

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, role: Role, column: impl Into<String>) -> Self {
        self.0.insert(role, column.into());
        self
    }

    pub fn get(&self, role: Role) -> Option<&str> {
        self.0.get(&role).map(|c| c.as_str())
    }

    pub fn require(&self, role: Role) -> Result<&str> {
        self.get(role).ok_or_else(|| {
            DashboardError::invalid_param("bindings", format!("no column bound to role {}", role))
        })
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.values().map(|c| c.as_str())
    }
}

/// Kinds of chart the builders produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Scatter,
    ScatterByCategory,
    AreaGradient,
    Treemap,
    Choropleth,
    Heatmap,
    Pie,
    BarPolar,
    PolarSwatches,
    Contour,
    BoxPlot,
    SwatchBar,
}

/// Everything a builder reads
pub struct BuildInput<'a> {
    /// None for charts drawn from colors alone (swatches)
    pub dataset: Option<&'a Dataset>,
    pub bindings: &'a Bindings,
    pub scale: &'a ColorScale,
    pub template: &'a Template,
}

impl<'a> BuildInput<'a> {
    pub fn new(
        dataset: Option<&'a Dataset>,
        bindings: &'a Bindings,
        scale: &'a ColorScale,
        template: &'a Template,
    ) -> Self {
        BuildInput {
            dataset,
            bindings,
            scale,
            template,
        }
    }

    /// The dataset, after checking required roles are bound and every bound
    /// column exists
    pub fn checked_dataset(&self, required: &[Role]) -> Result<&'a Dataset> {
        let dataset = self.dataset.ok_or_else(|| {
            DashboardError::invalid_param("dataset", "chart needs a dataset")
        })?;
        for role in required {
            self.bindings.require(*role)?;
        }
        dataset.require_columns(self.bindings.columns())?;
        Ok(dataset)
    }

    pub fn column(&self, role: Role) -> Result<&'a str> {
        self.bindings.require(role)
    }
}

pub trait ChartBuilder {
    fn kind(&self) -> ChartKind;

    fn build(&self, input: &BuildInput) -> Result<ChartDescription>;
}

/// Layout carrying the template inline, merged with chart-specific fields
pub(crate) fn layout_with(template: &Template, extra: Value) -> Value {
    let mut layout = json!({
        "template": template.to_layout_template(),
        "paper_bgcolor": template.background,
    });
    merge(&mut layout, extra);
    layout
}

/// Recursively merge `extra` into `base`; objects merge, other values replace
pub(crate) fn merge(base: &mut Value, extra: Value) {
    match (base, extra) {
        (Value::Object(base), Value::Object(extra)) => {
            for (key, value) in extra {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, extra) => *base = extra,
    }
}

/// Plotly express marker sizing: area mode, largest marker `size_max` px
pub(crate) fn size_reference(sizes: &[f64], size_max: f64) -> f64 {
    let max = sizes
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);
    if max <= 0.0 {
        return 1.0;
    }
    2.0 * max / (size_max * size_max)
}
