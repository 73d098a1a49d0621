//! Pie chart of per-name sums with discrete slice colors

use super::{layout_with, BuildInput, ChartBuilder, ChartKind, Role};
use crate::dashboard::colors::discrete_colors;
use crate::dashboard::error::Result;
use crate::plotly::chart::ChartDescription;
use serde_json::json;

#[derive(Debug, Clone, Default)]
pub struct PieBuilder {
    /// Fraction of the radius cut out of the middle, in [0, 1)
    pub hole: f64,
    pub title: Option<String>,
}

impl ChartBuilder for PieBuilder {
    fn kind(&self) -> ChartKind {
        ChartKind::Pie
    }

    fn build(&self, input: &BuildInput) -> Result<ChartDescription> {
        let dataset = input.checked_dataset(&[Role::Names, Role::Values])?;
        let sums = dataset.sum_by(input.column(Role::Names)?, input.column(Role::Values)?)?;
        let colors = discrete_colors(input.scale, sums.len())?;

        let (labels, values): (Vec<String>, Vec<f64>) = sums.into_iter().unzip();
        let trace = json!({
            "type": "pie",
            "labels": labels,
            "values": values,
            "hole": self.hole,
            "marker": {"colors": colors},
            "textinfo": "percent+label",
        });

        let layout = layout_with(
            input.template,
            json!({
                "title": {"text": self.title, "font": {"size": 18}, "y": 0.95, "x": 0.5},
                "height": 400,
                "showlegend": false,
                "margin": {"l": 10, "t": 70, "r": 10, "b": 30},
            }),
        );

        Ok(ChartDescription::new(layout).with_trace(trace))
    }
}
