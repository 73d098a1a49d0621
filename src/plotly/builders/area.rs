//! Line with a vertical gradient fill down to zero

use super::{layout_with, BuildInput, ChartBuilder, ChartKind, Role};
use crate::dashboard::colors::continuous_colorscale;
use crate::dashboard::error::Result;
use crate::plotly::chart::ChartDescription;
use serde_json::json;

#[derive(Debug, Clone, Default)]
pub struct AreaGradientBuilder;

impl ChartBuilder for AreaGradientBuilder {
    fn kind(&self) -> ChartKind {
        ChartKind::AreaGradient
    }

    fn build(&self, input: &BuildInput) -> Result<ChartDescription> {
        let dataset = input.checked_dataset(&[Role::X, Role::Y])?;
        let colorscale = continuous_colorscale(input.scale)?;
        let y_col = input.column(Role::Y)?;
        let company = vec![y_col; dataset.nrow()];

        let trace = json!({
            "type": "scatter",
            "name": "",
            "x": dataset.json_values(input.column(Role::X)?)?,
            "y": dataset.json_values(y_col)?,
            "customdata": company,
            "hovertemplate": "Company: %{customdata}<br>%{x}<br>Stock price: %{y:.2f}",
            "mode": "lines",
            "fill": "tozeroy",
            "line": {"color": input.scale.colors[0], "width": 1.5},
            "fillgradient": {"type": "vertical", "colorscale": colorscale},
        });

        let layout = layout_with(
            input.template,
            json!({
                "height": 350,
                "margin": {"l": 20, "t": 20, "r": 20, "b": 20},
                "xaxis": {"ticklabelposition": "outside right"},
            }),
        );

        Ok(ChartDescription::new(layout).with_trace(trace))
    }
}
