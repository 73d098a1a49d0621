//! Polar charts: a bar polar colored along theta, and a row of polar
//! swatches showing every cyclical palette at once

use super::{layout_with, BuildInput, ChartBuilder, ChartKind, Role};
use crate::dashboard::colors::continuous_colorscale;
use crate::dashboard::error::Result;
use crate::dashboard::palettes::ColorScale;
use crate::plotly::chart::ChartDescription;
use serde_json::{json, Value};

#[derive(Debug, Clone, Default)]
pub struct BarPolarBuilder {
    pub title: Option<String>,
}

impl ChartBuilder for BarPolarBuilder {
    fn kind(&self) -> ChartKind {
        ChartKind::BarPolar
    }

    fn build(&self, input: &BuildInput) -> Result<ChartDescription> {
        let dataset = input.checked_dataset(&[Role::R, Role::Theta])?;
        let colorscale = continuous_colorscale(input.scale)?;
        let theta = dataset.json_values(input.column(Role::Theta)?)?;

        let trace = json!({
            "type": "barpolar",
            "r": dataset.json_values(input.column(Role::R)?)?,
            "theta": theta,
            "marker": {
                "color": theta,
                "colorscale": colorscale,
                "showscale": true,
                "colorbar": {"title": {"text": "degrees"}, "nticks": 4},
            },
            "hovertemplate": "Speed: %{r:.1f} km/h<br>Direction: %{theta:.1f}°",
        });

        let layout = layout_with(
            input.template,
            json!({
                "title": {"text": self.title, "x": 0.5, "font": {"size": 20}},
                "margin": {"l": 50, "t": 70, "r": 70, "b": 50},
                "height": 400,
            }),
        );

        Ok(ChartDescription::new(layout).with_trace(trace))
    }
}

/// One ring per palette, laid out as a single row of polar subplots
#[derive(Debug, Clone)]
pub struct PolarSwatchesBuilder {
    pub palettes: Vec<ColorScale>,
    /// Degrees between ring segments
    pub theta_step: usize,
    pub horizontal_spacing: f64,
    pub hole: f64,
}

impl PolarSwatchesBuilder {
    pub fn new(palettes: Vec<ColorScale>) -> Self {
        PolarSwatchesBuilder {
            palettes,
            theta_step: 5,
            horizontal_spacing: 0.02,
            hole: 0.4,
        }
    }

    /// Horizontal domain of subplot `i` out of `n`
    fn domain(&self, i: usize, n: usize) -> (f64, f64) {
        let width = (1.0 - self.horizontal_spacing * (n as f64 - 1.0)) / n as f64;
        let start = i as f64 * (width + self.horizontal_spacing);
        (start, start + width)
    }
}

impl ChartBuilder for PolarSwatchesBuilder {
    fn kind(&self) -> ChartKind {
        ChartKind::PolarSwatches
    }

    fn build(&self, input: &BuildInput) -> Result<ChartDescription> {
        let theta: Vec<usize> = (0..360).step_by(self.theta_step.max(1)).collect();
        let n = self.palettes.len();

        let mut layout = json!({
            "height": 220,
            "margin": {"l": 10, "t": 20, "r": 10, "b": 0},
            "showlegend": false,
            "modebar": {"orientation": "v"},
        });
        let mut annotations = Vec::with_capacity(n);
        let mut chart = ChartDescription::default();

        for (i, palette) in self.palettes.iter().enumerate() {
            let subplot = if i == 0 {
                "polar".to_string()
            } else {
                format!("polar{}", i + 1)
            };
            let (x0, x1) = self.domain(i, n);

            chart = chart.with_trace(json!({
                "type": "barpolar",
                "subplot": subplot,
                "r": vec![1; theta.len()],
                "theta": theta,
                "width": 5,
                "marker": {"color": theta, "colorscale": continuous_colorscale(palette)?},
                "name": palette.name,
                "hoverinfo": "skip",
            }));

            layout[subplot.as_str()] = json!({
                "domain": {"x": [x0, x1], "y": [0.0, 1.0]},
                "hole": self.hole,
                "radialaxis": {"visible": false},
                "angularaxis": {"visible": false, "rotation": 90, "direction": "clockwise"},
            });
            annotations.push(json!({
                "text": palette.name,
                "x": (x0 + x1) / 2.0,
                "y": 0.95,
                "xref": "paper",
                "yref": "paper",
                "xanchor": "center",
                "yanchor": "bottom",
                "showarrow": false,
            }));
        }
        layout["annotations"] = Value::Array(annotations);

        chart.layout = layout_with(input.template, layout);
        Ok(chart)
    }
}
