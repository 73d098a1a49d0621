//! Swatch bars: one bar per color of a palette, or of a template's defaults

use super::{layout_with, BuildInput, ChartBuilder, ChartKind};
use crate::dashboard::colors::normalized_stops;
use crate::dashboard::error::{DashboardError, Result};
use crate::plotly::chart::ChartDescription;
use serde_json::json;

/// What the bars show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwatchSource {
    /// Selected palette, bars side by side
    PaletteVertical,
    /// Selected palette, bars stacked top to bottom
    PaletteHorizontal,
    /// Template's default discrete colors
    TemplateColorway,
    /// Template's default sequential colorscale
    TemplateColorscale,
}

#[derive(Debug, Clone)]
pub struct SwatchBarBuilder {
    pub source: SwatchSource,
}

impl SwatchBarBuilder {
    pub fn new(source: SwatchSource) -> Self {
        SwatchBarBuilder { source }
    }

    fn palette_bars(&self, input: &BuildInput) -> Result<ChartDescription> {
        let scale = input.scale;
        let n = scale.len();
        if n == 0 {
            return Err(DashboardError::PaletteMismatch {
                palette: scale.name.clone(),
                required: 1,
                available: 0,
            });
        }
        let bg = &input.template.background;

        let (trace, extra) = match self.source {
            SwatchSource::PaletteHorizontal => (
                json!({
                    "type": "bar",
                    "orientation": "h",
                    "x": vec![1; n],
                    "y": (0..n).collect::<Vec<_>>(),
                    "customdata": scale.colors,
                    "hovertemplate": "Color: %{customdata}<extra></extra>",
                    "marker": {"color": scale.colors},
                }),
                json!({
                    "modebar": {"orientation": "v"},
                    "height": 60 + 50 * n,
                    "margin": {"l": 30, "t": 50, "r": 30, "b": 10},
                    "title": {"text": format!("<b>{} <br><sub> {} colors", scale.name, n), "x": 0.07},
                    "yaxis": {"visible": false, "showgrid": false},
                    "xaxis": {"visible": false, "showgrid": false, "range": [0, 1]},
                }),
            ),
            _ => (
                json!({
                    "type": "bar",
                    "name": "",
                    "x": (1..=n).collect::<Vec<_>>(),
                    "y": vec![1; n],
                    "customdata": scale.colors,
                    "hovertemplate": "Number: %{x}<br>Color: %{customdata}",
                    "marker": {"color": scale.colors},
                }),
                json!({
                    "height": 80,
                    "margin": {"l": 10, "t": 40, "r": 10, "b": 10},
                    "title": {"text": format!("<b>{} Colorscale - {} colors", scale.name, n), "x": 0.03},
                    "plot_bgcolor": bg,
                    "yaxis": {"visible": false, "showgrid": false},
                    "xaxis": {"visible": false, "showgrid": false},
                }),
            ),
        };

        Ok(ChartDescription::new(layout_with(input.template, extra)).with_trace(trace))
    }

    fn template_bars(&self, input: &BuildInput) -> Result<ChartDescription> {
        let template = input.template;
        let (colors, title) = match self.source {
            SwatchSource::TemplateColorway => {
                (&template.colorway, format!("{} colorway", template.name))
            }
            _ => (
                &template.sequential,
                format!("{} sequential colorscale", template.name),
            ),
        };
        let n = colors.len();
        let index: Vec<usize> = (0..n).collect();

        let trace = json!({
            "type": "bar",
            "name": template.name,
            "x": index,
            "y": vec![1; n],
            "customdata": colors,
            "hovertemplate": "Index: %{x}<br>Color: %{customdata}<extra></extra>",
            "marker": {
                "color": index,
                "colorscale": normalized_stops(colors),
                "showscale": false,
            },
        });

        let layout = layout_with(
            template,
            json!({
                "title": {"text": title, "y": 0.93},
                "height": 100,
                "bargap": 0,
                "margin": {"l": 10, "t": 20, "r": 10, "b": 0},
                "plot_bgcolor": template.plot_background,
                "paper_bgcolor": template.plot_background,
                "yaxis": {"visible": false, "showgrid": false, "range": [-0.5, 1.5]},
                "xaxis": {"visible": false, "showgrid": false},
            }),
        );

        Ok(ChartDescription::new(layout).with_trace(trace))
    }
}

impl ChartBuilder for SwatchBarBuilder {
    fn kind(&self) -> ChartKind {
        ChartKind::SwatchBar
    }

    fn build(&self, input: &BuildInput) -> Result<ChartDescription> {
        match self.source {
            SwatchSource::PaletteVertical | SwatchSource::PaletteHorizontal => {
                self.palette_bars(input)
            }
            SwatchSource::TemplateColorway | SwatchSource::TemplateColorscale => {
                self.template_bars(input)
            }
        }
    }
}
