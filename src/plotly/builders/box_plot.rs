//! Box plot with one box per category, colored by the template colorway

use super::{layout_with, BuildInput, ChartBuilder, ChartKind, Role};
use crate::dashboard::colors::cycle_colors;
use crate::dashboard::error::Result;
use crate::plotly::chart::ChartDescription;
use serde_json::json;

#[derive(Debug, Clone, Default)]
pub struct BoxPlotBuilder {
    pub category_order: Option<Vec<String>>,
    pub title: Option<String>,
    pub tick_suffix: String,
    /// Source credit shown above the plot area
    pub source_note: Option<String>,
}

impl ChartBuilder for BoxPlotBuilder {
    fn kind(&self) -> ChartKind {
        ChartKind::BoxPlot
    }

    fn build(&self, input: &BuildInput) -> Result<ChartDescription> {
        let dataset = input.checked_dataset(&[Role::X, Role::Y])?;
        let x_col = input.column(Role::X)?;

        let categories = dataset.categories(x_col, self.category_order.as_deref())?;
        let colors = cycle_colors(&input.template.colorway, categories.len());
        let keys = dataset.string_values(x_col)?;
        let values = dataset.json_values(input.column(Role::Y)?)?;

        let mut chart = ChartDescription::default();
        for (category, color) in categories.iter().zip(&colors) {
            let ys: Vec<_> = keys
                .iter()
                .zip(&values)
                .filter(|(k, _)| *k == category)
                .map(|(_, v)| v.clone())
                .collect();
            chart = chart.with_trace(json!({
                "type": "box",
                "name": category,
                "x": vec![category; ys.len()],
                "y": ys,
                "marker": {"color": color},
            }));
        }

        let mut extra = json!({
            "title": {"text": self.title},
            "margin": {"l": 10, "t": 40, "r": 10, "b": 20},
            "height": 400,
            "showlegend": false,
            "modebar": {"orientation": "v"},
            "yaxis": {"ticksuffix": self.tick_suffix, "title": {"text": null}},
            "xaxis": {"title": {"text": null}},
        });
        if let Some(note) = &self.source_note {
            extra["annotations"] = json!([{
                "x": 0.9,
                "y": 1.05,
                "font": {"size": 12},
                "text": note,
                "xref": "paper",
                "yref": "paper",
                "xanchor": "center",
                "yanchor": "bottom",
                "showarrow": false,
            }]);
        }
        chart.layout = layout_with(input.template, extra);

        Ok(chart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::dataset::Dataset;
    use crate::plotly::builders::test_support::{scale, template};
    use crate::plotly::builders::Bindings;
    use polars::prelude::*;

    #[test]
    fn test_box_per_category_with_template_colors() {
        let df = df! {
            "month" => ["Feb", "Jan", "Feb", "Jan"],
            "tmax" => [8.0, 5.0, 9.5, 6.0]
        }
        .unwrap();
        let ds = Dataset::new("weather", df);
        let b = Bindings::new().bind(Role::X, "month").bind(Role::Y, "tmax");
        let s = scale(2);
        let t = template("ggplot2");
        let input = BuildInput::new(Some(&ds), &b, &s, t);
        let builder = BoxPlotBuilder {
            category_order: Some(vec!["Jan".into(), "Feb".into()]),
            ..Default::default()
        };
        let chart = builder.build(&input).unwrap();

        assert_eq!(chart.trace_count(), 2);
        assert_eq!(chart.data[0]["name"], "Jan");
        assert_eq!(chart.data[0]["y"], json!([5, 6]));
        assert_eq!(chart.data[0]["marker"]["color"], t.colorway[0].as_str());
        assert_eq!(chart.data[1]["marker"]["color"], t.colorway[1].as_str());
    }
}
