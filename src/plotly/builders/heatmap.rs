//! Heatmap of a long-form table pivoted into a matrix (mean per cell)

use super::{layout_with, BuildInput, ChartBuilder, ChartKind, Role};
use crate::dashboard::colors::continuous_colorscale;
use crate::dashboard::error::Result;
use crate::plotly::chart::ChartDescription;
use serde_json::{json, Value};

#[derive(Debug, Clone)]
pub struct HeatmapBuilder {
    /// Value placed at the middle of a diverging scale
    pub zmid: Option<f64>,
    /// Print cell values (`text` mirrors `z`)
    pub show_values: bool,
    /// Color with the template's sequential scale instead of the palette
    pub template_scale: bool,
    pub title: Option<String>,
    pub hovertemplate: String,
    pub tick_suffix: String,
    pub dtick: Option<f64>,
    pub height: u32,
}

impl Default for HeatmapBuilder {
    fn default() -> Self {
        HeatmapBuilder {
            zmid: None,
            show_values: false,
            template_scale: false,
            title: None,
            hovertemplate: "%{y}<br>%{x}<br>%{z}".to_string(),
            tick_suffix: String::new(),
            dtick: None,
            height: 550,
        }
    }
}

impl ChartBuilder for HeatmapBuilder {
    fn kind(&self) -> ChartKind {
        ChartKind::Heatmap
    }

    fn build(&self, input: &BuildInput) -> Result<ChartDescription> {
        let dataset = input.checked_dataset(&[Role::X, Role::Y, Role::Z])?;
        let grid = dataset.grid(
            input.column(Role::X)?,
            input.column(Role::Y)?,
            input.column(Role::Z)?,
        )?;
        let z = grid.z_json();

        let mut colorbar = json!({"ticksuffix": self.tick_suffix});
        if let Some(dtick) = self.dtick {
            colorbar["dtick"] = json!(dtick);
        }

        let mut trace = json!({
            "type": "heatmap",
            "name": "",
            "x": grid.x,
            "y": grid.y,
            "z": z,
            "xgap": 1,
            "ygap": 1,
            "text": if self.show_values { z.clone() } else { Value::Null },
            "texttemplate": "%{text:.1f}",
            "hovertemplate": self.hovertemplate,
            "colorbar": colorbar,
        });
        if !self.template_scale {
            trace["colorscale"] = continuous_colorscale(input.scale)?;
        }
        if let Some(mid) = self.zmid {
            trace["zmid"] = json!(mid);
        }

        let top = if self.title.is_some() { 100 } else { 40 };
        let layout = layout_with(
            input.template,
            json!({
                "title": {"text": self.title, "y": 0.95, "font": {"size": 18}},
                "xaxis": {"side": "top", "showgrid": false, "ticklabelstandoff": 5},
                "yaxis": {"autorange": "reversed", "showgrid": false, "ticklabelstandoff": 5},
                "height": self.height,
                "margin": {"l": 50, "t": top, "r": 10, "b": 20},
            }),
        );

        Ok(ChartDescription::new(layout).with_trace(trace))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::dataset::Dataset;
    use crate::plotly::builders::test_support::{scale, template};
    use crate::plotly::builders::Bindings;
    use polars::prelude::*;

    fn cpi() -> Dataset {
        let df = df! {
            "year" => ["2013", "2013", "2014", "2014"],
            "month" => ["Jan", "Feb", "Jan", "Feb"],
            "change" => [-2.5, 1.0, 3.5, -4.0]
        }
        .unwrap();
        Dataset::new("cpi", df)
    }

    fn bindings() -> Bindings {
        Bindings::new()
            .bind(Role::X, "month")
            .bind(Role::Y, "year")
            .bind(Role::Z, "change")
    }

    #[test]
    fn test_heatmap_pivot_and_midpoint() {
        let ds = cpi();
        let b = bindings();
        let s = scale(11);
        let input = BuildInput::new(Some(&ds), &b, &s, template("plotly"));
        let builder = HeatmapBuilder {
            zmid: Some(0.0),
            ..Default::default()
        };
        let chart = builder.build(&input).unwrap();
        let trace = &chart.data[0];

        assert_eq!(trace["x"], json!(["Jan", "Feb"]));
        assert_eq!(trace["y"], json!(["2013", "2014"]));
        assert_eq!(trace["z"], json!([[-2.5, 1], [3.5, -4]]));
        assert_eq!(trace["zmid"], 0.0);
        assert_eq!(trace["text"], Value::Null);
        assert_eq!(chart.layout["yaxis"]["autorange"], "reversed");
    }

    #[test]
    fn test_heatmap_values_and_template_scale() {
        let ds = cpi();
        let b = bindings();
        let s = scale(1);
        let input = BuildInput::new(Some(&ds), &b, &s, template("ggplot2"));
        let builder = HeatmapBuilder {
            show_values: true,
            template_scale: true,
            ..Default::default()
        };
        // a one-color palette is fine when the template colors the cells
        let chart = builder.build(&input).unwrap();
        let trace = &chart.data[0];
        assert_eq!(trace["text"], trace["z"]);
        assert!(trace.get("colorscale").is_none());
    }
}
