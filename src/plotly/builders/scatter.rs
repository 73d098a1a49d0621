//! Scatter plots: continuous color, or one trace per category

use super::{layout_with, size_reference, BuildInput, ChartBuilder, ChartKind, Role};
use crate::dashboard::colors::{continuous_colorscale, discrete_colors};
use crate::dashboard::error::Result;
use crate::plotly::chart::ChartDescription;
use serde_json::{json, Value};

/// Markers colored along a continuous scale and sized by a column
#[derive(Debug, Clone)]
pub struct ScatterBuilder {
    pub size_max: f64,
    pub show_scale: bool,
    pub title: Option<String>,
    pub hovertemplate: Option<String>,
    /// Extra layout fields (axis titles, ranges)
    pub layout: Value,
}

impl Default for ScatterBuilder {
    fn default() -> Self {
        ScatterBuilder {
            size_max: 15.0,
            show_scale: false,
            title: None,
            hovertemplate: None,
            layout: json!({}),
        }
    }
}

impl ChartBuilder for ScatterBuilder {
    fn kind(&self) -> ChartKind {
        ChartKind::Scatter
    }

    fn build(&self, input: &BuildInput) -> Result<ChartDescription> {
        let dataset = input.checked_dataset(&[Role::X, Role::Y, Role::Color, Role::Size])?;
        let colorscale = continuous_colorscale(input.scale)?;

        let sizes = dataset.f64_values_or_nan(input.column(Role::Size)?)?;
        let mut trace = json!({
            "type": "scatter",
            "mode": "markers",
            "x": dataset.json_values(input.column(Role::X)?)?,
            "y": dataset.json_values(input.column(Role::Y)?)?,
            "marker": {
                "color": dataset.json_values(input.column(Role::Color)?)?,
                "colorscale": colorscale,
                "showscale": self.show_scale,
                "size": dataset.json_values(input.column(Role::Size)?)?,
                "sizemode": "area",
                "sizeref": size_reference(&sizes, self.size_max),
            },
        });
        if let Some(hover) = &self.hovertemplate {
            trace["hovertemplate"] = json!(hover);
        }

        let (height, top) = match self.title {
            Some(_) => (400, 70),
            None => (350, 20),
        };
        let mut extra = json!({
            "height": height,
            "margin": {"l": 20, "t": top, "r": 20, "b": 20},
        });
        if let Some(title) = &self.title {
            extra["title"] = json!({"text": title, "x": 0.5, "font": {"size": 20}});
        }
        super::merge(&mut extra, self.layout.clone());

        Ok(ChartDescription::new(layout_with(input.template, extra)).with_trace(trace))
    }
}

/// One marker trace per category with discrete colors
#[derive(Debug, Clone)]
pub struct ScatterByCategoryBuilder {
    pub size_max: f64,
    pub opacity: f64,
    /// Categories to list first, in this order
    pub category_order: Option<Vec<String>>,
    pub title: Option<String>,
}

impl Default for ScatterByCategoryBuilder {
    fn default() -> Self {
        ScatterByCategoryBuilder {
            size_max: 13.0,
            opacity: 1.0,
            category_order: None,
            title: None,
        }
    }
}

impl ChartBuilder for ScatterByCategoryBuilder {
    fn kind(&self) -> ChartKind {
        ChartKind::ScatterByCategory
    }

    fn build(&self, input: &BuildInput) -> Result<ChartDescription> {
        let dataset = input.checked_dataset(&[Role::X, Role::Y, Role::Color])?;
        let color_col = input.column(Role::Color)?;

        let categories = dataset.categories(color_col, self.category_order.as_deref())?;
        let colors = discrete_colors(input.scale, categories.len())?;

        let keys = dataset.string_values(color_col)?;
        let xs = dataset.json_values(input.column(Role::X)?)?;
        let ys = dataset.json_values(input.column(Role::Y)?)?;
        let sizes = match input.bindings.get(Role::Size) {
            Some(col) => Some(dataset.json_values(col)?),
            None => None,
        };
        let sizeref = match input.bindings.get(Role::Size) {
            Some(col) => size_reference(&dataset.f64_values_or_nan(col)?, self.size_max),
            None => 1.0,
        };

        let mut chart = ChartDescription::new(Value::Null);
        for (category, color) in categories.iter().zip(&colors) {
            let rows: Vec<usize> = keys
                .iter()
                .enumerate()
                .filter(|(_, k)| *k == category)
                .map(|(i, _)| i)
                .collect();
            let pick = |values: &[Value]| -> Vec<Value> {
                rows.iter().map(|&i| values[i].clone()).collect()
            };

            let mut marker = json!({"color": color});
            if let Some(sizes) = &sizes {
                marker["size"] = json!(pick(sizes));
                marker["sizemode"] = json!("area");
                marker["sizeref"] = json!(sizeref);
            }

            chart = chart.with_trace(json!({
                "type": "scatter",
                "mode": "markers",
                "name": category,
                "legendgroup": category,
                "x": pick(&xs),
                "y": pick(&ys),
                "opacity": self.opacity,
                "marker": marker,
            }));
        }

        let mut extra = json!({
            "height": 400,
            "margin": {"l": 20, "t": 70, "r": 20, "b": 20},
            "modebar": {"orientation": "v"},
            "legend": {"orientation": "h", "y": 1.15, "x": 0.55, "title": {"text": null}},
        });
        if let Some(title) = &self.title {
            extra["title"] = json!({"text": title, "font": {"size": 18}, "y": 0.95, "x": 0.05});
        }
        chart.layout = layout_with(input.template, extra);

        log::debug!(
            "ScatterByCategoryBuilder: {} categories, {} colors in '{}'",
            categories.len(),
            input.scale.len(),
            input.scale.name
        );
        Ok(chart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::dataset::Dataset;
    use crate::dashboard::error::DashboardError;
    use crate::plotly::builders::test_support::{scale, template};
    use crate::plotly::builders::Bindings;
    use polars::prelude::*;

    fn tips() -> Dataset {
        let df = df! {
            "total_bill" => [10.0, 20.0, 30.0, 40.0, 50.0],
            "tip" => [1.0, 2.0, 3.0, 4.0, 5.0],
            "day" => ["Sun", "Sat", "Sun", "Thur", "Fri"]
        }
        .unwrap();
        Dataset::new("tips", df)
    }

    #[test]
    fn test_scatter_continuous() {
        let ds = tips();
        let b = Bindings::new()
            .bind(Role::X, "total_bill")
            .bind(Role::Y, "tip")
            .bind(Role::Color, "tip")
            .bind(Role::Size, "total_bill");
        let s = scale(4);
        let input = BuildInput::new(Some(&ds), &b, &s, template("plotly"));
        let chart = ScatterBuilder::default().build(&input).unwrap();

        assert_eq!(chart.trace_count(), 1);
        let marker = &chart.data[0]["marker"];
        assert_eq!(marker["color"], json!([1, 2, 3, 4, 5]));
        assert_eq!(marker["colorscale"][3][0], 1.0);
        assert_eq!(marker["showscale"], false);
        assert_eq!(chart.layout["paper_bgcolor"], "#E5ECF6");
    }

    #[test]
    fn test_scatter_by_category_order_and_colors() {
        let ds = tips();
        let b = Bindings::new()
            .bind(Role::X, "total_bill")
            .bind(Role::Y, "tip")
            .bind(Role::Color, "day")
            .bind(Role::Size, "tip");
        let s = scale(3);
        let input = BuildInput::new(Some(&ds), &b, &s, template("plotly"));
        let builder = ScatterByCategoryBuilder {
            category_order: Some(vec!["Sat".into(), "Sun".into(), "Thur".into(), "Fri".into()]),
            ..Default::default()
        };
        let chart = builder.build(&input).unwrap();

        let names: Vec<&str> = chart.data.iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["Sat", "Sun", "Thur", "Fri"]);
        // four categories over three colors: the fourth wraps to the first
        assert_eq!(chart.data[3]["marker"]["color"], s.colors[0].as_str());
        assert_eq!(chart.data[1]["x"], json!([10, 30]));
        assert_eq!(chart.data[0]["opacity"], 1.0);
    }

    #[test]
    fn test_scatter_by_category_empty_scale() {
        let ds = tips();
        let b = Bindings::new()
            .bind(Role::X, "total_bill")
            .bind(Role::Y, "tip")
            .bind(Role::Color, "day");
        let s = scale(0);
        let input = BuildInput::new(Some(&ds), &b, &s, template("plotly"));
        assert!(matches!(
            ScatterByCategoryBuilder::default().build(&input),
            Err(DashboardError::PaletteMismatch { .. })
        ));
    }
}
