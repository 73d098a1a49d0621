//! Contour of a long-form table pivoted into a matrix
//!
//! Missing cells are filled with their column mean. The adjustable fields
//! (interval, coloring, reversal, transpose) are the ones the patch engine
//! targets, so both share the axis titles and hover templates below.

use super::{layout_with, BuildInput, ChartBuilder, ChartKind, Role};
use crate::dashboard::colors::continuous_colorscale;
use crate::dashboard::error::{DashboardError, Result};
use crate::dashboard::parameters::ColoringMethod;
use crate::plotly::chart::ChartDescription;
use serde_json::json;

const HOVER_DAY_MONTH: &str =
    "Day: %{y}<br>Month: %{x}<br>Temperature: %{z:.1f}°C<extra></extra>";
const HOVER_MONTH_DAY: &str =
    "Month: %{y}<br>Day: %{x}<br>Temperature: %{z:.1f}°C<extra></extra>";

/// `(x title, y title)` for the given transpose state
pub fn axis_titles(transpose: bool) -> (&'static str, &'static str) {
    if transpose {
        ("Day", "Month")
    } else {
        ("Month", "Day")
    }
}

pub fn hovertemplate(transpose: bool) -> &'static str {
    if transpose {
        HOVER_MONTH_DAY
    } else {
        HOVER_DAY_MONTH
    }
}

#[derive(Debug, Clone)]
pub struct ContourBuilder {
    pub interval: i64,
    pub coloring: ColoringMethod,
    pub reversed: bool,
    pub transpose: bool,
    pub title: Option<String>,
}

impl Default for ContourBuilder {
    fn default() -> Self {
        ContourBuilder {
            interval: 2,
            coloring: ColoringMethod::Fill,
            reversed: false,
            transpose: false,
            title: None,
        }
    }
}

impl ChartBuilder for ContourBuilder {
    fn kind(&self) -> ChartKind {
        ChartKind::Contour
    }

    fn build(&self, input: &BuildInput) -> Result<ChartDescription> {
        let dataset = input.checked_dataset(&[Role::X, Role::Y, Role::Z])?;
        let colorscale = continuous_colorscale(input.scale)?;

        let mut grid = dataset.grid(
            input.column(Role::X)?,
            input.column(Role::Y)?,
            input.column(Role::Z)?,
        )?;
        grid.fill_with_column_means();
        let (start, end) = grid
            .z_range()
            .ok_or_else(|| DashboardError::invalid_param("z", "no values to contour"))?;

        let (x_title, y_title) = axis_titles(self.transpose);

        let trace = json!({
            "type": "contour",
            "x": grid.x,
            "y": grid.y,
            "z": grid.z_json(),
            "hovertemplate": hovertemplate(self.transpose),
            "colorscale": colorscale,
            "reversescale": self.reversed,
            "transpose": self.transpose,
            "contours": {
                "showlabels": true,
                "start": start,
                "end": end,
                "size": self.interval,
                "coloring": self.coloring.as_str(),
            },
            "colorbar": {"title": {"text": "t°C"}, "tickformat": ".0f"},
        });

        let layout = layout_with(
            input.template,
            json!({
                "height": 600,
                "margin": {"l": 50, "t": 50, "r": 50, "b": 50},
                "title": {"text": self.title, "font": {"size": 18}},
                "xaxis": {"title": {"text": x_title}, "tickmode": "linear"},
                "yaxis": {"title": {"text": y_title}},
            }),
        );

        log::debug!(
            "ContourBuilder: {}x{} grid, z in [{:.1}, {:.1}]",
            grid.x.len(),
            grid.y.len(),
            start,
            end
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

    fn weather() -> Dataset {
        let df = df! {
            "n_month" => [1i64, 1, 2],
            "day" => [1i64, 2, 1],
            "tmax" => [4.0, 6.0, 10.0]
        }
        .unwrap();
        Dataset::new("weather", df)
    }

    fn bindings() -> Bindings {
        Bindings::new()
            .bind(Role::X, "n_month")
            .bind(Role::Y, "day")
            .bind(Role::Z, "tmax")
    }

    #[test]
    fn test_contour_defaults() {
        let ds = weather();
        let b = bindings();
        let s = scale(3);
        let input = BuildInput::new(Some(&ds), &b, &s, template("plotly_white"));
        let chart = ContourBuilder::default().build(&input).unwrap();

        let trace = &chart.data[0];
        assert_eq!(trace["type"], "contour");
        assert_eq!(trace["transpose"], false);
        assert_eq!(trace["reversescale"], false);
        assert_eq!(trace["contours"]["size"], 2);
        assert_eq!(trace["contours"]["coloring"], "fill");
        assert_eq!(trace["hovertemplate"], hovertemplate(false));
        // (month 2, day 2) filled with month 2's mean
        assert_eq!(trace["z"][1][1], 10);
        assert_eq!(trace["contours"]["start"], 4.0);
        assert_eq!(trace["contours"]["end"], 10.0);
        assert_eq!(chart.layout["xaxis"]["title"]["text"], "Month");
        assert_eq!(chart.layout["yaxis"]["title"]["text"], "Day");
        assert_eq!(chart.layout["paper_bgcolor"], "white");
    }

    #[test]
    fn test_contour_honors_current_settings() {
        let ds = weather();
        let b = bindings();
        let s = scale(3);
        let input = BuildInput::new(Some(&ds), &b, &s, template("plotly_white"));
        let builder = ContourBuilder {
            interval: 5,
            coloring: ColoringMethod::Heatmap,
            reversed: true,
            transpose: true,
            title: None,
        };
        let chart = builder.build(&input).unwrap();
        assert_eq!(chart.data[0]["contours"]["size"], 5);
        assert_eq!(chart.data[0]["contours"]["coloring"], "heatmap");
        assert_eq!(chart.data[0]["reversescale"], true);
        assert_eq!(chart.layout["xaxis"]["title"]["text"], "Day");
    }

    #[test]
    fn test_contour_needs_two_colors() {
        let ds = weather();
        let b = bindings();
        let s = scale(1);
        let input = BuildInput::new(Some(&ds), &b, &s, template("plotly"));
        assert!(matches!(
            ContourBuilder::default().build(&input),
            Err(DashboardError::PaletteMismatch { .. })
        ));
    }

    #[test]
    fn test_contour_missing_column() {
        let ds = weather();
        let b = bindings().bind(Role::Z, "tmin");
        let s = scale(3);
        let input = BuildInput::new(Some(&ds), &b, &s, template("plotly"));
        assert!(matches!(
            ContourBuilder::default().build(&input),
            Err(DashboardError::MissingColumn(c)) if c == "tmin"
        ));
    }
}
