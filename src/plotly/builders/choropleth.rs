//! Choropleth map of European countries

use super::{layout_with, BuildInput, ChartBuilder, ChartKind, Role};
use crate::dashboard::colors::continuous_colorscale;
use crate::dashboard::error::Result;
use crate::plotly::chart::ChartDescription;
use serde_json::json;

#[derive(Debug, Clone)]
pub struct ChoroplethBuilder {
    /// Value placed at the middle of a diverging scale
    pub midpoint: Option<f64>,
    /// Explicit colorbar ticks; the colorbar is hidden without them
    pub tickvals: Option<Vec<f64>>,
    pub title: Option<String>,
    /// Map center as (lat, lon)
    pub center: (f64, f64),
    pub hovertemplate: String,
}

impl Default for ChoroplethBuilder {
    fn default() -> Self {
        ChoroplethBuilder {
            midpoint: None,
            tickvals: None,
            title: None,
            center: (54.5260, 10.2551),
            hovertemplate: "%{customdata}<br>GDP per capita: %{z:,.0f} (US$)".to_string(),
        }
    }
}

impl ChartBuilder for ChoroplethBuilder {
    fn kind(&self) -> ChartKind {
        ChartKind::Choropleth
    }

    fn build(&self, input: &BuildInput) -> Result<ChartDescription> {
        let dataset = input.checked_dataset(&[Role::Locations, Role::Color])?;
        let colorscale = continuous_colorscale(input.scale)?;

        let mut trace = json!({
            "type": "choropleth",
            "locationmode": "ISO-3",
            "locations": dataset.string_values(input.column(Role::Locations)?)?,
            "z": dataset.json_values(input.column(Role::Color)?)?,
            "colorscale": colorscale,
            "hovertemplate": self.hovertemplate,
            "showscale": self.tickvals.is_some(),
        });
        if let Some(hover) = input.bindings.get(Role::Hover) {
            trace["customdata"] = json!(dataset.string_values(hover)?);
        }
        if let Some(mid) = self.midpoint {
            trace["zmid"] = json!(mid);
        }
        if let Some(ticks) = &self.tickvals {
            trace["colorbar"] = json!({
                "thickness": 15,
                "len": 0.8,
                "title": {"text": "years"},
                "tickmode": "array",
                "tickvals": ticks,
                "tickformat": ".0f",
            });
        }

        let (lat, lon) = self.center;
        let mut extra = json!({
            "geo": {
                "scope": "europe",
                "center": {"lat": lat, "lon": lon},
                "projection": {"scale": 2},
                "bgcolor": input.template.background,
                "visible": false,
                "showcountries": false,
                "showcoastlines": false,
                "showland": false,
            },
            "height": if self.title.is_some() { 550 } else { 350 },
            "margin": {"l": 0, "t": if self.title.is_some() { 70 } else { 0 }, "r": 0, "b": 10},
        });
        if let Some(title) = &self.title {
            extra["title"] = json!({"text": title, "font": {"size": 18}});
        }

        Ok(ChartDescription::new(layout_with(input.template, extra)).with_trace(trace))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::dataset::Dataset;
    use crate::plotly::builders::test_support::{scale, template};
    use crate::plotly::builders::Bindings;
    use polars::prelude::*;

    fn europe() -> Dataset {
        let df = df! {
            "iso_alpha3" => ["AUT", "BEL"],
            "Countries" => ["Austria", "Belgium"],
            "All" => [81.8, 82.1]
        }
        .unwrap();
        Dataset::new("europe", df)
    }

    #[test]
    fn test_choropleth_plain() {
        let ds = europe();
        let b = Bindings::new()
            .bind(Role::Locations, "iso_alpha3")
            .bind(Role::Color, "All")
            .bind(Role::Hover, "Countries");
        let s = scale(3);
        let input = BuildInput::new(Some(&ds), &b, &s, template("plotly_dark"));
        let chart = ChoroplethBuilder::default().build(&input).unwrap();

        let trace = &chart.data[0];
        assert_eq!(trace["locations"], json!(["AUT", "BEL"]));
        assert_eq!(trace["customdata"], json!(["Austria", "Belgium"]));
        assert_eq!(trace["showscale"], false);
        assert!(trace.get("zmid").is_none());
        assert_eq!(chart.layout["geo"]["scope"], "europe");
        assert_eq!(chart.layout["geo"]["bgcolor"], "rgb(17,17,17)");
    }

    #[test]
    fn test_choropleth_midpoint_and_ticks() {
        let ds = europe();
        let b = Bindings::new()
            .bind(Role::Locations, "iso_alpha3")
            .bind(Role::Color, "All");
        let s = scale(11);
        let input = BuildInput::new(Some(&ds), &b, &s, template("plotly"));
        let builder = ChoroplethBuilder {
            midpoint: Some(81.95),
            tickvals: Some(vec![81.8, 81.95, 82.1]),
            title: Some("Life Expectancy in Europe".into()),
            ..Default::default()
        };
        let chart = builder.build(&input).unwrap();

        let trace = &chart.data[0];
        assert_eq!(trace["zmid"], 81.95);
        assert_eq!(trace["colorbar"]["tickvals"], json!([81.8, 81.95, 82.1]));
        assert_eq!(trace["showscale"], true);
        assert_eq!(chart.layout["height"], 550);
    }
}
