//! Page rebuild pipeline
//!
//! For a page and its selection state, builds every chart on the page from
//! the datasets it needs, plus the export snippet of the selected palette.
//! This is the rebuild path; small adjustments go through the patch engine
//! instead.

use crate::dashboard::dataset::Dataset;
use crate::dashboard::error::{DashboardError, Result};
use crate::dashboard::export::PaletteExport;
use crate::dashboard::palettes::{
    palette_registry, ColorScale, PaletteCategory, REVERSED_SUFFIX,
};
use crate::dashboard::parameters::{ColoringMethod, Page, ParamName, TemplateView};
use crate::dashboard::samples::{
    DatasetSource, CPI_GASOLINE, EUROPE, HOURLY_TEMPERATURE, MONTHS, SEATTLE_WEATHER,
    SEATTLE_WEATHER_2023, STOCKS, TIPS, WIND,
};
use crate::dashboard::selection::SelectionState;
use crate::dashboard::templates::{template_registry, Template};
use crate::plotly::builders::{
    AreaGradientBuilder, BarPolarBuilder, Bindings, BoxPlotBuilder, BuildInput, ChartBuilder,
    ChoroplethBuilder, ContourBuilder, HeatmapBuilder, PieBuilder, PolarSwatchesBuilder, Role,
    ScatterBuilder, ScatterByCategoryBuilder, SwatchBarBuilder, SwatchSource, TreemapBuilder,
};
use crate::plotly::chart::ChartDescription;
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Instant;

/// Every chart of a page, keyed by chart id
#[derive(Debug, Clone, PartialEq)]
pub struct PageBuild {
    pub charts: BTreeMap<String, ChartDescription>,
    /// None on pages without palette selection
    pub export: Option<PaletteExport>,
}

/// Rebuild all charts of the page `state` describes
pub fn build_page<S: DatasetSource + ?Sized>(
    state: &SelectionState,
    source: &S,
) -> Result<PageBuild> {
    let t0 = Instant::now();
    let scale = state.scale()?;
    let template = state.template()?;
    let ctx = PageContext {
        state,
        scale: &scale,
        template,
    };

    let charts = match state.page() {
        Page::Cyclical => cyclical(&ctx, source)?,
        Page::Diverging => diverging(&ctx, source)?,
        Page::Qualitative => qualitative(&ctx, source)?,
        Page::Sequential => sequential(&ctx, source)?,
        Page::Contour => contour(&ctx, source)?,
        Page::Templates => templates(&ctx, source)?,
    };

    let export = state
        .palette_name()
        .map(|_| PaletteExport::from_scale(&scale));

    log::info!(
        "{} page: built {} chart(s) with '{}' on {} in {:.1} ms",
        state.page(),
        charts.len(),
        scale.name,
        template.name,
        t0.elapsed().as_secs_f64() * 1000.0
    );

    Ok(PageBuild {
        charts: charts.into_iter().collect(),
        export,
    })
}

struct PageContext<'a> {
    state: &'a SelectionState,
    scale: &'a ColorScale,
    template: &'a Template,
}

impl PageContext<'_> {
    /// Build one chart with the page's scale and template
    fn render(
        &self,
        id: &str,
        builder: &dyn ChartBuilder,
        dataset: Option<&Dataset>,
        bindings: &Bindings,
    ) -> Result<(String, ChartDescription)> {
        self.render_with(id, builder, dataset, bindings, self.template)
    }

    fn render_with(
        &self,
        id: &str,
        builder: &dyn ChartBuilder,
        dataset: Option<&Dataset>,
        bindings: &Bindings,
        template: &Template,
    ) -> Result<(String, ChartDescription)> {
        let input = BuildInput::new(dataset, bindings, self.scale, template);
        let chart = builder.build(&input)?;
        log::debug!(
            "  {} ({:?}): {} trace(s)",
            id,
            builder.kind(),
            chart.trace_count()
        );
        Ok((id.to_string(), chart))
    }
}

type Charts = Vec<(String, ChartDescription)>;

fn cyclical<S: DatasetSource + ?Sized>(ctx: &PageContext, source: &S) -> Result<Charts> {
    let wind = source.load(WIND)?;
    let temperature = source.load(HOURLY_TEMPERATURE)?;
    let registry = palette_registry()?;
    let base_palettes: Vec<ColorScale> = registry
        .list(PaletteCategory::Cyclical)
        .iter()
        .filter(|name| !name.ends_with(REVERSED_SUFFIX))
        .map(|name| registry.get(PaletteCategory::Cyclical, name).cloned())
        .collect::<Result<_>>()?;

    let bar_polar = BarPolarBuilder {
        title: Some("Wind Speed and Direction".into()),
    };
    let scatter = ScatterBuilder {
        size_max: 20.0,
        show_scale: true,
        title: Some("Temperature Variation Over 24 Hours".into()),
        hovertemplate: Some("Hour of Day: %{x}<br>Temperature: %{y:.1f}°C".into()),
        layout: json!({
            "xaxis": {
                "title": {"text": "Hour of Day"},
                "tickmode": "linear",
                "range": [-0.5, 23.5],
                "showgrid": false,
                "zeroline": false,
            },
            "yaxis": {"title": {"text": "Temperature (°C)"}},
        }),
    };

    Ok(vec![
        ctx.render(
            "barpolar-wind",
            &bar_polar,
            Some(&wind),
            &Bindings::new()
                .bind(Role::R, "speed")
                .bind(Role::Theta, "direction"),
        )?,
        ctx.render(
            "scatter-plot-temperature",
            &scatter,
            Some(&temperature),
            &Bindings::new()
                .bind(Role::X, "hour")
                .bind(Role::Y, "temperature")
                .bind(Role::Color, "hour")
                .bind(Role::Size, "temperature"),
        )?,
        ctx.render(
            "swatches",
            &PolarSwatchesBuilder::new(base_palettes),
            None,
            &Bindings::new(),
        )?,
    ])
}

fn diverging<S: DatasetSource + ?Sized>(ctx: &PageContext, source: &S) -> Result<Charts> {
    let cpi = source.load(CPI_GASOLINE)?;
    let europe = source.load(EUROPE)?;

    let life: Vec<f64> = europe.f64_values("All")?.into_iter().flatten().collect();
    if life.is_empty() {
        return Err(DashboardError::invalid_param(
            "dataset",
            format!("'{}' has no life expectancy values", EUROPE),
        ));
    }
    let avg = life.iter().sum::<f64>() / life.len() as f64;
    let min = life.iter().copied().fold(f64::INFINITY, f64::min);
    let max = life.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let heatmap = HeatmapBuilder {
        zmid: Some(0.0),
        show_values: ctx.state.bool_param(ParamName::ShowValues)?,
        title: Some(
            "US Consumer Price Index 2013-2023, Motor Fuel <br><sub>(12-month percentage change)<br>"
                .into(),
        ),
        hovertemplate: "%{y} %{x}<br>Change: %{z:.1f}%<extra></extra>".into(),
        tick_suffix: "%".into(),
        dtick: Some(25.0),
        ..Default::default()
    };
    let map = ChoroplethBuilder {
        midpoint: Some(avg),
        tickvals: Some(vec![min, avg, max]),
        title: Some(format!(
            "Life Expectancy in Europe <br><sub>Average life expectancy in 2023 was {:.0} years",
            avg
        )),
        center: (54.8, 7.5),
        hovertemplate: "%{customdata}<br>Life Expectancy: %{z:.1f} years".into(),
    };

    Ok(vec![
        ctx.render(
            "color-bar-diverging",
            &SwatchBarBuilder::new(SwatchSource::PaletteVertical),
            None,
            &Bindings::new(),
        )?,
        ctx.render(
            "hmap-diverging",
            &heatmap,
            Some(&cpi),
            &Bindings::new()
                .bind(Role::X, "month")
                .bind(Role::Y, "year")
                .bind(Role::Z, "change"),
        )?,
        ctx.render(
            "map-diverging",
            &map,
            Some(&europe),
            &Bindings::new()
                .bind(Role::Locations, "iso_alpha3")
                .bind(Role::Color, "All")
                .bind(Role::Hover, "Countries"),
        )?,
    ])
}

fn qualitative<S: DatasetSource + ?Sized>(ctx: &PageContext, source: &S) -> Result<Charts> {
    let tips = source.load(TIPS)?;

    let pie = PieBuilder {
        hole: ctx.state.f64_param(ParamName::Hole)?,
        title: Some("Distribution of Tip by Day of the Week".into()),
    };
    let scatter = ScatterByCategoryBuilder {
        opacity: ctx.state.f64_param(ParamName::Opacity)?,
        category_order: Some(["Sat", "Sun", "Thur", "Fri"].map(String::from).to_vec()),
        title: Some("Total Bill and Tip by Day of the Week".into()),
        ..Default::default()
    };

    Ok(vec![
        ctx.render(
            "color-bar-qualitative",
            &SwatchBarBuilder::new(SwatchSource::PaletteVertical),
            None,
            &Bindings::new(),
        )?,
        ctx.render(
            "pie-qualitative",
            &pie,
            Some(&tips),
            &Bindings::new()
                .bind(Role::Names, "day")
                .bind(Role::Values, "tip"),
        )?,
        ctx.render(
            "scatter-qualitative",
            &scatter,
            Some(&tips),
            &Bindings::new()
                .bind(Role::X, "total_bill")
                .bind(Role::Y, "tip")
                .bind(Role::Color, "day")
                .bind(Role::Size, "tip"),
        )?,
    ])
}

fn sequential<S: DatasetSource + ?Sized>(ctx: &PageContext, source: &S) -> Result<Charts> {
    let tips = source.load(TIPS)?;
    let stocks = source.load(STOCKS)?;
    let europe = source.load(EUROPE)?;

    let scatter = ScatterBuilder {
        layout: json!({
            "xaxis": {"title": {"text": null}},
            "yaxis": {"title": {"text": null}},
        }),
        ..Default::default()
    };
    let treemap = TreemapBuilder {
        hover_columns: vec!["Male".into(), "Female".into()],
        year: Some(2023),
        ..Default::default()
    };

    Ok(vec![
        ctx.render(
            "color-bar-sequential",
            &SwatchBarBuilder::new(SwatchSource::PaletteHorizontal),
            None,
            &Bindings::new(),
        )?,
        ctx.render(
            "scatter-plot",
            &scatter,
            Some(&tips),
            &Bindings::new()
                .bind(Role::X, "total_bill")
                .bind(Role::Y, "tip")
                .bind(Role::Color, "tip")
                .bind(Role::Size, "total_bill"),
        )?,
        ctx.render(
            "area-plot",
            &AreaGradientBuilder,
            Some(&stocks),
            &Bindings::new().bind(Role::X, "date").bind(Role::Y, "AAPL"),
        )?,
        ctx.render(
            "treemap-plot",
            &treemap,
            Some(&europe),
            &Bindings::new()
                .bind(Role::Parent, "European Union")
                .bind(Role::Label, "Countries")
                .bind(Role::Values, "GDP per capita (US$)")
                .bind(Role::Color, "Sex gap"),
        )?,
        ctx.render(
            "map-plot",
            &ChoroplethBuilder::default(),
            Some(&europe),
            &Bindings::new()
                .bind(Role::Locations, "iso_alpha3")
                .bind(Role::Color, "GDP per capita (US$)")
                .bind(Role::Hover, "Countries"),
        )?,
    ])
}

fn contour<S: DatasetSource + ?Sized>(ctx: &PageContext, source: &S) -> Result<Charts> {
    let weather = source.load(SEATTLE_WEATHER)?;
    let state = ctx.state;

    let builder = ContourBuilder {
        interval: state.i64_param(ParamName::Interval)?,
        coloring: state
            .text_param(ParamName::ColoringMethod)?
            .parse::<ColoringMethod>()?,
        reversed: state.bool_param(ParamName::Reversed)?,
        transpose: state.bool_param(ParamName::Transpose)?,
        title: Some("Average Annual Maximum Temperatures in Seattle (2014-2023)".into()),
    };

    Ok(vec![ctx.render(
        "contour-plot",
        &builder,
        Some(&weather),
        &Bindings::new()
            .bind(Role::X, "n_month")
            .bind(Role::Y, "day")
            .bind(Role::Z, "tmax"),
    )?])
}

fn templates<S: DatasetSource + ?Sized>(ctx: &PageContext, source: &S) -> Result<Charts> {
    let weather = source.load(SEATTLE_WEATHER_2023)?;
    let view = ctx.state.view().unwrap_or_default();
    let all_templates = template_registry()?.list_templates();
    let mut charts = Vec::with_capacity(all_templates.len() + 1);

    match view {
        TemplateView::Colorway => {
            let box_plot = BoxPlotBuilder {
                category_order: Some(MONTHS.map(String::from).to_vec()),
                title: Some("Maximum Temperatures in Seattle, US, 2023".into()),
                tick_suffix: "°C".into(),
                source_note: Some(
                    "Data Source:<a href='https://meteostat.net/en/place/us/seattle'> [Meteostat]</a>"
                        .into(),
                ),
            };
            charts.push(ctx.render(
                "box-plot",
                &box_plot,
                Some(&weather),
                &Bindings::new().bind(Role::X, "month").bind(Role::Y, "tmax"),
            )?);
            for template in all_templates {
                charts.push(ctx.render_with(
                    &format!("color-bar-{}", template.name),
                    &SwatchBarBuilder::new(SwatchSource::TemplateColorway),
                    None,
                    &Bindings::new(),
                    template,
                )?);
            }
        }
        TemplateView::Colorscale => {
            let heatmap = HeatmapBuilder {
                template_scale: true,
                title: Some("Maximum Temperatures in Seattle by Day and Month, 2023".into()),
                hovertemplate: "%{y} %{x}<br>Max temperature: %{z:.1f}°C<extra></extra>".into(),
                tick_suffix: "°C".into(),
                height: 400,
                ..Default::default()
            };
            charts.push(ctx.render(
                "heatmap-temperature",
                &heatmap,
                Some(&weather),
                &Bindings::new()
                    .bind(Role::X, "day")
                    .bind(Role::Y, "month")
                    .bind(Role::Z, "tmax"),
            )?);
            for template in all_templates {
                charts.push(ctx.render_with(
                    &format!("color-bar2-{}", template.name),
                    &SwatchBarBuilder::new(SwatchSource::TemplateColorscale),
                    None,
                    &Bindings::new(),
                    template,
                )?);
            }
        }
    }

    Ok(charts)
}
