//! Treemap with a fixed root, one level of groups and leaf rows
//!
//! Parent values are the sums of their children. Parent colors (and hover
//! values) are the child values weighted by size, the way Plotly Express
//! aggregates a continuous color over a path.

use super::{layout_with, BuildInput, ChartBuilder, ChartKind, Role};
use crate::dashboard::colors::continuous_colorscale;
use crate::dashboard::error::Result;
use crate::plotly::chart::ChartDescription;
use polars::prelude::*;
use serde_json::{json, Value};

#[derive(Debug, Clone)]
pub struct TreemapBuilder {
    pub root_label: String,
    /// Columns shown on hover, in `customdata` order
    pub hover_columns: Vec<String>,
    pub year: Option<i32>,
}

impl Default for TreemapBuilder {
    fn default() -> Self {
        TreemapBuilder {
            root_label: "Europe".to_string(),
            hover_columns: Vec::new(),
            year: None,
        }
    }
}

/// One treemap node before serialization
struct Node {
    id: String,
    label: String,
    parent: String,
    value: f64,
    color: Option<f64>,
    hover: Vec<Option<f64>>,
}

/// Size-weighted mean of `(weight, value)` pairs; plain mean when weights sum to 0
fn weighted_mean(pairs: impl Iterator<Item = (f64, Option<f64>)>) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = pairs.filter_map(|(w, v)| v.map(|v| (w, v))).collect();
    if pairs.is_empty() {
        return None;
    }
    let total: f64 = pairs.iter().map(|(w, _)| w).sum();
    if total > 0.0 {
        Some(pairs.iter().map(|(w, v)| w * v).sum::<f64>() / total)
    } else {
        Some(pairs.iter().map(|(_, v)| v).sum::<f64>() / pairs.len() as f64)
    }
}

fn aggregate(id: String, label: String, parent: String, children: &[&Node]) -> Node {
    let value = children.iter().map(|n| n.value).sum();
    let color = weighted_mean(children.iter().map(|n| (n.value, n.color)));
    let width = children.first().map(|n| n.hover.len()).unwrap_or(0);
    let hover = (0..width)
        .map(|k| weighted_mean(children.iter().map(|n| (n.value, n.hover[k]))))
        .collect();
    Node {
        id,
        label,
        parent,
        value,
        color,
        hover,
    }
}

// Aliases of the node table columns
const PARENT: &str = "__parent";
const LABEL: &str = "__label";
const VALUE: &str = "__value";
const COLOR: &str = "__color";

fn hover_alias(k: usize) -> String {
    format!("__hover{}", k)
}

/// Group-level counterpart of `weighted_mean` over the `VALUE` weights
fn weighted_by_value(column: &str) -> Expr {
    let weight = col(VALUE).filter(col(column).is_not_null()).sum();
    let weighted = (col(VALUE) * col(column)).sum() / weight.clone();
    when(weight.gt(lit(0.0)))
        .then(weighted)
        .otherwise(col(column).mean())
        .alias(column)
}

impl TreemapBuilder {
    /// Nodes from a node table; `id` is left empty and `label` is read from
    /// `label_column` when given
    fn nodes(&self, table: &DataFrame, label_column: Option<&str>) -> Result<Vec<Node>> {
        let f64_column = |name: &str| -> Result<Vec<Option<f64>>> {
            Ok(table.column(name)?.as_materialized_series().f64()?.into_iter().collect())
        };
        let str_column = |name: &str| -> Result<Vec<String>> {
            Ok(table
                .column(name)?
                .as_materialized_series()
                .str()?
                .into_iter()
                .map(|v| v.unwrap_or_default().to_string())
                .collect())
        };

        let parents = str_column(PARENT)?;
        let labels = match label_column {
            Some(column) => str_column(column)?,
            None => vec![String::new(); table.height()],
        };
        let values = f64_column(VALUE)?;
        let colors = f64_column(COLOR)?;
        let hover = (0..self.hover_columns.len())
            .map(|k| f64_column(&hover_alias(k)))
            .collect::<Result<Vec<_>>>()?;

        Ok((0..table.height())
            .map(|i| Node {
                id: String::new(),
                label: labels[i].clone(),
                parent: parents[i].clone(),
                value: values[i].unwrap_or(0.0),
                color: colors[i],
                hover: hover.iter().map(|column| column[i]).collect(),
            })
            .collect())
    }
}

impl ChartBuilder for TreemapBuilder {
    fn kind(&self) -> ChartKind {
        ChartKind::Treemap
    }

    fn build(&self, input: &BuildInput) -> Result<ChartDescription> {
        let dataset = input.checked_dataset(&[Role::Parent, Role::Label, Role::Values, Role::Color])?;
        dataset.require_columns(self.hover_columns.iter().map(|c| c.as_str()))?;
        let colorscale = continuous_colorscale(input.scale)?;

        let leaves_df = dataset
            .inner()
            .clone()
            .lazy()
            .select(
                [
                    col(input.column(Role::Parent)?).cast(DataType::String).alias(PARENT),
                    col(input.column(Role::Label)?).cast(DataType::String).alias(LABEL),
                    col(input.column(Role::Values)?)
                        .cast(DataType::Float64)
                        .fill_null(lit(0.0))
                        .alias(VALUE),
                    col(input.column(Role::Color)?).cast(DataType::Float64).alias(COLOR),
                ]
                .into_iter()
                .chain(self.hover_columns.iter().enumerate().map(|(k, c)| {
                    col(c.as_str()).cast(DataType::Float64).alias(hover_alias(k))
                }))
                .collect::<Vec<_>>(),
            )
            .filter(col(PARENT).is_not_null())
            .collect()?;

        let parents_df = leaves_df
            .clone()
            .lazy()
            .group_by_stable([col(PARENT)])
            .agg(
                [col(VALUE).sum(), weighted_by_value(COLOR)]
                    .into_iter()
                    .chain((0..self.hover_columns.len()).map(|k| weighted_by_value(&hover_alias(k))))
                    .collect::<Vec<_>>(),
            )
            .collect()?;

        let root = &self.root_label;
        let leaves: Vec<Node> = self
            .nodes(&leaves_df, Some(LABEL))?
            .into_iter()
            .map(|mut n| {
                n.id = format!("{}/{}/{}", root, n.parent, n.label);
                n.parent = format!("{}/{}", root, n.parent);
                n
            })
            .collect();
        let parents: Vec<Node> = self
            .nodes(&parents_df, None)?
            .into_iter()
            .map(|mut n| {
                n.id = format!("{}/{}", root, n.parent);
                n.label = std::mem::replace(&mut n.parent, root.clone());
                n
            })
            .collect();
        let all_parents: Vec<&Node> = parents.iter().collect();
        let top = aggregate(root.clone(), root.clone(), String::new(), &all_parents);

        let nodes: Vec<&Node> = leaves.iter().chain(&parents).chain(std::iter::once(&top)).collect();
        let color_json = |v: Option<f64>| v.map(Value::from).unwrap_or(Value::Null);

        let mut hovertemplate = String::from(
            "Country: %{label}<br>GDP per capita: %{value:,.0f} (US$)<br>\
             Female Life Expectancy: %{customdata[1]:.1f} years<br>\
             Male Life Expectancy: %{customdata[0]:.1f} years<br>\
             Sex gap: %{color:.1f} years<br>",
        );
        if let Some(year) = self.year {
            hovertemplate.push_str(&format!("Year: {}", year));
        }

        let trace = json!({
            "type": "treemap",
            "ids": nodes.iter().map(|n| n.id.as_str()).collect::<Vec<_>>(),
            "labels": nodes.iter().map(|n| n.label.as_str()).collect::<Vec<_>>(),
            "parents": nodes.iter().map(|n| n.parent.as_str()).collect::<Vec<_>>(),
            "values": nodes.iter().map(|n| n.value).collect::<Vec<_>>(),
            "branchvalues": "total",
            "marker": {
                "colors": nodes.iter().map(|n| color_json(n.color)).collect::<Vec<_>>(),
                "colorscale": colorscale,
                "showscale": true,
                "cornerradius": 5,
            },
            "customdata": nodes
                .iter()
                .map(|n| n.hover.iter().map(|v| color_json(*v)).collect::<Vec<_>>())
                .collect::<Vec<_>>(),
            "hovertemplate": hovertemplate,
        });

        let layout = layout_with(
            input.template,
            json!({
                "height": 300,
                "margin": {"l": 20, "t": 20, "r": 20, "b": 20},
            }),
        );

        Ok(ChartDescription::new(layout).with_trace(trace))
    }
}
