//! Tabular datasets consumed by the chart builders
//!
//! A thin wrapper over a Polars DataFrame with the column accessors the
//! builders need: typed column extraction, category listing, per-category
//! sums and matrix pivots. Datasets are loaded once and shared read-only.

use super::error::{DashboardError, Result};
use polars::prelude::*;
use serde_json::Value;
use std::collections::HashMap;

// Aliases for the key and value columns of intermediate query results
const KEY: &str = "__key";
const VALUE: &str = "__value";
const X_KEY: &str = "__x";
const Y_KEY: &str = "__y";

#[derive(Debug, Clone)]
pub struct Dataset {
    name: String,
    df: DataFrame,
}

/// Matrix view of a long-form table: `z[row][col]` is the cell at `(x[col], y[row])`
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub x: Vec<Value>,
    pub y: Vec<Value>,
    pub z: Vec<Vec<Option<f64>>>,
}

impl Grid {
    /// Smallest and largest defined cell values
    pub fn z_range(&self) -> Option<(f64, f64)> {
        self.z
            .iter()
            .flatten()
            .flatten()
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Fill missing cells with the mean of their column
    ///
    /// Columns without any defined cell stay empty.
    pub fn fill_with_column_means(&mut self) {
        for col in 0..self.x.len() {
            let defined: Vec<f64> = self.z.iter().filter_map(|row| row[col]).collect();
            if defined.is_empty() {
                continue;
            }
            let mean = defined.iter().sum::<f64>() / defined.len() as f64;
            for row in self.z.iter_mut() {
                if row[col].is_none() {
                    row[col] = Some(mean);
                }
            }
        }
    }

    /// `z` as JSON, missing cells as `null`
    pub fn z_json(&self) -> Value {
        Value::Array(
            self.z
                .iter()
                .map(|row| Value::Array(row.iter().map(|v| option_f64_json(*v)).collect()))
                .collect(),
        )
    }
}

impl Dataset {
    pub fn new(name: impl Into<String>, df: DataFrame) -> Self {
        Dataset {
            name: name.into(),
            df,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the underlying Polars DataFrame
    pub fn inner(&self) -> &DataFrame {
        &self.df
    }

    pub fn nrow(&self) -> usize {
        self.df.height()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.df.get_column_index(column).is_some()
    }

    /// Fail with `MissingColumn` for the first column the dataset doesn't have
    pub fn require_columns<'a>(&self, columns: impl IntoIterator<Item = &'a str>) -> Result<()> {
        for column in columns {
            if !self.has_column(column) {
                log::warn!("Dataset '{}' has no column '{}'", self.name, column);
                return Err(DashboardError::MissingColumn(column.to_string()));
            }
        }
        Ok(())
    }

    fn column(&self, column: &str) -> Result<&Column> {
        if !self.has_column(column) {
            return Err(DashboardError::MissingColumn(column.to_string()));
        }
        Ok(self.df.column(column)?)
    }

    fn is_text(&self, column: &str) -> Result<bool> {
        Ok(matches!(self.column(column)?.dtype(), DataType::String))
    }

    /// Numeric column values (nulls preserved)
    pub fn f64_values(&self, column: &str) -> Result<Vec<Option<f64>>> {
        let casted = self.column(column)?.cast(&DataType::Float64)?;
        let values = casted
            .as_materialized_series()
            .f64()?
            .into_iter()
            .collect();
        Ok(values)
    }

    /// Numeric column values with nulls as NaN
    pub fn f64_values_or_nan(&self, column: &str) -> Result<Vec<f64>> {
        Ok(self
            .f64_values(column)?
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect())
    }

    /// Column values rendered as strings (nulls as empty strings)
    pub fn string_values(&self, column: &str) -> Result<Vec<String>> {
        let casted = self.column(column)?.cast(&DataType::String)?;
        let values = casted
            .as_materialized_series()
            .str()?
            .into_iter()
            .map(|v| v.unwrap_or_default().to_string())
            .collect();
        Ok(values)
    }

    /// Column values as JSON: numbers for numeric columns, strings otherwise
    pub fn json_values(&self, column: &str) -> Result<Vec<Value>> {
        if self.is_text(column)? {
            Ok(self
                .string_values(column)?
                .into_iter()
                .map(Value::String)
                .collect())
        } else {
            Ok(self
                .f64_values(column)?
                .into_iter()
                .map(option_f64_json)
                .collect())
        }
    }

    /// Distinct non-null values of a column
    ///
    /// Categories listed in `order` come first, in that order; the rest follow
    /// in order of first appearance.
    pub fn categories(&self, column: &str, order: Option<&[String]>) -> Result<Vec<String>> {
        self.require_columns([column])?;
        let distinct = self
            .df
            .clone()
            .lazy()
            .select([col(column).cast(DataType::String).alias(KEY)])
            .filter(col(KEY).is_not_null())
            .unique_stable(None, UniqueKeepStrategy::First)
            .collect()?;
        let seen: Vec<String> = distinct
            .column(KEY)?
            .as_materialized_series()
            .str()?
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect();

        let Some(order) = order else {
            return Ok(seen);
        };

        let mut ordered: Vec<String> = order
            .iter()
            .filter(|c| seen.contains(c))
            .cloned()
            .collect();
        ordered.extend(seen.into_iter().filter(|c| !order.contains(c)));
        Ok(ordered)
    }

    /// Sum of `values` per distinct `names` value, in first-appearance order
    ///
    /// Rows with a null name belong to no slice and are dropped.
    pub fn sum_by(&self, names: &str, values: &str) -> Result<Vec<(String, f64)>> {
        self.require_columns([names, values])?;
        let sums = self
            .df
            .clone()
            .lazy()
            .select([
                col(names).cast(DataType::String).alias(KEY),
                col(values).cast(DataType::Float64).alias(VALUE),
            ])
            .filter(col(KEY).is_not_null())
            .group_by_stable([col(KEY)])
            .agg([col(VALUE).sum()])
            .collect()?;

        let keys = sums.column(KEY)?.as_materialized_series().str()?;
        let totals = sums.column(VALUE)?.as_materialized_series().f64()?;
        Ok(keys
            .into_iter()
            .zip(totals)
            .filter_map(|(key, total)| Some((key?.to_string(), total.unwrap_or(0.0))))
            .collect())
    }

    /// Pivot a long-form table into a matrix, averaging duplicate cells
    ///
    /// Numeric axis keys are sorted ascending; text keys keep first-appearance
    /// order. Rows with a null key are dropped and NaN values are ignored.
    /// Cells without any row are `None`.
    pub fn grid(&self, x: &str, y: &str, z: &str) -> Result<Grid> {
        self.require_columns([x, y, z])?;
        let (x_axis, x_key) = self.axis(x)?;
        let (y_axis, y_key) = self.axis(y)?;

        let cells = self
            .df
            .clone()
            .lazy()
            .select([
                x_key.alias(X_KEY),
                y_key.alias(Y_KEY),
                col(z).cast(DataType::Float64).fill_nan(lit(NULL)).alias(VALUE),
            ])
            .group_by([col(X_KEY), col(Y_KEY)])
            .agg([col(VALUE).mean()])
            .collect()?;
        log::debug!(
            "Dataset '{}': {} x {} grid from {} cells",
            self.name,
            x_axis.len(),
            y_axis.len(),
            cells.height()
        );

        let xs = x_axis.positions(cells.column(X_KEY)?)?;
        let ys = y_axis.positions(cells.column(Y_KEY)?)?;
        let means = cells.column(VALUE)?.as_materialized_series().f64()?;

        let mut z = vec![vec![None; x_axis.len()]; y_axis.len()];
        for ((xi, yi), mean) in xs.into_iter().zip(ys).zip(means) {
            if let (Some(xi), Some(yi)) = (xi, yi) {
                z[yi][xi] = mean;
            }
        }

        Ok(Grid {
            x: x_axis.labels(),
            y: y_axis.labels(),
            z,
        })
    }

    /// Distinct keys of a pivot axis and the expression producing them
    fn axis(&self, column: &str) -> Result<(Axis, Expr)> {
        if self.is_text(column)? {
            return Ok((Axis::Text(self.categories(column, None)?), col(column)));
        }

        let key = col(column).cast(DataType::Float64);
        let distinct = self
            .df
            .clone()
            .lazy()
            .select([key.clone().alias(KEY)])
            .filter(col(KEY).is_not_null().and(col(KEY).is_not_nan()))
            .unique(None, UniqueKeepStrategy::First)
            .sort([KEY], SortMultipleOptions::default())
            .collect()?;
        let keys = distinct
            .column(KEY)?
            .as_materialized_series()
            .f64()?
            .into_iter()
            .flatten()
            .collect();
        Ok((Axis::Numeric(keys), key))
    }
}

/// Ordered distinct keys of one pivot axis
enum Axis {
    Text(Vec<String>),
    Numeric(Vec<f64>),
}

impl Axis {
    fn len(&self) -> usize {
        match self {
            Axis::Text(keys) => keys.len(),
            Axis::Numeric(keys) => keys.len(),
        }
    }

    fn labels(self) -> Vec<Value> {
        match self {
            Axis::Text(keys) => keys.into_iter().map(Value::String).collect(),
            Axis::Numeric(keys) => keys.into_iter().map(f64_json).collect(),
        }
    }

    /// Axis position of every key in `column`; unknown or null keys have none
    fn positions(&self, column: &Column) -> Result<Vec<Option<usize>>> {
        let series = column.as_materialized_series();
        match self {
            Axis::Text(keys) => {
                let index: HashMap<&str, usize> = keys
                    .iter()
                    .enumerate()
                    .map(|(i, k)| (k.as_str(), i))
                    .collect();
                Ok(series
                    .str()?
                    .into_iter()
                    .map(|k| k.and_then(|k| index.get(k).copied()))
                    .collect())
            }
            Axis::Numeric(keys) => Ok(series
                .f64()?
                .into_iter()
                .map(|k| k.and_then(|k| keys.binary_search_by(|d| d.total_cmp(&k)).ok()))
                .collect()),
        }
    }
}

/// JSON number for a finite value, integral values rendered without a fraction
pub(crate) fn f64_json(v: f64) -> Value {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        Value::from(v as i64)
    } else {
        serde_json::Number::from_f64(v)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

pub(crate) fn option_f64_json(v: Option<f64>) -> Value {
    v.map(f64_json).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tips() -> Dataset {
        let df = df! {
            "day" => ["Sun", "Sat", "Sun", "Thur", "Sat"],
            "tip" => [1.0, 2.0, 3.0, 4.0, 5.0],
            "size" => [2i64, 3, 2, 4, 1]
        }
        .unwrap();
        Dataset::new("tips", df)
    }

    #[test]
    fn test_require_columns() {
        let ds = tips();
        assert!(ds.require_columns(["day", "tip"]).is_ok());
        assert!(matches!(
            ds.require_columns(["day", "bill"]),
            Err(DashboardError::MissingColumn(c)) if c == "bill"
        ));
    }

    #[test]
    fn test_categories_with_order() {
        let ds = tips();
        assert_eq!(
            ds.categories("day", None).unwrap(),
            vec!["Sun", "Sat", "Thur"]
        );

        let order = vec!["Sat".to_string(), "Fri".to_string(), "Sun".to_string()];
        assert_eq!(
            ds.categories("day", Some(&order)).unwrap(),
            vec!["Sat", "Sun", "Thur"]
        );
    }

    #[test]
    fn test_sum_by() {
        let ds = tips();
        assert_eq!(
            ds.sum_by("day", "tip").unwrap(),
            vec![
                ("Sun".to_string(), 4.0),
                ("Sat".to_string(), 7.0),
                ("Thur".to_string(), 4.0)
            ]
        );
    }

    #[test]
    fn test_null_names_are_not_a_slice() {
        let df = df! {
            "day" => [Some("a"), None, Some("a"), Some("b")],
            "tip" => [1.0, 2.0, 3.0, 5.0]
        }
        .unwrap();
        let ds = Dataset::new("tips", df);

        assert_eq!(
            ds.sum_by("day", "tip").unwrap(),
            vec![("a".to_string(), 4.0), ("b".to_string(), 5.0)]
        );
        assert_eq!(ds.categories("day", None).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_sum_by_missing_column() {
        assert!(matches!(
            tips().sum_by("day", "bill"),
            Err(DashboardError::MissingColumn(c)) if c == "bill"
        ));
    }

    #[test]
    fn test_json_values_keep_types() {
        let ds = tips();
        assert_eq!(ds.json_values("size").unwrap()[0], json!(2));
        assert_eq!(ds.json_values("day").unwrap()[0], json!("Sun"));
        assert_eq!(ds.json_values("tip").unwrap()[1], json!(2));
    }

    #[test]
    fn test_grid_pivot_and_fill() {
        let df = df! {
            "month" => [1i64, 1, 2, 2, 1],
            "day" => [1i64, 2, 1, 1, 1],
            "tmax" => [10.0, 12.0, 20.0, 22.0, 14.0]
        }
        .unwrap();
        let ds = Dataset::new("weather", df);

        let mut grid = ds.grid("month", "day", "tmax").unwrap();
        assert_eq!(grid.x, vec![json!(1), json!(2)]);
        assert_eq!(grid.y, vec![json!(1), json!(2)]);
        // (month 1, day 1) averages 10 and 14
        assert_eq!(grid.z[0][0], Some(12.0));
        assert_eq!(grid.z[0][1], Some(21.0));
        assert_eq!(grid.z[1][0], Some(12.0));
        assert_eq!(grid.z[1][1], None);

        grid.fill_with_column_means();
        assert_eq!(grid.z[1][1], Some(21.0));
        assert_eq!(grid.z_range(), Some((12.0, 21.0)));
    }

    #[test]
    fn test_grid_text_axis_drops_null_keys() {
        let df = df! {
            "month" => [Some("Jan"), Some("Feb"), None, Some("Jan")],
            "day" => [2i64, 1, 1, 1],
            "tmax" => [1.0, 2.0, 50.0, f64::NAN]
        }
        .unwrap();
        let ds = Dataset::new("weather", df);

        let grid = ds.grid("month", "day", "tmax").unwrap();
        assert_eq!(grid.x, vec![json!("Jan"), json!("Feb")]);
        assert_eq!(grid.y, vec![json!(1), json!(2)]);
        // (Jan, 1) only has a NaN reading
        assert_eq!(grid.z, vec![vec![None, Some(2.0)], vec![Some(1.0), None]]);
    }
}
