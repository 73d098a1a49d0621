//! Declarative chart descriptions in Plotly's figure schema

use crate::dashboard::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A chart as `{ "data": [trace, ...], "layout": {...} }`
///
/// Produced fresh by a builder and afterwards changed only by applying a
/// `Patch`. Descriptions carry their template inline, so one serializes and
/// renders without any other context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDescription {
    pub data: Vec<Value>,
    pub layout: Value,
}

impl Default for ChartDescription {
    fn default() -> Self {
        ChartDescription {
            data: Vec::new(),
            layout: Value::Object(Map::new()),
        }
    }
}

impl ChartDescription {
    pub fn new(layout: Value) -> Self {
        ChartDescription {
            data: Vec::new(),
            layout,
        }
    }

    pub fn with_trace(mut self, trace: Value) -> Self {
        self.data.push(trace);
        self
    }

    pub fn trace_count(&self) -> usize {
        self.data.len()
    }

    pub fn trace(&self, index: usize) -> Option<&Value> {
        self.data.get(index)
    }

    /// Plotly trace type of the first trace
    pub fn first_trace_type(&self) -> Option<&str> {
        self.data.first().and_then(|t| t["type"].as_str())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_figure_shape() {
        let chart = ChartDescription::new(json!({"height": 400}))
            .with_trace(json!({"type": "pie", "values": [1, 2]}));

        let value = serde_json::to_value(&chart).unwrap();
        assert_eq!(value["data"][0]["type"], "pie");
        assert_eq!(value["layout"]["height"], 400);
        assert_eq!(chart.first_trace_type(), Some("pie"));

        let back = ChartDescription::from_json(&chart.to_json().unwrap()).unwrap();
        assert_eq!(back, chart);
    }
}
