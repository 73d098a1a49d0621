//! Patch engine: targeted mutations of an emitted chart description
//!
//! A `Patch` is an ordered list of `PatchOp`s, each assigning a value at a
//! field path inside `{data, layout}`. Patches serialize in the rendering
//! surface's partial-update wire format:
//!
//! ```json
//! {"__dash_patch_update": "__dash_patch_update",
//!  "operations": [{"operation": "Assign", "location": ["data", 0, "hole"], "params": {"value": 0.3}}]}
//! ```
//!
//! `compute_patch` maps the single control that fired onto its field paths;
//! `apply` runs a patch against a description without mutating the input.

use super::builders::contour;
use super::chart::ChartDescription;
use crate::dashboard::colors::cycle_colors;
use crate::dashboard::error::{DashboardError, Result};
use crate::dashboard::parameters::{ColoringMethod, ParamName, ParamValue, Trigger};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One step of a field path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

/// Location of a field, rooted at `data` or `layout`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// `data[index]`
    pub fn trace(index: usize) -> Self {
        FieldPath(vec![
            PathSegment::Key("data".to_string()),
            PathSegment::Index(index),
        ])
    }

    /// `layout`
    pub fn layout() -> Self {
        FieldPath(vec![PathSegment::Key("layout".to_string())])
    }

    pub fn key(mut self, key: &str) -> Self {
        self.0.push(PathSegment::Key(key.to_string()));
        self
    }

    pub fn index(mut self, index: usize) -> Self {
        self.0.push(PathSegment::Index(index));
        self
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    /// `data[0].contours.size`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(k) if i == 0 => write!(f, "{}", k)?,
                PathSegment::Key(k) => write!(f, ".{}", k)?,
                PathSegment::Index(n) => write!(f, "[{}]", n)?,
            }
        }
        Ok(())
    }
}

/// Assign `value` at `path`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "WireOp", try_from = "WireOp")]
pub struct PatchOp {
    pub path: FieldPath,
    pub value: Value,
}

impl PatchOp {
    pub fn assign(path: FieldPath, value: impl Into<Value>) -> Self {
        PatchOp {
            path,
            value: value.into(),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct WireOp {
    operation: String,
    location: FieldPath,
    params: WireParams,
}

#[derive(Serialize, Deserialize)]
struct WireParams {
    value: Value,
}

const ASSIGN: &str = "Assign";

impl From<PatchOp> for WireOp {
    fn from(op: PatchOp) -> Self {
        WireOp {
            operation: ASSIGN.to_string(),
            location: op.path,
            params: WireParams { value: op.value },
        }
    }
}

impl TryFrom<WireOp> for PatchOp {
    type Error = String;

    fn try_from(wire: WireOp) -> std::result::Result<Self, Self::Error> {
        if wire.operation != ASSIGN {
            return Err(format!("unsupported patch operation '{}'", wire.operation));
        }
        Ok(PatchOp {
            path: wire.location,
            value: wire.params.value,
        })
    }
}

/// Ordered list of operations produced by one trigger
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(into = "WirePatch", from = "WirePatch")]
pub struct Patch {
    pub ops: Vec<PatchOp>,
}

const PATCH_MARKER: &str = "__dash_patch_update";

#[derive(Serialize, Deserialize)]
struct WirePatch {
    #[serde(rename = "__dash_patch_update")]
    marker: String,
    operations: Vec<PatchOp>,
}

impl From<Patch> for WirePatch {
    fn from(patch: Patch) -> Self {
        WirePatch {
            marker: PATCH_MARKER.to_string(),
            operations: patch.ops,
        }
    }
}

impl From<WirePatch> for Patch {
    fn from(wire: WirePatch) -> Self {
        Patch {
            ops: wire.operations,
        }
    }
}

impl Patch {
    pub fn new(ops: Vec<PatchOp>) -> Self {
        Patch { ops }
    }

    pub fn push(&mut self, path: FieldPath, value: impl Into<Value>) {
        self.ops.push(PatchOp::assign(path, value));
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }
}

/// Map the control that fired onto a patch against `target`
///
/// Exactly one trigger is resolved per call. Unknown parameter names have no
/// field mapping (`UnknownPatchTarget`), values of the wrong type are
/// `InvalidParam`. `target` is only read.
pub fn compute_patch(triggers: &[Trigger], target: &ChartDescription) -> Result<Patch> {
    let trigger = match triggers {
        [trigger] => trigger,
        _ => return Err(DashboardError::AmbiguousTrigger(triggers.len())),
    };

    let name: ParamName = trigger.param.parse()?;
    let value = &trigger.value;
    let mut patch = Patch::default();

    match name {
        ParamName::Transpose => {
            let on = expect_bool(name, value)?;
            let (x_title, y_title) = contour::axis_titles(on);
            patch.push(FieldPath::trace(0).key("transpose"), on);
            patch.push(
                FieldPath::layout().key("xaxis").key("title").key("text"),
                x_title,
            );
            patch.push(
                FieldPath::layout().key("yaxis").key("title").key("text"),
                y_title,
            );
            patch.push(
                FieldPath::trace(0).key("hovertemplate"),
                contour::hovertemplate(on),
            );
        }
        ParamName::Reversed => {
            patch.push(
                FieldPath::trace(0).key("reversescale"),
                expect_bool(name, value)?,
            );
        }
        ParamName::Interval => {
            let size = value
                .as_i64()
                .ok_or_else(|| DashboardError::invalid_param(name.as_str(), "expected an integer"))?;
            patch.push(FieldPath::trace(0).key("contours").key("size"), size);
        }
        ParamName::ColoringMethod => {
            let method: ColoringMethod = value
                .as_str()
                .ok_or_else(|| DashboardError::invalid_param(name.as_str(), "expected a string"))?
                .parse()?;
            patch.push(
                FieldPath::trace(0).key("contours").key("coloring"),
                method.as_str(),
            );
        }
        ParamName::Opacity => {
            let opacity = expect_f64(name, value)?;
            for i in 0..target.trace_count() {
                patch.push(FieldPath::trace(i).key("opacity"), opacity);
            }
        }
        ParamName::Hole => {
            patch.push(FieldPath::trace(0).key("hole"), expect_f64(name, value)?);
        }
        ParamName::ShowValues => {
            let text = if expect_bool(name, value)? {
                target
                    .trace(0)
                    .map(|t| t["z"].clone())
                    .ok_or_else(|| DashboardError::InvalidPatchPath("data[0].z".to_string()))?
            } else {
                Value::Null
            };
            patch.push(FieldPath::trace(0).key("text"), text);
        }
        ParamName::Range => {
            // Selecting a range only picks colors; nothing on a chart changes
            return Err(DashboardError::UnknownPatchTarget(name.to_string()));
        }
    }

    log::debug!(
        "compute_patch: '{}' -> {} op(s)",
        trigger.param,
        patch.len()
    );
    Ok(patch)
}

/// Patch that recolors a chart with user-chosen colors
///
/// Pie charts get `data[0].marker.colors`, cycled over the slice count; other
/// charts get `data[i].marker.color = colors[i]` for the first
/// `min(colors, traces)` traces.
pub fn color_patch(target: &ChartDescription, colors: &[String]) -> Result<Patch> {
    if colors.is_empty() {
        return Err(DashboardError::invalid_param("colors", "no colors chosen"));
    }

    let mut patch = Patch::default();
    if target.first_trace_type() == Some("pie") {
        let slices = target
            .trace(0)
            .and_then(|t| t["labels"].as_array())
            .map(|labels| labels.len())
            .unwrap_or(colors.len());
        patch.push(
            FieldPath::trace(0).key("marker").key("colors"),
            cycle_colors(colors, slices),
        );
    } else {
        for (i, color) in colors.iter().take(target.trace_count()).enumerate() {
            patch.push(FieldPath::trace(i).key("marker").key("color"), color.as_str());
        }
    }
    Ok(patch)
}

fn expect_bool(name: ParamName, value: &ParamValue) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| DashboardError::invalid_param(name.as_str(), "expected a boolean"))
}

fn expect_f64(name: ParamName, value: &ParamValue) -> Result<f64> {
    value
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| DashboardError::invalid_param(name.as_str(), "expected a number"))
}

/// Apply a patch, returning the new description
///
/// Works on a copy: either every op applies or the error is returned and
/// nothing changes. Missing object keys along a path are created; missing
/// trace or array indices and non-container intermediates are
/// `InvalidPatchPath`.
pub fn apply(description: &ChartDescription, patch: &Patch) -> Result<ChartDescription> {
    let mut next = description.clone();
    for op in &patch.ops {
        assign(&mut next, op)?;
    }
    Ok(next)
}

/// Apply a patch in place, leaving `description` untouched on failure
pub fn apply_in_place(description: &mut ChartDescription, patch: &Patch) -> Result<()> {
    *description = apply(description, patch)?;
    Ok(())
}

fn invalid_path(path: &FieldPath, reason: &str) -> DashboardError {
    DashboardError::InvalidPatchPath(format!("{}: {}", path, reason))
}

fn assign(chart: &mut ChartDescription, op: &PatchOp) -> Result<()> {
    let path = &op.path;
    match path.segments() {
        [PathSegment::Key(k), PathSegment::Index(index), rest @ ..] if k == "data" => {
            let count = chart.data.len();
            let trace = chart
                .data
                .get_mut(*index)
                .ok_or_else(|| invalid_path(path, &format!("chart has {} trace(s)", count)))?;
            assign_in(trace, rest, op.value.clone(), path)
        }
        [PathSegment::Key(k), rest @ ..] if k == "layout" => {
            assign_in(&mut chart.layout, rest, op.value.clone(), path)
        }
        [PathSegment::Key(k), ..] if k == "data" => Err(invalid_path(
            path,
            "data must be followed by a trace index",
        )),
        _ => Err(invalid_path(path, "path must start at data or layout")),
    }
}

fn assign_in(target: &mut Value, rest: &[PathSegment], value: Value, path: &FieldPath) -> Result<()> {
    let mut current = target;
    for segment in rest {
        current = match segment {
            PathSegment::Key(key) => {
                if current.is_null() {
                    *current = Value::Object(Map::new());
                }
                current
                    .as_object_mut()
                    .ok_or_else(|| invalid_path(path, &format!("'{}' is not inside an object", key)))?
                    .entry(key.clone())
                    .or_insert(Value::Null)
            }
            PathSegment::Index(i) => {
                let items = current
                    .as_array_mut()
                    .ok_or_else(|| invalid_path(path, &format!("[{}] is not inside an array", i)))?;
                let len = items.len();
                items
                    .get_mut(*i)
                    .ok_or_else(|| invalid_path(path, &format!("index {} out of {}", i, len)))?
            }
        };
    }
    *current = value;
    Ok(())
}

/// Value at `path`, if the description has one
pub fn get<'a>(description: &'a ChartDescription, path: &FieldPath) -> Option<&'a Value> {
    let (mut current, rest) = match path.segments() {
        [PathSegment::Key(k), PathSegment::Index(i), rest @ ..] if k == "data" => {
            (description.data.get(*i)?, rest)
        }
        [PathSegment::Key(k), rest @ ..] if k == "layout" => (&description.layout, rest),
        _ => return None,
    };
    for segment in rest {
        current = match segment {
            PathSegment::Key(key) => current.get(key.as_str())?,
            PathSegment::Index(i) => current.get(*i)?,
        };
    }
    Some(current)
}

/// Wire form of a patch as a JSON value
pub fn to_wire(patch: &Patch) -> Result<Value> {
    Ok(serde_json::to_value(patch)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn contour_chart() -> ChartDescription {
        ChartDescription::new(json!({
            "xaxis": {"title": {"text": "Month"}},
            "yaxis": {"title": {"text": "Day"}}
        }))
        .with_trace(json!({
            "type": "contour",
            "z": [[1.0, 2.0], [3.0, 4.0]],
            "transpose": false,
            "reversescale": false,
            "contours": {"size": 2, "coloring": "fill"},
            "hovertemplate": contour::hovertemplate(false)
        }))
    }

    fn scatter_chart(traces: usize) -> ChartDescription {
        (0..traces).fold(ChartDescription::new(json!({})), |chart, i| {
            chart.with_trace(json!({"type": "scatter", "name": format!("t{}", i), "marker": {"color": "#000"}}))
        })
    }

    fn trigger(param: &str, value: ParamValue) -> Vec<Trigger> {
        vec![Trigger::new(param, value)]
    }

    #[test]
    fn test_transpose_patch() {
        let chart = contour_chart();
        let patch = compute_patch(&trigger("transpose", ParamValue::Bool(true)), &chart).unwrap();
        assert_eq!(patch.len(), 4);

        let next = apply(&chart, &patch).unwrap();
        assert_eq!(next.data[0]["transpose"], true);
        assert_eq!(next.layout["xaxis"]["title"]["text"], "Day");
        assert_eq!(next.layout["yaxis"]["title"]["text"], "Month");
        assert_eq!(
            next.data[0]["hovertemplate"],
            "Month: %{y}<br>Day: %{x}<br>Temperature: %{z:.1f}°C<extra></extra>"
        );
        // untouched fields survive
        assert_eq!(next.data[0]["contours"]["size"], 2);
        assert_eq!(next.data[0]["z"], chart.data[0]["z"]);
    }

    #[test]
    fn test_contour_field_paths() {
        let chart = contour_chart();

        let p = compute_patch(&trigger("reversed", ParamValue::Bool(true)), &chart).unwrap();
        assert_eq!(p.ops[0].path.to_string(), "data[0].reversescale");

        let p = compute_patch(&trigger("interval", ParamValue::Integer(5)), &chart).unwrap();
        assert_eq!(p.ops[0].path.to_string(), "data[0].contours.size");
        assert_eq!(p.ops[0].value, json!(5));

        let p = compute_patch(
            &trigger("coloringMethod", ParamValue::Text("heatmap".into())),
            &chart,
        )
        .unwrap();
        assert_eq!(p.ops[0].path.to_string(), "data[0].contours.coloring");
        assert_eq!(p.ops[0].value, json!("heatmap"));
    }

    #[test]
    fn test_opacity_targets_every_trace() {
        let chart = scatter_chart(4);
        let patch = compute_patch(&trigger("opacity", ParamValue::Number(0.4)), &chart).unwrap();
        assert_eq!(patch.len(), 4);

        let next = apply(&chart, &patch).unwrap();
        for (before, after) in chart.data.iter().zip(&next.data) {
            assert_eq!(after["opacity"], 0.4);
            assert_eq!(after["name"], before["name"]);
            assert_eq!(after["marker"], before["marker"]);
        }
        assert_eq!(next.layout, chart.layout);
    }

    #[test]
    fn test_show_values_copies_z() {
        let chart = contour_chart();
        let on = compute_patch(&trigger("showValues", ParamValue::Bool(true)), &chart).unwrap();
        let next = apply(&chart, &on).unwrap();
        assert_eq!(next.data[0]["text"], chart.data[0]["z"]);

        let off = compute_patch(&trigger("showValues", ParamValue::Bool(false)), &next).unwrap();
        assert_eq!(apply(&next, &off).unwrap().data[0]["text"], Value::Null);
    }

    #[test]
    fn test_trigger_errors() {
        let chart = contour_chart();
        assert!(matches!(
            compute_patch(&[], &chart),
            Err(DashboardError::AmbiguousTrigger(0))
        ));

        let two = vec![
            Trigger::new("hole", ParamValue::Number(0.1)),
            Trigger::new("opacity", ParamValue::Number(0.5)),
        ];
        assert!(matches!(
            compute_patch(&two, &chart),
            Err(DashboardError::AmbiguousTrigger(2))
        ));

        assert!(matches!(
            compute_patch(&trigger("zzz", ParamValue::Bool(true)), &chart),
            Err(DashboardError::UnknownPatchTarget(_))
        ));
        assert!(matches!(
            compute_patch(&trigger("transpose", ParamValue::Number(1.5)), &chart),
            Err(DashboardError::InvalidParam { .. })
        ));
        assert!(matches!(
            compute_patch(&trigger("range", ParamValue::Range(1, 4)), &chart),
            Err(DashboardError::UnknownPatchTarget(_))
        ));
    }

    #[test]
    fn test_apply_creates_missing_keys() {
        let chart = scatter_chart(1);
        let patch = Patch::new(vec![PatchOp::assign(
            FieldPath::layout().key("xaxis").key("title").key("text"),
            "Day",
        )]);
        let next = apply(&chart, &patch).unwrap();
        assert_eq!(next.layout["xaxis"]["title"]["text"], "Day");
    }

    #[test]
    fn test_apply_rejects_bad_paths_without_partial_application() {
        let chart = scatter_chart(2);
        let patch = Patch::new(vec![
            PatchOp::assign(FieldPath::trace(0).key("opacity"), 0.5),
            PatchOp::assign(FieldPath::trace(5).key("opacity"), 0.5),
        ]);
        assert!(matches!(
            apply(&chart, &patch),
            Err(DashboardError::InvalidPatchPath(_))
        ));

        let mut in_place = chart.clone();
        assert!(apply_in_place(&mut in_place, &patch).is_err());
        assert_eq!(in_place, chart);

        // "name" is a string, not a container
        let through_leaf = Patch::new(vec![PatchOp::assign(
            FieldPath::trace(0).key("name").key("font"),
            1,
        )]);
        assert!(apply(&chart, &through_leaf).is_err());

        let bad_root = Patch::new(vec![PatchOp::assign(
            FieldPath(vec![PathSegment::Key("frames".into())]),
            1,
        )]);
        assert!(apply(&chart, &bad_root).is_err());
    }

    #[test]
    fn test_color_patch_pie_cycles() {
        let pie = ChartDescription::new(json!({})).with_trace(json!({
            "type": "pie",
            "labels": ["Sat", "Sun", "Thur", "Fri", "Mon"],
            "marker": {"colors": []}
        }));
        let colors: Vec<String> = vec!["a".into(), "b".into(), "c".into()];
        let patch = color_patch(&pie, &colors).unwrap();
        let next = apply(&pie, &patch).unwrap();
        assert_eq!(next.data[0]["marker"]["colors"], json!(["a", "b", "c", "a", "b"]));
    }

    #[test]
    fn test_color_patch_scatter_stops_at_trace_count() {
        let chart = scatter_chart(4);
        let colors: Vec<String> = (0..6).map(|i| format!("c{}", i)).collect();
        let patch = color_patch(&chart, &colors).unwrap();
        assert_eq!(patch.len(), 4);
        let next = apply(&chart, &patch).unwrap();
        assert_eq!(next.data[3]["marker"]["color"], "c3");

        assert!(color_patch(&chart, &[]).is_err());
    }

    #[test]
    fn test_wire_format() {
        let patch = Patch::new(vec![PatchOp::assign(FieldPath::trace(0).key("hole"), 0.3)]);
        let wire = to_wire(&patch).unwrap();
        assert_eq!(
            wire,
            json!({
                "__dash_patch_update": "__dash_patch_update",
                "operations": [
                    {"operation": "Assign", "location": ["data", 0, "hole"], "params": {"value": 0.3}}
                ]
            })
        );

        let back: Patch = serde_json::from_value(wire).unwrap();
        assert_eq!(back, patch);

        let other = json!({"operation": "Delete", "location": ["data"], "params": {"value": null}});
        assert!(serde_json::from_value::<PatchOp>(other).is_err());
    }

    #[test]
    fn test_get_resolves_paths() {
        let chart = contour_chart();
        assert_eq!(
            get(&chart, &FieldPath::trace(0).key("contours").key("size")),
            Some(&json!(2))
        );
        assert_eq!(
            get(&chart, &FieldPath::layout().key("xaxis").key("title").key("text")),
            Some(&json!("Month"))
        );
        assert_eq!(get(&chart, &FieldPath::trace(3).key("x")), None);
    }
}
