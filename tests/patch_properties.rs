//! Property tests for patch application and color cycling

use palette_explorer::dashboard::colors::{cycle_colors, discrete_colors};
use palette_explorer::dashboard::{palette_registry, ColorScale, PaletteCategory};
use palette_explorer::plotly::patch::{apply, color_patch};
use palette_explorer::plotly::{ChartDescription, FieldPath, Patch, PatchOp};
use proptest::prelude::*;
use serde_json::{json, Value};

const TRACES: usize = 3;

fn base_chart() -> ChartDescription {
    let mut chart = ChartDescription::new(json!({
        "xaxis": {"title": {"text": "Month"}},
        "yaxis": {"title": {"text": "Day"}},
    }));
    for i in 0..TRACES {
        chart = chart.with_trace(json!({
            "type": "scatter",
            "name": format!("t{}", i),
            "marker": {"color": "#000000"},
            "contours": {"size": 2, "coloring": "fill"},
        }));
    }
    chart
}

fn leaf_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::from),
        (-1.0e6..1.0e6f64).prop_map(|v| json!(v)),
        (0i64..100).prop_map(Value::from),
        "[a-z#0-9]{0,8}".prop_map(Value::from),
        Just(Value::Null),
    ]
}

/// Paths whose intermediate keys are never assigned as leaves
fn valid_path() -> impl Strategy<Value = FieldPath> {
    let trace_leaf = (
        0..TRACES,
        prop::sample::select(vec!["opacity", "hole", "reversescale", "text", "transpose"]),
    )
        .prop_map(|(i, key)| FieldPath::trace(i).key(key));

    let trace_nested = (
        0..TRACES,
        prop::sample::select(vec![
            ("marker", "color"),
            ("marker", "colors"),
            ("contours", "size"),
            ("contours", "coloring"),
        ]),
    )
        .prop_map(|(i, (parent, key))| FieldPath::trace(i).key(parent).key(key));

    let layout_leaf = prop::sample::select(vec!["xaxis", "yaxis"])
        .prop_map(|axis| FieldPath::layout().key(axis).key("title").key("text"));

    prop_oneof![trace_leaf, trace_nested, layout_leaf]
}

fn patch() -> impl Strategy<Value = Patch> {
    prop::collection::vec((valid_path(), leaf_value()), 1..8).prop_map(|ops| {
        Patch::new(
            ops.into_iter()
                .map(|(path, value)| PatchOp::assign(path, value))
                .collect(),
        )
    })
}

fn scale(len: usize) -> ColorScale {
    ColorScale::new(
        "Prop",
        PaletteCategory::Qualitative,
        (0..len).map(|i| format!("#{:06x}", i * 0x111)).collect(),
    )
}

proptest! {
    #[test]
    fn prop_apply_is_idempotent(patch in patch()) {
        let chart = base_chart();
        let once = apply(&chart, &patch).unwrap();
        let twice = apply(&once, &patch).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_apply_leaves_input_untouched(patch in patch()) {
        let chart = base_chart();
        let snapshot = chart.clone();
        let _ = apply(&chart, &patch).unwrap();
        prop_assert_eq!(chart, snapshot);
    }

    #[test]
    fn prop_discrete_colors_cycle(len in 1usize..12, n in 0usize..40) {
        let s = scale(len);
        let colors = discrete_colors(&s, n).unwrap();
        prop_assert_eq!(colors.len(), n);
        for (i, color) in colors.iter().enumerate() {
            prop_assert_eq!(color, &s.colors[i % len]);
        }
    }

    #[test]
    fn prop_pie_color_patch_cycles_over_slices(len in 1usize..12, slices in 1usize..20) {
        let labels: Vec<String> = (0..slices).map(|i| format!("s{}", i)).collect();
        let pie = ChartDescription::default()
            .with_trace(json!({"type": "pie", "labels": labels, "values": vec![1; slices]}));
        let s = scale(len);

        let patched = apply(&pie, &color_patch(&pie, &s.colors).unwrap()).unwrap();
        prop_assert_eq!(
            &patched.data[0]["marker"]["colors"],
            &json!(cycle_colors(&s.colors, slices))
        );
    }
}

#[test]
fn test_every_registry_color_is_a_non_empty_string() {
    let registry = palette_registry().unwrap();
    for category in PaletteCategory::ALL {
        let names = registry.list(category);
        assert!(!names.is_empty(), "no {} palettes", category);
        for name in names {
            let scale = registry.get(category, name).unwrap();
            assert!(!scale.colors.is_empty(), "{} is empty", name);
            assert!(scale.colors.iter().all(|c| !c.trim().is_empty()));
        }
    }
}

#[test]
fn test_reversed_variant_is_exact_reversal() {
    let registry = palette_registry().unwrap();
    for category in PaletteCategory::ALL {
        for name in registry.list(category).iter().filter(|n| !n.ends_with("_r")) {
            let base = registry.get(category, name).unwrap();
            let reversed = registry.get(category, &format!("{}_r", name)).unwrap();
            let mut expected = base.colors.clone();
            expected.reverse();
            assert_eq!(reversed.colors, expected, "{}_r", name);
        }
    }
}
