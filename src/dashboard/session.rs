//! Explorer session
//!
//! A session owns one page's selection state and the chart descriptions it
//! has emitted, and processes UI events strictly in order. Each event either
//! replaces every chart (rebuild), patches the chart a parameter targets, or
//! only updates state.
//!
//! An event that fails leaves the session exactly as it was.

use super::error::{DashboardError, Result};
use super::export::PaletteExport;
use super::parameters::{Page, TemplateView, Trigger};
use super::samples::DatasetSource;
use super::selection::{SelectionState, Transition};
use crate::pipeline::build_page;
use crate::plotly::chart::ChartDescription;
use crate::plotly::patch::{apply_in_place, color_patch, compute_patch, Patch};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// UI event as received from the rendering surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UiEvent {
    PaletteChanged { name: String },
    TemplateChanged { name: String },
    /// Controls that fired; exactly one is accepted
    ParamChanged { triggers: Vec<Trigger> },
    ViewChanged { view: TemplateView },
    /// Color the page's target charts with the colors picked by `range`
    ApplyColors,
}

/// What the rendering surface must do after an event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "update", rename_all = "snake_case")]
pub enum SessionUpdate {
    Replace {
        charts: BTreeMap<String, ChartDescription>,
        #[serde(skip_serializing_if = "Option::is_none")]
        export: Option<PaletteExport>,
    },
    Patch {
        patches: BTreeMap<String, Patch>,
    },
    /// Nothing to redraw
    State,
}

pub struct Session<S: DatasetSource> {
    id: Uuid,
    source: S,
    selection: SelectionState,
    charts: BTreeMap<String, ChartDescription>,
    /// Colors applied with `ApplyColors`, re-applied after template rebuilds
    applied_colors: Option<Vec<String>>,
}

impl<S: DatasetSource> Session<S> {
    /// Open a session on `page` with its defaults, returning the initial charts
    pub fn open(page: Page, source: S) -> Result<(Self, SessionUpdate)> {
        let selection = SelectionState::new(page)?;
        let built = build_page(&selection, &source)?;
        let id = Uuid::new_v4();
        log::info!("Session {}: opened {} page", id, page);

        let session = Session {
            id,
            source,
            selection,
            charts: built.charts.clone(),
            applied_colors: None,
        };
        Ok((
            session,
            SessionUpdate::Replace {
                charts: built.charts,
                export: built.export,
            },
        ))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn charts(&self) -> &BTreeMap<String, ChartDescription> {
        &self.charts
    }

    pub fn chart(&self, id: &str) -> Option<&ChartDescription> {
        self.charts.get(id)
    }

    /// Process one event to completion
    pub fn handle(&mut self, event: UiEvent) -> Result<SessionUpdate> {
        log::debug!("Session {}: {:?}", self.id, event);
        let result = match event {
            UiEvent::PaletteChanged { name } => {
                let mut selection = self.selection.clone();
                selection.on_palette_change(&name)?;
                self.rebuild(selection, None)
            }
            UiEvent::TemplateChanged { name } => {
                let mut selection = self.selection.clone();
                selection.on_template_change(&name)?;
                let colors = self.applied_colors.clone();
                self.rebuild(selection, colors)
            }
            UiEvent::ViewChanged { view } => {
                let mut selection = self.selection.clone();
                selection.on_view_change(view)?;
                let colors = self.applied_colors.clone();
                self.rebuild(selection, colors)
            }
            UiEvent::ParamChanged { triggers } => self.param_changed(triggers),
            UiEvent::ApplyColors => self.apply_colors(),
        };

        if let Err(e) = &result {
            log::warn!("Session {}: event rejected: {}", self.id, e);
        }
        result
    }

    fn rebuild(
        &mut self,
        selection: SelectionState,
        colors: Option<Vec<String>>,
    ) -> Result<SessionUpdate> {
        let mut built = build_page(&selection, &self.source)?;
        if let Some(colors) = &colors {
            for (id, patch) in color_patches(&selection, &built.charts, colors)? {
                if let Some(chart) = built.charts.get_mut(&id) {
                    apply_in_place(chart, &patch)?;
                }
            }
        }

        self.selection = selection;
        self.charts = built.charts.clone();
        self.applied_colors = colors;
        Ok(SessionUpdate::Replace {
            charts: built.charts,
            export: built.export,
        })
    }

    fn param_changed(&mut self, triggers: Vec<Trigger>) -> Result<SessionUpdate> {
        let [trigger] = <[Trigger; 1]>::try_from(triggers)
            .map_err(|t| DashboardError::AmbiguousTrigger(t.len()))?;

        let mut selection = self.selection.clone();
        let transition = selection.on_param_change(&trigger.param, trigger.value)?;

        match transition {
            Transition::StateOnly => {
                self.selection = selection;
                Ok(SessionUpdate::State)
            }
            Transition::Rebuild => {
                let colors = self.applied_colors.clone();
                self.rebuild(selection, colors)
            }
            Transition::Patch(trigger) => {
                let chart_id = selection
                    .config()?
                    .params
                    .iter()
                    .find(|p| p.name.as_str() == trigger.param)
                    .and_then(|p| p.chart.clone())
                    .ok_or_else(|| DashboardError::UnknownPatchTarget(trigger.param.clone()))?;
                let target = self
                    .charts
                    .get(&chart_id)
                    .ok_or_else(|| DashboardError::not_found("chart", chart_id.as_str()))?;

                let patch = compute_patch(std::slice::from_ref(&trigger), target)?;
                let mut patched = target.clone();
                apply_in_place(&mut patched, &patch)?;

                self.selection = selection;
                self.charts.insert(chart_id.clone(), patched);
                Ok(SessionUpdate::Patch {
                    patches: BTreeMap::from([(chart_id, patch)]),
                })
            }
        }
    }

    fn apply_colors(&mut self) -> Result<SessionUpdate> {
        let colors = self.selection.chosen_colors()?;
        let patches = color_patches(&self.selection, &self.charts, &colors)?;

        let mut charts = self.charts.clone();
        for (id, patch) in &patches {
            if let Some(chart) = charts.get_mut(id) {
                apply_in_place(chart, patch)?;
            }
        }

        log::info!(
            "Session {}: applied {} color(s) to {} chart(s)",
            self.id,
            colors.len(),
            patches.len()
        );
        self.charts = charts;
        self.applied_colors = Some(colors);
        Ok(SessionUpdate::Patch { patches })
    }
}

/// Color patches for every chart the page colors on request
fn color_patches(
    selection: &SelectionState,
    charts: &BTreeMap<String, ChartDescription>,
    colors: &[String],
) -> Result<BTreeMap<String, Patch>> {
    let mut patches = BTreeMap::new();
    for id in &selection.config()?.apply_colors {
        let chart = charts
            .get(id)
            .ok_or_else(|| DashboardError::not_found("chart", id.as_str()))?;
        patches.insert(id.clone(), color_patch(chart, colors)?);
    }
    Ok(patches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::parameters::ParamValue;
    use crate::dashboard::samples::SampleDatasets;
    use serde_json::json;

    fn open(page: Page) -> Session<SampleDatasets> {
        Session::open(page, SampleDatasets::new().unwrap()).unwrap().0
    }

    fn param(name: &str, value: ParamValue) -> UiEvent {
        UiEvent::ParamChanged {
            triggers: vec![Trigger::new(name, value)],
        }
    }

    #[test]
    fn test_event_json() {
        let event: UiEvent = serde_json::from_value(json!({
            "event": "param_changed",
            "triggers": [{"param": "hole", "value": 0.3}]
        }))
        .unwrap();
        assert_eq!(event, param("hole", ParamValue::Number(0.3)));

        let event: UiEvent = serde_json::from_value(json!({"event": "apply_colors"})).unwrap();
        assert_eq!(event, UiEvent::ApplyColors);
    }

    #[test]
    fn test_param_patch_updates_stored_chart() {
        let mut session = open(Page::Qualitative);
        let update = session.handle(param("hole", ParamValue::Number(0.3))).unwrap();

        let SessionUpdate::Patch { patches } = update else {
            panic!("expected a patch");
        };
        assert_eq!(patches.len(), 1);
        assert_eq!(patches["pie-qualitative"].len(), 1);
        assert_eq!(session.chart("pie-qualitative").unwrap().data[0]["hole"], 0.3);
    }

    #[test]
    fn test_two_triggers_are_ambiguous() {
        let mut session = open(Page::Contour);
        let before = session.charts().clone();
        let result = session.handle(UiEvent::ParamChanged {
            triggers: vec![
                Trigger::new("interval", ParamValue::Integer(3)),
                Trigger::new("reversed", ParamValue::Bool(true)),
            ],
        });
        assert!(matches!(result, Err(DashboardError::AmbiguousTrigger(2))));
        assert_eq!(session.charts(), &before);
    }

    #[test]
    fn test_range_then_apply_colors() {
        let mut session = open(Page::Qualitative);
        assert_eq!(
            session.handle(param("range", ParamValue::Range(2, 5))).unwrap(),
            SessionUpdate::State
        );

        let SessionUpdate::Patch { patches } = session.handle(UiEvent::ApplyColors).unwrap() else {
            panic!("expected patches");
        };
        assert!(patches.contains_key("pie-qualitative"));
        assert!(patches.contains_key("scatter-qualitative"));

        let scatter = session.chart("scatter-qualitative").unwrap();
        assert_eq!(scatter.data[0]["marker"]["color"], "rgb(17, 165, 121)");
    }

    #[test]
    fn test_template_rebuild_keeps_applied_colors() {
        let mut session = open(Page::Qualitative);
        session.handle(UiEvent::ApplyColors).unwrap();
        let colored = session.chart("pie-qualitative").unwrap().data[0]["marker"]["colors"].clone();

        session
            .handle(UiEvent::TemplateChanged {
                name: "seaborn".into(),
            })
            .unwrap();
        let pie = session.chart("pie-qualitative").unwrap();
        assert_eq!(pie.data[0]["marker"]["colors"], colored);
        assert_eq!(pie.layout["paper_bgcolor"], "rgb(234,234,242)");

        session
            .handle(UiEvent::PaletteChanged { name: "Set2".into() })
            .unwrap();
        let pie = session.chart("pie-qualitative").unwrap();
        assert_eq!(pie.data[0]["marker"]["colors"][0], "rgb(102,194,165)");
    }

    #[test]
    fn test_failed_event_keeps_session() {
        let mut session = open(Page::Diverging);
        let charts = session.charts().clone();
        let selection = session.selection().clone();

        assert!(session
            .handle(UiEvent::PaletteChanged { name: "Bold".into() })
            .is_err());
        assert!(session.handle(param("showValues", ParamValue::Integer(1))).is_err());
        assert!(session.handle(UiEvent::ApplyColors).is_err());

        assert_eq!(session.charts(), &charts);
        assert_eq!(session.selection(), &selection);
    }

    #[test]
    fn test_update_json_shape() {
        let mut session = open(Page::Contour);
        let update = session
            .handle(param("reversed", ParamValue::Bool(true)))
            .unwrap();
        let wire = serde_json::to_value(&update).unwrap();

        assert_eq!(wire["update"], "patch");
        let op = &wire["patches"]["contour-plot"]["operations"][0];
        assert_eq!(op["operation"], "Assign");
        assert_eq!(op["location"], json!(["data", 0, "reversescale"]));
        assert_eq!(op["params"]["value"], true);
    }
}
