//! Per-page selection state
//!
//! Holds the selected palette, template, view and adjustable parameters of one
//! page, and decides for every change whether the page's charts must be
//! rebuilt, patched, or left alone.
//!
//! All change handlers validate first and mutate last: on error the state is
//! exactly what it was before the call.

use super::error::{DashboardError, Result};
use super::palettes::{ColorScale, PaletteCategory};
use super::parameters::{
    page_registry, Page, PageConfig, ParamName, ParamValue, TemplateView, Trigger,
};
use super::templates::{template_registry, Template};
use std::collections::BTreeMap;

/// What the caller must do after a successful change
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Rebuild every chart of the page
    Rebuild,
    /// Patch the chart the parameter targets
    Patch(Trigger),
    /// State changed; no chart is affected yet
    StateOnly,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionState {
    page: Page,
    /// Canonical registry name; none on pages without palette selection
    palette: Option<String>,
    template: String,
    view: Option<TemplateView>,
    params: BTreeMap<ParamName, ParamValue>,
}

impl SelectionState {
    /// State with the page's declared defaults
    pub fn new(page: Page) -> Result<Self> {
        let config = page_registry()?.get(page)?;
        let scale = match &config.palette {
            Some(name) => Some(config.resolve_palette(name)?),
            None => None,
        };

        Ok(SelectionState {
            page,
            palette: scale.map(|s| s.name.clone()),
            template: config.template.clone(),
            view: config.view,
            params: config.defaults(scale.map(|s| s.len())),
        })
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn config(&self) -> Result<&'static PageConfig> {
        page_registry()?.get(self.page)
    }

    pub fn palette_name(&self) -> Option<&str> {
        self.palette.as_deref()
    }

    pub fn template_name(&self) -> &str {
        &self.template
    }

    pub fn view(&self) -> Option<TemplateView> {
        self.view
    }

    pub fn param(&self, name: ParamName) -> Option<&ParamValue> {
        self.params.get(&name)
    }

    pub fn params(&self) -> &BTreeMap<ParamName, ParamValue> {
        &self.params
    }

    /// The selected color scale
    ///
    /// Pages without palette selection use the template's sequential
    /// colorscale.
    pub fn scale(&self) -> Result<ColorScale> {
        match &self.palette {
            Some(name) => Ok(self.config()?.resolve_palette(name)?.clone()),
            None => {
                let template = self.template()?;
                Ok(ColorScale::new(
                    template.name.clone(),
                    PaletteCategory::Sequential,
                    template.sequential.clone(),
                ))
            }
        }
    }

    pub fn template(&self) -> Result<&'static Template> {
        template_registry()?.get_template(&self.template)
    }

    /// Select a palette and reset the page's parameters to their defaults
    pub fn on_palette_change(&mut self, name: &str) -> Result<Transition> {
        let config = self.config()?;
        let scale = config.resolve_palette(name)?;

        self.palette = Some(scale.name.clone());
        self.params = config.defaults(Some(scale.len()));
        log::info!(
            "{} page: palette '{}' ({} colors), parameters reset",
            self.page,
            scale.name,
            scale.len()
        );
        Ok(Transition::Rebuild)
    }

    /// Select a template; parameters are kept
    pub fn on_template_change(&mut self, name: &str) -> Result<Transition> {
        let template = template_registry()?.get_template(name)?;

        self.template = template.name.clone();
        log::info!("{} page: template '{}'", self.page, template.name);
        Ok(Transition::Rebuild)
    }

    /// Validate and store one parameter value
    pub fn on_param_change(&mut self, name: &str, value: ParamValue) -> Result<Transition> {
        let config = self.config()?;
        let param: ParamName = name.parse()?;
        let def = config.param(param).ok_or_else(|| {
            DashboardError::invalid_param(
                name,
                format!("not adjustable on the {} page", self.page),
            )
        })?;

        let palette_len = match &self.palette {
            Some(palette) => Some(config.resolve_palette(palette)?.len()),
            None => None,
        };
        let value = def.check(&value, palette_len)?;

        log::debug!("{} page: {} = {:?}", self.page, param, value);
        self.params.insert(param, value.clone());

        Ok(match def.chart {
            Some(_) => Transition::Patch(Trigger::new(param.as_str(), value)),
            None => Transition::StateOnly,
        })
    }

    /// Switch between the templates page's colorway and colorscale views
    pub fn on_view_change(&mut self, view: TemplateView) -> Result<Transition> {
        if self.view.is_none() {
            return Err(DashboardError::invalid_param(
                "view",
                format!("the {} page has no views", self.page),
            ));
        }

        self.view = Some(view);
        log::info!("{} page: view {:?}", self.page, view);
        Ok(Transition::Rebuild)
    }

    /// Colors picked by the `range` parameter, positions `low..=high` (1-based)
    pub fn chosen_colors(&self) -> Result<Vec<String>> {
        let (low, high) = self
            .param(ParamName::Range)
            .and_then(ParamValue::as_range)
            .ok_or_else(|| {
                DashboardError::invalid_param(
                    "range",
                    format!("no color range on the {} page", self.page),
                )
            })?;

        let scale = self.scale()?;
        let colors = scale
            .colors
            .get(low.saturating_sub(1) as usize..high as usize)
            .ok_or_else(|| {
                DashboardError::invalid_param(
                    "range",
                    format!("[{}, {}] exceeds {} colors", low, high, scale.len()),
                )
            })?;
        Ok(colors.to_vec())
    }

    pub(crate) fn bool_param(&self, name: ParamName) -> Result<bool> {
        self.typed_param(name, ParamValue::as_bool)
    }

    pub(crate) fn f64_param(&self, name: ParamName) -> Result<f64> {
        self.typed_param(name, ParamValue::as_f64)
    }

    pub(crate) fn i64_param(&self, name: ParamName) -> Result<i64> {
        self.typed_param(name, ParamValue::as_i64)
    }

    pub(crate) fn text_param(&self, name: ParamName) -> Result<&str> {
        self.typed_param(name, ParamValue::as_str)
    }

    fn typed_param<'a, T>(
        &'a self,
        name: ParamName,
        read: impl Fn(&'a ParamValue) -> Option<T>,
    ) -> Result<T> {
        self.params
            .get(&name)
            .and_then(read)
            .ok_or_else(|| {
                DashboardError::invalid_param(
                    name.as_str(),
                    format!("not set on the {} page", self.page),
                )
            })
    }
}
