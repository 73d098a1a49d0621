//! Visual templates (named bundles of default styling)
//!
//! Loaded from templates.json (embedded at compile time). Each template carries
//! its background color plus the defaults charts fall back to when no palette
//! drives a color: the discrete colorway and the sequential colorscale.

use super::colors::parse_css_color;
use super::error::{DashboardError, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Embedded templates.json content
const TEMPLATES_JSON: &str = include_str!("../../templates.json");

/// Global template registry, built on first access
static TEMPLATE_REGISTRY: Lazy<std::result::Result<TemplateRegistry, String>> =
    Lazy::new(|| TemplateRegistry::from_json(TEMPLATES_JSON).map_err(|e| e.to_string()));

/// Get the process-wide template registry
pub fn template_registry() -> Result<&'static TemplateRegistry> {
    TEMPLATE_REGISTRY
        .as_ref()
        .map_err(|e| DashboardError::Config(e.clone()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    /// Paper background color
    pub background: String,
    /// Plot area background color
    pub plot_background: String,
    pub font_color: String,
    /// Default discrete colors
    pub colorway: Vec<String>,
    /// Default sequential colorscale colors
    pub sequential: Vec<String>,
}

impl Template {
    /// Template styling as an inline Plotly `layout.template` object
    pub fn to_layout_template(&self) -> Value {
        json!({
            "layout": {
                "colorway": self.colorway,
                "colorscale": {
                    "sequential": crate::dashboard::colors::normalized_stops(&self.sequential),
                },
                "plot_bgcolor": self.plot_background,
                "paper_bgcolor": self.background,
                "font": { "color": self.font_color },
            }
        })
    }

    fn validate(&self) -> Result<()> {
        let fields = [&self.background, &self.plot_background, &self.font_color];
        let colors = fields
            .into_iter()
            .chain(self.colorway.iter())
            .chain(self.sequential.iter());
        for color in colors {
            if parse_css_color(color).is_none() {
                return Err(DashboardError::Config(format!(
                    "template '{}' has invalid color '{}'",
                    self.name, color
                )));
            }
        }
        if self.colorway.is_empty() || self.sequential.len() < 2 {
            return Err(DashboardError::Config(format!(
                "template '{}' needs a colorway and at least two sequential colors",
                self.name
            )));
        }
        Ok(())
    }
}

/// Ordered list of templates
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: Vec<Template>,
}

impl TemplateRegistry {
    pub fn from_json(json: &str) -> Result<Self> {
        let templates: Vec<Template> = serde_json::from_str(json).map_err(|e| {
            DashboardError::Config(format!("Failed to parse templates JSON: {}", e))
        })?;

        for (i, template) in templates.iter().enumerate() {
            template.validate()?;
            if templates[..i].iter().any(|t| t.name == template.name) {
                return Err(DashboardError::Config(format!(
                    "duplicate template '{}'",
                    template.name
                )));
            }
        }

        log::debug!("TemplateRegistry: Loaded {} templates", templates.len());
        Ok(Self { templates })
    }

    /// All templates in registry order
    pub fn list_templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn names(&self) -> Vec<&str> {
        self.templates.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn get_template(&self, name: &str) -> Result<&Template> {
        self.templates
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| DashboardError::not_found("template", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_order_and_backgrounds() {
        let registry = template_registry().unwrap();
        assert_eq!(
            registry.names(),
            vec![
                "ggplot2",
                "seaborn",
                "simple_white",
                "plotly",
                "plotly_white",
                "plotly_dark"
            ]
        );
        assert_eq!(
            registry.get_template("plotly").unwrap().background,
            "#E5ECF6"
        );
        assert_eq!(
            registry.get_template("plotly_dark").unwrap().background,
            "rgb(17,17,17)"
        );
    }

    #[test]
    fn test_unknown_template() {
        let registry = template_registry().unwrap();
        assert!(matches!(
            registry.get_template("solarized"),
            Err(DashboardError::NotFound { .. })
        ));
    }

    #[test]
    fn test_layout_template_is_inline() {
        let registry = template_registry().unwrap();
        let t = registry.get_template("ggplot2").unwrap().to_layout_template();
        assert_eq!(t["layout"]["paper_bgcolor"], "rgb(237,237,237)");
        assert_eq!(t["layout"]["colorway"][0], "#F8766D");
        assert_eq!(t["layout"]["colorscale"]["sequential"][0][0], 0.0);
    }
}
