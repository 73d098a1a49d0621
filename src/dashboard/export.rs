//! Palette export: the selected scale as a color list and a Python snippet

use super::palettes::ColorScale;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaletteExport {
    pub category: String,
    pub name: String,
    pub colors: Vec<String>,
    /// Python code that loads the same scale with plotly.express
    pub code: String,
}

impl PaletteExport {
    pub fn from_scale(scale: &ColorScale) -> Self {
        let category = scale.category.as_str();
        PaletteExport {
            category: category.to_string(),
            name: scale.name.clone(),
            colors: scale.colors.clone(),
            code: format!(
                "import plotly.express as px\npx.colors.{}.{}",
                category, scale.name
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::palettes::palette_registry;

    #[test]
    fn test_export_reversed_qualitative() {
        let scale = palette_registry()
            .unwrap()
            .get_palette("qualitative", "Bold_r")
            .unwrap();
        let export = PaletteExport::from_scale(scale);

        assert_eq!(export.code, "import plotly.express as px\npx.colors.qualitative.Bold_r");
        assert_eq!(export.colors.first().map(String::as_str), Some("rgb(165, 170, 153)"));
        assert_eq!(export.colors.len(), 11);
    }
}
