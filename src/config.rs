//! Explorer configuration
//!
//! Page defaults (palette, template, parameters) come from the embedded
//! pages.json. This module only chooses WHICH page to open and optional
//! starting overrides, from command-line flags and an optional
//! `explorer_config.json` file. Flags win over the file.

use crate::dashboard::error::{DashboardError, Result};
use crate::dashboard::parameters::{page_registry, Page};
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default location of the override file
pub const CONFIG_FILE: &str = "explorer_config.json";

/// Palette explorer: reads UI events as JSON lines on stdin and writes chart
/// replacements and patches as JSON lines on stdout
#[derive(Debug, Clone, Parser)]
#[command(name = "palette_explorer", version, about)]
pub struct Cli {
    /// Page to open (cyclical, diverging, qualitative, sequential, contour, templates)
    #[arg(long)]
    pub page: Option<Page>,

    /// Palette to select after opening the page
    #[arg(long)]
    pub palette: Option<String>,

    /// Template to select after opening the page
    #[arg(long)]
    pub template: Option<String>,

    /// JSON override file
    #[arg(long, default_value = CONFIG_FILE)]
    pub config: PathBuf,

    /// Print pages, palettes and templates as JSON and exit
    #[arg(long)]
    pub list: bool,
}

/// Starting selection; unset fields keep the page defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExplorerConfig {
    pub page: Option<Page>,
    pub palette: Option<String>,
    pub template: Option<String>,
}

impl ExplorerConfig {
    /// Load the override file; a missing file means no overrides
    pub fn load(path: &Path) -> Result<Self> {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No {} found, using page defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(DashboardError::Config(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let config = Self::from_json(&json).map_err(|e| {
            DashboardError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Overlay command-line flags
    pub fn with_cli(self, cli: &Cli) -> Self {
        ExplorerConfig {
            page: cli.page.or(self.page),
            palette: cli.palette.clone().or(self.palette),
            template: cli.template.clone().or(self.template),
        }
    }

    /// The configured page, or the first page pages.json declares
    pub fn resolved_page(&self) -> Result<Page> {
        if let Some(page) = self.page {
            return Ok(page);
        }
        page_registry()?
            .pages()
            .first()
            .map(|p| p.page)
            .ok_or_else(|| DashboardError::Config("pages.json declares no pages".into()))
    }
}
