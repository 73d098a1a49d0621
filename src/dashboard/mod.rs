//! Palette explorer core
//!
//! Registries for palettes, templates and pages, datasets and their sources,
//! per-page selection state, and the session that turns UI events into chart
//! updates.

pub mod colors;
pub mod dataset;
pub mod error;
pub mod export;
pub mod palettes;
pub mod parameters;
pub mod samples;
pub mod selection;
pub mod session;
pub mod templates;

pub use dataset::Dataset;
pub use error::{DashboardError, Result};
pub use export::PaletteExport;
pub use palettes::{palette_registry, ColorScale, PaletteCategory, PaletteRegistry};
pub use parameters::{page_registry, Page, ParamName, ParamValue, TemplateView, Trigger};
pub use samples::{DatasetSource, SampleDatasets};
pub use selection::{SelectionState, Transition};
pub use session::{Session, SessionUpdate, UiEvent};
pub use templates::{template_registry, Template, TemplateRegistry};
