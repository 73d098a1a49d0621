//! Palette Explorer - Main entry point
//!
//! Opens one explorer page, writes its initial charts, then processes UI
//! events read as JSON lines on stdin. Every event produces exactly one JSON
//! line on stdout: a chart replacement, a set of patches, a state
//! acknowledgement, or an error. Logs go to stderr (`RUST_LOG`, default
//! `info`).

use anyhow::{Context, Result};
use clap::Parser;
use palette_explorer::config::{Cli, ExplorerConfig};
use palette_explorer::dashboard::{
    page_registry, palette_registry, template_registry, PaletteCategory, SampleDatasets, Session,
    SessionUpdate, UiEvent,
};
use serde::Serialize;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Palette Explorer v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();

    // Fail early on broken embedded registries
    let palettes = palette_registry().context("loading palettes")?;
    let templates = template_registry().context("loading templates")?;
    let pages = page_registry().context("loading pages")?;
    log::info!(
        "Registries loaded: {} palettes, {} templates, {} pages",
        palettes.len(),
        templates.list_templates().len(),
        pages.pages().len()
    );

    let mut stdout = tokio::io::stdout();

    if cli.list {
        let listing = json!({
            "pages": pages.pages().iter().map(|p| p.page).collect::<Vec<_>>(),
            "palettes": PaletteCategory::ALL
                .iter()
                .map(|c| (c.as_str(), palettes.list(*c)))
                .collect::<std::collections::BTreeMap<_, _>>(),
            "colorscales": palettes.named_colorscales(),
            "templates": templates.names(),
        });
        write_line(&mut stdout, &listing).await?;
        return Ok(());
    }

    let config = ExplorerConfig::load(&cli.config)?.with_cli(&cli);
    let page = config.resolved_page()?;
    let source = SampleDatasets::new().context("generating sample datasets")?;

    let (mut session, mut update) = Session::open(page, source)?;
    log::info!("Session {} on {} page", session.id(), page);

    // Starting overrides replace the initial charts
    if let Some(name) = &config.palette {
        update = session
            .handle(UiEvent::PaletteChanged { name: name.clone() })
            .with_context(|| format!("selecting palette '{}'", name))?;
    }
    if let Some(name) = &config.template {
        update = session
            .handle(UiEvent::TemplateChanged { name: name.clone() })
            .with_context(|| format!("selecting template '{}'", name))?;
    }
    write_line(&mut stdout, &update).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut handled = 0usize;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let reply = match serde_json::from_str::<UiEvent>(line) {
            Ok(event) => match session.handle(event) {
                Ok(update) => to_value(&update)?,
                Err(e) => json!({"update": "error", "message": e.to_string()}),
            },
            Err(e) => {
                log::warn!("Unreadable event: {}", e);
                json!({"update": "error", "message": format!("unreadable event: {}", e)})
            }
        };
        write_line(&mut stdout, &reply).await?;
        handled += 1;
    }

    log::info!("Session {}: {} event(s) handled, input closed", session.id(), handled);
    Ok(())
}

fn to_value(update: &SessionUpdate) -> Result<serde_json::Value> {
    serde_json::to_value(update).context("serializing update")
}

async fn write_line<T: Serialize>(stdout: &mut Stdout, value: &T) -> Result<()> {
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');
    stdout.write_all(&line).await?;
    stdout.flush().await?;
    Ok(())
}
