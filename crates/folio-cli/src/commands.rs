use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use folio_registry::{LoggingListener, RegistryCell, RegistryConfig, SettingsRegistry};
use folio_types::{ApplicationSettings, DocumentKey, DocumentSettings, PageIndex};
use tracing::debug;

use crate::cli::*;

/// What a command produced, rendered once it has finished.
pub enum Report {
    Settings(Arc<ApplicationSettings>),
    Document(Arc<DocumentSettings>),
    Documents(Vec<Arc<DocumentSettings>>),
    Reset,
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = RegistryConfig {
        settings_file: cli.settings.clone(),
        store_dir: cli.store.clone(),
    };
    if config.store_dir.is_none() {
        debug!("no --store given, document settings will not outlive this run");
    }
    let cell = RegistryCell::new();
    let registry = cell
        .initialize(&config)
        .context("failed to open settings registry")?;
    registry.add_listener(Arc::new(LoggingListener))?;

    let report = execute(&registry, cli.command)?;
    println!("{}", render(&report, &cli.format)?);
    Ok(())
}

pub fn execute(registry: &SettingsRegistry, command: Command) -> anyhow::Result<Report> {
    match command {
        Command::Settings => Ok(Report::Settings(registry.application_settings()?)),
        Command::Open(args) => {
            let key = DocumentKey::new(args.key)?;
            Ok(Report::Document(registry.select_document(&key)?))
        }
        Command::List(args) => cmd_list(registry, args),
        Command::Page(args) => cmd_page(registry, args),
        Command::Zoom(args) => cmd_zoom(registry, args),
        Command::Layout(args) => cmd_layout(registry, args),
        Command::Reset => {
            registry.delete_all()?;
            Ok(Report::Reset)
        }
    }
}

fn cmd_list(registry: &SettingsRegistry, args: ListArgs) -> anyhow::Result<Report> {
    let docs = if args.all {
        registry.all_documents()?.into_values().collect()
    } else {
        registry.recent_document()?.into_iter().collect()
    };
    Ok(Report::Documents(docs))
}

fn cmd_page(registry: &SettingsRegistry, args: PageArgs) -> anyhow::Result<Report> {
    let doc = registry.select_document(&DocumentKey::new(args.key)?)?;
    registry.on_current_page_changed(doc.current_page, PageIndex::new(args.doc, args.view))?;
    current(registry)
}

fn cmd_zoom(registry: &SettingsRegistry, args: ZoomArgs) -> anyhow::Result<Report> {
    registry.select_document(&DocumentKey::new(args.key)?)?;
    registry.on_zoom_changed(args.value)?;
    current(registry)
}

fn cmd_layout(registry: &SettingsRegistry, args: LayoutArgs) -> anyhow::Result<Report> {
    registry.select_document(&DocumentKey::new(args.key.as_str())?)?;
    let mut editor = registry.edit_current()?;
    editor.update(|doc| {
        if let Some(split) = args.split_pages() {
            doc.layout.split_pages = split;
        }
        if let Some(single) = args.single_page() {
            doc.layout.single_page = single;
        }
        if let Some(align) = args.align {
            doc.layout.page_align = align.into();
        }
        if let Some(animation) = args.animation {
            doc.layout.animation = animation.into();
        }
    })?;
    editor.commit()?;
    current(registry)
}

fn current(registry: &SettingsRegistry) -> anyhow::Result<Report> {
    let doc = registry
        .current_document()?
        .context("no document is open")?;
    Ok(Report::Document(doc))
}

pub fn render(report: &Report, format: &OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => render_json(report),
        OutputFormat::Text => Ok(render_text(report)),
    }
}

fn render_json(report: &Report) -> anyhow::Result<String> {
    let value = match report {
        Report::Settings(app) => serde_json::to_value(app.as_ref())?,
        Report::Document(doc) => serde_json::to_value(doc.as_ref())?,
        Report::Documents(docs) => {
            let docs: Vec<&DocumentSettings> = docs.iter().map(|d| d.as_ref()).collect();
            serde_json::to_value(docs)?
        }
        Report::Reset => serde_json::json!({ "reset": true }),
    };
    Ok(serde_json::to_string_pretty(&value)?)
}

fn render_text(report: &Report) -> String {
    match report {
        Report::Settings(app) => settings_text(app),
        Report::Document(doc) => document_text(doc),
        Report::Documents(docs) if docs.is_empty() => "No stored documents.".to_string(),
        Report::Documents(docs) => docs
            .iter()
            .map(|d| document_text(d))
            .collect::<Vec<_>>()
            .join("\n"),
        Report::Reset => format!("{} All document settings deleted.", "✓".green().bold()),
    }
}

fn yes_no(value: bool) -> colored::ColoredString {
    if value { "yes".green() } else { "no".dimmed() }
}

fn settings_text(app: &ApplicationSettings) -> String {
    let defaults = &app.document_defaults;
    [
        format!("{}", "Application settings".bold()),
        format!("  night mode:     {}", yes_no(app.night_mode)),
        format!("  keep screen on: {}", yes_no(app.keep_screen_on)),
        format!("  full screen:    {}", yes_no(app.full_screen)),
        format!("  show title:     {}", yes_no(app.show_title)),
        format!("  page in title:  {}", yes_no(app.page_in_title)),
        format!("  brightness:     {}", app.brightness),
        format!("  max zoom:       {:.2}", app.max_zoom),
        format!(
            "  defaults:       split={} single={} align={} animation={}",
            yes_no(defaults.split_pages),
            yes_no(defaults.single_page),
            defaults.page_align.to_string().cyan(),
            defaults.animation.to_string().cyan(),
        ),
    ]
    .join("\n")
}

fn document_text(doc: &DocumentSettings) -> String {
    let updated = doc
        .last_updated_at()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "unknown".to_string());
    [
        format!("{}", doc.key.as_str().yellow().bold()),
        format!("  page:    {}", doc.current_page),
        format!("  zoom:    {:.2}", doc.zoom),
        format!(
            "  layout:  split={} single={} align={} animation={}",
            yes_no(doc.layout.split_pages),
            yes_no(doc.layout.single_page),
            doc.layout.page_align.to_string().cyan(),
            doc.layout.animation.to_string().cyan(),
        ),
        format!("  updated: {}", updated.dimmed()),
    ]
    .join("\n")
}
