use bytes::Bytes;
use clap::Parser;
use colored::*;
use directories::ProjectDirs;
use sprint::config::SprintConfig;
use sprint::error::{Result, SprintError};
use sprint::logging::init_logging;
use sprint::markup;
use sprint::model::Note;
use sprint::repository::NoteRepository;
use sprint::richtext::{
    apply_bullet_style, apply_paragraph_style, toggle_facet, AttributeSet, AttributedBuffer,
    Facet, FontSlant, FontWeight, InlineObject, TextStyle, OBJECT_REPLACEMENT_CHAR,
};
use sprint::service::DocumentService;
use sprint::store::fs::FileStore;
use std::path::PathBuf;
use std::sync::Arc;
use unicode_width::UnicodeWidthStr;

mod args;
use args::{Cli, Commands, FormatAction};

const DATA_DIR_ENV: &str = "SPRINT_HOME";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

struct AppContext {
    service: DocumentService,
    repository: NoteRepository,
    config: SprintConfig,
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut ctx = init_context(&cli).await?;

    match cli.command {
        Some(Commands::Create {
            title,
            markup,
            images,
        }) => handle_create(&mut ctx, title, markup, images).await,
        Some(Commands::List) | None => handle_list(&ctx),
        Some(Commands::View { id, markup }) => handle_view(&ctx, &id, markup),
        Some(Commands::Format {
            id,
            action,
            start,
            end,
        }) => handle_format(&mut ctx, &id, action, start..end).await,
    }
}

fn resolve_data_dir(cli: &Cli) -> Result<PathBuf> {
    if let Some(dir) = &cli.data_dir {
        return Ok(dir.clone());
    }
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    ProjectDirs::from("com", "sprint", "sprint")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| SprintError::Config("Could not determine data directory".to_string()))
}

async fn init_context(cli: &Cli) -> Result<AppContext> {
    let data_dir = resolve_data_dir(cli)?;
    let config = SprintConfig::load(&data_dir)?;

    let level = if cli.verbose {
        "debug"
    } else {
        config.log_level.as_str()
    };
    init_logging(level)?;
    tracing::debug!("using data dir {}", data_dir.display());

    let store = Arc::new(FileStore::new(data_dir));
    let service = DocumentService::from_config(store.clone(), store, &config);

    let mut repository = NoteRepository::new();
    repository.refresh(&service).await?;

    Ok(AppContext {
        service,
        repository,
        config,
    })
}

async fn handle_create(
    ctx: &mut AppContext,
    title: String,
    markup: Option<String>,
    images: Vec<PathBuf>,
) -> Result<()> {
    let mut body = match markup {
        Some(markup) => markup::decode(&markup)?,
        None => AttributedBuffer::new(),
    };

    for path in images {
        let payload = std::fs::read(&path)?;
        if !body.is_empty() {
            body.push_str("\n", AttributeSet::plain());
        }
        body.push_object(
            InlineObject::new(Bytes::from(payload)).with_size(ctx.config.image_size()),
            AttributeSet::plain(),
        );
    }

    let note = ctx
        .repository
        .save(&ctx.service, Note::with_body(title, body))
        .await?;
    println!(
        "{}",
        format!("Created note {}: {}", short_id(note), note.title).green()
    );
    Ok(())
}

fn handle_view(ctx: &AppContext, id: &str, raw: bool) -> Result<()> {
    let note = ctx.repository.find(id)?;
    if raw {
        println!("{}", markup::encode(&note.body)?);
        return Ok(());
    }

    println!("{} {}", short_id(note).yellow(), note.title.bold());
    println!("--------------------------------");
    println!("{}", render(&note.body));
    Ok(())
}

async fn handle_format(
    ctx: &mut AppContext,
    id: &str,
    action: FormatAction,
    range: std::ops::Range<usize>,
) -> Result<()> {
    let mut note = ctx.repository.find(id)?.clone();

    let message = match action {
        FormatAction::Bold => toggled(&mut note, range, Facet::Bold, "bold")?,
        FormatAction::Italic => toggled(&mut note, range, Facet::Italic, "italic")?,
        FormatAction::Underline => toggled(&mut note, range, Facet::Underline, "underline")?,
        FormatAction::Strikethrough => {
            toggled(&mut note, range, Facet::Strikethrough, "strikethrough")?
        }
        FormatAction::Bullet => {
            apply_bullet_style(&mut note.body, range)?;
            "Applied bullet style".to_string()
        }
        FormatAction::Title => restyled(&mut note, range, TextStyle::Title)?,
        FormatAction::Heading => restyled(&mut note, range, TextStyle::Heading)?,
        FormatAction::Subheading => restyled(&mut note, range, TextStyle::Subheading)?,
        FormatAction::Body => restyled(&mut note, range, TextStyle::Body)?,
    };

    ctx.repository.save(&ctx.service, note).await?;
    println!("{}", message.green());
    Ok(())
}

fn toggled(
    note: &mut Note,
    range: std::ops::Range<usize>,
    facet: Facet,
    name: &str,
) -> Result<String> {
    let on = toggle_facet(&mut note.body, range, facet)?;
    Ok(format!("{} {}", name, if on { "on" } else { "off" }))
}

fn restyled(note: &mut Note, range: std::ops::Range<usize>, style: TextStyle) -> Result<String> {
    apply_paragraph_style(&mut note.body, range, style)?;
    let name = format!("{style:?}").to_lowercase();
    Ok(format!("Applied {name} style"))
}

fn short_id(note: &Note) -> String {
    note.id().to_string()[..8].to_string()
}

/// Terminal rendering of a body: facets become ANSI styles, objects a marker.
fn render(body: &AttributedBuffer) -> String {
    let mut out = String::new();
    let mut chars = body.text().chars();
    for run in body.runs() {
        let text: String = chars
            .by_ref()
            .take(run.len())
            .map(|c| if c == OBJECT_REPLACEMENT_CHAR { '▣' } else { c })
            .collect();
        let attrs = &run.attributes;
        let mut styled = text.normal();
        if attrs.weight == FontWeight::Bold {
            styled = styled.bold();
        }
        if attrs.slant == FontSlant::Italic {
            styled = styled.italic();
        }
        if attrs.underline {
            styled = styled.underline();
        }
        if attrs.strikethrough {
            styled = styled.strikethrough();
        }
        if attrs.reference.is_some() {
            styled = styled.cyan();
        }
        out.push_str(&styled.to_string());
    }
    out
}

const LINE_WIDTH: usize = 100;
const TIME_WIDTH: usize = 18;
const ID_WIDTH: usize = 10;

fn handle_list(ctx: &AppContext) -> Result<()> {
    let notes = ctx.repository.notes();
    if notes.is_empty() {
        println!("No notes found.");
        return Ok(());
    }

    let available = LINE_WIDTH.saturating_sub(ID_WIDTH + TIME_WIDTH);
    for note in notes {
        let preview: String = note
            .body
            .text()
            .chars()
            .take(50)
            .filter(|&c| c != OBJECT_REPLACEMENT_CHAR)
            .map(|c| if c == '\n' { ' ' } else { c })
            .collect();
        let title_content = if preview.is_empty() {
            note.title.clone()
        } else {
            format!("{} {}", note.title, preview)
        };

        let title_display = truncate_to_width(&title_content, available);
        let padding = available.saturating_sub(title_display.width());
        let updated = note.updated_at.format("%Y-%m-%d %H:%M").to_string();

        let id = format!("{:<width$}", short_id(note), width = ID_WIDTH);

        println!(
            "{}{}{}{}",
            id.yellow(),
            title_display,
            " ".repeat(padding),
            updated.dimmed()
        );
    }
    Ok(())
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    use unicode_width::UnicodeWidthChar;

    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }

    result
}
