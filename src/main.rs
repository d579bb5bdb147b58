use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use exfile::hub::extract::excerpt;
use exfile::hub::upload::read_uploads;
use exfile::hub::{ConnectivitySignal, ContentPayload, FileHub, FileRecord, Theme, ViewMode};
use exfile::Config;

/// Characters of text content shown by `show`.
const PREVIEW_CHARS: usize = 5_000;

#[derive(Parser, Debug)]
#[command(name = "exfile", version, about = "Smart file hub with AI classification")]
struct Cli {
    /// Path to config.toml (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Skip the AI service and use the offline heuristics
    #[arg(long, global = true)]
    offline: bool,

    /// Verbose logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload and classify files
    Upload {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// List files
    List {
        /// Show the trash instead of active files
        #[arg(long)]
        trash: bool,
        /// Group by suggested folder
        #[arg(long, conflicts_with = "trash")]
        folders: bool,
    },
    /// Show one file in detail
    Show { id: String },
    /// Search by meaning (online) or by name and tags
    Search {
        query: String,
        #[arg(long)]
        trash: bool,
    },
    /// Move a file to the trash
    Trash { id: String },
    /// Restore a file from the trash
    Restore { id: String },
    /// Delete a file permanently
    Purge { id: String },
    /// Show or change the theme preference
    Theme { mode: Option<ThemeArg> },
    /// Print the JSON Schema of config.toml
    ConfigSchema,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ThemeArg {
    Light,
    Dark,
    Toggle,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "exfile=debug" } else { "exfile=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Command::ConfigSchema = cli.command {
        println!("{}", Config::json_schema()?);
        return Ok(());
    }

    let config = Config::load(cli.config.as_deref())?;
    let mut hub = FileHub::open(&config, ConnectivitySignal::new(!cli.offline))?;

    match cli.command {
        Command::Upload { paths } => {
            let raws = read_uploads(&paths).await?;
            for file in hub.upload(raws).await? {
                print_row(&file);
            }
        }
        Command::List { trash, folders } => {
            let mode = match (trash, folders) {
                (true, _) => ViewMode::Trash,
                (_, true) => ViewMode::Folders,
                _ => ViewMode::Grid,
            };
            list(&hub, mode);
        }
        Command::Show { id } => match hub.collection().get(&id) {
            Some(file) => show(file),
            None => bail!("No file with id {id}"),
        },
        Command::Search { query, trash } => {
            let mode = if trash { ViewMode::Trash } else { ViewMode::Grid };
            hub.search(&query, mode);
            hub.resolver().settled().await;
            let shown = hub.visible(&query, mode);
            if shown.is_empty() {
                println!("No files match \"{query}\"");
            }
            for file in shown {
                print_row(file);
            }
        }
        Command::Trash { id } => set_deleted(&mut hub, &id, true)?,
        Command::Restore { id } => set_deleted(&mut hub, &id, false)?,
        Command::Purge { id } => {
            if hub.delete_forever(&id)? {
                println!("Deleted {id} permanently");
            } else {
                println!("No file with id {id}");
            }
        }
        Command::Theme { mode } => {
            let theme = match mode {
                None => hub.theme(),
                Some(ThemeArg::Toggle) => hub.toggle_theme()?,
                Some(ThemeArg::Light) => {
                    hub.set_theme(Theme::Light)?;
                    Theme::Light
                }
                Some(ThemeArg::Dark) => {
                    hub.set_theme(Theme::Dark)?;
                    Theme::Dark
                }
            };
            println!("{}", theme.as_str());
        }
        Command::ConfigSchema => println!("{}", Config::json_schema()?),
    }
    Ok(())
}

fn set_deleted(hub: &mut FileHub, id: &str, deleted: bool) -> Result<()> {
    match hub.collection().get(id).map(|f| f.is_deleted) {
        None => println!("No file with id {id}"),
        Some(current) if current == deleted => {
            println!("{id} is already {}", if deleted { "in the trash" } else { "active" });
        }
        Some(_) => {
            hub.toggle_trash(id)?;
            println!("{id} {}", if deleted { "moved to trash" } else { "restored" });
        }
    }
    Ok(())
}

fn list(hub: &FileHub, mode: ViewMode) {
    let files = hub.collection().view(mode);
    if files.is_empty() {
        println!("Nothing here yet");
        return;
    }
    if mode == ViewMode::Folders {
        for folder in hub.folders(mode) {
            println!("{folder}/");
            for file in files.iter().filter(|f| {
                f.folder()
                    .unwrap_or(exfile::hub::collection::UNCATEGORIZED_FOLDER)
                    == folder
            }) {
                print!("  ");
                print_row(file);
            }
        }
    } else {
        for file in files {
            print_row(file);
        }
    }
}

fn print_row(file: &FileRecord) {
    println!(
        "{}  {:<14} {}  [{}]",
        file.id,
        file.folder().unwrap_or("-"),
        file.name,
        file.tags().join(", ")
    );
}

fn show(file: &FileRecord) {
    println!("id:        {}", file.id);
    println!("name:      {}", file.name);
    println!("type:      {}", file.mime_type);
    println!("size:      {} bytes", file.size_bytes);
    println!("deleted:   {}", file.is_deleted);
    if let Some(c) = &file.classification {
        println!("folder:    {}", c.suggested_folder);
        println!("tags:      {}", c.tags.join(", "));
        println!("summary:   {}", c.summary);
        println!("insights:  {}", c.insights);
    }
    println!();
    match &file.content {
        ContentPayload::Text(text) => {
            print!("{}", excerpt(text, PREVIEW_CHARS));
            if text.chars().count() > PREVIEW_CHARS {
                print!("... (truncated)");
            }
            println!();
        }
        ContentPayload::DataUri(uri) => {
            println!("[{} content, {} bytes encoded]", file.mime_type, uri.len());
        }
    }
}
