mod api;
mod app;
mod cli;
mod ui;

use ar_notes::board::Board;
use ar_notes::config::{Config, StoreBackend};
use ar_notes::note::{
    Note, NoteColor, NoteId, NoteKind, decode_note, decode_todo_list, encode_note,
};
use ar_notes::store::{Dispatch, HttpStore, RemoteStore, SqliteStore, StoreClient, StorePath};
use ar_notes::utils::paths::{
    ensure_ar_notes_dir_exists, get_crash_log_path, get_database_path, get_logs_dir,
};

use anyhow::{Context, Result, bail};
use app::AppState;
use chrono::Local;
use clap::Parser;
use cli::{Cli, Commands};
use serde_json::json;
use std::fs;
use std::io::Write;
use std::panic;
use std::sync::Arc;
use ui::theme::Theme;

/// Install a panic hook that writes crash information to a log file
fn install_crash_handler() {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        if let Ok(crash_log_path) = get_crash_log_path() {
            let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
            let mut crash_report = format!("=== CRASH at {} ===\n", timestamp);

            if let Some(message) = panic_info.payload().downcast_ref::<&str>() {
                crash_report.push_str(&format!("Message: {}\n", message));
            } else if let Some(message) = panic_info.payload().downcast_ref::<String>() {
                crash_report.push_str(&format!("Message: {}\n", message));
            }

            if let Some(location) = panic_info.location() {
                crash_report.push_str(&format!(
                    "Location: {}:{}:{}\n",
                    location.file(),
                    location.line(),
                    location.column()
                ));
            }

            crash_report.push_str(&format!(
                "\nBacktrace:\n{}\n",
                std::backtrace::Backtrace::force_capture()
            ));
            crash_report.push('\n');

            if let Some(parent) = crash_log_path.parent() {
                let _ = fs::create_dir_all(parent);
            }
            if let Ok(mut file) = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&crash_log_path)
            {
                let _ = file.write_all(crash_report.as_bytes());
                eprintln!("\nCrash logged to: {}", crash_log_path.display());
            }
        }

        default_hook(panic_info);
    }));
}

/// Initialize file-based logging for the terminal client.
///
/// Logs are written to ~/.local/share/ar-notes/logs/arnotes.log
/// Log level can be controlled with RUST_LOG env var (default: info).
fn init_file_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let logs_dir = get_logs_dir().ok()?;

    if let Err(e) = fs::create_dir_all(&logs_dir) {
        eprintln!("Warning: Could not create logs directory: {}", e);
        return None;
    }

    let file_appender = tracing_appender::rolling::daily(&logs_dir, "arnotes.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    Some(guard)
}

fn init_stderr_logging(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn open_local_store() -> Result<Arc<SqliteStore>> {
    ensure_ar_notes_dir_exists()?;
    let db_path = get_database_path()?;
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("Failed to open {}", db_path.display()))?;
    Ok(Arc::new(store))
}

fn open_store(config: &Config) -> Result<Arc<dyn RemoteStore>> {
    match config.store.backend {
        StoreBackend::Local => Ok(open_local_store()?),
        StoreBackend::Remote => {
            let store = HttpStore::new(
                &config.store.url,
                config.store.poll_interval(),
                config.store.request_timeout(),
            )?;
            tracing::info!(url = %config.store.url, "Using remote store");
            Ok(Arc::new(store))
        }
    }
}

fn main() -> Result<()> {
    install_crash_handler();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        None => {
            let _log_guard = init_file_logging();
            tracing::info!("Starting ar-notes v{}", env!("CARGO_PKG_VERSION"));

            let store = open_store(&config)?;
            let client = StoreClient::new(store, Dispatch::Background);
            let markers = config.markers.iter().map(|m| (m.note_id.clone(), m.kind));
            let board = Board::with_markers(client, config.fallback()?, markers)?;
            let theme = Theme::from_config(&config);

            ui::run_tui(AppState::new(board, config, theme))?;
        }
        Some(Commands::Show { note_id }) => {
            init_stderr_logging("warn");
            handle_show(&config, NoteId::new(note_id))?;
        }
        Some(Commands::Add { note_id, name, quantity }) => {
            init_stderr_logging("warn");
            handle_add(&config, NoteId::new(note_id), &name, quantity)?;
        }
        Some(Commands::Color { note_id, color }) => {
            init_stderr_logging("warn");
            handle_color(&config, NoteId::new(note_id), &color)?;
        }
        Some(Commands::Markers) => handle_markers(&config),
        Some(Commands::Serve { port }) => {
            init_stderr_logging("info,tower_http=debug");
            run_server(open_local_store()?, port)?;
        }
    }

    Ok(())
}

fn handle_show(config: &Config, id: NoteId) -> Result<()> {
    let store = open_store(config)?;
    let path = StorePath::note(&id)?;
    let Some(document) = store.get(&path)? else {
        println!("{id}: no such note");
        return Ok(());
    };
    let fallback = config.fallback()?;

    match config.kind_of(&id).unwrap_or(NoteKind::Shopping) {
        NoteKind::Shopping => {
            let decoded = decode_note(&id, &document, fallback)?;
            decoded.log_warnings(&path.to_string());
            let note = decoded.value;
            println!("{} ({})", note.id, note.color.to_hex());
            for item in &note.items {
                let done = if item.done { "[x]" } else { "[ ]" };
                let hidden = if item.visible { "" } else { " (hidden)" };
                println!("  {done} {}{hidden}", item.label());
            }
        }
        NoteKind::Todo => {
            let decoded = decode_todo_list(&id, &document, fallback)?;
            decoded.log_warnings(&path.to_string());
            let list = decoded.value;
            println!("{} ({}, {} open)", list.id, list.color.to_hex(), list.pending_count());
            for item in &list.items {
                let done = if item.done { "[x]" } else { "[ ]" };
                let flag = if item.important { " !" } else { "" };
                println!("  {done} {}{flag}", item.title);
                if !item.note.is_empty() {
                    println!("      {}", item.note);
                }
            }
        }
    }
    Ok(())
}

fn handle_add(config: &Config, id: NoteId, name: &str, quantity: u32) -> Result<()> {
    if config.kind_of(&id) == Some(NoteKind::Todo) {
        bail!("{id} is a to-do list, not a shopping note");
    }

    let store = open_store(config)?;
    let path = StorePath::note(&id)?;
    let fallback = config.fallback()?;
    let mut note = match store.get(&path)? {
        Some(document) => decode_note(&id, &document, fallback)?.value,
        None => Note::new(id.clone(), fallback),
    };

    note.add_item(name, quantity)?;
    store.set(&path, encode_note(&note))?;
    println!("Added {} to {id}", note.items.last().map(|i| i.label()).unwrap_or_default());
    Ok(())
}

fn handle_color(config: &Config, id: NoteId, color: &str) -> Result<()> {
    let color: NoteColor = color.parse()?;
    let store = open_store(config)?;
    store.set(&StorePath::note_color(&id)?, json!(color.to_hex()))?;
    println!("{id} is now {}", color.to_hex());
    Ok(())
}

fn handle_markers(config: &Config) {
    if config.markers.is_empty() {
        println!("No markers configured");
        return;
    }
    for marker in &config.markers {
        println!(
            "  {}  {:<12} {:<10} {}",
            marker.key,
            marker.note_id.as_str(),
            marker.kind.to_string(),
            marker.name
        );
    }
}

#[tokio::main]
async fn run_server(store: Arc<SqliteStore>, port: u16) -> Result<()> {
    let app = api::create_router(store);
    let addr = format!("0.0.0.0:{port}");

    tracing::info!("Starting store server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
