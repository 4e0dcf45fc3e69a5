use photoswipe::cli::{AppConfig, Args, Command};
use photoswipe::config::UserConfig;
use photoswipe::domain::{HistoryFilter, JsonFileStore, MemoryStore, ProcessedStore};
use photoswipe::repository::{AssetRepository, DryRunRepository, FsRepository};
use photoswipe::session::Triage;
use photoswipe::tui::{
    handle_history_input, handle_key_event, render, render_help_overlay, render_history_overlay,
    render_summary, render_welcome_overlay, synthetic_gesture, HistoryKey, KeyAction, ViewState,
};

use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let config: AppConfig = args.into();
    init_tracing(&config.command);

    if let Err(e) = run(config).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr, except while the interactive screen owns the terminal
fn init_tracing(command: &Command) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("photoswipe=info"));

    let writer = match command {
        Command::Swipe => match open_log_file() {
            Some(file) => BoxMakeWriter::new(Mutex::new(file)),
            None => BoxMakeWriter::new(io::sink),
        },
        _ => BoxMakeWriter::new(io::stderr),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .init();
}

fn open_log_file() -> Option<fs::File> {
    let dir = dirs::data_dir()?.join("photoswipe");
    fs::create_dir_all(&dir).ok()?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("photoswipe.log"))
        .ok()
}

async fn run(config: AppConfig) -> photoswipe::Result<()> {
    let mut user_config = UserConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "failed to load user config; using defaults");
        UserConfig::default()
    });

    let library = FsRepository::new(config.library.clone());
    let (repository, dry_run): (Arc<dyn AssetRepository>, _) = if config.dry_run {
        let dry_run = Arc::new(DryRunRepository::new(library));
        (dry_run.clone() as Arc<dyn AssetRepository>, Some(dry_run))
    } else {
        (Arc::new(library) as Arc<dyn AssetRepository>, None)
    };

    if config.command == Command::Collections {
        for collection in repository.list_collections().await? {
            println!(
                "{}\t{}\t{} photos{}",
                collection.id,
                collection.display_name,
                collection.item_count,
                if collection.accepts_content { "" } else { "\t(read-only)" }
            );
        }
        return Ok(());
    }

    let store = open_store(&config, &user_config)?;
    let mut triage = Triage::open(
        repository,
        store,
        config.session_settings(&user_config),
        config.source_filter.clone(),
        config.destinations(&user_config),
    )
    .await?;
    info!(
        library = %config.library.display(),
        queued = triage.session().queue().len(),
        dry_run = config.dry_run,
        "session opened"
    );

    match &config.command {
        Command::Status => print_status(&triage),
        Command::Reset { yes } => {
            let processed = triage.session().processed().len();
            if !yes && !confirm(&format!("Forget all {} classifications? [y/N] ", processed))? {
                println!("Reset cancelled");
                return Ok(());
            }
            triage.reset().await?;
            println!("Reset {} classifications", processed);
        }
        Command::Swipe => {
            run_interactive(&mut triage, &config, &mut user_config).await?;

            let stats = triage.session().statistics();
            if let Some(dry_run) = dry_run {
                println!("\n[DRY RUN] Complete");
                println!("   Decisions recorded: {}", stats.decided());
                println!("   Library changes skipped: {}", dry_run.skipped().len());
            } else if stats.decided() > 0 {
                println!(
                    "Kept {}, trashed {}, favorited {}, hid {}, moved {}",
                    stats.kept, stats.trashed, stats.favorited, stats.hidden, stats.moved
                );
            }
        }
        Command::Collections => {}
    }

    Ok(())
}

/// The processed-set store. A dry run reads the saved progress but never writes it.
fn open_store(config: &AppConfig, user_config: &UserConfig) -> photoswipe::Result<Box<dyn ProcessedStore>> {
    let Some(path) = config.state_path(user_config) else {
        warn!("no data directory available; progress will not be saved");
        return Ok(Box::new(MemoryStore::new()));
    };

    let store = JsonFileStore::new(path);
    if config.dry_run {
        Ok(Box::new(MemoryStore::with_ids(store.load()?)))
    } else {
        Ok(Box::new(store))
    }
}

fn print_status(triage: &Triage) {
    let session = triage.session();
    if session.access_denied() {
        println!("Access to the photo library was denied");
        return;
    }
    let queue = session.queue();
    println!("Eligible:   {}", queue.total_eligible());
    println!("Reviewed:   {}", queue.total_eligible() - queue.len());
    println!("Remaining:  {}", queue.len());
    println!("Processed:  {} (all sources)", session.processed().len());
    println!("Progress:   {:.0}%", session.progress() * 100.0);
}

fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

/// Runs the interactive screen, restoring the terminal whatever happens
async fn run_interactive(
    triage: &mut Triage,
    config: &AppConfig,
    user_config: &mut UserConfig,
) -> photoswipe::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, triage, config, user_config).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Main application loop
async fn run_loop<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    triage: &mut Triage,
    config: &AppConfig,
    user_config: &mut UserConfig,
) -> photoswipe::Result<()> {
    let mut view_state = if config.show_welcome || !user_config.welcome_shown {
        ViewState::Welcome
    } else {
        ViewState::Browsing
    };
    let mut status: Option<String> = None;

    loop {
        terminal.draw(|frame| {
            render(frame, triage.session(), status.as_deref());

            match view_state {
                ViewState::Help => render_help_overlay(frame),
                ViewState::History(filter) => {
                    render_history_overlay(frame, triage.session(), filter)
                }
                ViewState::Summary => render_summary(frame, &triage.session().statistics()),
                ViewState::Welcome => render_welcome_overlay(frame),
                ViewState::Browsing => {}
            }
        })?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };

        match view_state {
            ViewState::Welcome => {
                view_state = ViewState::Browsing;
                user_config.welcome_shown = true;
                if let Err(e) = user_config.save() {
                    warn!(error = %e, "failed to save user config");
                }
                continue;
            }
            ViewState::Help => {
                let action = handle_key_event(key);
                if matches!(action, KeyAction::Help | KeyAction::Quit | KeyAction::None) {
                    view_state = ViewState::Browsing;
                }
                continue;
            }
            ViewState::Summary => break,
            ViewState::History(filter) => {
                match handle_history_input(key) {
                    HistoryKey::Close => view_state = ViewState::Browsing,
                    HistoryKey::Filter(filter) => view_state = ViewState::History(filter),
                    HistoryKey::Undo(row) => {
                        let target = triage
                            .session()
                            .history_view(filter)
                            .get(row)
                            .map(|entry| entry.asset_id().clone());
                        if let Some(id) = target {
                            status = Some(if triage.undo_by_id(&id).await {
                                format!("Undid {}", id)
                            } else {
                                format!("Nothing to undo for {}", id)
                            });
                        }
                    }
                    HistoryKey::None => {}
                }
                continue;
            }
            ViewState::Browsing => {}
        }

        match handle_key_event(key) {
            KeyAction::Quit => {
                if triage.session().statistics().decided() > 0 {
                    view_state = ViewState::Summary;
                } else {
                    break;
                }
            }
            KeyAction::Undo => {
                status = Some(match triage.undo_last().await {
                    Ok(Some(id)) => format!("Undid {}", id),
                    Ok(None) => "Nothing to undo".to_string(),
                    Err(e) => format!("Undo failed: {}", e),
                });
            }
            KeyAction::History => view_state = ViewState::History(HistoryFilter::All),
            KeyAction::Help => view_state = ViewState::Help,
            KeyAction::None => {}
            gesture => {
                let height = f64::from(terminal.size()?.height);
                let albums = triage.session().destinations().len();
                let Some(update) = synthetic_gesture(gesture, albums, height) else {
                    continue;
                };
                let Some(current) = triage.session().current().map(|item| item.id.clone()) else {
                    continue;
                };
                if !triage.gesture_start() {
                    continue;
                }
                triage.gesture_update(update);

                status = match triage.finish_gesture().await {
                    Ok(Some(decision)) => Some(format!("{}: {}", decision, current)),
                    Ok(None) => None,
                    Err(e) => Some(format!("Could not apply to {}: {}", current, e)),
                };

                if triage.session().current().is_none() && !triage.session().access_denied() {
                    view_state = ViewState::Summary;
                }
            }
        }
    }

    Ok(())
}
