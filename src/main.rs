use std::io;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, TimeZone};
use crossterm::event::KeyEventKind;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use tokio::task::JoinHandle;

mod agent;
mod ai;
mod app;
mod config;
mod coordinator;
mod db;
mod error;
mod extract;
mod models;
mod services;
#[cfg(test)]
mod testing;
mod tui;

use agent::{PanelBody, PanelView};
use ai::{GeminiHttp, SummaryClient};
use app::App;
use config::Config;
use coordinator::{Coordinator, CoordinatorHandle};
use db::Repository;
use error::Result;
use extract::{HttpPageSource, TextExtractor};
use models::{ContextId, SummaryMode};
use services::{RemoteMirror, SummaryPersister};
use tui::{draw, handle_key_event};

const HEADLESS_TIMEOUT: Duration = Duration::from_secs(180);
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

enum Command {
    Tui { url: Option<String> },
    Summarize { url: String, mode: SummaryMode, save: bool },
    List,
    Delete { id: String },
}

fn parse_args(args: &[String]) -> Command {
    match args.get(1).map(String::as_str) {
        Some("--list") => Command::List,
        Some("--delete") if args.len() >= 3 => Command::Delete {
            id: args[2].clone(),
        },
        Some("--summarize") if args.len() >= 3 => {
            let mut mode = SummaryMode::All;
            let mut save = false;
            let mut rest = args[3..].iter();
            while let Some(arg) = rest.next() {
                match arg.as_str() {
                    "--mode" => mode = SummaryMode::from_label(rest.next().map(String::as_str)),
                    "--save" => save = true,
                    other => tracing::warn!("Ignoring unknown argument {}", other),
                }
            }
            Command::Summarize {
                url: args[2].clone(),
                mode,
                save,
            }
        }
        Some(url) if !url.starts_with("--") => Command::Tui {
            url: Some(url.to_string()),
        },
        _ => Command::Tui { url: None },
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config = Config::load()?;

    match parse_args(&args) {
        Command::List => list_saved(&config).await,
        Command::Delete { id } => {
            let persister = SummaryPersister::new(Repository::new(&config.db_path).await?, None);
            persister.delete(&id).await?;
            println!("Deleted {}", id);
            Ok(())
        }
        Command::Summarize { url, mode, save } => summarize_headless(&config, &url, mode, save).await,
        Command::Tui { url } => run_tui(&config, url).await,
    }
}

async fn build_coordinator(config: &Config) -> Result<(CoordinatorHandle, JoinHandle<()>)> {
    let repository = Repository::new(&config.db_path).await?;
    let mirror = RemoteMirror::from_config(&config.remote_mirror);
    let persister = SummaryPersister::new(repository, mirror);

    let api = GeminiHttp::new(
        config.api_base.clone(),
        Duration::from_secs(config.request_timeout_secs),
    );
    let client = SummaryClient::new(Arc::new(api));
    let extractor = TextExtractor::new(Arc::new(HttpPageSource::new()));

    Ok(Coordinator::spawn(
        client,
        config.api_key(),
        persister,
        extractor,
    ))
}

async fn stop_coordinator(handle: &CoordinatorHandle, task: JoinHandle<()>) {
    handle.shutdown();
    if tokio::time::timeout(SHUTDOWN_TIMEOUT, task).await.is_err() {
        tracing::warn!("Coordinator did not stop in time");
    }
}

async fn list_saved(config: &Config) -> Result<()> {
    let persister = SummaryPersister::new(Repository::new(&config.db_path).await?, None);
    let records = persister.list().await?;
    if records.is_empty() {
        println!("No saved summaries");
        return Ok(());
    }

    for record in records {
        let date = Local
            .timestamp_millis_opt(record.created_at)
            .single()
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!("{}  {}  [{}]", record.id, date, record.mode.label());
        println!("  {}", record.title);
        println!("  {}", record.video_url);
        for line in textwrap::wrap(&record.summary, 78) {
            println!("  {}", line);
        }
        println!("  {}", record.provenance.label());
        println!();
    }
    Ok(())
}

async fn wait_until(
    view: &mut tokio::sync::watch::Receiver<PanelView>,
    check: impl Fn(&PanelView) -> bool,
) -> Option<PanelView> {
    let waited = tokio::time::timeout(HEADLESS_TIMEOUT, async {
        loop {
            {
                let current = view.borrow_and_update();
                if check(&*current) {
                    return Some((*current).clone());
                }
            }
            if view.changed().await.is_err() {
                return None;
            }
        }
    })
    .await;
    waited.ok().flatten()
}

async fn summarize_headless(config: &Config, url: &str, mode: SummaryMode, save: bool) -> Result<()> {
    let (coordinator, task) = build_coordinator(config).await?;
    let context = ContextId(1);

    let panel = coordinator.summarize(context, url, mode).await?;
    let mut view = panel.subscribe();
    let finished = wait_until(&mut view, |v| v.body.is_terminal()).await;

    match finished {
        Some(PanelView {
            body: PanelBody::Summary(text),
            provenance,
            model_used,
            ..
        }) => {
            for line in textwrap::wrap(&text, 78) {
                println!("{}", line);
            }
            println!();
            if let Some(provenance) = provenance {
                println!("{}", provenance.label());
            }
            if let Some(model) = model_used {
                println!("Model: {}", model);
            }

            if save {
                panel.save()?;
                match wait_until(&mut view, |v| !v.save_visible || matches!(v.body, PanelBody::Error(_))).await {
                    Some(PanelView {
                        body: PanelBody::Error(e),
                        ..
                    }) => eprintln!("{}", e),
                    Some(_) => println!("Summary saved"),
                    None => eprintln!("Timed out waiting for the save to finish"),
                }
            }
        }
        Some(PanelView {
            body: PanelBody::Error(e),
            ..
        }) => eprintln!("Error: {}", e),
        _ => eprintln!("Timed out waiting for the summary"),
    }

    coordinator.close_context(context)?;
    stop_coordinator(&coordinator, task).await;
    Ok(())
}

async fn run_tui(config: &Config, url: Option<String>) -> Result<()> {
    let (coordinator, task) = build_coordinator(config).await?;
    let mut app = App::new(coordinator.clone(), url);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    stop_coordinator(&coordinator, task).await;
    Ok(())
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| draw(frame, app))?;

        // Advance spinner animation
        if app.is_loading() {
            app.tick_spinner();
        }

        // Poll for events with timeout so agent updates get redrawn
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(action) =
                        handle_key_event(key, app.url_input_active, app.show_help)
                    {
                        let should_quit = app.handle_action(action).await?;
                        if should_quit {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}
