mod action;
mod app;
mod auth;
mod config;
mod error;
mod event;
mod github;
mod source;
mod tui;
mod types;
mod ui;
mod view;

use std::panic;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::action::Action;
use crate::app::App;
use crate::config::Config;
use crate::event::Event;
use crate::github::GitHub;
use crate::tui::EventHandler;
use crate::types::RepoId;

/// Browse a GitHub repository and its issues, five at a time
#[derive(Debug, Parser)]
#[command(name = "repolens", version, about)]
struct Cli {
    /// Repository to open, as `owner/name` (percent-encoding accepted, e.g. `facebook%2Freact`).
    /// Defaults to the GitHub remote of the current git checkout.
    repository: Option<String>,

    /// REST API base URL (overrides the config file)
    #[arg(long)]
    api_url: Option<String>,

    /// Config file to read instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    let initial_repo = match &cli.repository {
        Some(raw) => Some(RepoId::decode(raw)?),
        None => config::detect_repository(&config),
    };

    let api_url = cli.api_url.as_deref().unwrap_or(&config.github.api_url);
    let token = auth::load_token(&config.github);
    info!(%api_url, authenticated = token.is_some(), "starting");
    let github = GitHub::new(api_url, token)?;

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = tui::restore();
        original_hook(panic_info);
    }));

    let result = run(github, config.repositories(), initial_repo).await;

    // Restore terminal
    tui::restore()?;

    result
}

async fn run(
    github: GitHub,
    repos: Vec<RepoId>,
    initial_repo: Option<RepoId>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut terminal = tui::init()?;

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let mut app = App::new(Arc::new(github), repos, initial_repo, action_tx.clone());

    let tick_rate = Duration::from_millis(250);
    let render_rate = Duration::from_millis(16); // ~60fps
    let mut events = EventHandler::new(tick_rate, render_rate);

    loop {
        tokio::select! {
            Some(event) = events.next() => {
                if event.is_quit() {
                    break;
                }

                match event {
                    Event::Render => {
                        terminal.draw(|frame| ui::render(frame, &app))?;
                    }
                    _ => {
                        let action = app.handle_event(event);
                        if !matches!(action, Action::None) {
                            action_tx.send(action)?;
                        }
                    }
                }
            }
            Some(action) = action_rx.recv() => {
                app.update(action);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
