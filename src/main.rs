mod announcer;
mod app;
mod cache;
mod clock;
mod commands;
mod config;
mod event;
mod focus;
mod logging;
mod modal;
mod net;
mod omdb;
mod query;
mod render;
mod search;
mod services;
mod ui;
mod worker;

use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::services::Services;

#[derive(Parser, Debug)]
#[command(name = "moviedeck")]
#[command(about = "Browse the OMDb movie database from the terminal")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/moviedeck/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Go straight to the network, without the offline response cache
  #[arg(long, global = true)]
  no_worker: bool,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Start the interactive browser (the default)
  Browse {
    /// Deliver this push payload (JSON) to the offline worker on startup
    #[arg(long)]
    push: Option<String>,
  },
  /// Render search results, or the home page without a query, as standalone HTML
  Export {
    query: Option<String>,
    #[arg(short, long, default_value_t = 1)]
    page: u32,
    /// Write to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
  },
  /// Print the details panel markup for an IMDb id
  Details { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let config = config::Config::load(args.config.as_deref())?;
  let use_worker = !args.no_worker;

  match args.command.unwrap_or(Command::Browse { push: None }) {
    Command::Browse { push } => {
      let _guard = logging::init_file(&config)?;
      info!("moviedeck v{} starting", env!("CARGO_PKG_VERSION"));

      let services = Services::build(&config, use_worker).await?;
      if let Some(data) = push {
        match &services.worker {
          Some(worker) => worker.handle.push(data),
          None => return Err(eyre!("--push needs the offline worker")),
        }
      }

      let default_hook = std::panic::take_hook();
      std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        default_hook(info);
      }));

      let events = event::EventHandler::new(Duration::from_millis(250));
      let mut app = app::App::new(config, services, events.sender());
      app.run(events).await?;
    }
    Command::Export {
      query,
      page,
      output,
    } => {
      logging::init_stderr(&config)?;
      let services = Services::build(&config, use_worker).await?;
      let mut out: Box<dyn Write> = match &output {
        Some(path) => Box::new(
          std::fs::File::create(path)
            .map_err(|e| eyre!("Failed to create {}: {}", path.display(), e))?,
        ),
        None => Box::new(std::io::stdout().lock()),
      };
      match query {
        Some(query) => {
          commands::export(&services.client, config.title(), &query, page, &mut out).await?
        }
        None => {
          commands::export_home(&services.client, config.title(), &config.categories, &mut out)
            .await?
        }
      }
      out.flush()?;
      if let Some(path) = output {
        info!("wrote {}", path.display());
      }
    }
    Command::Details { id } => {
      logging::init_stderr(&config)?;
      let services = Services::build(&config, use_worker).await?;
      let mut stdout = std::io::stdout().lock();
      commands::details(&services.client, &id, &mut stdout).await?;
      stdout.flush()?;
    }
  }

  Ok(())
}
