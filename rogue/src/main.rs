//! Terminal roguelike with LLM-generated NPCs and enemies.
//!
//! Characters are written by Claude when `ANTHROPIC_API_KEY` is set (a
//! `.env` file is read on startup). Without a key the game runs offline
//! with stock characters.
//!
//! ```bash
//! cargo run -p rogue -- --use-pregenerated
//! ```
//!
//! Diagnostics go to `rogue.log`; set `RUST_LOG` to change the level.

mod app;
mod events;
mod ui;

use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::error::Error;
use std::fs::File;
use std::io::stdout;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rogue_core::{
    ClaudeCompletion, EventResult, GameConfig, GameSession, OfflineCompletion, Outcome,
    TextCompletion,
};

use app::App;
use events::handle_event;
use ui::render::render;

/// Explore a dungeon full of characters written by Claude
#[derive(Parser, Debug)]
#[command(name = "rogue", version, about, long_about = None)]
struct Args {
    /// Sample characters saved by earlier runs instead of generating new ones
    #[arg(long)]
    use_pregenerated: bool,

    /// Do not write newly generated characters to disk
    #[arg(long)]
    no_save_characters: bool,

    /// Generate scholars and paradoxes instead of ordinary dungeon folk
    #[arg(long)]
    philosophical: bool,

    /// Player name
    #[arg(short = 'n', long, default_value = "Adventurer")]
    name: String,

    /// Directory for saved characters
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Fixed seed for a reproducible dungeon
    #[arg(long)]
    seed: Option<u64>,

    /// Diagnostic log file
    #[arg(long, default_value = "rogue.log")]
    log_file: PathBuf,
}

impl Args {
    fn game_config(&self) -> GameConfig {
        let config = GameConfig::new()
            .with_player_name(self.name.clone())
            .with_data_dir(self.data_dir.clone())
            .with_pregenerated(self.use_pregenerated)
            .with_save_characters(!self.no_save_characters)
            .with_philosophical(self.philosophical);
        match self.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }
}

/// Send tracing output to a file; the terminal belongs to the TUI.
fn init_logging(path: &Path) -> Result<(), Box<dyn Error>> {
    let file = File::create(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn completion_backend() -> Arc<dyn TextCompletion> {
    match ClaudeCompletion::from_env() {
        Ok(claude) => Arc::new(claude),
        Err(e) => {
            warn!("Claude unavailable, using stock characters: {e}");
            Arc::new(OfflineCompletion)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_file)?;

    let config = args.game_config();
    info!(?config, "Starting rogue");

    let session = GameSession::new(config, completion_backend()).await?;
    let mut app = App::new(session);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {e}");
    }

    if app.session.outcome() == Outcome::Defeated {
        for line in app.session.log_window(3) {
            println!("{line}");
        }
        println!("You fell on dungeon level {}.", app.session.display_level());
    }

    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    let poll_timeout = app.session.config().poll_timeout;
    let tick_delay = app.session.config().tick_delay;

    loop {
        // Render
        terminal.draw(|f| render(f, app))?;

        // Queued async work runs before the next key is read
        if app.session.has_pending() {
            app.set_status("Processing...");
            terminal.draw(|f| render(f, app))?;
            app.session.process_pending().await?;
            app.clear_status();
            continue;
        }

        if !app.session.is_running() {
            return Ok(());
        }

        let result = if event::poll(poll_timeout)? {
            handle_event(app, event::read()?)
        } else {
            app.session.handle_key(None)
        };

        match result {
            EventResult::Quit => return Ok(()),
            EventResult::NeedsAsync => continue,
            EventResult::Continue => {}
        }

        app.session.tick();
        tokio::time::sleep(tick_delay).await;
    }
}
