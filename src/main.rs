use std::io;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::prelude::*;

use coaching_hub::app::App;
use coaching_hub::cache::HubData;
use coaching_hub::config::Config;
use coaching_hub::{logs, persist, store};

mod ui;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let config = Config::load(&args)?;
    if let Err(err) = logs::init_logger(&config.log_file, config.log_level, false) {
        eprintln!("warning: file logging disabled: {err:#}");
    }
    log::info!("starting coaching hub with db {}", config.db_path.display());

    let conn = store::open_db(&config.db_path)?;
    let mut app = App::new(HubData::new(conn), config);
    persist::load_into_state(&mut app.state);
    let db_line = format!("[INFO] Store: {}", app.config.db_path.display());
    app.state.push_log(db_line);

    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("enter alternate screen")?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend).context("create terminal")?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    persist::save_from_state(&app.state);
    log::info!("coaching hub closed");
    res.context("ui loop")
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        app.poll_playback(Instant::now());
        app.refresh();

        terminal.draw(|f| ui::draw(f, app))?;

        let mut timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if let Some(remaining) = app.playback_remaining(Instant::now()) {
            timeout = timeout.min(remaining);
        }
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
