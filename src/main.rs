use clap::Parser;
use crossterm::{
    event::{self, Event as CEvent, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::error::Error;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::sync::{mpsc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tui::{backend::CrosstermBackend, Terminal};

use crate::chart::chart_config;
use crate::config::{Config, DEFAULT_EXPORT_PATH};
use crate::dataset::build_dataset;
use crate::selection::{AppState, LoadState, SelectionController};
use crate::ui::{Focus, ViewState};

mod chart;
mod config;
mod csv_reader;
mod dataset;
mod error;
mod selection;
mod ui;

enum Event<I> {
    Input(I),
    Tick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::parse();
    init_logging(&config.log_file)?;
    info!(data = %config.data.display(), county = %config.county, "startup");

    let mut app = AppState::new(&config.county);
    app.finish_load(csv_reader::read_rows(&config.data).map(|rows| build_dataset(&rows)));

    match &config.export {
        Some(path) => {
            if let LoadState::Failed { reason } = app.load_state() {
                return Err(reason.clone().into());
            }
            export_chart(&app, path)
        }
        None => run_terminal(app),
    }
}

fn init_logging(path: &Path) -> Result<(), Box<dyn Error>> {
    let file = File::create(path)?;
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

/// Writes the chart configuration for the current selection as JSON.
fn export_chart(app: &AppState, path: &Path) -> Result<(), Box<dyn Error>> {
    let config = chart_config(app.visible(), &app.dataset().categories);
    let json = serde_json::to_string_pretty(&config)?;
    if path == Path::new("-") {
        println!("{}", json);
    } else {
        fs::write(path, json)?;
    }
    info!(path = %path.display(), series = config.series.len(), "exported chart");
    Ok(())
}

fn handle_key(code: KeyCode, app: &mut AppState, view: &mut ViewState, export_path: &Path) -> Flow {
    view.message = None;
    match code {
        KeyCode::Char('q') => return Flow::Quit,
        KeyCode::Tab => view.toggle_focus(),
        KeyCode::Up => view.move_cursor(true, app),
        KeyCode::Down => view.move_cursor(false, app),
        KeyCode::Enter if view.focus == Focus::Counties => {
            if let Some(county) = app.dataset().counties.get(view.county_cursor).cloned() {
                app.set_county(&county);
                view.highlighted = 0;
            }
        }
        KeyCode::Enter | KeyCode::Char(' ') => {
            if let Some(option) = app.dataset().cities.get(view.city_cursor).cloned() {
                app.toggle_city(&option.label);
            }
        }
        KeyCode::Char('c') => app.set_selected_cities(None),
        KeyCode::Char('r') => app.reset_to_county(),
        KeyCode::Char('[') => view.cycle_highlight(false, app.visible().len()),
        KeyCode::Char(']') => view.cycle_highlight(true, app.visible().len()),
        KeyCode::Char('e') => {
            view.message = Some(match export_chart(app, export_path) {
                Ok(()) => format!("Exported chart to {}", export_path.display()),
                Err(err) => {
                    warn!(error = %err, "export failed");
                    format!("Export failed: {}", err)
                }
            });
        }
        _ => {}
    }
    view.clamp(app);
    Flow::Continue
}

fn run_terminal(mut app: AppState) -> Result<(), Box<dyn Error>> {
    enable_raw_mode()?;

    let (tx, rx) = mpsc::channel();
    let tick_rate = Duration::from_millis(200);
    thread::spawn(move || {
        let mut last_tick = Instant::now();
        loop {
            let timeout = tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_secs(0));

            if event::poll(timeout).unwrap_or(false) {
                if let Ok(CEvent::Key(key)) = event::read() {
                    if key.kind == KeyEventKind::Press && tx.send(Event::Input(key)).is_err() {
                        return;
                    }
                }
            }

            if last_tick.elapsed() >= tick_rate {
                if tx.send(Event::Tick).is_err() {
                    return;
                }
                last_tick = Instant::now();
            }
        }
    });

    let stdout = io::stdout();
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let export_path = Path::new(DEFAULT_EXPORT_PATH);
    let mut view = ViewState::new(&app);
    loop {
        terminal.draw(|rect| ui::draw(rect, &app, &view))?;

        match rx.recv()? {
            Event::Input(event) => {
                if handle_key(event.code, &mut app, &mut view, export_path) == Flow::Quit {
                    break;
                }
            }
            Event::Tick => {}
        }
    }

    disable_raw_mode()?;
    terminal.clear()?;
    terminal.show_cursor()?;
    info!("shutdown");
    Ok(())
}
