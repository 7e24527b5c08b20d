use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent,
    MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use tokio::runtime::Runtime;
use tracing::info;

use tui_flightmap::app::{App, InputMode};
use tui_flightmap::config::Config;
use tui_flightmap::fetch::{DemoFlightApi, FlightApi, HttpFlightApi};
use tui_flightmap::{data, logging, ui};

#[derive(Parser, Debug)]
#[command(author, version, about = "Flight destination prices on a terminal world map")]
struct Cli {
    /// TOML configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Price service base URL; the offline demo data is used without one
    #[arg(long)]
    api_url: Option<String>,

    /// Departure airport code, e.g. SYD
    #[arg(long, short)]
    departure: Option<String>,

    /// Directory with Natural Earth coastline GeoJSON files
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Trace-level logging for this crate
    #[arg(long, short)]
    verbose: bool,
}

impl Cli {
    fn apply(self, config: &mut Config) {
        if let Some(url) = self.api_url {
            config.api_base_url = Some(url);
        }
        if let Some(code) = self.departure {
            // a label for another airport would be wrong; show the code
            config.default_departure_label = code.clone();
            config.default_departure = code;
        }
        if let Some(dir) = self.data_dir {
            config.data_dir = dir;
        }
        if let Some(file) = self.log_file {
            config.log_file = file;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbose = cli.verbose;

    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_env(|key| std::env::var(key).ok());
    cli.apply(&mut config);

    let _log_guard = logging::init(&config.log_file, verbose)?;
    info!(?config, "starting");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("starting async runtime")?;
    let api = flight_api(&config)?;

    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, &config, api, &runtime);

    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

fn flight_api(config: &Config) -> Result<Arc<dyn FlightApi>> {
    match &config.api_base_url {
        Some(url) => {
            info!(%url, "using price service");
            let timeout = Duration::from_secs(config.request_timeout_secs);
            Ok(Arc::new(HttpFlightApi::new(url, timeout)?))
        }
        None => {
            info!("no price service configured, using demo data");
            Ok(Arc::new(DemoFlightApi::new(Duration::from_millis(150))))
        }
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Moved => app.set_mouse_pos(mouse.column, mouse.row),
        MouseEventKind::ScrollUp => app.scroll(mouse.column, mouse.row, true),
        MouseEventKind::ScrollDown => app.scroll(mouse.column, mouse.row, false),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        MouseEventKind::Down(MouseButton::Left) => app.begin_drag(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.handle_drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.end_drag(mouse.column, mouse.row),
        _ => {}
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if app.input_mode == InputMode::Departure {
        match key.code {
            KeyCode::Enter => app.submit_departure(),
            KeyCode::Esc => app.cancel_input(),
            KeyCode::Backspace => app.input_backspace(),
            KeyCode::Char(c) => app.input_char(c),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Esc if app.selected.is_some() => app.selected = None,
        KeyCode::Esc => app.quit(),

        KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
        KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
        KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
        KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

        KeyCode::Char('d') => app.begin_departure_input(),
        KeyCode::Char('m') => app.cycle_month(),
        KeyCode::Char('w') => app.cycle_duration(),
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, config: &Config, api: Arc<dyn FlightApi>, runtime: &Runtime) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(config, api, runtime.handle().clone(), size.width, size.height);
    data::load_basemap(&mut app.map_renderer, &config.data_dir);

    // initial load counts as the first viewport change
    app.map_changed();

    loop {
        app.render_pass();
        app.tick();
        terminal.draw(|frame| ui::render(frame, &app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(&mut app, key),
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    info!("exiting");
    Ok(())
}
