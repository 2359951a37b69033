use directories::ProjectDirs;
use hooked::app::App;
use hooked::Config;
use hooked_ravelry::{EncryptedFileBackend, TokenStore};
use ratatui::crossterm::event::{
    self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyModifiers,
};
use ratatui::crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use std::fs::{self, File};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "saschaw", "hooked")
}

fn get_config_path() -> PathBuf {
    if let Some(proj_dirs) = project_dirs() {
        proj_dirs.config_dir().join("config.toml")
    } else {
        PathBuf::from("config/default.toml")
    }
}

/// Logs go to a file; the terminal belongs to the UI.
fn init_logging() {
    let Some(proj_dirs) = project_dirs() else {
        return;
    };
    let log_dir = proj_dirs.data_dir();
    if fs::create_dir_all(log_dir).is_err() {
        return;
    }
    let Ok(file) = File::create(log_dir.join("hooked.log")) else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    init_logging();

    terminal::enable_raw_mode()?;
    let mut terminal = ratatui::init();
    ratatui::crossterm::execute!(io::stdout(), EnterAlternateScreen, EnableBracketedPaste)?;

    let result = run(&mut terminal);

    let _ = ratatui::crossterm::execute!(io::stdout(), DisableBracketedPaste, LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    ratatui::restore();

    result
}

fn run(
    terminal: &mut ratatui::Terminal<ratatui::backend::CrosstermBackend<io::Stdout>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load_or_default(&get_config_path());
    config.apply_env();

    let rt = tokio::runtime::Runtime::new()?;
    let _guard = rt.enter();

    let store = Arc::new(TokenStore::open(EncryptedFileBackend::in_project_dirs()?)?);
    let mut app = App::new(config, store);
    terminal.draw(|frame| app.render(frame))?;

    rt.block_on(async {
        if let Err(e) = app.init().await {
            tracing::error!("Failed to initialize app: {}", e);
        }
    });

    loop {
        terminal.draw(|frame| app.render(frame))?;

        if event::poll(Duration::from_millis(50))? {
            let event = event::read()?;

            if let Event::Key(key) = &event {
                if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    break;
                }
            }

            if let Ok(should_quit) = app.handle_event(event) {
                if should_quit {
                    break;
                }
            }
        }

        app.process_async_events();

        if app.should_quit {
            break;
        }
    }

    app.shutdown();
    Ok(())
}
