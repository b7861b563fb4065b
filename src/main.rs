#![warn(clippy::all, clippy::pedantic)]

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use crossbeam_channel::{Sender, bounded};
use crossterm::{
    cursor::Show,
    event::{self, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{debug, error, info, warn};
use ratatui::{Terminal, prelude::CrosstermBackend};

use tetrafade::app::{App, Command, Session, map_key};
use tetrafade::components::Action;
use tetrafade::config::Config;
use tetrafade::game_loop;
use tetrafade::save::{default_save_path, load_game, save_game};
use tetrafade::sound::AudioState;

const LOG_PATH: &str = "tetrafade.log";
const INPUT_POLL: Duration = Duration::from_millis(50);

fn main() -> Result<()> {
    init_logging()?;
    info!("Starting Tetrafade");

    let config = Config::load();
    let save_path = default_save_path();

    let app = match config
        .game
        .load_saved_game
        .then(|| load_game(&save_path, config.game.width, config.game.height))
        .flatten()
    {
        Some(playfield) => App::with_playfield(playfield, AudioState::new(&config.audio)),
        None => App::new(&config),
    };

    // Terminal initialization
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let running = Arc::new(AtomicBool::new(true));
    let (sender, receiver) = bounded::<Action>(64);
    let session = Session::new(app, terminal, receiver);

    let update_rate = config.game.update_rate;
    let sim_running = Arc::clone(&running);
    let simulation = thread::Builder::new()
        .name("simulation".into())
        .spawn(move || {
            let mut session = session;
            let result = game_loop::run(&sim_running, &mut session, update_rate);
            sim_running.store(false, Ordering::Release);
            (session, result)
        });
    let simulation = match simulation {
        Ok(handle) => handle,
        Err(e) => {
            restore_terminal()?;
            return Err(e).context("failed to spawn simulation thread");
        }
    };

    let input_result = read_keys(&running, &sender);
    running.store(false, Ordering::Release);

    let joined = simulation.join();
    restore_terminal()?;
    let (session, loop_result) = joined.map_err(|_| anyhow!("simulation thread panicked"))?;
    let (app, _terminal) = session.into_parts();

    if let Err(e) = &loop_result {
        error!("Game error: {e:?}");
    }

    match input_result {
        Ok(true) => match save_game(app.playfield(), &save_path) {
            Ok(()) => {}
            Err(e) => error!("Failed to save game: {e}"),
        },
        Ok(false) => info!("Quit without saving"),
        Err(e) => error!("Input error: {e:?}"),
    }

    info!("Goodbye");
    loop_result
}

fn init_logging() -> Result<()> {
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(LOG_PATH)
        .with_context(|| format!("failed to create log file {LOG_PATH}"))?;

    // Keep log output off the terminal the UI draws on
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .format_module_path(false)
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();
    Ok(())
}

/// Forwards key presses to the simulation until the player quits or the loop
/// stops. Returns whether the game should be saved.
fn read_keys(running: &AtomicBool, sender: &Sender<Action>) -> Result<bool> {
    while running.load(Ordering::Acquire) {
        if !event::poll(INPUT_POLL)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        debug!("Key event: {key:?}");
        match map_key(key) {
            Some(Command::Play(actions)) => {
                for &action in actions {
                    if sender.try_send(action).is_err() {
                        warn!("Input queue full, dropped {action:?}");
                    }
                }
            }
            Some(Command::SaveAndQuit) => return Ok(true),
            Some(Command::Quit) => return Ok(false),
            None => {}
        }
    }
    // The loop ended on its own, keep the session
    Ok(true)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, Show)?;
    Ok(())
}

