#![warn(clippy::all, clippy::pedantic)]

use bevy_ecs::prelude::*;
use crossbeam_channel::Receiver;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::info;
use ratatui::{Terminal, prelude::Backend};

use crate::components::{Action, Input, InputSource};
use crate::config::Config;
use crate::game_loop::Simulation;
use crate::playfield::Playfield;
use crate::sound::AudioState;
use crate::ui;

/// Game state held in a bevy `World`: the `Playfield`, the pending `Input`
/// and the `AudioState`.
pub struct App {
    pub world: World,
    pub should_quit: bool,
}

impl App {
    /// Fresh game sized and configured from `config`.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let mut playfield = Playfield::new(config.game.width, config.game.height);
        playfield.set_shadow_visible(config.game.show_shadow);
        Self::with_playfield(playfield, AudioState::new(&config.audio))
    }

    #[must_use]
    pub fn with_playfield(playfield: Playfield, audio: AudioState) -> Self {
        let mut world = World::new();
        world.insert_resource(playfield);
        world.insert_resource(Input::default());
        world.insert_resource(audio);
        Self {
            world,
            should_quit: false,
        }
    }

    #[must_use]
    pub fn playfield(&self) -> &Playfield {
        self.world.resource::<Playfield>()
    }

    /// Arms `action` for the next tick.
    pub fn queue_action(&mut self, action: Action) {
        self.world.resource_mut::<Input>().request(action);
    }

    /// One simulation tick. A restart request is honoured only once the game
    /// is over and is dropped otherwise.
    pub fn tick(&mut self) {
        let restart = self.world.resource_mut::<Input>().take(Action::Restart);
        if restart && self.playfield().is_game_over() {
            self.reset();
            return;
        }

        self.world.resource_scope(|world, mut playfield: Mut<Playfield>| {
            world.resource_scope(|world, mut audio: Mut<AudioState>| {
                let mut input = world.resource_mut::<Input>();
                playfield.update(&mut *input, &mut *audio);
            });
        });
    }

    /// Starts a new game on a field of the same size, keeping the shadow
    /// preference.
    pub fn reset(&mut self) {
        let (width, height, shadow) = {
            let playfield = self.playfield();
            (playfield.width(), playfield.height(), playfield.is_shadow_visible())
        };
        let mut playfield = Playfield::new(width, height);
        playfield.set_shadow_visible(shadow);
        self.world.insert_resource(playfield);
        self.world.insert_resource(Input::default());
        info!("New game started");
    }
}

/// What a key press asks the application to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Play(&'static [Action]),
    SaveAndQuit,
    Quit,
}

/// Maps a key event to a command. Releases and unbound keys map to nothing.
#[must_use]
pub fn map_key(key: KeyEvent) -> Option<Command> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Command::Quit);
    }
    let command = match key.code {
        KeyCode::Left | KeyCode::Char('a') => Command::Play(&[Action::Left]),
        KeyCode::Right | KeyCode::Char('d') => Command::Play(&[Action::Right]),
        KeyCode::Down | KeyCode::Char('s') => Command::Play(&[Action::Down]),
        KeyCode::Up | KeyCode::Char('w') => Command::Play(&[Action::Rotate]),
        KeyCode::Char(' ') => Command::Play(&[Action::HardDrop]),
        // Drops while playing, restarts once the game is over
        KeyCode::Enter => Command::Play(&[Action::HardDrop, Action::Restart]),
        KeyCode::Char('p') => Command::Play(&[Action::Pause]),
        KeyCode::Char('g') => Command::Play(&[Action::ToggleShadow]),
        KeyCode::Char('q') => Command::SaveAndQuit,
        KeyCode::Esc => Command::Quit,
        _ => return None,
    };
    Some(command)
}

/// The running game bound to a terminal and an action channel, driven by the
/// fixed-timestep loop.
pub struct Session<B: Backend> {
    app: App,
    terminal: Terminal<B>,
    actions: Receiver<Action>,
}

impl<B: Backend> Session<B> {
    pub fn new(app: App, terminal: Terminal<B>, actions: Receiver<Action>) -> Self {
        Self {
            app,
            terminal,
            actions,
        }
    }

    #[must_use]
    pub fn app(&self) -> &App {
        &self.app
    }

    #[must_use]
    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    pub fn into_parts(self) -> (App, Terminal<B>) {
        (self.app, self.terminal)
    }
}

impl<B: Backend> Simulation for Session<B> {
    fn update(&mut self) {
        for action in self.actions.try_iter() {
            self.app.queue_action(action);
        }
        self.app.tick();
    }

    fn render(&mut self) -> anyhow::Result<()> {
        let playfield = self.app.playfield();
        self.terminal.draw(|f| ui::render(f, playfield))?;
        Ok(())
    }
}
