//! SPYWORD - team word-guessing game for LAN chat channels
//!
//! `spyword serve` runs a hub with the game bot; `spyword play` joins one.

mod app;
mod config;
mod game;
mod hub;
mod lobby;
mod network;
mod storage;
mod telemetry;
mod tui;

use app::{AppCoordinator, Screen};
use clap::Parser;
use config::{Cli, Command, PlayArgs, ServeArgs};
use crossterm::event::KeyCode;
use hub::serve::{self, ServeConfig};
use std::error::Error;
use std::time::{Duration, Instant};
use storage::Storage;
use tracing::warn;
use tui::Tui;

/// Client log file inside the data directory
const CLIENT_LOG: &str = "client.log";

fn main() -> Result<(), Box<dyn Error>> {
    match Cli::parse().command {
        Command::Serve(args) => run_hub(args),
        Command::Play(args) => run_client(args),
    }
}

fn run_hub(args: ServeArgs) -> Result<(), Box<dyn Error>> {
    telemetry::init_server_tracing();
    serve::run(ServeConfig {
        port: args.port,
        guild: args.guild,
        mdns: !args.no_mdns,
    })?;
    Ok(())
}

fn run_client(args: PlayArgs) -> Result<(), Box<dyn Error>> {
    let storage = Storage::open()?;
    telemetry::init_client_tracing(&Storage::data_dir()?.join(CLIENT_LOG));

    let config = args.resolve(&storage.profile()?, &config::default_name());
    if let Err(e) = storage.save_profile(&config.profile()) {
        warn!(error = %e, "could not save profile");
    }

    let mut terminal = Tui::new()?;
    terminal.enter()?;

    let mut app = AppCoordinator::new(config);

    let tick_rate = Duration::from_secs(1);
    let frame_rate = Duration::from_millis(50);
    let mut last_tick = Instant::now();

    loop {
        app.poll();
        terminal.draw(|frame| tui::render(frame, &app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO)
            .min(frame_rate);

        if let Some(key) = terminal.next_key(timeout)? {
            let browsing = matches!(app.screen, Screen::Browser { .. });
            match key.code {
                KeyCode::Esc => app.back(),
                KeyCode::Enter if browsing => app.browser_select(),
                KeyCode::Enter => app.on_submit(),
                KeyCode::Up => app.browser_up(),
                KeyCode::Down => app.browser_down(),
                KeyCode::Backspace => app.on_backspace(),
                KeyCode::Char(c) => app.on_char(c),
                _ => {}
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }

    // Terminal cleanup happens automatically via Tui::drop
    Ok(())
}
