/// Entry point and game loop.

mod config;
mod domain;
mod screen;
mod sim;
mod ui;

use std::fs::File;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use config::GameConfig;
use screen::gameplay::GameplayScreen;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::surface::{Frame, Surface};

const FRAME_SLEEP: Duration = Duration::from_millis(5);
/// Longest simulated step; a stalled terminal must not tunnel the player
/// through the floor.
const MAX_DELTA: f32 = 0.1;
const LOG_ENV_VAR: &str = "GIGAGAL_LOG";
const DEFAULT_LOG_FILE: &str = "gigagal.log";

fn main() {
    init_tracing();
    info!("=== GigaGal startup ===");

    let config = GameConfig::load();
    let tick_rate = config.tick_rate();

    // Load the first level before touching the terminal so errors print plainly.
    let mut screen = match GameplayScreen::show(config) {
        Ok(screen) => screen,
        Err(e) => {
            error!(error = %e, "could not start a level");
            eprintln!("Could not start a level: {e}");
            std::process::exit(1);
        }
    };

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        // Raw mode may already be on; put the terminal back before reporting.
        if let Err(cleanup_err) = renderer.cleanup() {
            error!(error = %cleanup_err, "terminal cleanup after failed init");
        }
        screen.dispose();
        error!(error = %e, "terminal init failed");
        eprintln!("Terminal init failed: {e}");
        return;
    }
    let mut input = InputState::new();
    input.enable_release_events();

    let result = game_loop(&mut screen, &mut renderer, &mut input, tick_rate);

    if let Err(e) = input.disable_release_events() {
        error!(error = %e, "keyboard enhancement restore failed");
    }
    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    screen.dispose();

    if let Err(e) = result {
        error!(error = %e, "game loop failed");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing GigaGal!");
    println!("Levels played: {}", screen.episodes());
    println!("Final Score: {}", screen.total_score());
}

fn game_loop(
    screen: &mut GameplayScreen,
    renderer: &mut Renderer,
    input: &mut InputState,
    tick_rate: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut frame = Frame::new(0, 0);
    let mut last_tick = Instant::now();

    // Edge-triggered presses seen between ticks, so none are lost.
    let mut pending_jump = false;
    let mut pending_shoot = false;

    loop {
        input.drain_events();
        if input.quit_requested() {
            info!("quit requested");
            break;
        }

        let seen = input.player_input();
        pending_jump |= seen.jump_pressed;
        pending_shoot |= seen.shoot_pressed;

        let now = Instant::now();
        let since = now.duration_since(last_tick);
        if since >= tick_rate {
            last_tick = now;

            let size = renderer.size();
            if size != frame.size() {
                frame.resize(size.0, size.1);
                screen.resize(size.0, size.1);
            }

            let mut tick_input = seen;
            tick_input.jump_pressed = std::mem::take(&mut pending_jump);
            tick_input.shoot_pressed = std::mem::take(&mut pending_shoot);

            let delta = since.as_secs_f32().min(MAX_DELTA);
            screen.render(delta, tick_input, now, &mut frame)?;
            renderer.present(&frame)?;
        }

        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Log to a file: the terminal belongs to the game while it runs.
fn init_tracing() {
    let path = std::env::var(LOG_ENV_VAR).unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
    let file = match File::create(&path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Logging disabled: could not create {path}: {e}");
            return;
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .compact()
        .init();
}
