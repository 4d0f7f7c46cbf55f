//! Heist
//!
//! Headless run of the stealth game: a burglar walks a scripted route through
//! a mansion while a guard patrols. Pass a `.toml` or `.ron` file to override
//! the defaults:
//!
//! ```text
//! heist [config.toml]
//! ```

mod config;
mod entities;
mod game;
mod level;

use heist_engine::core::config::Config;
use heist_engine::foundation::logging;

use config::GameConfig;
use game::{GameError, Heist, Outcome};

fn load_config() -> Result<GameConfig, GameError> {
    let config = match std::env::args().nth(1) {
        Some(path) => GameConfig::load_from_file(&path)?,
        None => GameConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), GameError> {
    let config = load_config()?;
    logging::init_with_filter(&config.engine.log_level);
    log::info!(
        "Starting heist: {:?} broad phase, {:?} spatial index, {} ticks",
        config.collision.default_strategy,
        config.world.spatial_index,
        config.gameplay.ticks
    );

    let mut game = Heist::new(&config)?;
    match game.run()? {
        Outcome::Caught { tick } => log::info!("Game over: caught after {tick} ticks"),
        Outcome::TimeUp { loot } => log::info!("Escaped with {loot} loot"),
    }
    log::debug!(
        "Final state: {:?}, {} props left in the level",
        game.world(),
        game.level().actionables.len()
    );
    Ok(())
}
