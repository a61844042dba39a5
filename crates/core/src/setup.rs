//! Starting data for a new game.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    config::AppConfig,
    error::SetupError,
    models::{Commodity, Location, Money, World},
};

/// Bankroll of a new player: $2,000.00.
pub const DEFAULT_STARTING_MONEY: Money = 2_000_00;

// 2-20 letters (Latin-1 accents included), spaces and hyphens.
static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-zÀ-ÖØ-öø-ÿ \-]{2,20}$").expect("valid name pattern"));

/// Trim and validate a player name.
pub fn validate_player_name(raw: &str) -> Result<String, SetupError> {
    let trimmed = raw.trim();
    if NAME_PATTERN.is_match(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(SetupError::InvalidPlayerName(trimmed.to_string()))
    }
}

/// The five fruits traded in the default game.
pub fn default_commodities() -> Vec<Commodity> {
    vec![
        Commodity::new("Apple", 100, "🍎"),
        Commodity::new("Banana", 80, "🍌"),
        Commodity::new("Cherry", 150, "🍒"),
        Commodity::new("Grape", 120, "🍇"),
        Commodity::new("Orange", 110, "🍊"),
    ]
}

/// The five cities of the default map. The first one is the starting city.
pub fn default_locations() -> Vec<Location> {
    vec![
        Location::new("Helsinki", (0, 0))
            .with_specialty("Apple", 1.1)
            .with_specialty("Banana", 1.0),
        Location::new("Tampere", (1, 2))
            .with_specialty("Cherry", 0.9)
            .with_specialty("Banana", 1.05),
        Location::new("Turku", (2, 1))
            .with_specialty("Orange", 0.8)
            .with_specialty("Grape", 1.2),
        Location::new("Oulu", (3, 3))
            .with_specialty("Banana", 0.95)
            .with_specialty("Apple", 1.15),
        Location::new("Pori", (0, 3))
            .with_specialty("Apple", 0.8)
            .with_specialty("Grape", 1.05),
    ]
}

/// Build the default world for `player_name`, using the configured bankroll.
///
/// Prices are still empty; they are generated when the engine is created.
pub fn new_world(player_name: &str, config: &AppConfig) -> Result<World, SetupError> {
    let name = validate_player_name(player_name)?;
    let locations = default_locations();
    let start = locations
        .first()
        .map(|location| location.name.clone())
        .ok_or(SetupError::NoLocations)?;
    World::new(
        default_commodities(),
        locations,
        name,
        &start,
        config.starting_money,
    )
}
