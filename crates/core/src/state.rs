//! Flat, serializable form of a [`World`].
//!
//! Markets and the player refer to locations by name. Turning a
//! [`GameState`] back into a world resolves those names and rejects any state
//! that breaks the one-market-per-location rule.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::StateError,
    models::{Commodity, Location, Market, Money, Player, World, FIRST_DAY},
};

/// Player fields as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// Display name.
    pub name: String,
    /// Cash on hand.
    pub money: Money,
    /// Commodity name to units held.
    #[serde(default)]
    pub inventory: BTreeMap<String, u32>,
    /// Location name, resolved on load.
    pub current_location: String,
}

/// Everything needed to resume a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Tradeable goods.
    pub commodities: Vec<Commodity>,
    /// Locations in map order.
    pub locations: Vec<Location>,
    /// Price tables, matched to locations by name.
    pub markets: Vec<Market>,
    /// The trader.
    pub player: PlayerRecord,
    /// Day number, at least 1.
    pub current_day: u32,
    /// Informational timestamp of the capture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl GameState {
    /// Snapshot the given world.
    pub fn capture(world: &World) -> Self {
        let player = world.player();
        Self {
            commodities: world.commodities().to_vec(),
            locations: world.locations().to_vec(),
            markets: world.markets().to_vec(),
            player: PlayerRecord {
                name: player.name.clone(),
                money: player.money,
                inventory: player.inventory.clone(),
                current_location: player.current_location.clone(),
            },
            current_day: world.current_day(),
            created_at: Some(Utc::now()),
        }
    }

    /// Rebuild a world, resolving location names.
    pub fn into_world(self) -> Result<World, StateError> {
        if self.current_day < FIRST_DAY {
            return Err(StateError::InvalidDay(self.current_day));
        }

        let known: HashMap<&str, usize> = self
            .locations
            .iter()
            .enumerate()
            .map(|(idx, location)| (location.name.as_str(), idx))
            .collect();

        let mut slots: Vec<Option<Market>> = vec![None; self.locations.len()];
        for market in self.markets {
            let idx = *known
                .get(market.location.as_str())
                .ok_or_else(|| StateError::UnknownMarketLocation(market.location.clone()))?;
            if slots[idx].is_some() {
                return Err(StateError::DuplicateMarket(market.location));
            }
            slots[idx] = Some(market);
        }

        let markets = slots
            .into_iter()
            .zip(&self.locations)
            .map(|(slot, location)| {
                slot.ok_or_else(|| StateError::MissingMarket(location.name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if !known.contains_key(self.player.current_location.as_str()) {
            return Err(StateError::UnknownPlayerLocation(
                self.player.current_location,
            ));
        }

        let player = Player {
            name: self.player.name,
            money: self.player.money,
            inventory: self.player.inventory,
            current_location: self.player.current_location,
        };
        Ok(World::from_parts(
            self.commodities,
            self.locations,
            markets,
            player,
            self.current_day,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::engine::GameEngine;

    fn played_world() -> World {
        let world = World::new(
            vec![
                Commodity::new("Apple", 100, "🍎"),
                Commodity::new("Banana", 80, "🍌"),
            ],
            vec![
                Location::new("Helsinki", (0, 0)).with_specialty("Apple", 1.1),
                Location::new("Tampere", (1, 2)).with_specialty("Banana", 1.05),
            ],
            "Saver",
            "Helsinki",
            5_000,
        )
        .expect("valid world");
        let mut engine = GameEngine::new(world, StdRng::seed_from_u64(42));
        engine.buy("Apple", 3).expect("buy");
        engine.travel("Tampere").expect("travel");
        engine.into_world()
    }

    #[test]
    fn json_round_trip_restores_world() -> anyhow::Result<()> {
        let world = played_world();
        let json = serde_json::to_string(&GameState::capture(&world))?;
        let restored: GameState = serde_json::from_str(&json)?;
        let restored = restored.into_world()?;

        assert_eq!(restored.player(), world.player());
        assert_eq!(restored.current_day(), 2);
        assert_eq!(restored.markets(), world.markets());
        assert_eq!(restored, world);
        Ok(())
    }

    #[test]
    fn markets_are_reordered_to_match_locations() {
        let world = played_world();
        let mut state = GameState::capture(&world);
        state.markets.reverse();
        let restored = state.into_world().expect("valid state");
        assert_eq!(restored.markets(), world.markets());
    }

    #[test]
    fn unknown_player_location_is_rejected() {
        let mut state = GameState::capture(&played_world());
        state.player.current_location = "Atlantis".to_string();
        assert_eq!(
            state.into_world().unwrap_err(),
            StateError::UnknownPlayerLocation("Atlantis".to_string())
        );
    }

    #[test]
    fn market_for_unknown_location_is_rejected() {
        let mut state = GameState::capture(&played_world());
        state.markets[0].location = "Atlantis".to_string();
        assert_eq!(
            state.into_world().unwrap_err(),
            StateError::UnknownMarketLocation("Atlantis".to_string())
        );
    }

    #[test]
    fn missing_and_duplicate_markets_are_rejected() {
        let mut state = GameState::capture(&played_world());
        state.markets.pop();
        assert_eq!(
            state.clone().into_world().unwrap_err(),
            StateError::MissingMarket("Tampere".to_string())
        );

        let first = state.markets[0].clone();
        state.markets.push(first);
        assert_eq!(
            state.into_world().unwrap_err(),
            StateError::DuplicateMarket("Helsinki".to_string())
        );
    }

    #[test]
    fn day_zero_is_rejected() {
        let mut state = GameState::capture(&played_world());
        state.current_day = 0;
        assert_eq!(state.into_world().unwrap_err(), StateError::InvalidDay(0));
    }

    #[test]
    fn missing_fields_fail_to_parse() {
        let result = serde_json::from_str::<GameState>(r#"{"commodities": [], "locations": []}"#);
        assert!(result.is_err());
    }
}
