//! Shared domain models.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::SetupError;

/// Amount of money in minor currency units (cents).
pub type Money = u64;

/// Cosmetic map coordinates of a location.
pub type Position = (i32, i32);

/// Modifier applied when a location has no specialty entry for a commodity.
pub const NEUTRAL_MODIFIER: f64 = 1.0;

/// A tradeable good.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commodity {
    /// Unique name (e.g. `Apple`).
    pub name: String,
    /// Reference price before city modifiers and daily variance.
    pub base_price: Money,
    /// Display label, usually an emoji.
    #[serde(default)]
    pub label: String,
    /// Optional flavour text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Commodity {
    /// Build a commodity without a description.
    pub fn new(name: impl Into<String>, base_price: Money, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_price,
            label: label.into(),
            description: None,
        }
    }
}

/// A city the player can travel to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Unique name (e.g. `Tampere`).
    pub name: String,
    /// Map coordinates. Not used by any game rule.
    #[serde(default)]
    pub position: Position,
    /// Commodity name to price multiplier.
    #[serde(default)]
    pub specialties: BTreeMap<String, f64>,
}

impl Location {
    /// A location without specialties.
    pub fn new(name: impl Into<String>, position: Position) -> Self {
        Self {
            name: name.into(),
            position,
            specialties: BTreeMap::new(),
        }
    }

    /// Builder-style helper to attach a specialty modifier.
    pub fn with_specialty(mut self, commodity: impl Into<String>, modifier: f64) -> Self {
        self.specialties.insert(commodity.into(), modifier);
        self
    }

    /// Multiplier for `commodity`, neutral when the city has no specialty for it.
    pub fn modifier_for(&self, commodity: &str) -> f64 {
        self.specialties
            .get(commodity)
            .copied()
            .unwrap_or(NEUTRAL_MODIFIER)
    }
}

/// Current price table of one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    /// Name of the owning location.
    pub location: String,
    /// Commodity name to current price.
    #[serde(default)]
    pub prices: BTreeMap<String, Money>,
}

impl Market {
    /// An empty price table for `location`.
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            prices: BTreeMap::new(),
        }
    }

    /// Listed price for `commodity`, if the market trades it.
    pub fn price(&self, commodity: &str) -> Option<Money> {
        self.prices.get(commodity).copied()
    }
}

/// The single trader of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Display name.
    pub name: String,
    /// Cash on hand.
    pub money: Money,
    /// Commodity name to units held.
    #[serde(default)]
    pub inventory: BTreeMap<String, u32>,
    /// Name of the location the player is currently in.
    pub current_location: String,
}

impl Player {
    /// Units of `commodity` held; absent entries count as zero.
    pub fn quantity_of(&self, commodity: &str) -> u32 {
        self.inventory.get(commodity).copied().unwrap_or(0)
    }

    /// Total number of units held across all commodities.
    pub fn total_units(&self) -> u64 {
        self.inventory.values().map(|qty| u64::from(*qty)).sum()
    }
}

/// Aggregate root holding the whole simulation state.
///
/// Markets are stored in the same order as locations, so `markets[i]` always
/// belongs to `locations[i]`. Fields are private to keep that pairing and the
/// name index consistent; use the accessors to read them.
#[derive(Debug, Clone, PartialEq)]
pub struct World {
    commodities: Vec<Commodity>,
    locations: Vec<Location>,
    markets: Vec<Market>,
    player: Player,
    current_day: u32,
    location_index: HashMap<String, usize>,
}

/// Day number of a fresh world.
pub const FIRST_DAY: u32 = 1;

impl World {
    /// Build a fresh world with empty markets, the player standing in
    /// `start_location` on day one.
    pub fn new(
        commodities: Vec<Commodity>,
        locations: Vec<Location>,
        player_name: impl Into<String>,
        start_location: &str,
        starting_money: Money,
    ) -> Result<Self, SetupError> {
        let markets = locations
            .iter()
            .map(|location| Market::new(location.name.clone()))
            .collect();
        let player = Player {
            name: player_name.into(),
            money: starting_money,
            inventory: BTreeMap::new(),
            current_location: start_location.to_string(),
        };
        Self::from_parts(commodities, locations, markets, player, FIRST_DAY)
    }

    /// Assemble a world from already-paired parts. `markets` must line up with
    /// `locations` by index.
    pub(crate) fn from_parts(
        commodities: Vec<Commodity>,
        locations: Vec<Location>,
        markets: Vec<Market>,
        player: Player,
        current_day: u32,
    ) -> Result<Self, SetupError> {
        let mut seen = HashSet::with_capacity(commodities.len());
        for commodity in &commodities {
            if !seen.insert(commodity.name.as_str()) {
                return Err(SetupError::DuplicateCommodity(commodity.name.clone()));
            }
        }

        let mut location_index = HashMap::with_capacity(locations.len());
        for (idx, location) in locations.iter().enumerate() {
            if location_index.insert(location.name.clone(), idx).is_some() {
                return Err(SetupError::DuplicateLocation(location.name.clone()));
            }
        }
        if locations.is_empty() {
            return Err(SetupError::NoLocations);
        }
        let paired = markets.len() == locations.len()
            && markets
                .iter()
                .zip(&locations)
                .all(|(market, location)| market.location == location.name);
        if !paired {
            return Err(SetupError::UnpairedMarkets);
        }
        if !location_index.contains_key(&player.current_location) {
            return Err(SetupError::UnknownStartLocation(
                player.current_location.clone(),
            ));
        }

        Ok(Self {
            commodities,
            locations,
            markets,
            player,
            current_day,
            location_index,
        })
    }

    /// All tradeable goods, in definition order.
    pub fn commodities(&self) -> &[Commodity] {
        &self.commodities
    }

    /// Commodity with the given name.
    pub fn commodity(&self, name: &str) -> Option<&Commodity> {
        self.commodities.iter().find(|commodity| commodity.name == name)
    }

    /// All locations, in map order.
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// Resolve a location by name through the index.
    pub fn location(&self, name: &str) -> Option<&Location> {
        self.location_index
            .get(name)
            .map(|idx| &self.locations[*idx])
    }

    /// Markets, index-paired with [`World::locations`].
    pub fn markets(&self) -> &[Market] {
        &self.markets
    }

    /// Market belonging to the named location.
    pub fn market(&self, location: &str) -> Option<&Market> {
        self.location_index
            .get(location)
            .and_then(|idx| self.markets.get(*idx))
    }

    /// Market of the city the player is standing in.
    pub fn current_market(&self) -> Option<&Market> {
        self.market(&self.player.current_location)
    }

    /// Location the player is standing in.
    pub fn current_location(&self) -> Option<&Location> {
        self.location(&self.player.current_location)
    }

    /// The trader.
    pub fn player(&self) -> &Player {
        &self.player
    }

    pub(crate) fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    /// Day number, starting at 1.
    pub fn current_day(&self) -> u32 {
        self.current_day
    }

    pub(crate) fn set_current_day(&mut self, day: u32) {
        self.current_day = day;
    }

    /// Current price of `commodity` in `location`, `0` when either is unknown.
    pub fn price(&self, commodity: &str, location: &str) -> Money {
        self.market(location)
            .and_then(|market| market.price(commodity))
            .unwrap_or(0)
    }

    /// Split borrow used by the pricing pass.
    pub(crate) fn pricing_parts(&mut self) -> (&[Commodity], &[Location], &mut [Market]) {
        (&self.commodities, &self.locations, &mut self.markets)
    }

    /// Net worth of the player: cash plus inventory valued at local prices.
    pub fn net_worth(&self) -> Money {
        let market = self.current_market();
        self.player
            .inventory
            .iter()
            .map(|(name, qty)| {
                market
                    .and_then(|market| market.price(name))
                    .unwrap_or(0)
                    .saturating_mul(Money::from(*qty))
            })
            .fold(self.player.money, Money::saturating_add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_world() -> World {
        World::new(
            vec![Commodity::new("Apple", 100, "a"), Commodity::new("Banana", 80, "b")],
            vec![
                Location::new("Pori", (0, 3)).with_specialty("Apple", 0.8),
                Location::new("Oulu", (3, 3)),
            ],
            "Tester",
            "Pori",
            1_000,
        )
        .expect("valid world")
    }

    #[test]
    fn new_world_pairs_markets_with_locations() {
        let world = sample_world();
        assert_eq!(world.current_day(), FIRST_DAY);
        assert_eq!(world.markets().len(), world.locations().len());
        for (location, market) in world.locations().iter().zip(world.markets()) {
            assert_eq!(location.name, market.location);
        }
        assert_eq!(world.current_market().map(|m| m.location.as_str()), Some("Pori"));
    }

    #[test]
    fn missing_specialty_is_neutral() {
        let world = sample_world();
        let pori = world.location("Pori").expect("pori exists");
        assert_eq!(pori.modifier_for("Apple"), 0.8);
        assert_eq!(pori.modifier_for("Banana"), NEUTRAL_MODIFIER);
    }

    #[test]
    fn rejects_unknown_start_location() {
        let err = World::new(
            vec![Commodity::new("Apple", 100, "a")],
            vec![Location::new("Pori", (0, 0))],
            "Tester",
            "Atlantis",
            10,
        )
        .unwrap_err();
        assert_eq!(err, SetupError::UnknownStartLocation("Atlantis".to_string()));
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = World::new(
            vec![Commodity::new("Apple", 100, "a")],
            vec![Location::new("Pori", (0, 0)), Location::new("Pori", (1, 1))],
            "Tester",
            "Pori",
            10,
        )
        .unwrap_err();
        assert_eq!(err, SetupError::DuplicateLocation("Pori".to_string()));

        let err = World::new(
            vec![Commodity::new("Apple", 100, "a"), Commodity::new("Apple", 90, "a")],
            vec![Location::new("Pori", (0, 0))],
            "Tester",
            "Pori",
            10,
        )
        .unwrap_err();
        assert_eq!(err, SetupError::DuplicateCommodity("Apple".to_string()));
    }

    #[test]
    fn empty_inventory_counts_as_zero() {
        let world = sample_world();
        assert_eq!(world.player().quantity_of("Apple"), 0);
        assert_eq!(world.player().total_units(), 0);
        assert_eq!(world.net_worth(), 1_000);
    }

    #[test]
    fn price_lookup_of_unknown_pair_is_zero() {
        let world = sample_world();
        assert_eq!(world.price("Apple", "Pori"), 0);
        assert_eq!(world.price("Apple", "Atlantis"), 0);
    }
}
