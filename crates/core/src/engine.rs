//! Buying, selling and traveling.
//!
//! [`GameEngine`] is the only component that mutates the player and the only
//! one that advances the day. Every operation checks all of its
//! preconditions before touching state, so a returned error always means the
//! world is exactly as it was before the call.

use rand::{rngs::StdRng, Rng};

use crate::{
    error::TradeError,
    models::{Market, Money, Player, World},
    pricing::PricingEngine,
};

/// Flat cost of moving to another city.
pub const DEFAULT_TRAVEL_COST: Money = 50;

/// Summary of a completed buy or sell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Commodity traded.
    pub commodity: String,
    /// Units traded.
    pub quantity: u32,
    /// Price of one unit at the time of the trade.
    pub unit_price: Money,
    /// Money paid or received.
    pub total: Money,
}

/// Owns the world and the pricing engine for one session.
#[derive(Debug, Clone)]
pub struct GameEngine<R = StdRng> {
    world: World,
    pricing: PricingEngine<R>,
    travel_cost: Money,
}

impl<R: Rng> GameEngine<R> {
    /// Start a session on a fresh world, generating the first price tables.
    pub fn new(mut world: World, rng: R) -> Self {
        let mut pricing = PricingEngine::new(rng);
        pricing.regenerate_all_prices(&mut world);
        Self {
            world,
            pricing,
            travel_cost: DEFAULT_TRAVEL_COST,
        }
    }

    /// Resume a session from a restored world, keeping its saved prices.
    pub fn restore(world: World, rng: R) -> Self {
        Self {
            world,
            pricing: PricingEngine::new(rng),
            travel_cost: DEFAULT_TRAVEL_COST,
        }
    }

    /// Override the travel cost. Callers pass a positive amount; the config
    /// layer rejects zero.
    pub fn with_travel_cost(mut self, travel_cost: Money) -> Self {
        self.travel_cost = travel_cost;
        self
    }

    /// Read-only view of the whole simulation.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The trader of this session.
    pub fn player(&self) -> &Player {
        self.world.player()
    }

    /// Cost charged by every successful [`GameEngine::travel`].
    pub fn travel_cost(&self) -> Money {
        self.travel_cost
    }

    /// Market of the player's current city.
    pub fn current_market(&self) -> Option<&Market> {
        self.world.current_market()
    }

    /// Price lookup for display. `0` means not available.
    pub fn get_price(&self, commodity: &str, location: &str) -> Money {
        self.pricing.get_price(&self.world, commodity, location)
    }

    /// Buy `quantity` units of `commodity` in the current city.
    pub fn buy(&mut self, commodity: &str, quantity: u32) -> Result<Receipt, TradeError> {
        let unit_price = self.listed_price(commodity)?;
        if quantity == 0 {
            return Err(TradeError::InvalidQuantity(quantity));
        }
        let total = unit_price
            .checked_mul(Money::from(quantity))
            .ok_or_else(|| TradeError::AmountOverflow {
                commodity: commodity.to_string(),
                quantity,
            })?;
        let available = self.player().money;
        if total > available {
            return Err(TradeError::InsufficientFunds {
                commodity: commodity.to_string(),
                quantity,
                cost: total,
                available,
            });
        }
        let held = self.player().quantity_of(commodity);
        let new_held = held
            .checked_add(quantity)
            .ok_or_else(|| TradeError::AmountOverflow {
                commodity: commodity.to_string(),
                quantity,
            })?;

        let player = self.world.player_mut();
        player.money = available - total;
        player.inventory.insert(commodity.to_string(), new_held);
        Ok(Receipt {
            commodity: commodity.to_string(),
            quantity,
            unit_price,
            total,
        })
    }

    /// Sell `quantity` units of `commodity` in the current city.
    ///
    /// The inventory entry is kept at zero when everything is sold.
    pub fn sell(&mut self, commodity: &str, quantity: u32) -> Result<Receipt, TradeError> {
        let unit_price = self.listed_price(commodity)?;
        if quantity == 0 {
            return Err(TradeError::InvalidQuantity(quantity));
        }
        let held = self.player().quantity_of(commodity);
        if quantity > held {
            return Err(TradeError::InsufficientInventory {
                commodity: commodity.to_string(),
                requested: quantity,
                held,
            });
        }
        let overflow = || TradeError::AmountOverflow {
            commodity: commodity.to_string(),
            quantity,
        };
        let total = unit_price
            .checked_mul(Money::from(quantity))
            .ok_or_else(overflow)?;
        let new_money = self
            .player()
            .money
            .checked_add(total)
            .ok_or_else(overflow)?;

        let player = self.world.player_mut();
        player.money = new_money;
        player.inventory.insert(commodity.to_string(), held - quantity);
        Ok(Receipt {
            commodity: commodity.to_string(),
            quantity,
            unit_price,
            total,
        })
    }

    /// Move to `destination`, pay the travel cost and start a new day.
    pub fn travel(&mut self, destination: &str) -> Result<(), TradeError> {
        let location = self
            .world
            .location(destination)
            .ok_or_else(|| TradeError::LocationNotFound(destination.to_string()))?;
        let name = location.name.clone();

        let money = self.player().money;
        if money < self.travel_cost {
            return Err(TradeError::InsufficientTravelFunds {
                destination: name,
                shortfall: self.travel_cost - money,
            });
        }
        let today = self.world.current_day();
        let next_day = today
            .checked_add(1)
            .ok_or(TradeError::DayLimitReached(today))?;

        let player = self.world.player_mut();
        player.money = money - self.travel_cost;
        player.current_location = name;
        self.advance_day(next_day);
        Ok(())
    }

    /// Only reachable through [`GameEngine::travel`].
    fn advance_day(&mut self, next_day: u32) {
        self.world.set_current_day(next_day);
        self.pricing.regenerate_all_prices(&mut self.world);
    }

    fn listed_price(&self, commodity: &str) -> Result<Money, TradeError> {
        let market = self.current_market().ok_or_else(|| {
            TradeError::MissingMarket(self.player().current_location.clone())
        })?;
        market
            .price(commodity)
            .ok_or_else(|| TradeError::CommodityNotInMarket(commodity.to_string()))
    }

    /// Give up the engine and keep the world, e.g. for a final save.
    pub fn into_world(self) -> World {
        self.world
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::mock::StepRng;

    use super::*;
    use crate::{
        models::{Commodity, Location},
        state::GameState,
    };

    // A zero step source pins every random factor to 0.8:
    // Pori: Apple 64, Banana 120. Helsinki: Apple 96, Banana 120.
    fn engine_with(money: Money) -> GameEngine<StepRng> {
        let world = World::new(
            vec![
                Commodity::new("Apple", 100, "🍎"),
                Commodity::new("Banana", 150, "🍌"),
            ],
            vec![
                Location::new("Pori", (0, 0)).with_specialty("Apple", 0.8),
                Location::new("Helsinki", (0, 0)).with_specialty("Apple", 1.2),
            ],
            "Test Player",
            "Pori",
            money,
        )
        .expect("valid world");
        GameEngine::new(world, StepRng::new(0, 0))
    }

    #[test]
    fn construction_generates_prices() {
        let engine = engine_with(1_000);
        assert_eq!(engine.get_price("Apple", "Pori"), 64);
        assert_eq!(engine.get_price("Apple", "Helsinki"), 96);
        assert_eq!(engine.world().current_day(), 1);
    }

    #[test]
    fn buy_deducts_money_and_adds_inventory() {
        let mut engine = engine_with(1_000);
        let receipt = engine.buy("Apple", 5).expect("buy succeeds");
        assert_eq!(receipt.unit_price, 64);
        assert_eq!(receipt.total, 320);
        assert_eq!(engine.player().money, 680);
        assert_eq!(engine.player().quantity_of("Apple"), 5);

        engine.buy("Apple", 1).expect("second buy");
        assert_eq!(engine.player().quantity_of("Apple"), 6);
    }

    #[test]
    fn buy_with_insufficient_funds_changes_nothing() {
        let mut engine = engine_with(10);
        let before = engine.world().clone();
        let err = engine.buy("Apple", 1).unwrap_err();
        assert!(matches!(err, TradeError::InsufficientFunds { cost: 64, available: 10, .. }));
        assert_eq!(engine.player().money, 10);
        assert_eq!(engine.world(), &before);
    }

    #[test]
    fn buy_exact_balance_leaves_zero() {
        let mut engine = engine_with(128);
        engine.buy("Apple", 2).expect("exact amount");
        assert_eq!(engine.player().money, 0);
    }

    #[test]
    fn buy_unknown_commodity_fails() {
        let mut engine = engine_with(1_000);
        let err = engine.buy("Durian", 1).unwrap_err();
        assert_eq!(err, TradeError::CommodityNotInMarket("Durian".to_string()));
        assert_eq!(err.to_string(), "Commodity not in market: Durian");
        assert_eq!(engine.player().money, 1_000);
    }

    #[test]
    fn unknown_commodity_is_reported_before_quantity() {
        let mut engine = engine_with(1_000);
        assert_eq!(
            engine.buy("Durian", 0).unwrap_err(),
            TradeError::CommodityNotInMarket("Durian".to_string())
        );
        assert_eq!(engine.buy("Apple", 0).unwrap_err(), TradeError::InvalidQuantity(0));
        assert_eq!(engine.sell("Apple", 0).unwrap_err(), TradeError::InvalidQuantity(0));
    }

    #[test]
    fn buy_rejects_cost_overflow() {
        let world = World::new(
            vec![Commodity::new("Gold", Money::MAX / 2, "g")],
            vec![Location::new("Vault", (0, 0))],
            "Rich",
            "Vault",
            Money::MAX,
        )
        .expect("valid world");
        let mut engine = GameEngine::new(world, StepRng::new(0, 0));
        let err = engine.buy("Gold", u32::MAX).unwrap_err();
        assert!(matches!(err, TradeError::AmountOverflow { .. }));
        assert_eq!(engine.player().money, Money::MAX);
        assert_eq!(engine.player().quantity_of("Gold"), 0);
    }

    #[test]
    fn sell_adds_money_and_keeps_zero_entry() {
        let mut engine = engine_with(1_000);
        engine.buy("Banana", 2).expect("buy");
        let receipt = engine.sell("Banana", 2).expect("sell");
        assert_eq!(receipt.total, 240);
        assert_eq!(engine.player().money, 1_000);
        assert_eq!(engine.player().inventory.get("Banana"), Some(&0));
    }

    #[test]
    fn sell_more_than_held_changes_nothing() {
        let mut engine = engine_with(1_000);
        engine.buy("Apple", 1).expect("buy");
        let before = engine.world().clone();
        let err = engine.sell("Apple", 10).unwrap_err();
        assert_eq!(
            err,
            TradeError::InsufficientInventory {
                commodity: "Apple".to_string(),
                requested: 10,
                held: 1,
            }
        );
        assert_eq!(engine.world(), &before);
        assert_eq!(engine.player().quantity_of("Apple"), 1);
    }

    #[test]
    fn sell_unlisted_commodity_fails() {
        let mut engine = engine_with(1_000);
        let err = engine.sell("Durian", 1).unwrap_err();
        assert_eq!(err, TradeError::CommodityNotInMarket("Durian".to_string()));
    }

    #[test]
    fn buy_then_sell_without_travel_is_neutral() {
        let mut engine = engine_with(1_000);
        let before = engine.player().clone();
        engine.buy("Apple", 7).expect("buy");
        engine.sell("Apple", 7).expect("sell");
        assert_eq!(engine.player().money, before.money);
        assert_eq!(engine.player().quantity_of("Apple"), 0);
    }

    #[test]
    fn travel_moves_charges_and_advances_day() {
        let mut engine = engine_with(1_000);
        engine.travel("Helsinki").expect("travel");
        assert_eq!(engine.player().current_location, "Helsinki");
        assert_eq!(engine.player().money, 1_000 - DEFAULT_TRAVEL_COST);
        assert_eq!(engine.world().current_day(), 2);
        assert_eq!(
            engine.current_market().map(|market| market.location.as_str()),
            Some("Helsinki")
        );
    }

    #[test]
    fn travel_regenerates_every_market() {
        let mut engine = engine_with(1_000);
        {
            let (_, _, markets) = engine.world.pricing_parts();
            for market in markets.iter_mut() {
                market.prices.insert("Stale".to_string(), 1);
            }
        }
        engine.travel("Helsinki").expect("travel");
        for market in engine.world().markets() {
            assert!(!market.prices.contains_key("Stale"), "{}", market.location);
            assert_eq!(market.prices.len(), 2);
        }
    }

    #[test]
    fn travel_to_unknown_city_changes_nothing() {
        let mut engine = engine_with(1_000);
        let before = engine.world().clone();
        let err = engine.travel("Atlantis").unwrap_err();
        assert_eq!(err, TradeError::LocationNotFound("Atlantis".to_string()));
        assert_eq!(engine.world(), &before);
        assert_eq!(engine.world().current_day(), 1);
    }

    #[test]
    fn travel_without_funds_reports_shortfall() {
        let mut engine = engine_with(0);
        let err = engine.travel("Helsinki").unwrap_err();
        assert_eq!(
            err,
            TradeError::InsufficientTravelFunds {
                destination: "Helsinki".to_string(),
                shortfall: 50,
            }
        );
        assert!(err.to_string().contains("50 more"));
        assert_eq!(engine.player().current_location, "Pori");
        assert_eq!(engine.world().current_day(), 1);

        let mut engine = engine_with(30);
        let err = engine.travel("Helsinki").unwrap_err();
        assert!(err.to_string().contains("You need 20 more."));
        assert_eq!(engine.player().money, 30);
    }

    #[test]
    fn travel_cost_can_be_overridden() {
        let mut engine = engine_with(100).with_travel_cost(100);
        engine.travel("Helsinki").expect("travel");
        assert_eq!(engine.player().money, 0);
        assert!(engine.travel("Pori").is_err());
    }

    #[test]
    fn staying_put_still_passes_a_day() {
        let mut engine = engine_with(1_000);
        engine.travel("Pori").expect("travel");
        assert_eq!(engine.world().current_day(), 2);
        assert_eq!(engine.player().current_location, "Pori");
    }

    #[test]
    fn travel_on_last_representable_day_changes_nothing() {
        let engine = engine_with(1_000);
        let mut state = GameState::capture(engine.world());
        state.current_day = u32::MAX;
        let world = state.into_world().expect("valid state");
        let mut engine = GameEngine::restore(world, StepRng::new(0, 0));
        let before = engine.world().clone();

        let err = engine.travel("Helsinki").unwrap_err();
        assert_eq!(err, TradeError::DayLimitReached(u32::MAX));
        assert_eq!(engine.world(), &before);
        assert_eq!(engine.player().money, 1_000);
        assert_eq!(engine.player().current_location, "Pori");
    }

    #[test]
    fn restore_keeps_saved_prices() {
        let engine = engine_with(1_000);
        let world = engine.into_world();
        let restored = GameEngine::restore(world.clone(), StepRng::new(u64::MAX, 0));
        assert_eq!(restored.world(), &world);
    }
}
