//! Daily price generation for every market.
//!
//! A price is `floor(base_price * specialty * variance)` where the variance is
//! drawn uniformly from [`MIN_VARIANCE`, `MAX_VARIANCE`] for each city and
//! commodity independently. Tables are always rebuilt from scratch, so no drift
//! accumulates between days.

use std::collections::BTreeMap;

use rand::Rng;

use crate::models::{Commodity, Location, Money, World};

/// Lower bound of the daily random factor.
pub const MIN_VARIANCE: f64 = 0.8;
/// Upper bound of the daily random factor.
pub const MAX_VARIANCE: f64 = 1.2;

/// Writes fresh price tables into a world's markets.
#[derive(Debug, Clone)]
pub struct PricingEngine<R> {
    rng: R,
}

impl<R: Rng> PricingEngine<R> {
    /// Wrap the random source used for daily variance.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Replace the price table of every market in `world`.
    pub fn regenerate_all_prices(&mut self, world: &mut World) {
        let (commodities, locations, markets) = world.pricing_parts();
        for (location, market) in locations.iter().zip(markets.iter_mut()) {
            market.prices = self.market_prices(location, commodities);
        }
    }

    fn market_prices(
        &mut self,
        location: &Location,
        commodities: &[Commodity],
    ) -> BTreeMap<String, Money> {
        commodities
            .iter()
            .map(|commodity| {
                let factor = self.rng.gen_range(MIN_VARIANCE..=MAX_VARIANCE);
                let price = compute_price(
                    commodity.base_price,
                    location.modifier_for(&commodity.name),
                    factor,
                );
                (commodity.name.clone(), price)
            })
            .collect()
    }

    /// Current price of `commodity` in `location`, `0` when not listed.
    ///
    /// Zero means "unavailable", never "free".
    pub fn get_price(&self, world: &World, commodity: &str, location: &str) -> Money {
        world.price(commodity, location)
    }
}

/// Price before rounding down to whole minor units.
pub fn compute_price(base_price: Money, modifier: f64, factor: f64) -> Money {
    let raw = base_price as f64 * modifier * factor;
    if raw.is_finite() && raw > 0.0 {
        raw.floor() as Money
    } else {
        0
    }
}

/// Inclusive range a regenerated price can land in.
pub fn price_bounds(base_price: Money, modifier: f64) -> (Money, Money) {
    (
        compute_price(base_price, modifier, MIN_VARIANCE),
        compute_price(base_price, modifier, MAX_VARIANCE),
    )
}
