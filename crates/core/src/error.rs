//! Error types shared by the engine, setup and persistence layers.

use thiserror::Error;

use crate::models::Money;

/// Caller-correctable failures of a trade or travel attempt.
///
/// None of these leave the world modified.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TradeError {
    /// The current market does not list the commodity.
    #[error("Commodity not in market: {0}")]
    CommodityNotInMarket(String),

    /// Quantities must be at least one.
    #[error("Quantity must be a positive number, got {0}")]
    InvalidQuantity(u32),

    /// Buying would cost more than the player holds.
    #[error("Not enough funds to buy {quantity} {commodity}: costs {cost}, you have {available}")]
    InsufficientFunds {
        /// Commodity requested.
        commodity: String,
        /// Units requested.
        quantity: u32,
        /// Total price of the order.
        cost: Money,
        /// Money held by the player.
        available: Money,
    },

    /// Selling more units than held.
    #[error("Not enough {commodity} to sell {requested}: you have {held}")]
    InsufficientInventory {
        /// Commodity requested.
        commodity: String,
        /// Units requested.
        requested: u32,
        /// Units held by the player.
        held: u32,
    },

    /// The destination does not exist.
    #[error("City not found: {0}")]
    LocationNotFound(String),

    /// The player cannot afford the trip.
    #[error("Not enough funds to travel to {destination}. You need {shortfall} more.")]
    InsufficientTravelFunds {
        /// Requested destination.
        destination: String,
        /// Exact amount missing: travel cost minus money held.
        shortfall: Money,
    },

    /// Price times quantity does not fit the money type.
    #[error("Order of {quantity} {commodity} is too large")]
    AmountOverflow {
        /// Commodity requested.
        commodity: String,
        /// Units requested.
        quantity: u32,
    },

    /// The day counter cannot advance any further.
    #[error("The calendar has run out: day {0} is the last one")]
    DayLimitReached(u32),

    /// The player's location has no market. Only reachable through a broken world.
    #[error("No market for {0}")]
    MissingMarket(String),
}

/// Invalid input while building a new world.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    /// Name fails the 2-20 letters rule.
    #[error("Invalid player name: {0:?}. Use 2-20 letters (spaces and hyphens allowed).")]
    InvalidPlayerName(String),

    /// Two commodities share a name.
    #[error("duplicate commodity: {0}")]
    DuplicateCommodity(String),

    /// Two locations share a name.
    #[error("duplicate location: {0}")]
    DuplicateLocation(String),

    /// The map is empty.
    #[error("world has no locations")]
    NoLocations,

    /// The player starts outside the map.
    #[error("unknown starting location: {0}")]
    UnknownStartLocation(String),

    /// Markets are not index-paired with locations.
    #[error("markets do not line up with locations")]
    UnpairedMarkets,
}

/// Persisted state that cannot be turned back into a world.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// A market names a location that does not exist.
    #[error("market references unknown location '{0}'")]
    UnknownMarketLocation(String),

    /// A location has two markets.
    #[error("more than one market for location '{0}'")]
    DuplicateMarket(String),

    /// A location has no market.
    #[error("no market stored for location '{0}'")]
    MissingMarket(String),

    /// The player stands in a location that does not exist.
    #[error("player is in unknown location '{0}'")]
    UnknownPlayerLocation(String),

    /// Day zero.
    #[error("current day must be at least 1, got {0}")]
    InvalidDay(u32),

    /// The rebuilt world breaks a world invariant.
    #[error(transparent)]
    Inconsistent(#[from] SetupError),
}
