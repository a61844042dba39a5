#![warn(clippy::all, missing_docs)]

//! Core domain logic for the Fruit Dealer trading game.
//!
//! This crate hosts the data models, the pricing and transaction engines,
//! command parsing, configuration handling and save-file persistence used by
//! the terminal UI and any future frontends.

pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod pricing;
pub mod save;
pub mod setup;
pub mod state;

pub use command::{parse_command, Command, CommandError, Outcome};
pub use config::AppConfig;
pub use engine::{GameEngine, Receipt, DEFAULT_TRAVEL_COST};
pub use error::{SetupError, StateError, TradeError};
pub use models::{Commodity, Location, Market, Money, Player, World};
pub use pricing::PricingEngine;
pub use save::{SaveEntry, SaveManager};
pub use state::GameState;
