//! Parsing and execution of in-game text commands.

use std::fmt;

use rand::Rng;
use thiserror::Error;

use crate::{engine::GameEngine, error::TradeError, models::Money};

/// Command words shown by `help`, with their usage.
pub const COMMAND_HELP: &[(&str, &str)] = &[
    ("buy <fruit> <qty>", "Buy from the local market"),
    ("sell <fruit> <qty>", "Sell to the local market"),
    ("travel <city>", "Move to another city (costs money, one day passes)"),
    ("status", "Refresh the overview"),
    ("save", "Write the game to disk"),
    ("help", "Show this list"),
    ("quit", "Return to the main menu"),
];

/// A parsed player command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List the available commands.
    Help,
    /// Show money, location and net worth.
    Status,
    /// Persist the game now.
    Save,
    /// Leave the game (`quit` or `exit`).
    Quit,
    /// Buy from the local market.
    Buy {
        /// Capitalized commodity name.
        commodity: String,
        /// Units, always positive.
        quantity: u32,
    },
    /// Sell to the local market.
    Sell {
        /// Capitalized commodity name.
        commodity: String,
        /// Units, always positive.
        quantity: u32,
    },
    /// Move to another city.
    Travel {
        /// Capitalized city name.
        destination: String,
    },
}

/// Input that could not be turned into a [`Command`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Blank input.
    #[error("Empty command")]
    Empty,

    /// Unrecognized command word.
    #[error("Invalid command: {0}")]
    Unknown(String),

    /// Wrong number of arguments.
    #[error("{usage}")]
    Usage {
        /// Usage line for the command.
        usage: &'static str,
        /// Example invocation.
        example: &'static str,
    },

    /// Quantity is not a positive whole number.
    #[error("Quantity must be a number")]
    InvalidQuantity {
        /// Example invocation.
        example: &'static str,
    },
}

impl CommandError {
    /// Short follow-up hint for the player.
    pub fn hint(&self) -> String {
        match self {
            CommandError::Empty | CommandError::Unknown(_) => {
                "Try typing 'help' to see available commands.".to_string()
            }
            CommandError::Usage { example, .. } | CommandError::InvalidQuantity { example } => {
                format!("Example: {example}")
            }
        }
    }
}

/// What the caller should do after a command ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// State changed; show the message and persist.
    Done(String),
    /// Show the command list.
    ShowHelp,
    /// Show the player overview.
    ShowStatus,
    /// Persist the game.
    SaveRequested,
    /// Return to the menu.
    Quit,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Help => write!(f, "help"),
            Command::Status => write!(f, "status"),
            Command::Save => write!(f, "save"),
            Command::Quit => write!(f, "quit"),
            Command::Buy { commodity, quantity } => write!(f, "buy {commodity} {quantity}"),
            Command::Sell { commodity, quantity } => write!(f, "sell {commodity} {quantity}"),
            Command::Travel { destination } => write!(f, "travel {destination}"),
        }
    }
}

/// Parse one line of input.
///
/// The command word is case-insensitive; names are capitalized so `apple`
/// matches `Apple`.
pub fn parse_command(input: &str) -> Result<Command, CommandError> {
    let mut parts = input.split_whitespace();
    let word = parts.next().ok_or(CommandError::Empty)?.to_lowercase();
    let args: Vec<&str> = parts.collect();

    match word.as_str() {
        "help" => Ok(Command::Help),
        "status" => Ok(Command::Status),
        "save" => Ok(Command::Save),
        "quit" | "exit" => Ok(Command::Quit),
        "buy" => {
            let (commodity, quantity) =
                trade_args(&args, "Usage: buy <fruit> <quantity>", "buy apple 5")?;
            Ok(Command::Buy { commodity, quantity })
        }
        "sell" => {
            let (commodity, quantity) =
                trade_args(&args, "Usage: sell <fruit> <quantity>", "sell banana 3")?;
            Ok(Command::Sell { commodity, quantity })
        }
        "travel" => match args.as_slice() {
            [city] => Ok(Command::Travel {
                destination: capitalize(city),
            }),
            _ => Err(CommandError::Usage {
                usage: "Usage: travel <city>",
                example: "travel Tampere",
            }),
        },
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

fn trade_args(
    args: &[&str],
    usage: &'static str,
    example: &'static str,
) -> Result<(String, u32), CommandError> {
    let [name, qty] = args else {
        return Err(CommandError::Usage { usage, example });
    };
    if qty.is_empty() || !qty.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(CommandError::InvalidQuantity { example });
    }
    let quantity = qty
        .parse::<u32>()
        .ok()
        .filter(|value| *value > 0)
        .ok_or(CommandError::InvalidQuantity { example })?;
    Ok((capitalize(name), quantity))
}

/// Run a parsed command against the engine.
pub fn execute<R: Rng>(
    engine: &mut GameEngine<R>,
    command: Command,
) -> Result<Outcome, TradeError> {
    match command {
        Command::Help => Ok(Outcome::ShowHelp),
        Command::Status => Ok(Outcome::ShowStatus),
        Command::Save => Ok(Outcome::SaveRequested),
        Command::Quit => Ok(Outcome::Quit),
        Command::Buy {
            commodity,
            quantity,
        } => {
            let receipt = engine.buy(&commodity, quantity)?;
            Ok(Outcome::Done(format!(
                "Bought {} {} for {}!",
                receipt.quantity,
                pluralize(&receipt.commodity.to_lowercase(), receipt.quantity),
                format_money(receipt.total)
            )))
        }
        Command::Sell {
            commodity,
            quantity,
        } => {
            let receipt = engine.sell(&commodity, quantity)?;
            Ok(Outcome::Done(format!(
                "Sold {} {} for {}!",
                receipt.quantity,
                pluralize(&receipt.commodity.to_lowercase(), receipt.quantity),
                format_money(receipt.total)
            )))
        }
        Command::Travel { destination } => {
            engine.travel(&destination)?;
            Ok(Outcome::Done(format!(
                "Traveled to {destination}! Day {} begins.",
                engine.world().current_day()
            )))
        }
    }
}

/// Upper-case the first character and lower-case the rest.
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// `word` or `words` depending on `count`.
pub fn pluralize(word: &str, count: u32) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

/// Render cents as dollars, e.g. `$1,234.56`.
pub fn format_money(cents: Money) -> String {
    let dollars = (cents / 100).to_string();
    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (idx, ch) in dollars.chars().enumerate() {
        if idx > 0 && (dollars.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("${grouped}.{:02}", cents % 100)
}

#[cfg(test)]
mod tests {
    use rand::rngs::mock::StepRng;

    use super::*;
    use crate::models::{Commodity, Location, World};

    fn engine() -> GameEngine<StepRng> {
        let world = World::new(
            vec![Commodity::new("Apple", 100, "🍎")],
            vec![Location::new("Pori", (0, 0)), Location::new("Tampere", (1, 2))],
            "Player",
            "Pori",
            1_000,
        )
        .expect("valid world");
        GameEngine::new(world, StepRng::new(0, 0))
    }

    #[test]
    fn parses_simple_commands() {
        assert_eq!(parse_command("help"), Ok(Command::Help));
        assert_eq!(parse_command("  STATUS "), Ok(Command::Status));
        assert_eq!(parse_command("exit"), Ok(Command::Quit));
        assert_eq!(parse_command("quit"), Ok(Command::Quit));
        assert_eq!(parse_command("save"), Ok(Command::Save));
    }

    #[test]
    fn parses_trades_and_capitalizes_names() {
        assert_eq!(
            parse_command("buy apple 5"),
            Ok(Command::Buy {
                commodity: "Apple".to_string(),
                quantity: 5
            })
        );
        assert_eq!(
            parse_command("Sell BANANA 3"),
            Ok(Command::Sell {
                commodity: "Banana".to_string(),
                quantity: 3
            })
        );
        assert_eq!(
            parse_command("travel tampere"),
            Ok(Command::Travel {
                destination: "Tampere".to_string()
            })
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(parse_command("   "), Err(CommandError::Empty));
        assert_eq!(parse_command("dance"), Err(CommandError::Unknown("dance".to_string())));
        assert!(matches!(parse_command("buy apple"), Err(CommandError::Usage { .. })));
        assert!(matches!(parse_command("travel"), Err(CommandError::Usage { .. })));
        assert!(matches!(
            parse_command("buy apple five"),
            Err(CommandError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            parse_command("sell apple -1"),
            Err(CommandError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            parse_command("buy apple 0"),
            Err(CommandError::InvalidQuantity { .. })
        ));
        assert_eq!(
            parse_command("buy apple").unwrap_err().hint(),
            "Example: buy apple 5"
        );
    }

    #[test]
    fn executes_trades_and_travel() {
        let mut engine = engine();
        let outcome = execute(&mut engine, parse_command("buy apple 2").expect("parse"));
        assert_eq!(outcome, Ok(Outcome::Done("Bought 2 apples for $1.60!".to_string())));

        let outcome = execute(&mut engine, parse_command("sell apple 1").expect("parse"));
        assert_eq!(outcome, Ok(Outcome::Done("Sold 1 apple for $0.80!".to_string())));

        let outcome = execute(&mut engine, parse_command("travel tampere").expect("parse"));
        assert_eq!(
            outcome,
            Ok(Outcome::Done("Traveled to Tampere! Day 2 begins.".to_string()))
        );
    }

    #[test]
    fn trade_errors_pass_through() {
        let mut engine = engine();
        let err = execute(&mut engine, parse_command("sell apple 4").expect("parse")).unwrap_err();
        assert!(matches!(err, TradeError::InsufficientInventory { .. }));
    }

    #[test]
    fn non_trading_commands_map_to_outcomes() {
        let mut engine = engine();
        assert_eq!(execute(&mut engine, Command::Help), Ok(Outcome::ShowHelp));
        assert_eq!(execute(&mut engine, Command::Save), Ok(Outcome::SaveRequested));
        assert_eq!(execute(&mut engine, Command::Quit), Ok(Outcome::Quit));
        assert_eq!(engine.player().money, 1_000);
    }

    #[test]
    fn formats_money_in_dollars() {
        assert_eq!(format_money(0), "$0.00");
        assert_eq!(format_money(5), "$0.05");
        assert_eq!(format_money(200_000), "$2,000.00");
        assert_eq!(format_money(123_456_789), "$1,234,567.89");
    }

    #[test]
    fn capitalize_and_pluralize() {
        assert_eq!(capitalize("tAMPERE"), "Tampere");
        assert_eq!(capitalize(""), "");
        assert_eq!(pluralize("apple", 1), "apple");
        assert_eq!(pluralize("apple", 3), "apples");
    }
}
