//! Market pricing module
//!
//! Converts bookmaker decimal odds into implied and margin-free probabilities

mod devig;
mod types;

pub use devig::{devig, implied_probability};
pub use types::{MarketPricing, MarketProbability, OddsError, OddsTriple};
