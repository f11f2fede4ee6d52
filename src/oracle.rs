// Price Oracle seam.
//
// The vault is agnostic to where prices come from. Every valuation asks for
// either the minimum or the maximum plausible price and the oracle answers
// with whichever is least favorable to the pool for that use. Staleness and
// multi-source aggregation are the oracle's own concern, not the vault's.

use crate::types::{AssetId, Price};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    #[error("no price available for asset {0:?}")]
    NoPrice(AssetId),
}

pub trait PriceOracle {
    // maximize=false -> minimum plausible price, true -> maximum
    fn price(&self, asset: AssetId, maximize: bool) -> Result<Price, OracleError>;
}

// In-memory min/max quote table. This is what the sim binary and the test
// suites drive; a production oracle adapter implements the same trait.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OracleBook {
    quotes: HashMap<AssetId, (Price, Price)>,
}

impl OracleBook {
    pub fn new() -> Self {
        Self {
            quotes: HashMap::new(),
        }
    }

    pub fn set_price(&mut self, asset: AssetId, min: Price, max: Price) {
        debug_assert!(min <= max, "min price must not exceed max price");
        self.quotes.insert(asset, (min, max));
    }

    // convenience for scenarios with no spread
    pub fn set_spot(&mut self, asset: AssetId, price: Price) {
        self.quotes.insert(asset, (price, price));
    }
}

impl PriceOracle for OracleBook {
    fn price(&self, asset: AssetId, maximize: bool) -> Result<Price, OracleError> {
        let (min, max) = self
            .quotes
            .get(&asset)
            .copied()
            .ok_or(OracleError::NoPrice(asset))?;
        Ok(if maximize { max } else { min })
    }
}
