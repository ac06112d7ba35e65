//! Cost-of-living estimates.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{CostSource, Location, SourceError};

/// Per-day costs in USD.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub daily: f64,
    pub meal: f64,
    pub transport: f64,
    pub hotel: f64,
    /// True when no city-specific row existed and the generic row was used
    pub estimated: bool,
}

impl CostBreakdown {
    const fn row(daily: f64, meal: f64, transport: f64, hotel: f64) -> Self {
        Self {
            daily,
            meal,
            transport,
            hotel,
            estimated: false,
        }
    }
}

const DEFAULT_ROW: CostBreakdown = CostBreakdown {
    daily: 70.0,
    meal: 10.0,
    transport: 2.5,
    hotel: 60.0,
    estimated: true,
};

/// Static cost table keyed by [`Location::cost_key`].
#[derive(Debug, Clone)]
pub struct CostTable {
    rows: HashMap<String, CostBreakdown>,
}

impl CostTable {
    /// Built-in reference cities.
    pub fn builtin() -> Self {
        let rows = [
            ("seoul", CostBreakdown::row(100.0, 12.0, 3.0, 80.0)),
            ("tokyo", CostBreakdown::row(120.0, 15.0, 4.0, 100.0)),
            ("delhi", CostBreakdown::row(40.0, 5.0, 1.0, 30.0)),
            ("lagos", CostBreakdown::row(50.0, 8.0, 2.0, 40.0)),
            ("paris", CostBreakdown::row(110.0, 18.0, 3.0, 90.0)),
            ("nairobi", CostBreakdown::row(60.0, 8.0, 2.0, 45.0)),
            ("sao paulo", CostBreakdown::row(70.0, 10.0, 2.0, 55.0)),
        ]
        .into_iter()
        .map(|(city, row)| (city.to_string(), row))
        .collect();
        Self { rows }
    }

    /// Add or replace a row.
    pub fn with_row(mut self, city: &str, row: CostBreakdown) -> Self {
        self.rows.insert(city.to_lowercase(), row);
        self
    }

    /// Row for `key`, or the generic estimate.
    pub fn lookup(&self, key: &str) -> CostBreakdown {
        self.rows.get(key).copied().unwrap_or(DEFAULT_ROW)
    }
}

impl Default for CostTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[async_trait]
impl CostSource for CostTable {
    async fn costs(&self, location: &Location) -> Result<CostBreakdown, SourceError> {
        Ok(self.lookup(&location.cost_key()))
    }
}
