//! Item valuation.
//!
//! [`PriceService::fetch_type_price`] walks a fixed sequence of strategies and returns the first
//! price that clears [`PRICE_FLOOR`]:
//!
//! 1. worthless categories are priced at the floor
//! 2. structure rigs and modules are priced at their build cost when it is known
//! 3. a small table of fixed prices for items without a usable market
//! 4. composite formulas for items assembled from other items
//! 5. unpublished types are priced at the floor
//! 6. a trimmed average of recent market history
//! 7. build cost from blueprint materials
//!
//! Build cost recursion tracks the types currently being built and fails with
//! [`PricingError::BlueprintCycle`] instead of recursing forever on cyclic blueprint data.

use chrono::NaiveDate;
use futures::future::{BoxFuture, FutureExt};
use sea_orm::DatabaseConnection;

use crate::{
    cache::{get_json, key, set_json, Cache},
    data::market::MarketRepository,
    error::{pricing::PricingError, Error, ResultExt},
    esi::EsiClient,
    service::{
        eve::{blueprint::BlueprintService, types::TypeService},
        market::ingest::MarketIngestService,
    },
    util::eve::PRICE_FLOOR,
};

/// SKINs have no market value
pub const WORTHLESS_CATEGORY_ID: i64 = 91;
/// Structure modules and rigs, priced at build cost before market data
pub const BUILD_COST_CATEGORY_ID: i64 = 66;

/// Number of history records averaged
pub const HISTORY_SAMPLE_SIZE: u64 = 33;
/// Below this many records no outliers are trimmed
const MIN_TRIMMED_SAMPLE: usize = 6;

/// Items without a meaningful market, mostly special edition ships
const FIXED_PRICES: &[(i64, f64)] = &[
    (2834, 80_000_000_000.0),   // Utu
    (3516, 80_000_000_000.0),   // Malice
    (11375, 80_000_000_000.0),  // Freki
    (3518, 80_000_000_000.0),   // Vangel
    (32788, 100_000_000_000.0), // Cambion
    (32790, 100_000_000_000.0), // Etana
    (32209, 100_000_000_000.0), // Mimir
    (33673, 100_000_000_000.0), // Whiptail
    (33397, 120_000_000_000.0), // Chremoas
    (35779, 120_000_000_000.0), // Imp
    (42246, 120_000_000_000.0), // Caedes
    (45530, 120_000_000_000.0), // Virtuoso
    (48636, 120_000_000_000.0), // Hydra
    (48635, 120_000_000_000.0), // Tiamat
    (12478, 0.01),              // Khumaak
    (34559, 0.01),              // Conflux Element
];

/// Items valued as `base + multiplier × Σ parts`
struct Composite {
    type_id: i64,
    base_type_id: i64,
    multiplier: f64,
    part_type_ids: &'static [i64],
}

const COMPOSITES: &[Composite] = &[
    // Customs Office: Gantry plus eight of each planetary component
    Composite {
        type_id: 2233,
        base_type_id: 3962,
        multiplier: 8.0,
        part_type_ids: &[2867, 2871, 2876, 2872],
    },
];

pub fn fixed_price(type_id: i64) -> Option<f64> {
    FIXED_PRICES
        .iter()
        .find(|(id, _)| *id == type_id)
        .map(|(_, price)| *price)
}

/// Mean of the history sample after trimming outliers.
///
/// A full sample drops the two highest and the lowest price, a partial sample of more than six
/// records drops the two highest and two lowest. Returns 0 for an empty sample.
pub fn trimmed_average(prices: &[f64]) -> f64 {
    let mut sorted = prices.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));

    let trimmed = if sorted.len() == HISTORY_SAMPLE_SIZE as usize {
        &sorted[2..sorted.len() - 1]
    } else if sorted.len() > MIN_TRIMMED_SAMPLE {
        &sorted[2..sorted.len() - 2]
    } else {
        &sorted[..]
    };

    if trimmed.is_empty() {
        return 0.0;
    }

    trimmed.iter().sum::<f64>() / trimmed.len() as f64
}

pub struct PriceService<'a> {
    db: &'a DatabaseConnection,
    cache: &'a dyn Cache,
    esi: &'a EsiClient,
}

impl<'a> PriceService<'a> {
    pub fn new(db: &'a DatabaseConnection, cache: &'a dyn Cache, esi: &'a EsiClient) -> Self {
        Self { db, cache, esi }
    }

    /// Price of one unit of `type_id` on `date`, never below [`PRICE_FLOOR`]
    pub async fn fetch_type_price(&self, type_id: i64, date: NaiveDate) -> Result<f64, Error> {
        let mut path = Vec::new();
        let price = self.price(type_id, date, &mut path).await?;

        Ok(price.max(PRICE_FLOOR))
    }

    fn price<'s>(
        &'s self,
        type_id: i64,
        date: NaiveDate,
        path: &'s mut Vec<i64>,
    ) -> BoxFuture<'s, Result<f64, Error>> {
        async move {
            let types = TypeService::new(self.db, self.cache, self.esi);

            let inventory_type = types.get_type(type_id).await?;
            let group = types.get_group(inventory_type.group_id).await?;

            if group.category_id == WORTHLESS_CATEGORY_ID {
                return Ok(PRICE_FLOOR);
            }

            if group.category_id == BUILD_COST_CATEGORY_ID {
                let built = self.build_price(type_id, date, path).await?;
                if built > PRICE_FLOOR {
                    return Ok(built);
                }
            }

            if let Some(price) = fixed_price(type_id) {
                return Ok(price);
            }

            if let Some(composite) = COMPOSITES.iter().find(|c| c.type_id == type_id) {
                let mut parts = 0.0;
                for part_type_id in composite.part_type_ids {
                    parts += self.price(*part_type_id, date, path).await?;
                }
                let base = self.price(composite.base_type_id, date, path).await?;

                return Ok((base + composite.multiplier * parts).max(PRICE_FLOOR));
            }

            if !inventory_type.published {
                return Ok(PRICE_FLOOR);
            }

            let average = self.historical_price(type_id, date).await?;
            if average > PRICE_FLOOR {
                return Ok(average);
            }

            let built = self.build_price(type_id, date, path).await?;

            Ok(built.max(PRICE_FLOOR))
        }
        .boxed()
    }

    /// Trimmed average of recent history, or the exact day's price when that is higher
    async fn historical_price(&self, type_id: i64, date: NaiveDate) -> Result<f64, Error> {
        let repo = MarketRepository::new(self.db);

        let mut records = repo
            .history_until(type_id, date, HISTORY_SAMPLE_SIZE)
            .await
            .context(format!("unable to load market history for type {type_id}"))?;

        if records.is_empty() && self.backfill_history(type_id).await? {
            records = repo
                .history_until(type_id, date, HISTORY_SAMPLE_SIZE)
                .await
                .context(format!("unable to load market history for type {type_id}"))?;
        }

        let prices: Vec<f64> = records.iter().map(|record| record.price).collect();
        let average = trimmed_average(&prices);

        let exact = records
            .iter()
            .find(|record| record.date == date)
            .map(|record| record.price);

        Ok(match exact {
            Some(price) if price > average => price,
            _ => average,
        })
    }

    /// Backfills history for a type at most once per cache period, returns whether any
    /// records were added
    async fn backfill_history(&self, type_id: i64) -> Result<bool, Error> {
        let marker = key::market_history_backfill(type_id);
        if get_json::<bool>(self.cache, &marker).await?.is_some() {
            return Ok(false);
        }

        let inserted = match MarketIngestService::new(self.db, self.esi)
            .backfill_history(type_id)
            .await
        {
            Ok(inserted) => inserted,
            Err(e) => {
                tracing::warn!(type_id, "market history backfill failed: {}", e);
                0
            }
        };

        set_json(self.cache, &marker, &true, key::VOLATILE_TTL)
            .await
            .context("unable to cache market history backfill marker in redis")?;

        Ok(inserted > 0)
    }

    /// Cost of the manufacturing materials of `type_id`, 0 when it cannot be built
    fn build_price<'s>(
        &'s self,
        type_id: i64,
        date: NaiveDate,
        path: &'s mut Vec<i64>,
    ) -> BoxFuture<'s, Result<f64, Error>> {
        async move {
            if path.contains(&type_id) {
                let mut cycle = path.clone();
                cycle.push(type_id);
                return Err(PricingError::BlueprintCycle {
                    type_id,
                    path: cycle,
                }
                .into());
            }

            let market = MarketRepository::new(self.db);
            if let Some(built) = market
                .find_built_price(type_id, date)
                .await
                .context(format!("unable to load built price for type {type_id}"))?
            {
                return Ok(built.price);
            }

            let blueprints = BlueprintService::new(self.db, self.cache);
            let Some(product) = blueprints.by_product_type(type_id).await? else {
                return Ok(0.0);
            };

            let materials = blueprints.materials(product.type_id).await?;
            if materials.is_empty() {
                return Ok(0.0);
            }

            path.push(type_id);
            let mut total = 0.0;
            for material in &materials {
                let unit = self.price(material.material_type_id, date, path).await?;
                total += material.quantity as f64 * unit.max(PRICE_FLOOR);
            }
            path.pop();

            if total > PRICE_FLOOR {
                market
                    .upsert_built_price(type_id, date, total)
                    .await
                    .context(format!("unable to store built price for type {type_id}"))?;
            }

            Ok(total)
        }
        .boxed()
    }
}
