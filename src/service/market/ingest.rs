//! Market price ingest from ESI.
//!
//! The daily job stores one record per type from the global `/markets/prices/` feed. Types
//! without any stored history can be backfilled from the regional history of The Forge.

use chrono::NaiveDate;
use sea_orm::DatabaseConnection;

use crate::{
    data::market::MarketRepository,
    error::{Error, ResultExt},
    esi::{market::EsiMarketPrice, market::THE_FORGE_REGION_ID, EsiClient},
    util::eve::PRICE_FLOOR,
};

/// Rows per insert statement
const INSERT_CHUNK_SIZE: usize = 1000;

pub struct MarketIngestService<'a> {
    db: &'a DatabaseConnection,
    esi: &'a EsiClient,
}

impl<'a> MarketIngestService<'a> {
    pub fn new(db: &'a DatabaseConnection, esi: &'a EsiClient) -> Self {
        Self { db, esi }
    }

    /// Stores today's price for every type listed by ESI, returns the number of rows inserted.
    ///
    /// Existing records for `date` are kept.
    pub async fn ingest_prices(&self, date: NaiveDate) -> Result<u64, Error> {
        let repo = MarketRepository::new(self.db);

        let (prices, _) = self
            .esi
            .get_market_prices()
            .await
            .into_result()
            .context("unable to fetch market prices from ESI")?;

        let records: Vec<(i64, NaiveDate, f64)> = prices
            .iter()
            .filter_map(|price| select_price(price).map(|value| (price.type_id, date, value)))
            .collect();

        let mut inserted = 0;
        for chunk in records.chunks(INSERT_CHUNK_SIZE) {
            inserted += repo
                .insert_history(chunk.to_vec())
                .await
                .context("failed to insert market price chunk")?;
        }

        tracing::info!(
            listed = prices.len(),
            inserted,
            %date,
            "stored market prices"
        );

        Ok(inserted)
    }

    /// Inserts the daily averages ESI reports for `type_id` in The Forge
    pub async fn backfill_history(&self, type_id: i64) -> Result<u64, Error> {
        let repo = MarketRepository::new(self.db);

        let (history, _) = self
            .esi
            .get_market_history(THE_FORGE_REGION_ID, type_id)
            .await
            .into_result()
            .context(format!("unable to fetch market history for type {type_id}"))?;

        let records: Vec<(i64, NaiveDate, f64)> = history
            .into_iter()
            .filter(|day| day.average > PRICE_FLOOR)
            .map(|day| (type_id, day.date, day.average))
            .collect();

        let mut inserted = 0;
        for chunk in records.chunks(INSERT_CHUNK_SIZE) {
            inserted += repo
                .insert_history(chunk.to_vec())
                .await
                .context(format!("failed to insert market history for type {type_id}"))?;
        }

        tracing::debug!(type_id, inserted, "backfilled market history");

        Ok(inserted)
    }
}

/// Greater of the adjusted and average price, `None` when it does not clear the floor
fn select_price(price: &EsiMarketPrice) -> Option<f64> {
    let adjusted = price.adjusted_price.unwrap_or(0.0);
    let average = price.average_price.unwrap_or(0.0);
    let selected = adjusted.max(average);

    (selected > PRICE_FLOOR).then_some(selected)
}

#[cfg(test)]
mod tests {
    use wreckage_test_utils::{fixtures::eve::mockito as mocks, prelude::*};

    use super::*;
    use crate::esi::test_client;

    #[test]
    fn select_price_prefers_higher_value() {
        let price = |adjusted, average| EsiMarketPrice {
            type_id: 34,
            adjusted_price: adjusted,
            average_price: average,
        };

        assert_eq!(select_price(&price(Some(5.0), Some(4.0))), Some(5.0));
        assert_eq!(select_price(&price(Some(5.0), Some(6.5))), Some(6.5));
        assert_eq!(select_price(&price(None, Some(2.0))), Some(2.0));
        assert_eq!(select_price(&price(Some(0.01), None)), None);
        assert_eq!(select_price(&price(None, None)), None);
    }

    /// Expect one record per priced type and worthless entries skipped
    #[tokio::test]
    async fn ingest_prices_stores_daily_records() -> Result<(), TestError> {
        let test = TestBuilder::new()
            .with_market_tables()
            .with_json_endpoint(
                &mocks::market_prices_path(),
                data::market_prices(&[
                    (34, Some(4.5), Some(5.0)),
                    (35, Some(9.0), None),
                    (36, None, Some(0.001)),
                ]),
                1,
            )
            .build()
            .await?;
        let esi = test_client(&test.server_url());
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let service = MarketIngestService::new(&test.db, &esi);

        service.ingest_prices(date).await.unwrap();

        let repo = MarketRepository::new(&test.db);
        assert_eq!(repo.history_until(34, date, 33).await?[0].price, 5.0);
        assert_eq!(repo.history_until(35, date, 33).await?[0].price, 9.0);
        assert!(repo.history_until(36, date, 33).await?.is_empty());
        test.assert_mocks();

        Ok(())
    }

    /// Expect regional daily averages to be stored per date
    #[tokio::test]
    async fn backfill_history_inserts_averages() -> Result<(), TestError> {
        let body = data::market_history(&[("2024-06-13", 10.0), ("2024-06-14", 12.0)]);
        let test = TestBuilder::new()
            .with_market_tables()
            .with_mock_endpoint(move |server| {
                mocks::market_history_endpoint(server, THE_FORGE_REGION_ID, 587, &body, 1)
            })
            .build()
            .await?;
        let esi = test_client(&test.server_url());
        let service = MarketIngestService::new(&test.db, &esi);

        service.backfill_history(587).await.unwrap();

        let repo = MarketRepository::new(&test.db);
        let history = repo
            .history_until(587, NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(), 33)
            .await?;
        let prices: Vec<f64> = history.iter().map(|record| record.price).collect();
        assert_eq!(prices, vec![12.0, 10.0]);
        test.assert_mocks();

        Ok(())
    }
}
