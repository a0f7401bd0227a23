use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{EsiClient, EsiResponse};

/// The Forge, used as the reference market for history backfills
pub const THE_FORGE_REGION_ID: i64 = 10000002;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EsiMarketHistory {
    pub date: NaiveDate,
    pub average: f64,
    pub highest: f64,
    pub lowest: f64,
    pub order_count: i64,
    pub volume: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EsiMarketPrice {
    pub type_id: i64,
    pub adjusted_price: Option<f64>,
    pub average_price: Option<f64>,
}

impl EsiClient {
    pub async fn get_market_history(
        &self,
        region_id: i64,
        type_id: i64,
    ) -> EsiResponse<Vec<EsiMarketHistory>> {
        self.get(
            &format!("/markets/{}/history/?type_id={}", region_id, type_id),
            None,
        )
        .await
    }

    pub async fn get_market_prices(&self) -> EsiResponse<Vec<EsiMarketPrice>> {
        self.get("/markets/prices/", None).await
    }
}
