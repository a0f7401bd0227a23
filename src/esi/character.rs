//! Alliance, corporation and character endpoints.
//!
//! These are the expirable entities; each accepts the previously stored etag so ESI can answer
//! `304 Not Modified` for unchanged data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EsiClient, EsiResponse};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EsiAlliance {
    pub creator_corporation_id: i64,
    pub creator_id: i64,
    pub date_founded: DateTime<Utc>,
    pub executor_corporation_id: Option<i64>,
    pub faction_id: Option<i64>,
    pub name: String,
    pub ticker: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EsiCorporation {
    pub alliance_id: Option<i64>,
    pub ceo_id: i64,
    pub creator_id: i64,
    pub date_founded: Option<DateTime<Utc>>,
    pub faction_id: Option<i64>,
    pub member_count: i64,
    pub name: String,
    pub tax_rate: f64,
    pub ticker: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EsiCharacter {
    pub alliance_id: Option<i64>,
    pub birthday: DateTime<Utc>,
    pub corporation_id: i64,
    pub faction_id: Option<i64>,
    pub name: String,
    pub security_status: Option<f64>,
}

impl EsiClient {
    pub async fn get_alliance(&self, alliance_id: i64, etag: Option<&str>) -> EsiResponse<EsiAlliance> {
        self.get(&format!("/alliances/{}/", alliance_id), etag).await
    }

    pub async fn get_corporation(
        &self,
        corporation_id: i64,
        etag: Option<&str>,
    ) -> EsiResponse<EsiCorporation> {
        self.get(&format!("/corporations/{}/", corporation_id), etag)
            .await
    }

    pub async fn get_character(
        &self,
        character_id: i64,
        etag: Option<&str>,
    ) -> EsiResponse<EsiCharacter> {
        self.get(&format!("/characters/{}/", character_id), etag)
            .await
    }
}
