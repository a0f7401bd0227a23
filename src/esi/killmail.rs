use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{universe::EsiPosition, EsiClient, EsiResponse};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EsiKillmail {
    pub killmail_id: i64,
    pub killmail_time: DateTime<Utc>,
    pub solar_system_id: i64,
    pub moon_id: Option<i64>,
    pub war_id: Option<i64>,
    pub victim: EsiVictim,
    #[serde(default)]
    pub attackers: Vec<EsiAttacker>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EsiVictim {
    pub alliance_id: Option<i64>,
    pub character_id: Option<i64>,
    pub corporation_id: Option<i64>,
    pub faction_id: Option<i64>,
    pub damage_taken: i64,
    pub ship_type_id: i64,
    pub position: Option<EsiPosition>,
    #[serde(default)]
    pub items: Vec<EsiItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EsiAttacker {
    pub alliance_id: Option<i64>,
    pub character_id: Option<i64>,
    pub corporation_id: Option<i64>,
    pub faction_id: Option<i64>,
    pub damage_done: i64,
    pub final_blow: bool,
    pub security_status: f64,
    pub ship_type_id: Option<i64>,
    pub weapon_type_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EsiItem {
    pub flag: i64,
    pub item_type_id: i64,
    pub quantity_destroyed: Option<i64>,
    pub quantity_dropped: Option<i64>,
    pub singleton: i64,
    /// Contents of containers
    #[serde(default)]
    pub items: Vec<EsiItem>,
}

impl EsiClient {
    pub async fn get_killmail(&self, killmail_id: i64, hash: &str) -> EsiResponse<EsiKillmail> {
        self.get(&format!("/killmails/{}/{}/", killmail_id, hash), None)
            .await
    }
}
