use serde::{Deserialize, Serialize};

use super::{EsiClient, EsiResponse};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EsiPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EsiSolarSystem {
    pub system_id: i64,
    pub constellation_id: i64,
    pub name: String,
    pub position: EsiPosition,
    pub security_class: Option<String>,
    pub security_status: f64,
    pub star_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EsiConstellation {
    pub constellation_id: i64,
    pub name: String,
    pub region_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EsiRegion {
    pub region_id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EsiDogmaAttribute {
    pub attribute_id: i64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EsiType {
    pub type_id: i64,
    pub group_id: i64,
    pub name: String,
    pub description: String,
    pub published: bool,
    pub market_group_id: Option<i64>,
    pub volume: Option<f64>,
    pub capacity: Option<f64>,
    pub mass: Option<f64>,
    #[serde(default)]
    pub dogma_attributes: Vec<EsiDogmaAttribute>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EsiGroup {
    pub group_id: i64,
    pub category_id: i64,
    pub name: String,
    pub published: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EsiCategory {
    pub category_id: i64,
    pub name: String,
    pub published: bool,
}

impl EsiClient {
    pub async fn get_solar_system(&self, system_id: i64) -> EsiResponse<EsiSolarSystem> {
        self.get(&format!("/universe/systems/{}/", system_id), None)
            .await
    }

    pub async fn get_constellation(&self, constellation_id: i64) -> EsiResponse<EsiConstellation> {
        self.get(&format!("/universe/constellations/{}/", constellation_id), None)
            .await
    }

    pub async fn get_region(&self, region_id: i64) -> EsiResponse<EsiRegion> {
        self.get(&format!("/universe/regions/{}/", region_id), None)
            .await
    }

    pub async fn get_type(&self, type_id: i64) -> EsiResponse<EsiType> {
        self.get(&format!("/universe/types/{}/", type_id), None).await
    }

    pub async fn get_group(&self, group_id: i64) -> EsiResponse<EsiGroup> {
        self.get(&format!("/universe/groups/{}/", group_id), None)
            .await
    }

    pub async fn get_category(&self, category_id: i64) -> EsiResponse<EsiCategory> {
        self.get(&format!("/universe/categories/{}/", category_id), None)
            .await
    }
}
