use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter,
};

use crate::esi::universe::{EsiConstellation, EsiRegion, EsiSolarSystem};

/// Solar systems, constellations and regions
pub struct UniverseRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> UniverseRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn create_solar_system(
        &self,
        system: EsiSolarSystem,
    ) -> Result<entity::eve_solar_system::Model, DbErr> {
        entity::eve_solar_system::ActiveModel {
            id: ActiveValue::Set(system.system_id),
            name: ActiveValue::Set(system.name),
            constellation_id: ActiveValue::Set(system.constellation_id),
            star_id: ActiveValue::Set(system.star_id),
            security_status: ActiveValue::Set(system.security_status),
            security_class: ActiveValue::Set(system.security_class),
            pos_x: ActiveValue::Set(system.position.x),
            pos_y: ActiveValue::Set(system.position.y),
            pos_z: ActiveValue::Set(system.position.z),
            created_at: ActiveValue::Set(Utc::now().naive_utc()),
        }
        .insert(self.db)
        .await
    }

    pub async fn find_solar_system(
        &self,
        system_id: i64,
    ) -> Result<Option<entity::eve_solar_system::Model>, DbErr> {
        entity::prelude::EveSolarSystem::find_by_id(system_id)
            .one(self.db)
            .await
    }

    pub async fn find_solar_systems(
        &self,
        system_ids: &[i64],
    ) -> Result<Vec<entity::eve_solar_system::Model>, DbErr> {
        entity::prelude::EveSolarSystem::find()
            .filter(entity::eve_solar_system::Column::Id.is_in(system_ids.to_vec()))
            .all(self.db)
            .await
    }

    pub async fn create_constellation(
        &self,
        constellation: EsiConstellation,
    ) -> Result<entity::eve_constellation::Model, DbErr> {
        entity::eve_constellation::ActiveModel {
            id: ActiveValue::Set(constellation.constellation_id),
            name: ActiveValue::Set(constellation.name),
            region_id: ActiveValue::Set(constellation.region_id),
            created_at: ActiveValue::Set(Utc::now().naive_utc()),
        }
        .insert(self.db)
        .await
    }

    pub async fn find_constellation(
        &self,
        constellation_id: i64,
    ) -> Result<Option<entity::eve_constellation::Model>, DbErr> {
        entity::prelude::EveConstellation::find_by_id(constellation_id)
            .one(self.db)
            .await
    }

    pub async fn create_region(&self, region: EsiRegion) -> Result<entity::eve_region::Model, DbErr> {
        entity::eve_region::ActiveModel {
            id: ActiveValue::Set(region.region_id),
            name: ActiveValue::Set(region.name),
            description: ActiveValue::Set(region.description),
            created_at: ActiveValue::Set(Utc::now().naive_utc()),
        }
        .insert(self.db)
        .await
    }

    pub async fn find_region(
        &self,
        region_id: i64,
    ) -> Result<Option<entity::eve_region::Model>, DbErr> {
        entity::prelude::EveRegion::find_by_id(region_id)
            .one(self.db)
            .await
    }
}
