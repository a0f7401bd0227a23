use entity::prelude::*;
use sea_orm_migration::prelude::*;

use crate::{create_entity_table, drop_entity_table};

static IDX_EVE_ALLIANCE_CACHED_UNTIL: &str = "idx_eve_alliance_cached_until";
static IDX_EVE_CORPORATION_CACHED_UNTIL: &str = "idx_eve_corporation_cached_until";
static IDX_EVE_CHARACTER_CACHED_UNTIL: &str = "idx_eve_character_cached_until";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        create_entity_table(manager, EveAlliance).await?;
        create_entity_table(manager, EveCorporation).await?;
        create_entity_table(manager, EveCharacter).await?;
        create_entity_table(manager, EveRegion).await?;
        create_entity_table(manager, EveConstellation).await?;
        create_entity_table(manager, EveSolarSystem).await?;
        create_entity_table(manager, EveTypeCategory).await?;
        create_entity_table(manager, EveTypeGroup).await?;
        create_entity_table(manager, EveType).await?;
        create_entity_table(manager, EveTypeFlag).await?;
        create_entity_table(manager, EveTypeAttribute).await?;

        // The refreshers scan expirable entities by cache expiry
        manager
            .create_index(
                Index::create()
                    .name(IDX_EVE_ALLIANCE_CACHED_UNTIL)
                    .table(EveAlliance)
                    .col(entity::eve_alliance::Column::CachedUntil)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_EVE_CORPORATION_CACHED_UNTIL)
                    .table(EveCorporation)
                    .col(entity::eve_corporation::Column::CachedUntil)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_EVE_CHARACTER_CACHED_UNTIL)
                    .table(EveCharacter)
                    .col(entity::eve_character::Column::CachedUntil)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_entity_table(manager, EveTypeAttribute).await?;
        drop_entity_table(manager, EveTypeFlag).await?;
        drop_entity_table(manager, EveType).await?;
        drop_entity_table(manager, EveTypeGroup).await?;
        drop_entity_table(manager, EveTypeCategory).await?;
        drop_entity_table(manager, EveSolarSystem).await?;
        drop_entity_table(manager, EveConstellation).await?;
        drop_entity_table(manager, EveRegion).await?;
        drop_entity_table(manager, EveCharacter).await?;
        drop_entity_table(manager, EveCorporation).await?;
        drop_entity_table(manager, EveAlliance).await
    }
}
