use entity::prelude::*;
use sea_orm_migration::prelude::*;

use crate::{create_entity_table, drop_entity_table};

static IDX_EVE_BLUEPRINT_PRODUCT_PRODUCT_TYPE_ID: &str = "idx_eve_blueprint_product_product_type_id";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        create_entity_table(manager, MarketHistory).await?;
        create_entity_table(manager, MarketPriceBuilt).await?;
        create_entity_table(manager, EveBlueprintMaterial).await?;
        create_entity_table(manager, EveBlueprintProduct).await?;

        // Built prices look blueprints up by what they produce
        manager
            .create_index(
                Index::create()
                    .name(IDX_EVE_BLUEPRINT_PRODUCT_PRODUCT_TYPE_ID)
                    .table(EveBlueprintProduct)
                    .col(entity::eve_blueprint_product::Column::ProductTypeId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_entity_table(manager, EveBlueprintProduct).await?;
        drop_entity_table(manager, EveBlueprintMaterial).await?;
        drop_entity_table(manager, MarketPriceBuilt).await?;
        drop_entity_table(manager, MarketHistory).await
    }
}
