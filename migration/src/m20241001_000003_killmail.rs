use entity::prelude::*;
use sea_orm_migration::prelude::*;

use crate::{create_entity_table, drop_entity_table};

static IDX_KILLMAIL_ATTACKER_KILLMAIL_ID: &str = "idx_killmail_attacker_killmail_id";
static IDX_KILLMAIL_ITEM_KILLMAIL_ID: &str = "idx_killmail_item_killmail_id";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        create_entity_table(manager, Killmail).await?;
        create_entity_table(manager, KillmailVictim).await?;
        create_entity_table(manager, KillmailAttacker).await?;
        create_entity_table(manager, KillmailItem).await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_KILLMAIL_ATTACKER_KILLMAIL_ID)
                    .table(KillmailAttacker)
                    .col(entity::killmail_attacker::Column::KillmailId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_KILLMAIL_ITEM_KILLMAIL_ID)
                    .table(KillmailItem)
                    .col(entity::killmail_item::Column::KillmailId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_entity_table(manager, KillmailItem).await?;
        drop_entity_table(manager, KillmailAttacker).await?;
        drop_entity_table(manager, KillmailVictim).await?;
        drop_entity_table(manager, Killmail).await
    }
}
