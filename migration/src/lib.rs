pub use sea_orm_migration::prelude::*;

use sea_orm_migration::sea_orm::{EntityTrait, Schema};

mod m20241001_000001_eve_reference;
mod m20241001_000002_market;
mod m20241001_000003_killmail;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20241001_000001_eve_reference::Migration),
            Box::new(m20241001_000002_market::Migration),
            Box::new(m20241001_000003_killmail::Migration),
        ]
    }
}

/// Creates the table described by an entity of the `entity` crate
pub(crate) async fn create_entity_table<E: EntityTrait>(
    manager: &SchemaManager<'_>,
    entity: E,
) -> Result<(), DbErr> {
    let schema = Schema::new(manager.get_database_backend());

    manager
        .create_table(schema.create_table_from_entity(entity).if_not_exists().to_owned())
        .await
}

pub(crate) async fn drop_entity_table<E: EntityTrait>(
    manager: &SchemaManager<'_>,
    entity: E,
) -> Result<(), DbErr> {
    manager
        .drop_table(Table::drop().table(entity).if_exists().to_owned())
        .await
}
