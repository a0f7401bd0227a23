use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection, EntityTrait, PaginatorTrait};
use wreckage::data::killmail::KillmailRepository;
use wreckage_test_utils::prelude::*;

async fn migrated_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();

    db
}

/// Expect the migrations to create every table the pipeline writes to
#[tokio::test]
async fn migrations_create_killmail_graph_tables() {
    let db = migrated_db().await;

    killmail::insert_killmail(&db, 117000001, "deadbeef")
        .await
        .unwrap();

    let repo = KillmailRepository::new(&db);
    assert!(repo.find_victim(117000001).await.unwrap().is_none());
    assert!(repo.find_attackers(117000001).await.unwrap().is_empty());
    assert!(repo.find_items(117000001).await.unwrap().is_empty());
    assert_eq!(entity::prelude::Killmail::find().count(&db).await.unwrap(), 1);
    assert_eq!(entity::prelude::EveAlliance::find().count(&db).await.unwrap(), 0);
    assert_eq!(entity::prelude::MarketHistory::find().count(&db).await.unwrap(), 0);
}

/// Expect a second run against an up-to-date schema to be a no-op
#[tokio::test]
async fn migrations_rerun_cleanly() {
    let db = migrated_db().await;

    Migrator::up(&db, None).await.unwrap();

    assert!(Migrator::get_pending_migrations(&db).await.unwrap().is_empty());
}
