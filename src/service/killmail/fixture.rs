//! Reference data shared by the killmail service tests.

use chrono::NaiveDate;
use mockito::{Matcher, Mock, ServerGuard};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use wreckage_test_utils::prelude::*;

pub const KILLMAIL_ID: i64 = 117654321;
pub const HASH: &str = "0a1b2c3d4e5f";
pub const SYSTEM_ID: i64 = 30000142;
pub const ALLIANCE_ID: i64 = 99000001;
pub const CORPORATION_ID: i64 = 98000001;
pub const OTHER_CORPORATION_ID: i64 = 98000002;
pub const VICTIM_ID: i64 = 90000001;
pub const ATTACKER_ID: i64 = 90000002;
pub const OTHER_ATTACKER_ID: i64 = 90000003;

/// Rifter
pub const SHIP_TYPE_ID: i64 = 587;
pub const FRIGATE_GROUP_ID: i64 = 25;
/// Fitted module
pub const MODULE_TYPE_ID: i64 = 3001;
/// Cargo stack
pub const CARGO_TYPE_ID: i64 = 3002;

pub const SHIP_PRICE: f64 = 1_000.0;
pub const MODULE_PRICE: f64 = 100.0;
pub const CARGO_PRICE: f64 = 5.0;

pub fn killmail_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

/// Regional history answering with no records for any type
pub fn empty_history(server: &mut ServerGuard) -> Mock {
    server
        .mock("GET", Matcher::Regex(r"^/markets/10000002/history/".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
}

pub async fn setup() -> Result<TestContext, TestError> {
    TestBuilder::new()
        .with_eve_tables()
        .with_market_tables()
        .with_killmail_tables()
        .with_mock_endpoint(empty_history)
        .build()
        .await
}

/// Store every entity the fixture killmails reference, priced on the killmail date
pub async fn seed_world(db: &DatabaseConnection) -> Result<(), TestError> {
    let far_future = 4_102_444_800;

    factory::insert_solar_system(db, SYSTEM_ID, 20000020).await?;
    factory::insert_alliance(db, ALLIANCE_ID, far_future, None).await?;
    factory::insert_corporation(db, CORPORATION_ID, Some(ALLIANCE_ID), far_future).await?;
    factory::insert_corporation(db, OTHER_CORPORATION_ID, None, far_future).await?;
    for character_id in [VICTIM_ID, ATTACKER_ID] {
        factory::insert_character(db, character_id, CORPORATION_ID, far_future).await?;
    }
    factory::insert_character(db, OTHER_ATTACKER_ID, OTHER_CORPORATION_ID, far_future).await?;

    factory::insert_type_hierarchy(db, SHIP_TYPE_ID, FRIGATE_GROUP_ID, 6, true).await?;
    factory::insert_type_hierarchy(db, MODULE_TYPE_ID, 53, 7, true).await?;
    factory::insert_type_hierarchy(db, CARGO_TYPE_ID, 54, 7, true).await?;

    factory::insert_daily_prices(db, SHIP_TYPE_ID, killmail_date(), &[SHIP_PRICE; 10]).await?;
    factory::insert_daily_prices(db, MODULE_TYPE_ID, killmail_date(), &[MODULE_PRICE; 10]).await?;
    factory::insert_daily_prices(db, CARGO_TYPE_ID, killmail_date(), &[CARGO_PRICE; 10]).await?;

    Ok(())
}

/// Victim in [`CORPORATION_ID`] losing a ship with one module (1 destroyed, 1 dropped) and
/// ten units of cargo dropped
pub fn killmail_body(attackers: Vec<Value>) -> Value {
    killmail::killmail(
        KILLMAIL_ID,
        SYSTEM_ID,
        killmail::victim(
            Some(VICTIM_ID),
            Some(CORPORATION_ID),
            Some(ALLIANCE_ID),
            SHIP_TYPE_ID,
            vec![
                killmail::item(27, MODULE_TYPE_ID, Some(1), Some(1), vec![]),
                killmail::item(5, CARGO_TYPE_ID, None, Some(10), vec![]),
            ],
        ),
        attackers,
    )
}

/// Single corp mate in a frigate
pub fn corp_mate_attacker() -> Value {
    killmail::attacker(Some(ATTACKER_ID), Some(CORPORATION_ID), Some(SHIP_TYPE_ID), true)
}
