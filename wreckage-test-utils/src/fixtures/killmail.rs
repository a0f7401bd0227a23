//! Killmail payloads and database inserts.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseConnection, DbErr};
use serde_json::{json, Value};

use crate::constant::TEST_KILLMAIL_TIME;

pub fn killmail(killmail_id: i64, solar_system_id: i64, victim: Value, attackers: Vec<Value>) -> Value {
    json!({
        "killmail_id": killmail_id,
        "killmail_time": TEST_KILLMAIL_TIME,
        "solar_system_id": solar_system_id,
        "victim": victim,
        "attackers": attackers
    })
}

pub fn victim(
    character_id: Option<i64>,
    corporation_id: Option<i64>,
    alliance_id: Option<i64>,
    ship_type_id: i64,
    items: Vec<Value>,
) -> Value {
    json!({
        "character_id": character_id,
        "corporation_id": corporation_id,
        "alliance_id": alliance_id,
        "damage_taken": 4500,
        "ship_type_id": ship_type_id,
        "position": { "x": 100.0, "y": 200.0, "z": 300.0 },
        "items": items
    })
}

pub fn attacker(
    character_id: Option<i64>,
    corporation_id: Option<i64>,
    ship_type_id: Option<i64>,
    final_blow: bool,
) -> Value {
    json!({
        "character_id": character_id,
        "corporation_id": corporation_id,
        "damage_done": 1500,
        "final_blow": final_blow,
        "security_status": 1.2,
        "ship_type_id": ship_type_id,
        "weapon_type_id": ship_type_id
    })
}

pub fn item(
    flag: i64,
    item_type_id: i64,
    quantity_destroyed: Option<i64>,
    quantity_dropped: Option<i64>,
    items: Vec<Value>,
) -> Value {
    json!({
        "flag": flag,
        "item_type_id": item_type_id,
        "quantity_destroyed": quantity_destroyed,
        "quantity_dropped": quantity_dropped,
        "singleton": 0,
        "items": items
    })
}

/// Insert a bare killmail row, as left behind by a previous import
pub async fn insert_killmail(
    db: &DatabaseConnection,
    killmail_id: i64,
    hash: &str,
) -> Result<entity::killmail::Model, DbErr> {
    let now = Utc::now().naive_utc();
    let killmail_time = DateTime::parse_from_rfc3339(TEST_KILLMAIL_TIME)
        .map(|time| time.naive_utc())
        .unwrap_or(now);

    entity::killmail::ActiveModel {
        id: ActiveValue::Set(killmail_id),
        hash: ActiveValue::Set(hash.to_string()),
        solar_system_id: ActiveValue::Set(30000142),
        moon_id: ActiveValue::Set(None),
        war_id: ActiveValue::Set(None),
        killmail_time: ActiveValue::Set(killmail_time),
        is_npc: ActiveValue::Set(false),
        is_awox: ActiveValue::Set(false),
        is_solo: ActiveValue::Set(false),
        dropped_value: ActiveValue::Set(0.0),
        destroyed_value: ActiveValue::Set(0.0),
        fitted_value: ActiveValue::Set(0.0),
        total_value: ActiveValue::Set(0.0),
        created_at: ActiveValue::Set(now),
        updated_at: ActiveValue::Set(now),
    }
    .insert(db)
    .await
}
