//! Database fixture inserts for EVE reference data and market prices.

use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseConnection, DbErr};

/// Insert an alliance whose cache expires at `cached_until` (unix seconds)
pub async fn insert_alliance(
    db: &DatabaseConnection,
    alliance_id: i64,
    cached_until: i64,
    etag: Option<&str>,
) -> Result<entity::eve_alliance::Model, DbErr> {
    let now = Utc::now().naive_utc();

    entity::eve_alliance::ActiveModel {
        id: ActiveValue::Set(alliance_id),
        name: ActiveValue::Set(format!("Alliance {}", alliance_id)),
        ticker: ActiveValue::Set("ALLY".to_string()),
        creator_corporation_id: ActiveValue::Set(98784257),
        executor_corporation_id: ActiveValue::Set(Some(98787881)),
        date_founded: ActiveValue::Set(now),
        is_closed: ActiveValue::Set(false),
        cached_until: ActiveValue::Set(cached_until),
        etag: ActiveValue::Set(etag.map(|etag| etag.to_string())),
        not_modified_count: ActiveValue::Set(0),
        update_priority: ActiveValue::Set(0),
        update_error: ActiveValue::Set(0),
        created_at: ActiveValue::Set(now),
        updated_at: ActiveValue::Set(now),
    }
    .insert(db)
    .await
}

pub async fn insert_corporation(
    db: &DatabaseConnection,
    corporation_id: i64,
    alliance_id: Option<i64>,
    cached_until: i64,
) -> Result<entity::eve_corporation::Model, DbErr> {
    let now = Utc::now().naive_utc();

    entity::eve_corporation::ActiveModel {
        id: ActiveValue::Set(corporation_id),
        name: ActiveValue::Set(format!("Corporation {}", corporation_id)),
        ticker: ActiveValue::Set("CORP".to_string()),
        alliance_id: ActiveValue::Set(alliance_id),
        faction_id: ActiveValue::Set(None),
        ceo_id: ActiveValue::Set(2114794365),
        creator_id: ActiveValue::Set(2114794365),
        member_count: ActiveValue::Set(10),
        tax_rate: ActiveValue::Set(0.1),
        date_founded: ActiveValue::Set(None),
        cached_until: ActiveValue::Set(cached_until),
        etag: ActiveValue::Set(None),
        not_modified_count: ActiveValue::Set(0),
        update_priority: ActiveValue::Set(0),
        update_error: ActiveValue::Set(0),
        created_at: ActiveValue::Set(now),
        updated_at: ActiveValue::Set(now),
    }
    .insert(db)
    .await
}

pub async fn insert_character(
    db: &DatabaseConnection,
    character_id: i64,
    corporation_id: i64,
    cached_until: i64,
) -> Result<entity::eve_character::Model, DbErr> {
    let now = Utc::now().naive_utc();

    entity::eve_character::ActiveModel {
        id: ActiveValue::Set(character_id),
        name: ActiveValue::Set(format!("Character {}", character_id)),
        corporation_id: ActiveValue::Set(corporation_id),
        alliance_id: ActiveValue::Set(None),
        faction_id: ActiveValue::Set(None),
        birthday: ActiveValue::Set(now),
        security_status: ActiveValue::Set(Some(0.0)),
        cached_until: ActiveValue::Set(cached_until),
        etag: ActiveValue::Set(None),
        not_modified_count: ActiveValue::Set(0),
        update_priority: ActiveValue::Set(0),
        update_error: ActiveValue::Set(0),
        created_at: ActiveValue::Set(now),
        updated_at: ActiveValue::Set(now),
    }
    .insert(db)
    .await
}

pub async fn insert_solar_system(
    db: &DatabaseConnection,
    system_id: i64,
    constellation_id: i64,
) -> Result<entity::eve_solar_system::Model, DbErr> {
    entity::eve_solar_system::ActiveModel {
        id: ActiveValue::Set(system_id),
        name: ActiveValue::Set(format!("System {}", system_id)),
        constellation_id: ActiveValue::Set(constellation_id),
        star_id: ActiveValue::Set(None),
        security_status: ActiveValue::Set(0.5),
        security_class: ActiveValue::Set(None),
        pos_x: ActiveValue::Set(0.0),
        pos_y: ActiveValue::Set(0.0),
        pos_z: ActiveValue::Set(0.0),
        created_at: ActiveValue::Set(Utc::now().naive_utc()),
    }
    .insert(db)
    .await
}

pub async fn insert_type(
    db: &DatabaseConnection,
    type_id: i64,
    group_id: i64,
    published: bool,
) -> Result<entity::eve_type::Model, DbErr> {
    entity::eve_type::ActiveModel {
        id: ActiveValue::Set(type_id),
        group_id: ActiveValue::Set(group_id),
        name: ActiveValue::Set(format!("Type {}", type_id)),
        description: ActiveValue::Set(String::new()),
        published: ActiveValue::Set(published),
        market_group_id: ActiveValue::Set(None),
        volume: ActiveValue::Set(None),
        capacity: ActiveValue::Set(None),
        mass: ActiveValue::Set(None),
        created_at: ActiveValue::Set(Utc::now().naive_utc()),
    }
    .insert(db)
    .await
}

pub async fn insert_group(
    db: &DatabaseConnection,
    group_id: i64,
    category_id: i64,
) -> Result<entity::eve_type_group::Model, DbErr> {
    entity::eve_type_group::ActiveModel {
        id: ActiveValue::Set(group_id),
        category_id: ActiveValue::Set(category_id),
        name: ActiveValue::Set(format!("Group {}", group_id)),
        published: ActiveValue::Set(true),
        created_at: ActiveValue::Set(Utc::now().naive_utc()),
    }
    .insert(db)
    .await
}

pub async fn insert_category(
    db: &DatabaseConnection,
    category_id: i64,
) -> Result<entity::eve_type_category::Model, DbErr> {
    entity::eve_type_category::ActiveModel {
        id: ActiveValue::Set(category_id),
        name: ActiveValue::Set(format!("Category {}", category_id)),
        published: ActiveValue::Set(true),
        created_at: ActiveValue::Set(Utc::now().naive_utc()),
    }
    .insert(db)
    .await
}

pub async fn insert_flag(
    db: &DatabaseConnection,
    flag_id: i64,
    name: &str,
) -> Result<entity::eve_type_flag::Model, DbErr> {
    entity::eve_type_flag::ActiveModel {
        id: ActiveValue::Set(flag_id),
        name: ActiveValue::Set(name.to_string()),
        text: ActiveValue::Set(name.to_string()),
    }
    .insert(db)
    .await
}

/// Insert type, group and category in one go
pub async fn insert_type_hierarchy(
    db: &DatabaseConnection,
    type_id: i64,
    group_id: i64,
    category_id: i64,
    published: bool,
) -> Result<entity::eve_type::Model, DbErr> {
    insert_category_if_missing(db, category_id).await?;
    insert_group_if_missing(db, group_id, category_id).await?;
    insert_type(db, type_id, group_id, published).await
}

async fn insert_category_if_missing(db: &DatabaseConnection, category_id: i64) -> Result<(), DbErr> {
    use sea_orm::EntityTrait;

    if entity::prelude::EveTypeCategory::find_by_id(category_id)
        .one(db)
        .await?
        .is_none()
    {
        insert_category(db, category_id).await?;
    }

    Ok(())
}

async fn insert_group_if_missing(
    db: &DatabaseConnection,
    group_id: i64,
    category_id: i64,
) -> Result<(), DbErr> {
    use sea_orm::EntityTrait;

    if entity::prelude::EveTypeGroup::find_by_id(group_id)
        .one(db)
        .await?
        .is_none()
    {
        insert_group(db, group_id, category_id).await?;
    }

    Ok(())
}

pub async fn insert_price(
    db: &DatabaseConnection,
    type_id: i64,
    date: NaiveDate,
    price: f64,
) -> Result<entity::market_history::Model, DbErr> {
    entity::market_history::ActiveModel {
        type_id: ActiveValue::Set(type_id),
        date: ActiveValue::Set(date),
        price: ActiveValue::Set(price),
    }
    .insert(db)
    .await
}

/// Insert one price per day, ending at `last_date` and walking backwards
pub async fn insert_daily_prices(
    db: &DatabaseConnection,
    type_id: i64,
    last_date: NaiveDate,
    prices: &[f64],
) -> Result<(), DbErr> {
    for (offset, price) in prices.iter().enumerate() {
        let date = last_date - chrono::Duration::days(offset as i64);
        insert_price(db, type_id, date, *price).await?;
    }

    Ok(())
}

/// Insert a manufacturing blueprint producing `product_type_id` from `materials`
pub async fn insert_blueprint(
    db: &DatabaseConnection,
    blueprint_type_id: i64,
    product_type_id: i64,
    materials: &[(i64, i64)],
) -> Result<(), DbErr> {
    entity::eve_blueprint_product::ActiveModel {
        type_id: ActiveValue::Set(blueprint_type_id),
        activity_id: ActiveValue::Set(1),
        product_type_id: ActiveValue::Set(product_type_id),
        quantity: ActiveValue::Set(1),
    }
    .insert(db)
    .await?;

    for (material_type_id, quantity) in materials {
        entity::eve_blueprint_material::ActiveModel {
            type_id: ActiveValue::Set(blueprint_type_id),
            activity_id: ActiveValue::Set(1),
            material_type_id: ActiveValue::Set(*material_type_id),
            quantity: ActiveValue::Set(*quantity),
        }
        .insert(db)
        .await?;
    }

    Ok(())
}
