//! Cache key formats and time-to-live policy.

use std::time::Duration;

/// Entities that change during normal play: names, affiliations, prices
pub const VOLATILE_TTL: Duration = Duration::from_secs(60 * 60);
/// Static reference data: regions, groups, categories, flags
pub const STATIC_TTL: Duration = Duration::from_secs(24 * 60 * 60);

pub fn alliance(id: i64) -> String {
    format!("alliance:{}", id)
}

pub fn character(id: i64) -> String {
    format!("character:{}", id)
}

pub fn corporation(id: i64) -> String {
    format!("corporation:{}", id)
}

pub fn solar_system(id: i64) -> String {
    format!("system:{}", id)
}

pub fn constellation(id: i64) -> String {
    format!("constellation:{}", id)
}

pub fn region(id: i64) -> String {
    format!("region:{}", id)
}

pub fn inventory_type(id: i64) -> String {
    format!("type:{}", id)
}

pub fn type_category(id: i64) -> String {
    format!("type:category:{}", id)
}

pub fn type_group(id: i64) -> String {
    format!("type:group:{}", id)
}

pub fn type_flag(id: i64) -> String {
    format!("type:flag:{}", id)
}

pub fn type_attributes(type_id: i64) -> String {
    format!("type:attributes:{}", type_id)
}

pub fn blueprint_materials(blueprint_type_id: i64) -> String {
    format!("blueprint:materials:{}", blueprint_type_id)
}

pub fn blueprint_product(blueprint_type_id: i64) -> String {
    format!("blueprint:product:{}", blueprint_type_id)
}

pub fn blueprint_product_type(product_type_id: i64) -> String {
    format!("blueprint:producttypeid:{}", product_type_id)
}

/// Marker set once a type's market history was backfilled from ESI
pub fn market_history_backfill(type_id: i64) -> String {
    format!("market:history:backfill:{}", type_id)
}
