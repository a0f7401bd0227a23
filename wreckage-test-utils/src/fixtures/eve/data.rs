//! ESI response payloads used by mock endpoints.
//!
//! Payloads mirror the JSON shapes ESI returns so the main crate's response models decode
//! them exactly as they would in production.

use serde_json::{json, Value};

pub fn alliance(name: &str) -> Value {
    json!({
        "creator_corporation_id": 98784257,
        "creator_id": 2114794365,
        "date_founded": "2024-09-25T06:25:58Z",
        "executor_corporation_id": 98787881,
        "name": name,
        "ticker": "WRCK"
    })
}

pub fn corporation(name: &str, alliance_id: Option<i64>) -> Value {
    json!({
        "alliance_id": alliance_id,
        "ceo_id": 2114794365,
        "creator_id": 2114794365,
        "date_founded": "2024-10-07T21:43:09Z",
        "member_count": 21,
        "name": name,
        "tax_rate": 0.1,
        "ticker": "WRCK"
    })
}

pub fn character(name: &str, corporation_id: i64, alliance_id: Option<i64>) -> Value {
    json!({
        "alliance_id": alliance_id,
        "birthday": "2018-12-20T16:11:54Z",
        "corporation_id": corporation_id,
        "name": name,
        "security_status": -0.2
    })
}

pub fn solar_system(system_id: i64, constellation_id: i64) -> Value {
    json!({
        "system_id": system_id,
        "constellation_id": constellation_id,
        "name": format!("System {}", system_id),
        "position": { "x": 1.0, "y": 2.0, "z": 3.0 },
        "security_class": "B",
        "security_status": 0.5,
        "star_id": 40000001
    })
}

pub fn constellation(constellation_id: i64, region_id: i64) -> Value {
    json!({
        "constellation_id": constellation_id,
        "name": format!("Constellation {}", constellation_id),
        "region_id": region_id,
        "systems": []
    })
}

pub fn region(region_id: i64) -> Value {
    json!({
        "region_id": region_id,
        "name": format!("Region {}", region_id),
        "description": "A region",
        "constellations": []
    })
}

pub fn inventory_type(type_id: i64, group_id: i64, published: bool) -> Value {
    json!({
        "type_id": type_id,
        "group_id": group_id,
        "name": format!("Type {}", type_id),
        "description": "An item",
        "published": published,
        "market_group_id": null,
        "volume": 5.0,
        "capacity": 0.0,
        "mass": 1000.0,
        "dogma_attributes": [
            { "attribute_id": 4, "value": 1000.0 },
            { "attribute_id": 38, "value": 0.0 }
        ]
    })
}

pub fn group(group_id: i64, category_id: i64) -> Value {
    json!({
        "group_id": group_id,
        "category_id": category_id,
        "name": format!("Group {}", group_id),
        "published": true,
        "types": []
    })
}

pub fn category(category_id: i64) -> Value {
    json!({
        "category_id": category_id,
        "name": format!("Category {}", category_id),
        "published": true,
        "groups": []
    })
}

pub fn market_history(entries: &[(&str, f64)]) -> Value {
    Value::Array(
        entries
            .iter()
            .map(|(date, average)| {
                json!({
                    "date": date,
                    "average": average,
                    "highest": average * 1.1,
                    "lowest": average * 0.9,
                    "order_count": 10,
                    "volume": 100
                })
            })
            .collect(),
    )
}

pub fn market_prices(entries: &[(i64, Option<f64>, Option<f64>)]) -> Value {
    Value::Array(
        entries
            .iter()
            .map(|(type_id, adjusted, average)| {
                json!({
                    "type_id": type_id,
                    "adjusted_price": adjusted,
                    "average_price": average
                })
            })
            .collect(),
    )
}
