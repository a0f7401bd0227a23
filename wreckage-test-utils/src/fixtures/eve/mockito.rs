//! Mock ESI endpoint definitions.
//!
//! Each function returns an unregistered [`Mock`]; [`TestBuilder`](crate::TestBuilder) and
//! [`TestContext::add_mock`](crate::TestContext::add_mock) register them with the server.

use mockito::{Matcher, Mock, ServerGuard};
use serde_json::Value;

/// A 200 JSON response at `path`, expected `expected_requests` times
pub fn json_endpoint(
    server: &mut ServerGuard,
    path: &str,
    body: &Value,
    expected_requests: usize,
) -> Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_header("expires", "Sat, 14 Sep 2024 11:05:00 GMT")
        .with_header("etag", "\"fixture-etag\"")
        .with_body(body.to_string())
        .expect(expected_requests)
}

/// A bodiless response with the given status at `path`
pub fn status_endpoint(
    server: &mut ServerGuard,
    path: &str,
    status: usize,
    expected_requests: usize,
) -> Mock {
    server
        .mock("GET", path)
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body("{\"error\":\"fixture\"}")
        .expect(expected_requests)
}

pub fn alliance_path(alliance_id: i64) -> String {
    format!("/alliances/{}/", alliance_id)
}

pub fn corporation_path(corporation_id: i64) -> String {
    format!("/corporations/{}/", corporation_id)
}

pub fn character_path(character_id: i64) -> String {
    format!("/characters/{}/", character_id)
}

pub fn solar_system_path(system_id: i64) -> String {
    format!("/universe/systems/{}/", system_id)
}

pub fn constellation_path(constellation_id: i64) -> String {
    format!("/universe/constellations/{}/", constellation_id)
}

pub fn region_path(region_id: i64) -> String {
    format!("/universe/regions/{}/", region_id)
}

pub fn type_path(type_id: i64) -> String {
    format!("/universe/types/{}/", type_id)
}

pub fn group_path(group_id: i64) -> String {
    format!("/universe/groups/{}/", group_id)
}

pub fn category_path(category_id: i64) -> String {
    format!("/universe/categories/{}/", category_id)
}

pub fn killmail_path(killmail_id: i64, hash: &str) -> String {
    format!("/killmails/{}/{}/", killmail_id, hash)
}

/// Regional market history for `type_id`, ESI passes the type as a query parameter
pub fn market_history_endpoint(
    server: &mut ServerGuard,
    region_id: i64,
    type_id: i64,
    body: &Value,
    expected_requests: usize,
) -> Mock {
    server
        .mock(
            "GET",
            Matcher::Regex(format!(r"^/markets/{}/history/", region_id)),
        )
        .match_query(Matcher::UrlEncoded(
            "type_id".to_string(),
            type_id.to_string(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .expect(expected_requests)
}

pub fn market_prices_path() -> String {
    "/markets/prices/".to_string()
}
