//! EVE entity fixtures: ESI payloads, database inserts and mock endpoints.

pub mod data;
pub mod factory;
pub mod mockito;
