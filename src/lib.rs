//! Killmail ingestion and enrichment for EVE Online.
//!
//! References (`id`, `hash`) arrive on a score-ordered Valkey queue. Workers fetch each
//! killmail from ESI, resolve the entities it mentions through the cache-aside services, price
//! the ship and every item, derive flags and values and store the killmail in one transaction.
//! Around that core sit the recalculation sweep, the expired entity refreshers, the market
//! price ingest and the killboard history backfill.

pub mod cache;
pub mod config;
pub mod data;
pub mod error;
pub mod esi;
pub mod model;
pub mod scheduler;
pub mod service;
pub mod startup;
pub mod util;
pub mod worker;
