//! Utility functions and constants shared across services and workers.
//!
//! Includes EVE Online game constants (NPC corporation range, fitted slot flags, excluded ship
//! groups) and time helpers for cache expiry bookkeeping.

pub mod eve;
pub mod time;
