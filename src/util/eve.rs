//! EVE Online game constants and classification helpers.
//!
//! Corporation IDs below [`NPC_CORPORATION_THRESHOLD`] belong to NPC corporations. Player
//! corporations created after the 2010 ID migration start at 98,000,000.

/// Corporation IDs at or above this value are player owned.
pub const NPC_CORPORATION_THRESHOLD: i64 = 98_000_000;

/// Minimum price ever assigned to an item.
pub const PRICE_FLOOR: f64 = 0.01;

/// `singleton` value marking a blueprint copy.
pub const SINGLETON_BLUEPRINT_COPY: i64 = 2;

/// Ship groups excluded from awox classification: capsules, shuttles, corvettes (rookie
/// ships), mobile warp disruptors and citizen ships.
pub const AWOX_EXCLUDED_GROUP_IDS: [i64; 5] = [29, 31, 237, 361, 2001];

/// Inventory flag ranges for items fitted to a ship.
///
/// Low/mid/high slots (11-34), implants (89), drone bay (87), rigs (92-99), subsystems
/// (125-132) and fighter tubes/structure services (159-171).
const FITTED_FLAG_RANGES: [(i64, i64); 6] = [
    (11, 34),
    (87, 87),
    (89, 89),
    (92, 99),
    (125, 132),
    (159, 171),
];

/// Returns true if the flag identifies a fitted slot.
pub fn is_fitted_flag(flag: i64) -> bool {
    FITTED_FLAG_RANGES
        .iter()
        .any(|(start, end)| flag >= *start && flag <= *end)
}

/// Returns true if the corporation ID belongs to a player corporation.
pub fn is_player_corporation(corporation_id: i64) -> bool {
    corporation_id >= NPC_CORPORATION_THRESHOLD
}
