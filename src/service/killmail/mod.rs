//! Killmail enrichment: import, recalculation, notifications and historical backfill.

pub mod classify;
pub mod history;
pub mod notify;
pub mod pipeline;
pub mod prime;
pub mod recalculate;
pub mod value;

#[cfg(test)]
mod fixture;

pub use notify::Notifier;
pub use pipeline::{ImportOutcome, KillmailPipeline};
pub use recalculate::Recalculator;

use crate::service::eve::types::TypeService;

use self::classify::Participant;

/// Resolves the ship group needed for classification, unknown ships count as none
pub(crate) async fn participant(
    types: &TypeService<'_>,
    corporation_id: Option<i64>,
    ship_type_id: Option<i64>,
) -> Participant {
    let ship_group_id = match ship_type_id {
        Some(ship_type_id) => match types.get_type(ship_type_id).await {
            Ok(ship) => Some(ship.group_id),
            Err(e) => {
                tracing::debug!(ship_type_id, "ship group unavailable for classification: {}", e);
                None
            }
        },
        None => None,
    };

    Participant {
        corporation_id,
        ship_group_id,
    }
}
