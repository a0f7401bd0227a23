//! Killmail classification flags.
//!
//! Classification only looks at corporations and ship groups, so callers resolve ship groups
//! up front and pass [`Participant`]s in. An unknown ship group never counts as a ship for
//! awox purposes.

use crate::{
    model::killmail::KillmailFlags,
    util::eve::{is_player_corporation, AWOX_EXCLUDED_GROUP_IDS},
};

/// Victim or attacker reduced to what classification needs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Participant {
    pub corporation_id: Option<i64>,
    pub ship_group_id: Option<i64>,
}

pub fn classify(victim: &Participant, attackers: &[Participant]) -> KillmailFlags {
    KillmailFlags {
        is_npc: is_npc(attackers),
        is_solo: is_solo(attackers),
        is_awox: is_awox(victim, attackers),
    }
}

/// No player corporation among the attackers
pub fn is_npc(attackers: &[Participant]) -> bool {
    if attackers.is_empty() {
        return false;
    }

    !attackers
        .iter()
        .filter_map(|attacker| attacker.corporation_id)
        .any(is_player_corporation)
}

/// A single attacker flying for a player corporation
pub fn is_solo(attackers: &[Participant]) -> bool {
    match attackers {
        [attacker] => attacker.corporation_id.is_some_and(is_player_corporation),
        _ => false,
    }
}

/// Player corporation member killed in a real ship by a corp mate in a real ship
pub fn is_awox(victim: &Participant, attackers: &[Participant]) -> bool {
    let Some(victim_corporation_id) = victim.corporation_id else {
        return false;
    };

    if !is_player_corporation(victim_corporation_id) || !counts_as_ship(victim.ship_group_id) {
        return false;
    }

    attackers.iter().any(|attacker| {
        attacker.corporation_id == Some(victim_corporation_id)
            && counts_as_ship(attacker.ship_group_id)
    })
}

fn counts_as_ship(group_id: Option<i64>) -> bool {
    group_id.is_some_and(|group_id| !AWOX_EXCLUDED_GROUP_IDS.contains(&group_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYER_CORP: i64 = 98_000_001;
    const OTHER_PLAYER_CORP: i64 = 98_500_000;
    const NPC_CORP: i64 = 1_000_125;
    const FRIGATE: i64 = 25;
    const CAPSULE: i64 = 29;
    const CORVETTE: i64 = 237;

    fn participant(corporation_id: Option<i64>, ship_group_id: Option<i64>) -> Participant {
        Participant {
            corporation_id,
            ship_group_id,
        }
    }

    #[test]
    fn npc_only_attackers() {
        let attackers = [
            participant(Some(NPC_CORP), Some(FRIGATE)),
            participant(None, None),
        ];

        assert!(is_npc(&attackers));
    }

    #[test]
    fn any_player_attacker_is_not_npc() {
        let attackers = [
            participant(Some(NPC_CORP), Some(FRIGATE)),
            participant(Some(PLAYER_CORP), Some(FRIGATE)),
        ];

        assert!(!is_npc(&attackers));
    }

    #[test]
    fn no_attackers_is_not_npc() {
        assert!(!is_npc(&[]));
    }

    #[test]
    fn single_player_attacker_is_solo() {
        assert!(is_solo(&[participant(Some(PLAYER_CORP), Some(FRIGATE))]));
    }

    #[test]
    fn single_npc_attacker_is_not_solo() {
        assert!(!is_solo(&[participant(Some(NPC_CORP), Some(FRIGATE))]));
        assert!(!is_solo(&[participant(None, None)]));
    }

    #[test]
    fn gang_is_not_solo() {
        let attackers = [
            participant(Some(PLAYER_CORP), Some(FRIGATE)),
            participant(Some(OTHER_PLAYER_CORP), Some(FRIGATE)),
        ];

        assert!(!is_solo(&attackers));
    }

    #[test]
    fn corp_mate_in_real_ship_is_awox() {
        let victim = participant(Some(PLAYER_CORP), Some(FRIGATE));
        let attackers = [
            participant(Some(OTHER_PLAYER_CORP), Some(FRIGATE)),
            participant(Some(PLAYER_CORP), Some(FRIGATE)),
        ];

        assert!(is_awox(&victim, &attackers));
    }

    #[test]
    fn npc_corporation_victim_is_never_awox() {
        let victim = participant(Some(NPC_CORP), Some(FRIGATE));
        let attackers = [participant(Some(NPC_CORP), Some(FRIGATE))];

        assert!(!is_awox(&victim, &attackers));
    }

    #[test]
    fn excluded_ship_groups_are_not_awox() {
        let attackers = [participant(Some(PLAYER_CORP), Some(FRIGATE))];
        assert!(!is_awox(&participant(Some(PLAYER_CORP), Some(CAPSULE)), &attackers));

        let victim = participant(Some(PLAYER_CORP), Some(FRIGATE));
        assert!(!is_awox(
            &victim,
            &[participant(Some(PLAYER_CORP), Some(CORVETTE))]
        ));
    }

    #[test]
    fn unknown_ship_groups_are_not_awox() {
        let attackers = [participant(Some(PLAYER_CORP), Some(FRIGATE))];
        assert!(!is_awox(&participant(Some(PLAYER_CORP), None), &attackers));

        let victim = participant(Some(PLAYER_CORP), Some(FRIGATE));
        assert!(!is_awox(&victim, &[participant(Some(PLAYER_CORP), None)]));
    }

    #[test]
    fn classify_combines_flags() {
        let victim = participant(Some(PLAYER_CORP), Some(FRIGATE));
        let attackers = [participant(Some(PLAYER_CORP), Some(FRIGATE))];

        assert_eq!(
            classify(&victim, &attackers),
            KillmailFlags {
                is_npc: false,
                is_solo: true,
                is_awox: true,
            }
        );
    }
}
