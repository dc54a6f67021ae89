use std::collections::HashSet;

use crate::items::{Tier, TierTable};
use crate::packing::Placement;

/// Ranking used for "highest tier". Uncommon deliberately ranks below common.
pub fn default_ranking() -> TierTable<u32> {
    TierTable {
        common: 2,
        uncommon: 1,
        epic: 3,
        legendary: 4,
    }
}

/// Reaction image keys handed to the renderer.
pub fn default_reactions() -> TierTable<String> {
    TierTable {
        common: "cry".to_string(),
        uncommon: "cry".to_string(),
        epic: "happy".to_string(),
        legendary: "eat".to_string(),
    }
}

/// Tier of the best-ranked placed item, or common when nothing was placed.
///
/// Two tiers sharing a rank resolve to the one declared later in [`Tier`].
pub fn highest_tier(placements: &[Placement], ranking: &TierTable<u32>) -> Tier {
    placements
        .iter()
        .map(|placement| placement.item.tier)
        .max_by_key(|tier| (*ranking.get(*tier), *tier as u8))
        .unwrap_or(Tier::Common)
}

pub fn reaction_for(tier: Tier, reactions: &TierTable<String>) -> &str {
    reactions.get(tier)
}

pub fn total_value(placements: &[Placement]) -> u64 {
    placements
        .iter()
        .fold(0u64, |sum, placement| sum.saturating_add(placement.item.value))
}

/// Distinct `(item id, tier)` pairs in placement order.
pub fn collection_records(placements: &[Placement]) -> Vec<(&str, Tier)> {
    let mut seen = HashSet::new();
    placements
        .iter()
        .map(|placement| (placement.item.id.as_str(), placement.item.tier))
        .filter(|record| seen.insert(*record))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::Item;

    fn placed(id: &str, tier: Tier, value: u64) -> Placement {
        Placement {
            item: Item::new(id, tier, 1, 1, value),
            x: 0,
            y: 0,
            width: 1,
            height: 1,
            rotated: false,
        }
    }

    #[test]
    fn nothing_placed_is_common() {
        assert_eq!(highest_tier(&[], &default_ranking()), Tier::Common);
    }

    #[test]
    fn legendary_outranks_everything() {
        let placements = vec![
            placed("a", Tier::Epic, 1),
            placed("b", Tier::Legendary, 1),
            placed("c", Tier::Common, 1),
        ];
        assert_eq!(highest_tier(&placements, &default_ranking()), Tier::Legendary);
    }

    #[test]
    fn common_outranks_uncommon_in_default_table() {
        // Long-standing ranking quirk, kept on purpose.
        let placements = vec![placed("u", Tier::Uncommon, 1), placed("c", Tier::Common, 1)];
        assert_eq!(highest_tier(&placements, &default_ranking()), Tier::Common);

        let only_uncommon = vec![placed("u", Tier::Uncommon, 1)];
        assert_eq!(highest_tier(&only_uncommon, &default_ranking()), Tier::Uncommon);
    }

    #[test]
    fn shared_rank_picks_later_declared_tier() {
        let ranking = TierTable {
            common: 1,
            uncommon: 1,
            epic: 5,
            legendary: 5,
        };
        let placements = vec![placed("l", Tier::Legendary, 1), placed("e", Tier::Epic, 1)];
        assert_eq!(highest_tier(&placements, &ranking), Tier::Legendary);

        let reversed = vec![placed("e", Tier::Epic, 1), placed("l", Tier::Legendary, 1)];
        assert_eq!(highest_tier(&reversed, &ranking), Tier::Legendary);
    }

    #[test]
    fn reactions_follow_tier() {
        let reactions = default_reactions();
        assert_eq!(reaction_for(Tier::Legendary, &reactions), "eat");
        assert_eq!(reaction_for(Tier::Epic, &reactions), "happy");
        assert_eq!(reaction_for(Tier::Uncommon, &reactions), "cry");
        assert_eq!(reaction_for(Tier::Common, &reactions), "cry");
    }

    #[test]
    fn totals_and_records() {
        let placements = vec![
            placed("a", Tier::Epic, 10),
            placed("b", Tier::Common, u64::MAX),
            placed("a", Tier::Epic, 10),
        ];
        assert_eq!(total_value(&placements), u64::MAX);
        assert_eq!(total_value(&placements[..1]), 10);
        assert_eq!(
            collection_records(&placements),
            vec![("a", Tier::Epic), ("b", Tier::Common)]
        );
    }
}
