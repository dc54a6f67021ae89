use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod config;
pub mod items;
pub mod packing;
pub mod rarity;
pub mod region;
pub mod summary;

pub use config::LayoutConfig;
pub use items::{Item, Tier, TierTable};
pub use packing::{PackStrategy, Placement};
pub use region::Region;

#[derive(Debug, Error)]
pub enum SafeboxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid region {width}x{height}: both sides must be at least 1")]
    InvalidRegion { width: u32, height: u32 },
}

pub type Result<T> = std::result::Result<T, SafeboxError>;

/// Per-roll inputs that come from the player's progression state.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RollOptions {
    /// Largest region side allowed.
    pub grid_bound: u32,
    pub boost: bool,
}

impl Default for RollOptions {
    fn default() -> Self {
        Self {
            grid_bound: region::BASE_GRID_BOUND,
            boost: false,
        }
    }
}

impl RollOptions {
    pub fn for_facility_level(level: u32, boost: bool) -> Self {
        Self {
            grid_bound: region::grid_bound_for_level(level),
            boost,
        }
    }
}

/// Outcome of one roll. Placement coordinates are relative to the region,
/// which sits at the top-left corner of the outer grid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutResult {
    pub placements: Vec<Placement>,
    pub region_width: u32,
    pub region_height: u32,
    pub highest_tier: Tier,
}

impl LayoutResult {
    pub fn placed_count(&self) -> usize {
        self.placements.len()
    }

    pub fn total_value(&self) -> u64 {
        summary::total_value(&self.placements)
    }

    pub fn reaction<'a>(&self, reactions: &'a TierTable<String>) -> &'a str {
        summary::reaction_for(self.highest_tier, reactions)
    }
}

/// Roll one safe: pick candidates and a region, pack, then summarize.
pub fn roll<R: Rng>(
    catalog: &[Item],
    config: &LayoutConfig,
    options: RollOptions,
    rng: &mut R,
) -> Result<LayoutResult> {
    config.validate()?;

    let candidates = rarity::select_candidates(catalog, &config.rarity, options.boost, rng)?;

    let region_options = region::expand_region_options(&config.regions, options.grid_bound);
    let region = region::select_region(&region_options, options.grid_bound, rng)?;

    let placements = packing::pack(&candidates, region, config.strategy, rng)?;
    let highest_tier = summary::highest_tier(&placements, &config.ranking);

    log::info!(
        "rolled {}x{} region: {}/{} candidates placed, highest tier {}",
        region.width,
        region.height,
        placements.len(),
        candidates.len(),
        highest_tier
    );

    Ok(LayoutResult {
        placements,
        region_width: region.width,
        region_height: region.height,
        highest_tier,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn roll_seeded(
        catalog: &[Item],
        config: &LayoutConfig,
        options: RollOptions,
        seed: u64,
    ) -> LayoutResult {
        let mut rng = StdRng::seed_from_u64(seed);
        roll(catalog, config, options, &mut rng).unwrap()
    }

    #[test]
    fn empty_catalog_gives_empty_common_layout() {
        let config = LayoutConfig::default();
        let result = roll_seeded(&[], &config, RollOptions::default(), 11);
        assert!(result.placements.is_empty());
        assert_eq!(result.highest_tier, Tier::Common);
        assert_eq!(result.total_value(), 0);
        assert_eq!(result.reaction(&config.reactions), "cry");
    }

    #[test]
    fn same_seed_same_layout() {
        let catalog = items::builtin_catalog();
        let config = LayoutConfig::default();
        let options = RollOptions::for_facility_level(2, false);
        for seed in [0, 7, 42, 9001] {
            assert_eq!(
                roll_seeded(&catalog, &config, options, seed),
                roll_seeded(&catalog, &config, options, seed)
            );
        }
    }

    #[test]
    fn layouts_hold_their_invariants() {
        let catalog = items::builtin_catalog();
        let ids: HashSet<&str> = catalog.iter().map(|item| item.id.as_str()).collect();

        let strategies = [
            PackStrategy::DeterministicFirstFit,
            PackStrategy::RandomizedFirstFit {
                max_attempts: packing::DEFAULT_MAX_ATTEMPTS,
            },
        ];

        for strategy in strategies {
            let config = LayoutConfig {
                strategy,
                ..LayoutConfig::default()
            };
            for level in 0..=3 {
                for seed in 0..60 {
                    let options = RollOptions::for_facility_level(level, seed % 3 == 0);
                    let result = roll_seeded(&catalog, &config, options, seed);

                    assert!(result.region_width <= options.grid_bound);
                    assert!(result.region_height <= options.grid_bound);
                    assert!(result.placed_count() <= config.rarity.max_items as usize);

                    for (i, a) in result.placements.iter().enumerate() {
                        assert!(ids.contains(a.item.id.as_str()));
                        assert!(a.x + a.width <= result.region_width);
                        assert!(a.y + a.height <= result.region_height);
                        for b in &result.placements[i + 1..] {
                            assert!(!a.overlaps(b));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn boost_on_zeroed_catalog_does_not_fail() {
        let catalog: Vec<Item> = items::builtin_catalog()
            .into_iter()
            .filter(|item| item.tier == Tier::Uncommon)
            .collect();
        let config = LayoutConfig::default();
        let options = RollOptions {
            grid_bound: 4,
            boost: true,
        };
        for seed in 0..20 {
            let result = roll_seeded(&catalog, &config, options, seed);
            assert!(result.placements.is_empty());
            assert_eq!(result.highest_tier, Tier::Common);
        }
    }

    #[test]
    fn grid_bound_too_small_is_a_config_error() {
        let mut rng = StdRng::seed_from_u64(0);
        let err = roll(
            &items::builtin_catalog(),
            &LayoutConfig::default(),
            RollOptions { grid_bound: 1, boost: false },
            &mut rng,
        )
        .unwrap_err();
        assert!(matches!(err, SafeboxError::Config(_)));
    }

    #[test]
    fn invalid_config_fails_before_rolling() {
        let mut config = LayoutConfig::default();
        config.rarity.normal.legendary = -0.5;
        let mut rng = StdRng::seed_from_u64(0);
        assert!(roll(&[], &config, RollOptions::default(), &mut rng).is_err());
    }
}
