use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::items::{Item, Tier, TierTable};
use crate::{Result, SafeboxError};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RarityConfig {
    /// Per-item inclusion chance for a normal roll.
    pub normal: TierTable<f64>,
    /// Per-item inclusion chance while boost mode is on.
    pub boosted: TierTable<f64>,
    pub min_items: u32,
    pub max_items: u32,
    /// Tier used to pad a short selection.
    pub top_up_tier: Tier,
}

impl Default for RarityConfig {
    fn default() -> Self {
        Self {
            normal: TierTable {
                common: 0.42,
                uncommon: 0.25,
                epic: 0.28,
                legendary: 0.05,
            },
            boosted: TierTable {
                common: 0.45,
                uncommon: 0.0,
                epic: 0.4,
                legendary: 0.15,
            },
            min_items: 1,
            max_items: 5,
            top_up_tier: Tier::Common,
        }
    }
}

impl RarityConfig {
    pub fn probabilities(&self, boost: bool) -> &TierTable<f64> {
        if boost {
            &self.boosted
        } else {
            &self.normal
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (label, table) in [("normal", &self.normal), ("boosted", &self.boosted)] {
            for (tier, chance) in table.iter() {
                if !chance.is_finite() || !(0.0..=1.0).contains(chance) {
                    return Err(SafeboxError::Config(format!(
                        "{label} probability for {tier} must be within [0, 1], got {chance}"
                    )));
                }
            }
        }

        if self.min_items > self.max_items {
            return Err(SafeboxError::Config(format!(
                "item count range is inverted: min {} > max {}",
                self.min_items, self.max_items
            )));
        }

        Ok(())
    }
}

/// Pick the candidate items for one roll.
///
/// Every catalog item gets an independent draw against its tier's chance.
/// The survivors are then cut down (uniformly, without replacement) or padded
/// with `top_up_tier` items to a target count drawn from
/// `min_items..=max_items`. Padding stops quietly when the pool runs dry.
/// The result is shuffled, which decides the packing order of equal-area
/// items. An invalid `config` is rejected before any draw.
pub fn select_candidates<R: Rng>(
    catalog: &[Item],
    config: &RarityConfig,
    boost: bool,
    rng: &mut R,
) -> Result<Vec<Item>> {
    config.validate()?;

    if catalog.is_empty() {
        return Ok(Vec::new());
    }

    let chances = config.probabilities(boost);

    let mut selected: Vec<&Item> = Vec::new();
    for item in catalog {
        let chance = *chances.get(item.tier);
        let draw: f64 = rng.gen();
        // A zero chance never includes, even on a 0.0 draw.
        if chance > 0.0 && draw <= chance {
            selected.push(item);
        }
    }

    let target = rng.gen_range(config.min_items..=config.max_items) as usize;

    if selected.len() > target {
        let sampled: Vec<&Item> = selected.choose_multiple(rng, target).copied().collect();
        selected = sampled;
    } else if selected.len() < target {
        let pool: Vec<&Item> = catalog
            .iter()
            .filter(|item| item.tier == config.top_up_tier)
            .collect();
        let needed = (target - selected.len()).min(pool.len());
        selected.extend(pool.choose_multiple(rng, needed).copied());
    }

    selected.shuffle(rng);
    Ok(selected.into_iter().cloned().collect())
}
