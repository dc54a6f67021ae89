use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::items::TierTable;
use crate::packing::PackStrategy;
use crate::rarity::RarityConfig;
use crate::region::{default_region_options, RegionOption};
use crate::summary::{default_ranking, default_reactions};
use crate::{Result, SafeboxError};

/// Every tunable table of a roll. Missing keys fall back to the defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub rarity: RarityConfig,
    /// Region options for a level-0 facility; larger grids grow these.
    pub regions: Vec<RegionOption>,
    pub ranking: TierTable<u32>,
    pub reactions: TierTable<String>,
    pub strategy: PackStrategy,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            rarity: RarityConfig::default(),
            regions: default_region_options(),
            ranking: default_ranking(),
            reactions: default_reactions(),
            strategy: PackStrategy::default(),
        }
    }
}

impl LayoutConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let config: LayoutConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.rarity.validate()?;

        if self.regions.is_empty() {
            return Err(SafeboxError::Config("region catalog is empty".to_string()));
        }

        for option in &self.regions {
            if option.width == 0 || option.height == 0 {
                return Err(SafeboxError::InvalidRegion {
                    width: option.width,
                    height: option.height,
                });
            }
            if !option.weight.is_finite() || option.weight < 0.0 {
                return Err(SafeboxError::Config(format!(
                    "region {}x{} has invalid weight {}",
                    option.width, option.height, option.weight
                )));
            }
        }

        if !self.regions.iter().any(|option| option.weight > 0.0) {
            return Err(SafeboxError::Config("every region weight is zero".to_string()));
        }

        if let PackStrategy::RandomizedFirstFit { max_attempts: 0 } = self.strategy {
            return Err(SafeboxError::Config(
                "randomized packing needs at least one attempt".to_string(),
            ));
        }

        Ok(())
    }
}
