use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{Result, SafeboxError};

/// Grid bound of a facility at level 0.
pub const BASE_GRID_BOUND: u32 = 4;
pub const MAX_FACILITY_LEVEL: u32 = 3;

/// The rectangle that gets filled, anchored at the grid origin.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(SafeboxError::InvalidRegion { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionOption {
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl RegionOption {
    pub const fn new(width: u32, height: u32, weight: f64) -> Self {
        Self {
            width,
            height,
            weight,
        }
    }

    fn grown(&self, by: u32) -> Self {
        Self::new(
            self.width.saturating_add(by),
            self.height.saturating_add(by),
            self.weight,
        )
    }

    fn fits(&self, grid_bound: u32) -> bool {
        self.width <= grid_bound && self.height <= grid_bound
    }
}

pub fn default_region_options() -> Vec<RegionOption> {
    vec![
        RegionOption::new(2, 1, 1.0),
        RegionOption::new(3, 1, 1.0),
        RegionOption::new(4, 1, 1.0),
        RegionOption::new(4, 2, 1.0),
        RegionOption::new(4, 3, 1.0),
        RegionOption::new(4, 4, 1.0),
    ]
}

pub fn grid_bound_for_level(level: u32) -> u32 {
    BASE_GRID_BOUND + level.min(MAX_FACILITY_LEVEL)
}

/// Region catalog for a grid bound.
///
/// A facility grid of `4 + k` (k in 1..=3) offers the base options grown by
/// `k`, then by `k - 1`, down to the base options themselves. Any other bound
/// uses the base options as-is.
pub fn expand_region_options(base: &[RegionOption], grid_bound: u32) -> Vec<RegionOption> {
    let growth = match grid_bound.checked_sub(BASE_GRID_BOUND) {
        Some(k) if (1..=MAX_FACILITY_LEVEL).contains(&k) => k,
        _ => return base.to_vec(),
    };

    (0..=growth)
        .rev()
        .flat_map(|by| base.iter().map(move |option| option.grown(by)))
        .collect()
}

/// Weighted pick among the options that fit inside `grid_bound` on both axes.
pub fn select_region<R: Rng>(
    options: &[RegionOption],
    grid_bound: u32,
    rng: &mut R,
) -> Result<Region> {
    let fitting: Vec<&RegionOption> = options
        .iter()
        .filter(|option| option.fits(grid_bound))
        .collect();

    if fitting.is_empty() {
        return Err(SafeboxError::Config(format!(
            "no region option fits a grid bound of {grid_bound}"
        )));
    }

    let dist = WeightedIndex::new(fitting.iter().map(|option| option.weight)).map_err(|e| {
        SafeboxError::Config(format!("invalid region weights for grid bound {grid_bound}: {e}"))
    })?;
    let chosen = fitting[dist.sample(rng)];

    log::debug!(
        "region {}x{} chosen from {} options (grid bound {})",
        chosen.width,
        chosen.height,
        fitting.len(),
        grid_bound
    );

    Region::new(chosen.width, chosen.height)
}
