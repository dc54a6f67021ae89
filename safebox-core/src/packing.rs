use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

use crate::items::Item;
use crate::region::Region;
use crate::{Result, SafeboxError};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;

/// How candidate origins are visited while looking for a free spot.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PackStrategy {
    /// Row-major scan of every origin; the same input always packs the same way.
    #[default]
    DeterministicFirstFit,
    /// Origins are reshuffled for each item and at most `max_attempts` of
    /// them are tried before the item is dropped.
    RandomizedFirstFit { max_attempts: u32 },
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub item: Item,
    pub x: u32,
    pub y: u32,
    /// Width on the grid, after rotation.
    pub width: u32,
    /// Height on the grid, after rotation.
    pub height: u32,
    pub rotated: bool,
}

impl Placement {
    fn right(&self) -> u64 {
        u64::from(self.x) + u64::from(self.width)
    }

    fn bottom(&self) -> u64 {
        u64::from(self.y) + u64::from(self.height)
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && u64::from(x) < self.right() && y >= self.y && u64::from(y) < self.bottom()
    }

    pub fn overlaps(&self, other: &Placement) -> bool {
        u64::from(self.x) < other.right()
            && u64::from(other.x) < self.right()
            && u64::from(self.y) < other.bottom()
            && u64::from(other.y) < self.bottom()
    }

    pub fn cells(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let right = self.x.saturating_add(self.width);
        let bottom = self.y.saturating_add(self.height);
        (self.y..bottom).flat_map(move |y| (self.x..right).map(move |x| (x, y)))
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct Orientation {
    width: u32,
    height: u32,
    rotated: bool,
}

fn orientations(item: &Item) -> Vec<Orientation> {
    let mut out = vec![Orientation {
        width: item.width,
        height: item.height,
        rotated: false,
    }];
    if item.width != item.height {
        out.push(Orientation {
            width: item.height,
            height: item.width,
            rotated: true,
        });
    }
    out
}

/// Cell occupancy for a single `pack` call.
struct OccupancyGrid {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl OccupancyGrid {
    fn new(region: Region) -> Self {
        Self {
            width: region.width,
            height: region.height,
            cells: vec![false; region.area() as usize],
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    fn fits(&self, x: u32, y: u32, shape: Orientation) -> bool {
        let in_bounds = matches!(x.checked_add(shape.width), Some(right) if right <= self.width)
            && matches!(y.checked_add(shape.height), Some(bottom) if bottom <= self.height);
        if !in_bounds {
            return false;
        }
        (y..y + shape.height)
            .all(|cy| (x..x + shape.width).all(|cx| !self.cells[self.index(cx, cy)]))
    }

    fn occupy(&mut self, x: u32, y: u32, shape: Orientation) {
        for cy in y..y + shape.height {
            for cx in x..x + shape.width {
                let idx = self.index(cx, cy);
                self.cells[idx] = true;
            }
        }
    }

    fn origins(&self) -> Vec<(u32, u32)> {
        (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| (x, y)))
            .collect()
    }
}

fn first_fit<I>(
    grid: &OccupancyGrid,
    origins: I,
    shapes: &[Orientation],
) -> Option<(u32, u32, Orientation)>
where
    I: IntoIterator<Item = (u32, u32)>,
{
    origins.into_iter().find_map(|(x, y)| {
        shapes
            .iter()
            .find(|shape| grid.fits(x, y, **shape))
            .map(|shape| (x, y, *shape))
    })
}

/// Place `items` into `region` without overlap.
///
/// Items are visited largest footprint first; equal footprints keep their
/// input order. Each item takes the first origin (and, at that origin, the
/// first orientation) that fits. Items that fit nowhere are dropped.
pub fn pack<R: Rng>(
    items: &[Item],
    region: Region,
    strategy: PackStrategy,
    rng: &mut R,
) -> Result<Vec<Placement>> {
    if region.width == 0 || region.height == 0 {
        return Err(SafeboxError::InvalidRegion {
            width: region.width,
            height: region.height,
        });
    }

    let mut order: Vec<&Item> = items.iter().collect();
    order.sort_by_key(|item| Reverse(item.area()));

    let mut grid = OccupancyGrid::new(region);
    let scan_order = grid.origins();
    let mut placements = Vec::with_capacity(order.len());

    for item in order {
        let shapes = orientations(item);

        let spot = match strategy {
            PackStrategy::DeterministicFirstFit => {
                first_fit(&grid, scan_order.iter().copied(), &shapes)
            }
            PackStrategy::RandomizedFirstFit { max_attempts } => {
                let mut shuffled = scan_order.clone();
                shuffled.shuffle(rng);
                first_fit(
                    &grid,
                    shuffled.into_iter().take(max_attempts as usize),
                    &shapes,
                )
            }
        };

        match spot {
            Some((x, y, shape)) => {
                grid.occupy(x, y, shape);
                placements.push(Placement {
                    item: item.clone(),
                    x,
                    y,
                    width: shape.width,
                    height: shape.height,
                    rotated: shape.rotated,
                });
            }
            None => log::debug!(
                "dropping {} ({}x{}): no room in {}x{} region",
                item.id,
                item.width,
                item.height,
                region.width,
                region.height
            ),
        }
    }

    Ok(placements)
}
