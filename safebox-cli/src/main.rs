use clap::{Parser, ValueEnum};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;
use std::path::{Path, PathBuf};

use safebox_core::{
    items, packing, region, roll, Item, LayoutConfig, LayoutResult, PackStrategy, RollOptions,
    SafeboxError,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum StrategyArg {
    Deterministic,
    Randomized,
}

#[derive(Debug, Parser)]
#[command(name = "safebox", version, about = "Roll procedurally packed loot safes")]
struct Args {
    /// Seed for the roll; a random one is drawn and printed when omitted.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(
        long,
        value_parser = clap::value_parser!(u32).range(0..=3),
        conflicts_with = "grid_bound"
    )]
    facility_level: Option<u32>,

    #[arg(long)]
    grid_bound: Option<u32>,

    #[arg(long, default_value_t = false)]
    boost: bool,

    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Origins tried per item by the randomized strategy.
    #[arg(long)]
    max_attempts: Option<u32>,

    /// JSON array of item records.
    #[arg(long, conflicts_with = "items_dir")]
    catalog: Option<PathBuf>,

    /// Directory of item sprites named `<tier>_<W>x<H>_<name>.png`.
    #[arg(long)]
    items_dir: Option<PathBuf>,

    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the built-in configuration to PATH and exit.
    #[arg(long, value_name = "PATH")]
    write_default_config: Option<PathBuf>,

    #[arg(long, default_value_t = 1)]
    count: u32,

    #[arg(long, default_value_t = false)]
    json: bool,

    #[arg(long, default_value_t = false)]
    debug: bool,
}

#[derive(Serialize)]
struct RollReport<'a> {
    seed: u64,
    index: u32,
    grid_bound: u32,
    reaction: &'a str,
    total_value: u64,
    #[serde(flatten)]
    layout: &'a LayoutResult,
}

fn setup_logger(debug: bool) -> Result<(), log::SetLoggerError> {
    let level = if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
}

fn default_config_path() -> Option<PathBuf> {
    let mut base = dirs::config_dir().or_else(dirs::data_dir)?;
    base.push("Safebox");
    base.push("config.json");
    Some(base)
}

fn load_config(explicit: Option<&Path>) -> Result<LayoutConfig, SafeboxError> {
    if let Some(path) = explicit {
        return LayoutConfig::load(path);
    }

    match default_config_path() {
        Some(path) if path.exists() => {
            log::debug!("using config {}", path.display());
            LayoutConfig::load(&path)
        }
        _ => Ok(LayoutConfig::default()),
    }
}

fn load_catalog(args: &Args) -> Result<Vec<Item>, SafeboxError> {
    if let Some(path) = args.catalog.as_ref() {
        items::load_catalog_json(path)
    } else if let Some(dir) = args.items_dir.as_ref() {
        items::scan_item_dir(dir)
    } else {
        Ok(items::builtin_catalog())
    }
}

fn apply_strategy_flags(config: &mut LayoutConfig, args: &Args) {
    let current_attempts = match config.strategy {
        PackStrategy::RandomizedFirstFit { max_attempts } => max_attempts,
        PackStrategy::DeterministicFirstFit => packing::DEFAULT_MAX_ATTEMPTS,
    };
    let max_attempts = args.max_attempts.unwrap_or(current_attempts);

    config.strategy = match args.strategy {
        Some(StrategyArg::Deterministic) => PackStrategy::DeterministicFirstFit,
        Some(StrategyArg::Randomized) => PackStrategy::RandomizedFirstFit { max_attempts },
        None => match config.strategy {
            PackStrategy::RandomizedFirstFit { .. } => {
                PackStrategy::RandomizedFirstFit { max_attempts }
            }
            other => other,
        },
    };
}

/// Text view of the outer grid: `.` outside the region, `-` free, letters for items.
fn render_grid(layout: &LayoutResult, grid_bound: u32) -> String {
    let side = grid_bound.max(layout.region_width).max(layout.region_height);
    let mut out = String::new();

    for y in 0..side {
        for x in 0..side {
            let cell = if x >= layout.region_width || y >= layout.region_height {
                '.'
            } else {
                layout
                    .placements
                    .iter()
                    .position(|placement| placement.contains(x, y))
                    .map(placement_label)
                    .unwrap_or('-')
            };
            out.push(cell);
        }
        out.push('\n');
    }

    out
}

fn placement_label(index: usize) -> char {
    const LABELS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    LABELS.get(index).map(|b| *b as char).unwrap_or('#')
}

fn print_text(
    seed: u64,
    index: u32,
    grid_bound: u32,
    layout: &LayoutResult,
    config: &LayoutConfig,
) {
    println!(
        "roll {} (seed {}): region {}x{} in {}x{} grid",
        index + 1,
        seed,
        layout.region_width,
        layout.region_height,
        grid_bound,
        grid_bound
    );
    print!("{}", render_grid(layout, grid_bound));

    for (i, placement) in layout.placements.iter().enumerate() {
        println!(
            "  {} {:<28} {:<9} value {:>10}  at ({}, {}) {}x{}{}",
            placement_label(i),
            placement.item.id,
            placement.item.tier,
            placement.item.value,
            placement.x,
            placement.y,
            placement.width,
            placement.height,
            if placement.rotated { " rotated" } else { "" }
        );
    }

    println!(
        "highest tier: {}  reaction: {}  total value: {}",
        layout.highest_tier,
        layout.reaction(&config.reactions),
        layout.total_value()
    );
}

fn run(args: Args) -> Result<(), SafeboxError> {
    if let Some(path) = args.write_default_config.as_ref() {
        LayoutConfig::default().save(path)?;
        println!("wrote default config to {}", path.display());
        return Ok(());
    }

    let mut config = load_config(args.config.as_deref())?;
    apply_strategy_flags(&mut config, &args);

    let catalog = load_catalog(&args)?;
    log::debug!("catalog holds {} items", catalog.len());

    let grid_bound = args
        .grid_bound
        .unwrap_or_else(|| region::grid_bound_for_level(args.facility_level.unwrap_or(0)));
    let options = RollOptions {
        grid_bound,
        boost: args.boost,
    };

    let seed = args.seed.unwrap_or_else(|| rand::thread_rng().gen::<u64>());
    let mut rng = StdRng::seed_from_u64(seed);

    for index in 0..args.count {
        let layout = roll(&catalog, &config, options, &mut rng)?;

        if args.json {
            let report = RollReport {
                seed,
                index,
                grid_bound,
                reaction: layout.reaction(&config.reactions),
                total_value: layout.total_value(),
                layout: &layout,
            };
            println!("{}", serde_json::to_string(&report)?);
        } else {
            if index > 0 {
                println!();
            }
            print_text(seed, index, grid_bound, &layout, &config);
        }
    }

    Ok(())
}

fn main() {
    let args = Args::parse();

    if let Err(err) = setup_logger(args.debug) {
        eprintln!("Failed to initialise logging: {err}");
    }

    if let Err(err) = run(args) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
