//! Headless demo: generate a tile world, run the day cycle and lighting
//! engine over it, and exercise edits, eviction, and restore.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use loam_chunk::ChunkCoord;
use loam_lighting::{DEFAULT_RELAX_PASSES, DayCycle, LightingEngine};
use loam_tiles::{Tile, TileRegistry};
use loam_world::TileWorld;

mod terrain;

use terrain::NoiseTerrain;

#[derive(Parser, Debug)]
#[command(name = "loam", version, about = "Tile world and colored lighting demo")]
struct Cli {
    /// World width in 32-tile chunks.
    #[arg(long, default_value_t = 8)]
    chunks_x: i32,
    /// World height in 32-tile chunks.
    #[arg(long, default_value_t = 4)]
    chunks_y: i32,
    /// Terrain seed.
    #[arg(long, default_value_t = 1337)]
    seed: i32,
    /// Frames to simulate at a fixed 60 Hz step.
    #[arg(long, default_value_t = 240)]
    frames: u32,
    /// Seconds per full day/night cycle.
    #[arg(long, default_value_t = 60.0)]
    day_length: f32,
    /// Relaxation passes per lighting recompute.
    #[arg(long, default_value_t = DEFAULT_RELAX_PASSES)]
    relax_passes: usize,
    /// Tile catalog path; defaults to the embedded assets/tiles.toml.
    #[arg(long)]
    tiles: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        log::error!("{err}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let registry = Arc::new(match &cli.tiles {
        Some(path) => TileRegistry::load_from_path(path)?,
        None => TileRegistry::from_toml_str(include_str!("../assets/tiles.toml"))?,
    });
    let torch = Tile::new(
        registry
            .id_by_name("torch")
            .ok_or("tile catalog is missing \"torch\"")?,
    );

    let mut world = TileWorld::new(cli.chunks_x, cli.chunks_y, Arc::clone(&registry));
    let mut terrain = NoiseTerrain::new(cli.seed, &registry, world.height_tiles())?;
    load_all(&mut world, &mut terrain);
    log::info!(
        "world {}x{} tiles, {} chunks, seed {}",
        world.width_tiles(),
        world.height_tiles(),
        world.loaded_chunks(),
        cli.seed
    );

    let mut engine = LightingEngine::new(world.width_tiles(), world.height_tiles(), cli.relax_passes);
    let mut cycle = DayCycle::new(cli.day_length);
    let dt = 1.0 / 60.0;

    // Scripted mid-run events around the spawn column.
    let spawn_x = world.width_tiles() / 2;
    let surface = terrain.surface_row(spawn_x);
    let shaft_depth = 10;
    let mut stash: Vec<(ChunkCoord, Vec<u8>)> = Vec::new();

    for frame in 0..cli.frames {
        cycle.advance(dt);
        match frame {
            60 => {
                for d in 0..shaft_depth {
                    world.set_tile(spawn_x, surface + d, Tile::AIR);
                }
                log::info!("frame {frame}: dug a {shaft_depth}-tile shaft at x={spawn_x}");
            }
            90 => {
                world.set_tile(spawn_x, surface + shaft_depth - 1, torch);
                log::info!("frame {frame}: placed a torch at the shaft floor");
            }
            120 => {
                stash = world.evict_outside(ChunkCoord::new(0, 0), 1);
                log::info!(
                    "frame {frame}: streamed out to {} chunks, {} modified payloads stashed",
                    world.loaded_chunks(),
                    stash.len()
                );
            }
            150 => {
                for (coord, bytes) in stash.drain(..) {
                    world.restore_chunk(coord, &bytes)?;
                }
                load_all(&mut world, &mut terrain);
                log::info!("frame {frame}: streamed back in, {} chunks", world.loaded_chunks());
            }
            _ => {}
        }

        let stats = engine.update(&mut world, cycle.day_fraction(), dt);
        if stats.recomputed {
            log::debug!(
                "frame {frame}: relit {} rect {:?} in {} us",
                if stats.full { "full" } else { "band" },
                stats.rect,
                stats.t_sun_us + stats.t_relax_us + stats.t_emissive_us + stats.t_sync_us
            );
        }
        if frame % 60 == 0 {
            let sun = cycle.sample();
            log::info!(
                "frame {frame:>4}: day {:.2} sun {:.2} map rev {}",
                sun.day_fraction,
                sun.sun_intensity,
                engine.map_revision()
            );
        }
    }

    // Final probes down the spawn column.
    for (label, y) in [
        ("sky", 2),
        ("surface", surface),
        ("shaft floor", surface + shaft_depth - 1),
    ] {
        let rgb = engine.light_rgb8_at(&world, spawn_x, y);
        let ao = world.ambient_occlusion_at(spawn_x, y);
        let shadow = world.cast_shadow_at(spawn_x, y);
        log::info!(
            "probe {label:>12} ({spawn_x},{y}): light rgb {:?} brightness {} ao {ao:.2} shadow {shadow:.2}",
            rgb,
            world.light_at(spawn_x, y)
        );
    }

    let mut modified = 0usize;
    world.for_each_loaded(|_, chunk| {
        if chunk.modified {
            modified += 1;
        }
    });
    log::info!(
        "done after {} frames: {} chunks loaded, {} carrying edits",
        cli.frames,
        world.loaded_chunks(),
        modified
    );
    Ok(())
}

fn load_all(world: &mut TileWorld, terrain: &mut NoiseTerrain) {
    for cy in 0..world.height_chunks {
        for cx in 0..world.width_chunks {
            world.ensure_chunk(ChunkCoord::new(cx, cy), terrain);
        }
    }
}
