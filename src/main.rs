use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use rt_bvh::bvh::bvh_stats;
use rt_bvh::scene::demo_materials;
use rt_bvh::{validate_bvh, BvhConfig, Scene, SceneBuilder, SplitAxisPolicy};

#[derive(Parser)]
#[command(name = "rt-bvh")]
#[command(about = "Build the flattened BVH and GPU buffers of a ray-traced scene")]
#[command(version)]
struct Cli {
    /// glTF files merged into one scene (the built-in demo room when omitted)
    inputs: Vec<PathBuf>,

    /// Material index given to every triangle of the input files
    #[arg(short, long, default_value_t = 0)]
    material: u32,

    /// Seed for the random split axis
    #[arg(long)]
    seed: Option<u64>,

    /// Split along the longest axis instead of a random one
    #[arg(long)]
    longest_axis: bool,

    /// Directory to write the raw GPU buffers into
    #[arg(short, long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = BvhConfig {
        split_axis: if cli.longest_axis {
            SplitAxisPolicy::Longest
        } else {
            SplitAxisPolicy::Random
        },
        seed: cli.seed,
    };

    let scene = if cli.inputs.is_empty() {
        log::info!("no input files, building the demo room");
        Scene::demo(&config)?
    } else {
        let mut builder = SceneBuilder::with_materials(demo_materials());
        for path in &cli.inputs {
            builder.add_gltf(path, cli.material)?;
        }
        builder.build(&config)?
    };

    let stats = bvh_stats(&scene.bvh_nodes);
    log::info!(
        "BVH: {} nodes, {} leaves, {} internal, depth {}",
        stats.node_count,
        stats.leaf_count,
        stats.internal_count,
        stats.max_depth
    );
    let violations = validate_bvh(&scene.bvh_nodes, &scene.triangles);
    for violation in &violations {
        log::error!("{}", violation);
    }
    if !violations.is_empty() {
        bail!("BVH failed validation with {} violations", violations.len());
    }

    if let Some(out) = cli.out {
        fs::create_dir_all(&out)?;
        scene.gpu_buffers().write_to_dir(&out)?;
        log::info!("buffers written to {}", out.display());
    }
    Ok(())
}
