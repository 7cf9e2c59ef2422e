use anyhow::Context;
use clap::Parser;
use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use creature_generator::{
    AssemblyConfig, CreatureAssembler, CreatureTopology, PhysicsWorld, RapierWorld,
    RapierWorldConfig, SceneWorld,
};

#[derive(Parser, Debug)]
#[command(name = "creature_generator")]
#[command(about = "Assemble random jointed bipeds and drop them under gravity")]
struct Args {
    /// Random seed (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of creatures to spawn side by side
    #[arg(short = 'n', long, default_value = "1")]
    count: usize,

    /// Height of the torso centre at spawn
    #[arg(long, default_value = "5.0")]
    spawn_height: f32,

    /// Distance between neighbouring creatures along x
    #[arg(long, default_value = "4.0")]
    spacing: f32,

    /// Assembly config as JSON (defaults are used for missing fields)
    #[arg(short, long)]
    config: Option<String>,

    /// Simulation steps to run after spawning
    #[arg(long, default_value = "240")]
    steps: usize,

    /// Fixed step length in seconds
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Build into an in-memory scene and skip the physics engine
    #[arg(long)]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => AssemblyConfig::load(path)
            .with_context(|| format!("loading assembly config from {}", path))?,
        None => AssemblyConfig::default(),
    };
    let assembler = CreatureAssembler::new(config);

    let seed = args.seed.unwrap_or_else(rand::random);
    println!("Generating {} creature(s) with seed: {}", args.count, seed);

    if args.dry_run {
        let mut world = SceneWorld::new();
        let creatures = spawn_creatures(&mut world, &assembler, &args, seed)?;
        for (i, (_, creature)) in creatures.iter().enumerate() {
            println!("  #{} {}", i, creature.describe());
        }
        println!(
            "Scene holds {} entities, {} bodies, {} joints",
            world.entity_count(),
            world.body_count(),
            world.joint_count()
        );
        return Ok(());
    }

    let mut world = RapierWorld::new(RapierWorldConfig {
        dt: args.dt,
        ..RapierWorldConfig::default()
    });
    let creatures = spawn_creatures(&mut world, &assembler, &args, seed)?;
    for (i, (_, creature)) in creatures.iter().enumerate() {
        println!("  #{} {}", i, creature.describe());
    }

    println!("Simulating {} steps of {:.4}s...", args.steps, world.config().dt);
    world.simulate(args.steps);

    for (i, (start, creature)) in creatures.iter().enumerate() {
        let end = world.position(creature.torso().entity)?;
        println!(
            "  #{} torso y {:.2} -> {:.2} (drift {:.2}, {:.2})",
            i,
            start.y,
            end.y,
            end.x - start.x,
            end.z - start.z
        );
    }
    Ok(())
}

/// Place one root per creature in a row centred on the origin and assemble
/// each with its own generator derived from `seed`.
fn spawn_creatures<W: PhysicsWorld>(
    world: &mut W,
    assembler: &CreatureAssembler,
    args: &Args,
    seed: u64,
) -> anyhow::Result<Vec<(Vec3, CreatureTopology)>> {
    let half_row = (args.count.saturating_sub(1)) as f32 * args.spacing / 2.0;
    let mut creatures = Vec::with_capacity(args.count);
    for i in 0..args.count {
        let root = world.create_box();
        world.set_position(root, Vec3::new(i as f32 * args.spacing - half_row, 0.0, 0.0))?;

        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(i as u64));
        let creature = assembler
            .assemble(world, root, args.spawn_height, &mut rng)
            .with_context(|| format!("assembling creature #{}", i))?;
        log::info!(
            "creature #{}: {} segments, {} lower limbs",
            i,
            creature.segments().len(),
            creature.lower_limbs().count()
        );
        creatures.push((creature.torso().position, creature));
    }
    Ok(creatures)
}
