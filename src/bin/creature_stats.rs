//! Sampling tool: assemble many creatures and report how the draws land

use std::time::Instant;

use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use creature_generator::{CreatureAssembler, LimbFamily, SceneWorld};

const SAMPLES: u64 = 10_000;
const SEED: u64 = 1337;

#[derive(Default)]
struct Extent {
    min: f32,
    max: f32,
    sum: f64,
    n: u64,
}

impl Extent {
    fn push(&mut self, v: f32) {
        if self.n == 0 {
            self.min = v;
            self.max = v;
        }
        self.min = self.min.min(v);
        self.max = self.max.max(v);
        self.sum += v as f64;
        self.n += 1;
    }

    fn report(&self, label: &str) {
        let mean = if self.n > 0 { self.sum / self.n as f64 } else { 0.0 };
        println!(
            "  {:<14} min {:>6.3}  max {:>6.3}  mean {:>6.3}",
            label, self.min, self.max, mean
        );
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    println!("=== Creature Statistics ===");
    println!("Samples: {} (seeds {}..{})", SAMPLES, SEED, SEED + SAMPLES);
    println!();

    let assembler = CreatureAssembler::default();
    let mut torso = [Extent::default(), Extent::default(), Extent::default()];
    let mut limb_height = Extent::default();
    let mut motor_force = Extent::default();
    let mut motor_velocity = Extent::default();
    let mut lower_by_count = [0u64; 5];
    let mut lower_by_family = [0u64; 2];

    let start = Instant::now();
    for seed in SEED..SEED + SAMPLES {
        let mut world = SceneWorld::new();
        let root = world.spawn_root(Vec3::ZERO);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let creature = assembler.assemble(&mut world, root, 5.0, &mut rng)?;

        let t = creature.torso().dimensions;
        torso[0].push(t.x);
        torso[1].push(t.y);
        torso[2].push(t.z);

        for segment in creature.segments().iter().filter(|s| s.is_limb()) {
            limb_height.push(segment.height());
        }
        for motor in creature.joints().iter().filter_map(|j| j.motor()) {
            motor_force.push(motor.force);
            motor_velocity.push(motor.target_velocity);
        }

        lower_by_count[creature.lower_limbs().count()] += 1;
        for lower in creature.lower_limbs() {
            match lower.family() {
                Some(LimbFamily::Leg) => lower_by_family[0] += 1,
                Some(LimbFamily::Arm) => lower_by_family[1] += 1,
                None => {}
            }
        }
    }
    let elapsed = start.elapsed();

    println!("Torso:");
    torso[0].report("width");
    torso[1].report("height");
    torso[2].report("depth");
    println!("Limbs:");
    limb_height.report("segment height");
    motor_force.report("motor force");
    motor_velocity.report("motor velocity");

    println!("\nLower limbs per creature:");
    for (count, creatures) in lower_by_count.iter().enumerate() {
        println!(
            "  {}: {:>6} ({:>5.1}%)",
            count,
            creatures,
            100.0 * *creatures as f64 / SAMPLES as f64
        );
    }
    let chains = SAMPLES as f64 * 2.0;
    println!(
        "  legs grew lower segments {:.1}% of the time, arms {:.1}% (configured {:.1}%)",
        100.0 * lower_by_family[0] as f64 / chains,
        100.0 * lower_by_family[1] as f64 / chains,
        100.0 * assembler.config().lower_limb_probability()
    );

    println!("\n=== Summary ===");
    println!("Assembled {} creatures in {:?}", SAMPLES, elapsed);
    Ok(())
}
