//! Minimal example of a CANDIED simulation

use candied::{Config, SimError, World};

fn main() -> Result<(), SimError> {
    println!("CANDIED - Minimal Example");
    println!("=========================\n");

    let config = Config::default();
    let mut world = World::new_with_seed(config, 42)?;

    println!("Initial state:");
    println!("  Population: {}", world.population());
    println!("  Board: {}x{}", world.config.world.width, world.config.world.height);
    println!();

    let generations = world.config.population.max_generations;
    println!("Running {} generations...\n", generations);

    for _ in 0..generations {
        let snapshot = world.step()?;
        println!(
            "Gen {:3} | 0/1/2: {:3}/{:3}/{:3} | Speed: {:.2} | View: {:.2} | Focus: {:.2}",
            snapshot.generation,
            snapshot.zero_eaters,
            snapshot.one_eaters,
            snapshot.two_eaters,
            snapshot.genes.speed.mean,
            snapshot.genes.view_range.mean,
            snapshot.genes.focus_angle.mean,
        );

        if snapshot.extinct {
            println!("\nPopulation went extinct at generation {}", snapshot.generation);
            break;
        }
    }

    println!("\nFinal state:");
    println!("  Population: {}", world.population());
    println!("  Generations: {}", world.generation);

    Ok(())
}
