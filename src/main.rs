//! CANDIED - CLI Entry Point
//!
//! Evolutionary foraging simulation.

use candied::checkpoint::{Checkpoint, CheckpointManager};
use candied::export::ExportSystem;
use candied::genetics::Gene;
use candied::stats::GeneStats;
use candied::sweep::{run_sweep, SweepPlan};
use candied::{benchmark, Config, World};
use clap::{Parser, Subcommand};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Checkpoints kept on disk per output directory
const MAX_CHECKPOINTS: usize = 10;

#[derive(Parser)]
#[command(name = "candied")]
#[command(version)]
#[command(about = "Evolutionary foraging simulation on a toroidal board")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a new simulation
    Run {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Generation bound (defaults to population.max_generations)
        #[arg(short, long)]
        generations: Option<u64>,

        /// Output directory for checkpoints and history
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Quiet mode (warnings only)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Resume simulation from checkpoint
    Resume {
        /// Checkpoint file to resume from
        #[arg(short, long)]
        checkpoint: PathBuf,

        /// Number of additional generations
        #[arg(short, long, default_value = "10")]
        generations: u64,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
    },

    /// Run performance benchmark
    Benchmark {
        /// Number of generations
        #[arg(short, long, default_value = "20")]
        generations: u64,

        /// Population size (even)
        #[arg(short, long, default_value = "1000")]
        population: usize,
    },

    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },

    /// Analyze a checkpoint file
    Analyze {
        /// Checkpoint file
        checkpoint: PathBuf,
    },

    /// Average many seeded runs for several candy supplies
    Sweep {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Candies per creature to compare
        #[arg(long, value_delimiter = ',', default_value = "2,3,5")]
        candies: Vec<usize>,

        /// Runs per candy value
        #[arg(short, long, default_value = "10")]
        runs: usize,

        /// Generation bound per run
        #[arg(short, long, default_value = "30")]
        generations: u64,

        /// Seed of the first run
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Leave extinct runs out of the averages
        #[arg(long)]
        exclude_extinct: bool,

        /// Output directory
        #[arg(short, long, default_value = "sweep")]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            generations,
            output,
            seed,
            quiet,
        } => run_simulation(config, generations, output, seed, quiet),

        Commands::Resume {
            checkpoint,
            generations,
            output,
        } => resume_simulation(checkpoint, generations, output),

        Commands::Benchmark {
            generations,
            population,
        } => {
            init_logging("info");
            run_benchmark(generations, population)
        }

        Commands::Init { output } => generate_config(output),

        Commands::Analyze { checkpoint } => analyze_checkpoint(checkpoint),

        Commands::Sweep {
            config,
            candies,
            runs,
            generations,
            seed,
            exclude_extinct,
            output,
        } => {
            let plan = SweepPlan {
                candies,
                runs,
                generations,
                base_seed: seed,
                exclude_extinct,
            };
            run_batch(config, plan, output)
        }
    }
}

/// Initialize logging; `RUST_LOG` overrides `level`
fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn load_config(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    if path.exists() {
        println!("Loading config from: {:?}", path);
        Ok(Config::from_file(path)?)
    } else {
        println!("Using default configuration");
        Ok(Config::default())
    }
}

fn run_simulation(
    config_path: PathBuf,
    generations: Option<u64>,
    output: PathBuf,
    seed: Option<u64>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&config_path)?;
    init_logging(if quiet { "warn" } else { config.logging.log_level.as_str() });

    let generations = generations.unwrap_or(config.population.max_generations);

    let world = match seed.or(config.seed) {
        Some(s) => {
            println!("Using seed: {}", s);
            World::new_with_seed(config.clone(), s)?
        }
        None => World::new(config.clone())?,
    };

    println!("Starting simulation");
    println!("  Population: {}", world.population());
    println!("  Board: {}x{}", config.world.width, config.world.height);
    println!("  Candies per day: {}", config.candies_for(world.population()));
    println!("  Generations: {}", generations);
    println!();

    drive(world, generations, &output)
}

fn resume_simulation(
    checkpoint_path: PathBuf,
    generations: u64,
    output: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Loading checkpoint: {:?}", checkpoint_path);

    let checkpoint = Checkpoint::load(&checkpoint_path)?;
    init_logging(&checkpoint.config.logging.log_level);
    let world = World::from_checkpoint(checkpoint);

    println!("Resumed at generation {}", world.generation);
    println!("Population: {}", world.population());
    println!("Running {} additional generations", generations);
    println!();

    drive(world, generations, &output)
}

/// Run `generations` generations with periodic checkpoints, then write the final outputs
fn drive(mut world: World, generations: u64, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut checkpoint_mgr = CheckpointManager::new(
        output,
        world.config.logging.checkpoint_interval,
        MAX_CHECKPOINTS,
    )?;

    let start = Instant::now();
    let simulated = world.run_with_callback(generations, |world, _| {
        if checkpoint_mgr.should_save(world.generation) {
            match checkpoint_mgr.save(&world.create_checkpoint()) {
                Ok(path) => log::debug!("Checkpoint saved: {:?}", path),
                Err(e) => log::error!("Checkpoint error: {}", e),
            }
        }
        ControlFlow::Continue(())
    });
    let elapsed = start.elapsed();

    if world.is_extinct() {
        println!("\nPopulation extinct after generation {}", world.generation.saturating_sub(1));
    }

    println!();
    println!("=== Simulation Complete ===");
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Generations: {}", simulated);
    println!("Speed: {:.1} generations/s", simulated as f64 / elapsed.as_secs_f64());
    println!("Final population: {}", world.population());
    if let Some(last) = world.history.latest() {
        println!("Last: {}", last.summary());
    }

    let final_path = output.join("final.bin");
    world.create_checkpoint().save(&final_path)?;
    println!("Final checkpoint: {:?}", final_path);

    let manifest = ExportSystem::export_full_state(&world, output)?;
    println!("Stats history: {:?}", manifest.history_json);
    println!("History CSV: {:?}", manifest.history_csv);

    Ok(())
}

fn run_benchmark(generations: u64, population: usize) -> Result<(), Box<dyn std::error::Error>> {
    println!("Running benchmark...");
    println!("  Generations: {}", generations);
    println!("  Population: {}", population);
    println!();

    let result = benchmark(generations, population)?;
    println!("{}", result);

    Ok(())
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save(&output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}

fn analyze_checkpoint(checkpoint_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Checkpoint Analysis ===");
    println!("File: {:?}", checkpoint_path);
    println!();

    let checkpoint = Checkpoint::load(&checkpoint_path)?;

    println!("Generation: {}", checkpoint.generation);
    println!("Seed: {}", checkpoint.seed);
    println!("Extinct: {}", checkpoint.extinct);
    println!("Recorded generations: {}", checkpoint.history.len());
    println!();

    let alive: Vec<_> = checkpoint.creatures.iter().filter(|c| c.is_alive()).collect();
    println!("Living creatures: {}", alive.len());

    if !alive.is_empty() {
        let max_gen = alive.iter().map(|c| c.generation).max().unwrap_or(0);
        println!("Max lineage depth: {}", max_gen);
        println!();

        let stats = GeneStats::from_genomes(alive.iter().map(|c| &c.genome));
        for gene in Gene::ALL {
            let g = stats.get(gene);
            println!(
                "{:>14}: mean {:.4}  sd {:.4}  range [{:.4}, {:.4}]",
                gene.name(),
                g.mean,
                g.std_dev(),
                g.min,
                g.max
            );
        }
    }

    if let Some(last) = checkpoint.history.latest() {
        println!();
        println!("Last: {}", last.summary());
    }

    if checkpoint.history.len() > 1 {
        println!();
        println!("Trends (first -> last recorded generation):");
        for gene in Gene::ALL {
            let series = checkpoint.history.gene_mean_series(gene);
            if let (Some(first), Some(last)) = (series.first(), series.last()) {
                println!("{:>14}: {:.4} -> {:.4}", gene.name(), first.1, last.1);
            }
        }
        let eaters = checkpoint.history.eater_series();
        if let (Some((g0, first)), Some((g1, last))) = (eaters.first(), eaters.last()) {
            println!(
                "  eaters 0/1/2: gen {} {:?} -> gen {} {:?}",
                g0, first, g1, last
            );
        }
    }

    println!();
    println!(
        "Checkpoint size: {:.2} MB",
        checkpoint.size_bytes() as f64 / 1_000_000.0
    );

    Ok(())
}

fn run_batch(config_path: PathBuf, plan: SweepPlan, output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&config_path)?;
    init_logging(&config.logging.log_level);

    println!("=== Candy Sweep ===");
    println!("Candies per creature: {:?}", plan.candies);
    println!("Runs per value: {}", plan.runs);
    println!("Generations per run: {}", plan.generations);
    println!();

    let start = Instant::now();
    let result = run_sweep(&config, &plan)?;

    std::fs::create_dir_all(&output)?;
    result.save(output.join("sweep.json"))?;
    ExportSystem::export_sweep_csv(&result, output.join("sweep.csv"))?;

    println!("=== SUMMARY ({:.1}s) ===", start.elapsed().as_secs_f64());
    for cell in &result.cells {
        print!(
            "candies={:3} | extinct {:3}/{:3}",
            cell.candies_per_creature,
            cell.extinct_runs(),
            cell.runs.len()
        );
        match cell.averaged.last() {
            Some(row) => println!(
                " | gen {:4} | pop {:8.1} | speed {:.3} | view {:.3} | focus {:.3}",
                row.generation, row.population, row.gene_means[0], row.gene_means[1], row.gene_means[2]
            ),
            None => println!(" | no surviving runs"),
        }
    }
    println!();
    println!("Results: {:?}", output);

    Ok(())
}
