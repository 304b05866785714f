//! Data export system for analysis in external tools.

use crate::creature::Creature;
use crate::genetics::Gene;
use crate::stats::StatsHistory;
use crate::sweep::SweepResult;
use crate::world::World;
use std::fs::File;
use std::io::{BufWriter, Result, Write};
use std::path::{Path, PathBuf};

/// Export system for saving simulation data
pub struct ExportSystem;

impl ExportSystem {
    /// Export one row per generation to CSV
    pub fn export_history_csv<P: AsRef<Path>>(history: &StatsHistory, path: P) -> Result<()> {
        let mut file = BufWriter::new(File::create(path)?);

        write!(file, "generation,population")?;
        for gene in Gene::ALL {
            let name = gene.name();
            write!(file, ",{name}_mean,{name}_variance,{name}_min,{name}_max")?;
        }
        writeln!(
            file,
            ",zero_eaters,one_eaters,two_eaters,starved,eligible_parents,offspring,next_population,mean_energy_spent,ticks,tick_budget_exceeded,candies_remaining,extinct"
        )?;

        for s in &history.snapshots {
            write!(file, "{},{}", s.generation, s.population)?;
            for gene in Gene::ALL {
                let g = s.genes.get(gene);
                write!(file, ",{:.6},{:.6},{:.6},{:.6}", g.mean, g.variance, g.min, g.max)?;
            }
            writeln!(
                file,
                ",{},{},{},{},{},{},{},{:.4},{},{},{},{}",
                s.zero_eaters,
                s.one_eaters,
                s.two_eaters,
                s.starved,
                s.eligible_parents,
                s.offspring,
                s.next_population,
                s.mean_energy_spent,
                s.ticks,
                s.tick_budget_exceeded,
                s.candies_remaining,
                s.extinct,
            )?;
        }

        file.flush()
    }

    /// Export living creatures to CSV
    pub fn export_creatures_csv<P: AsRef<Path>>(creatures: &[Creature], path: P) -> Result<()> {
        let mut file = BufWriter::new(File::create(path)?);

        writeln!(
            file,
            "id,generation,parent1_id,parent2_id,x,y,speed,view_range,focus_angle,mutation_rate,hunger_streak,candies_eaten,energy_spent"
        )?;

        for c in creatures.iter().filter(|c| c.is_alive()) {
            let (parent1, parent2) = c
                .parents
                .map_or((String::new(), String::new()), |(a, b)| (a.to_string(), b.to_string()));

            writeln!(
                file,
                "{},{},{},{},{:.4},{:.4},{:.6},{:.6},{:.6},{:.6},{},{},{:.4}",
                c.id,
                c.generation,
                parent1,
                parent2,
                c.position.x,
                c.position.y,
                c.genome.speed,
                c.genome.view_range,
                c.genome.focus_angle,
                c.genome.mutation_rate,
                c.hunger_streak,
                c.candies_eaten,
                c.energy_spent,
            )?;
        }

        file.flush()
    }

    /// Export averaged sweep rows to CSV, one block per candy value
    pub fn export_sweep_csv<P: AsRef<Path>>(result: &SweepResult, path: P) -> Result<()> {
        let mut file = BufWriter::new(File::create(path)?);

        write!(file, "candies_per_creature,generation,runs,extinct_runs,population")?;
        for gene in Gene::ALL {
            write!(file, ",{}_mean", gene.name())?;
        }
        writeln!(file, ",zero_eaters,one_eaters,two_eaters,mean_energy_spent")?;

        for cell in &result.cells {
            let extinct_runs = cell.extinct_runs();
            for row in &cell.averaged {
                write!(
                    file,
                    "{},{},{},{},{:.4}",
                    cell.candies_per_creature, row.generation, row.runs, extinct_runs, row.population
                )?;
                for mean in row.gene_means {
                    write!(file, ",{:.6}", mean)?;
                }
                writeln!(
                    file,
                    ",{:.4},{:.4},{:.4},{:.4}",
                    row.zero_eaters, row.one_eaters, row.two_eaters, row.mean_energy_spent
                )?;
            }
        }

        file.flush()
    }

    /// Export a human-readable run summary
    pub fn export_summary<P: AsRef<Path>>(world: &World, path: P) -> Result<()> {
        let mut file = File::create(path)?;

        writeln!(file, "=== CANDIED Simulation Summary ===")?;
        writeln!(file, "Seed: {}", world.seed())?;
        writeln!(file, "Generations: {}", world.generation)?;
        writeln!(file, "Population: {}", world.population())?;
        writeln!(file, "Extinct: {}", world.is_extinct())?;
        writeln!(file)?;

        if let Some(last) = world.history.latest() {
            writeln!(file, "=== Last Generation ===")?;
            for gene in Gene::ALL {
                let g = last.genes.get(gene);
                writeln!(
                    file,
                    "{:>14}: mean {:.4}  sd {:.4}  range [{:.4}, {:.4}]",
                    gene.name(),
                    g.mean,
                    g.std_dev(),
                    g.min,
                    g.max
                )?;
            }
            writeln!(
                file,
                "Eaters 0/1/2: {}/{}/{}",
                last.zero_eaters, last.one_eaters, last.two_eaters
            )?;
        }

        Ok(())
    }

    /// Export history, population and summary into a directory
    pub fn export_full_state<P: AsRef<Path>>(world: &World, base_path: P) -> Result<ExportManifest> {
        let base = base_path.as_ref();
        std::fs::create_dir_all(base)?;

        let manifest = ExportManifest {
            generation: world.generation,
            history_csv: base.join("history.csv"),
            history_json: base.join("history.json"),
            creatures_csv: base.join("creatures.csv"),
            summary: base.join("summary.txt"),
        };

        Self::export_history_csv(&world.history, &manifest.history_csv)?;
        world.history.save(&manifest.history_json)?;
        Self::export_creatures_csv(&world.creatures, &manifest.creatures_csv)?;
        Self::export_summary(world, &manifest.summary)?;

        Ok(manifest)
    }
}

/// Manifest of exported files
#[derive(Debug)]
pub struct ExportManifest {
    pub generation: u64,
    pub history_csv: PathBuf,
    pub history_json: PathBuf,
    pub creatures_csv: PathBuf,
    pub summary: PathBuf,
}
