//! Checkpoint system for saving and loading simulation state.

use crate::config::Config;
use crate::creature::{Creature, CreatureId};
use crate::stats::StatsHistory;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

const MAGIC: &[u8; 4] = b"CNDY";

/// Complete simulation state at a generation boundary.
///
/// The candy field is not stored: it is respawned every morning from the
/// random stream, which is saved mid-flight so a resumed run continues
/// exactly where the original left off.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Version for compatibility checking
    pub version: u32,
    /// Next generation to simulate
    pub generation: u64,
    pub config: Config,
    pub creatures: Vec<Creature>,
    pub history: StatsHistory,
    pub next_creature_id: CreatureId,
    /// Seed the run was started with
    pub seed: u64,
    /// Random stream state at the boundary
    pub rng: ChaCha8Rng,
    pub extinct: bool,
}

impl Checkpoint {
    /// Current checkpoint version
    pub const VERSION: u32 = 1;

    /// Save checkpoint to binary file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), CheckpointError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writer.write_all(MAGIC)?;
        bincode::serialize_into(&mut writer, self)?;
        writer.flush()?;

        Ok(())
    }

    /// Load checkpoint from binary file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CheckpointError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(CheckpointError::InvalidFormat("Invalid magic bytes".to_string()));
        }

        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        let checkpoint: Checkpoint = bincode::deserialize(&buffer)?;

        if checkpoint.version != Self::VERSION {
            return Err(CheckpointError::VersionMismatch {
                expected: Self::VERSION,
                found: checkpoint.version,
            });
        }

        Ok(checkpoint)
    }

    /// Get approximate size in bytes
    pub fn size_bytes(&self) -> usize {
        bincode::serialized_size(self).unwrap_or(0) as usize + MAGIC.len()
    }
}

/// Errors that can occur during checkpoint operations
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Checkpoint manager for periodic saving
#[derive(Debug)]
pub struct CheckpointManager {
    /// Base directory for checkpoints
    pub base_dir: PathBuf,
    /// Generations between checkpoints
    pub interval: u64,
    /// Maximum checkpoints to keep
    pub max_checkpoints: usize,
    last_checkpoint: Option<u64>,
}

impl CheckpointManager {
    /// Create a new checkpoint manager, creating the directory if needed
    pub fn new<P: Into<PathBuf>>(
        base_dir: P,
        interval: u64,
        max_checkpoints: usize,
    ) -> Result<Self, CheckpointError> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;

        Ok(Self {
            base_dir,
            interval: interval.max(1),
            max_checkpoints,
            last_checkpoint: None,
        })
    }

    /// Check if a checkpoint should be saved at this generation boundary
    pub fn should_save(&self, generation: u64) -> bool {
        generation > 0 && generation % self.interval == 0 && self.last_checkpoint != Some(generation)
    }

    /// Generate checkpoint filename
    pub fn checkpoint_path(&self, generation: u64) -> PathBuf {
        self.base_dir.join(format!("checkpoint_{:08}.bin", generation))
    }

    /// Save checkpoint and drop the oldest ones beyond the limit
    pub fn save(&mut self, checkpoint: &Checkpoint) -> Result<PathBuf, CheckpointError> {
        let path = self.checkpoint_path(checkpoint.generation);
        checkpoint.save(&path)?;
        self.last_checkpoint = Some(checkpoint.generation);

        self.cleanup()?;

        Ok(path)
    }

    fn checkpoint_files(&self) -> Result<Vec<PathBuf>, CheckpointError> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.base_dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| is_numbered_checkpoint(&entry.file_name().to_string_lossy()))
            .map(|entry| entry.path())
            .collect();
        // Zero-padded generation numbers sort chronologically
        files.sort();
        Ok(files)
    }

    fn cleanup(&self) -> Result<(), CheckpointError> {
        let files = self.checkpoint_files()?;
        if files.len() > self.max_checkpoints {
            let to_remove = files.len() - self.max_checkpoints;
            for path in files.into_iter().take(to_remove) {
                std::fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    /// Find latest checkpoint in directory
    pub fn find_latest(&self) -> Option<PathBuf> {
        self.checkpoint_files().ok()?.pop()
    }
}

/// Whether `name` is a `checkpoint_<generation>.bin` file written by the manager
fn is_numbered_checkpoint(name: &str) -> bool {
    name.strip_prefix("checkpoint_")
        .and_then(|rest| rest.strip_suffix(".bin"))
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genetics::Genome;
    use crate::grid::Position;
    use rand::{RngCore, SeedableRng};

    fn create_test_checkpoint(generation: u64) -> Checkpoint {
        let mut rng = ChaCha8Rng::seed_from_u64(12345);
        rng.next_u64();

        Checkpoint {
            version: Checkpoint::VERSION,
            generation,
            config: Config::default(),
            creatures: vec![Creature::new(1, Position::new(3.0, 4.0), Genome::new(2.0, 5.0, 1.0, 0.1))],
            history: StatsHistory::new(),
            next_creature_id: 2,
            seed: 12345,
            rng,
            extinct: false,
        }
    }

    #[test]
    fn test_checkpoint_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.bin");
        let checkpoint = create_test_checkpoint(7);

        checkpoint.save(&path).unwrap();
        let mut loaded = Checkpoint::load(&path).unwrap();

        assert_eq!(loaded.generation, 7);
        assert_eq!(loaded.creatures, checkpoint.creatures);
        assert_eq!(loaded.config, checkpoint.config);
        assert_eq!(loaded.seed, 12345);

        // The random stream continues from the saved position
        let mut original = checkpoint.rng.clone();
        assert_eq!(loaded.rng.next_u64(), original.next_u64());
    }

    #[test]
    fn test_bad_magic_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.bin");
        std::fs::write(&path, b"NOPE and more bytes").unwrap();

        assert!(matches!(
            Checkpoint::load(&path),
            Err(CheckpointError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_version_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.bin");
        let mut checkpoint = create_test_checkpoint(1);
        checkpoint.version = 99;
        checkpoint.save(&path).unwrap();

        assert!(matches!(
            Checkpoint::load(&path),
            Err(CheckpointError::VersionMismatch { expected: 1, found: 99 })
        ));
    }

    #[test]
    fn test_manager_interval_and_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = CheckpointManager::new(dir.path(), 2, 2).unwrap();

        assert!(!manager.should_save(0));
        assert!(!manager.should_save(3));
        assert!(manager.should_save(4));

        for generation in [2, 4, 6] {
            manager.save(&create_test_checkpoint(generation)).unwrap();
        }
        assert!(!manager.should_save(6));

        let files = manager.checkpoint_files().unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(manager.find_latest(), Some(manager.checkpoint_path(6)));
    }

    #[test]
    fn test_manager_ignores_unnumbered_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = CheckpointManager::new(dir.path(), 1, 2).unwrap();

        for generation in [1, 2] {
            manager.save(&create_test_checkpoint(generation)).unwrap();
        }
        create_test_checkpoint(9).save(dir.path().join("checkpoint_final.bin")).unwrap();
        create_test_checkpoint(9).save(dir.path().join("final.bin")).unwrap();
        manager.save(&create_test_checkpoint(3)).unwrap();

        assert_eq!(
            manager.checkpoint_files().unwrap(),
            vec![manager.checkpoint_path(2), manager.checkpoint_path(3)]
        );
        assert_eq!(manager.find_latest(), Some(manager.checkpoint_path(3)));
        assert!(dir.path().join("checkpoint_final.bin").exists());
        assert!(dir.path().join("final.bin").exists());
    }

    #[test]
    fn test_checkpoint_size() {
        let size = create_test_checkpoint(1).size_bytes();
        assert!(size > MAGIC.len());
        assert!(size < 1_000_000);
    }
}
