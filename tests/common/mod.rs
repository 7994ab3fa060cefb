#![allow(dead_code)]

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use surface_kmc::core::domain::Config;
use surface_kmc::core::error::{KmcError, KmcResult};
use surface_kmc::engine::recorder::Recorder;
use surface_kmc::solvers::Snapshot;

pub fn seeded(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Default constants on a `width` x `height` lattice with S-site fraction `fi`.
pub fn small_config(width: usize, height: usize, fi: f64) -> Config {
    let mut config = Config::default();
    config.simulating.matrix_len_x = width;
    config.simulating.matrix_len_y = height;
    config.simulating.log_percent = 10.0;
    config.consts.fi = fi;
    config
}

/// Recorder whose every write fails.
#[derive(Default)]
pub struct FailingRecorder {
    pub attempts: usize,
}

impl Recorder for FailingRecorder {
    fn record(&mut self, _snapshot: &Snapshot) -> KmcResult<()> {
        self.attempts += 1;
        Err(KmcError::Report("disk full".to_string()))
    }

    fn name(&self) -> &str {
        "Failing"
    }
}

/// Fresh scratch directory under the system temp dir.
pub fn scratch_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("surface_kmc_{}_{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}
