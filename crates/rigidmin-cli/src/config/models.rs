use rigidmin::core::potentials::lj::LennardJones;
use rigidmin::engine::config::QuenchConfig;
use std::path::PathBuf;

pub struct AppConfig {
    pub nrigid: usize,
    /// `None` draws the starting configuration from OS entropy.
    pub seed: Option<u64>,
    pub use_accelerated_path: bool,
    pub potential: LennardJones,
    pub quench: QuenchConfig,
    pub output_path: Option<PathBuf>,
}
