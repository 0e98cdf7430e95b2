use crate::cli::QuenchArgs;
use crate::config::{AppConfig, build_config};
use crate::error::Result;
use crate::structure;
use crate::utils::progress::CliProgressHandler;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rigidmin::{
    core::potentials::rigid::RigidBodyPotential,
    core::rigidbody::{RigidBodyTopologyBuilder, fragments::otp},
    engine::progress::ProgressReporter,
    workflows::{self, quench::QuenchResult},
};
use std::fs::File;
use std::io::BufWriter;
use tracing::{info, warn};

pub fn run(args: QuenchArgs) -> Result<()> {
    info!("Merging configuration from defaults, file and CLI arguments...");
    let config = build_config(&args)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let result = quench_random_cluster(&config, &reporter)?;

    println!(
        "Quench {} after {} iterations ({} energy evaluations).",
        if result.converged { "converged" } else { "did not converge" },
        result.iterations,
        result.function_evaluations
    );
    println!("  Energy:       {:.10}", result.energy);
    println!("  RMS gradient: {:.3e}", result.rms);
    if !result.converged {
        warn!(
            "Stopped at the iteration limit ({}) with rms {:.3e} above tolerance {:.1e}.",
            config.quench.max_iterations, result.rms, config.quench.tolerance
        );
    }
    Ok(())
}

/// Builds the OTP cluster described by `config`, quenches it and writes the output file if
/// one was requested.
pub fn quench_random_cluster(
    config: &AppConfig,
    reporter: &ProgressReporter,
) -> Result<QuenchResult> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let initial = structure::random_cluster(config.nrigid, &mut rng)?;

    let topology = RigidBodyTopologyBuilder::new()
        .add_sites((0..config.nrigid).map(|_| otp()))
        .finalize_setup(config.use_accelerated_path)?;
    info!(
        "Built topology: {} rigid molecules, {} atoms, {:?} transform path.",
        topology.nsites(),
        topology.total_atoms(),
        topology.path()
    );
    let potential = RigidBodyPotential::new(&topology, config.potential);

    println!(
        "Quenching a cluster of {} OTP molecules ({} rigid-body coordinates)...",
        config.nrigid,
        initial.len()
    );
    let result = workflows::quench::run(&potential, &initial, &config.quench, reporter)?;

    if let Some(path) = &config.output_path {
        let atomistic = topology.to_atomistic(&result.coords)?;
        let mut writer = BufWriter::new(File::create(path)?);
        structure::write_xyz(
            &mut writer,
            &atomistic,
            "LJ",
            &format!("E = {:.10} rms = {:.3e}", result.energy, result.rms),
        )?;
        info!("Wrote minimized structure to {:?}", path);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigidmin::core::potentials::Potential;
    use tempfile::tempdir;

    fn small_config(output: Option<std::path::PathBuf>) -> AppConfig {
        let args = QuenchArgs {
            nrigid: Some(3),
            seed: Some(11),
            max_iterations: Some(3000),
            tolerance: Some(1e-3),
            output,
            ..Default::default()
        };
        build_config(&args).unwrap()
    }

    #[test]
    fn quench_lowers_energy_of_random_cluster_and_writes_xyz() {
        let dir = tempdir().unwrap();
        let xyz = dir.path().join("min.xyz");
        let config = small_config(Some(xyz.clone()));

        let mut rng = StdRng::seed_from_u64(11);
        let initial = structure::random_cluster(3, &mut rng).unwrap();
        let topology = RigidBodyTopologyBuilder::new()
            .add_sites((0..3).map(|_| otp()))
            .finalize_setup(false)
            .unwrap();
        let e0 = RigidBodyPotential::new(&topology, config.potential)
            .energy(&initial)
            .unwrap();

        let result = quench_random_cluster(&config, &ProgressReporter::new()).unwrap();
        assert!(result.energy < e0);

        let text = std::fs::read_to_string(&xyz).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("9"));
        assert!(lines.next().unwrap().starts_with("E = "));
        assert_eq!(lines.count(), 9);
    }

    #[test]
    fn reference_and_accelerated_paths_agree() {
        let mut config = small_config(None);
        config.quench.max_iterations = 20;
        config.use_accelerated_path = false;
        let reference = quench_random_cluster(&config, &ProgressReporter::new()).unwrap();
        config.use_accelerated_path = true;
        let accelerated = quench_random_cluster(&config, &ProgressReporter::new()).unwrap();
        assert_eq!(reference, accelerated);
    }
}
