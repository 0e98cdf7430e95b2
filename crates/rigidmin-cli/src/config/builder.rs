use super::defaults::DefaultsConfig;
use super::file::{FileConfig, FileLbfgsConfig, FileQuenchConfig};
use super::models::AppConfig;
use crate::cli::QuenchArgs;
use crate::error::{CliError, Result};
use rigidmin::core::potentials::lj::LennardJones;
use rigidmin::engine::config::{self as core_config, CurvaturePolicy};
use serde::Deserialize;
use serde::de::IntoDeserializer;
use serde::de::value::{Error as ValueError, StrDeserializer};
use std::str::FromStr;

/// Merges, in increasing precedence, built-in defaults, the TOML file, `--set` values and
/// explicit command-line flags.
pub fn build_config(args: &QuenchArgs) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };

    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let system_file = file_config.system.take().unwrap_or_default();
    let nrigid = args
        .nrigid
        .or(system_file.nrigid)
        .unwrap_or(defaults.nrigid);
    if nrigid == 0 {
        return Err(CliError::Config(
            "The cluster must contain at least one rigid molecule.".to_string(),
        ));
    }
    let seed = args.seed.or(system_file.seed);
    let use_accelerated_path = !args.reference_path
        && system_file
            .accelerated_path
            .unwrap_or(defaults.use_accelerated_path);

    let potential_file = file_config.potential.take().unwrap_or_default();
    let potential = LennardJones::new(
        potential_file.epsilon.unwrap_or(defaults.epsilon),
        potential_file.sigma.unwrap_or(defaults.sigma),
    );

    let lbfgs = merge_lbfgs(args, file_config.lbfgs.take(), &defaults)?;
    let quench = merge_quench(args, file_config.quench.take(), lbfgs, &defaults)?;

    Ok(AppConfig {
        nrigid,
        seed,
        use_accelerated_path,
        potential,
        quench,
        output_path: args.output.clone(),
    })
}

fn merge_lbfgs(
    args: &QuenchArgs,
    file_val: Option<FileLbfgsConfig>,
    defaults: &DefaultsConfig,
) -> Result<core_config::LbfgsConfig> {
    let file_val = file_val.unwrap_or_default();
    core_config::LbfgsConfigBuilder::new()
        .history_size(
            args.history_size
                .or(file_val.history_size)
                .unwrap_or(defaults.history_size),
        )
        .max_step(
            args.max_step
                .or(file_val.max_step)
                .unwrap_or(defaults.max_step),
        )
        .initial_inverse_hessian(
            file_val
                .initial_inverse_hessian
                .unwrap_or(defaults.initial_inverse_hessian),
        )
        .scale_inverse_hessian(
            file_val
                .scale_inverse_hessian
                .unwrap_or(defaults.scale_inverse_hessian),
        )
        .curvature_policy(
            file_val
                .curvature_policy
                .unwrap_or(defaults.curvature_policy),
        )
        .build()
        .map_err(|e| CliError::Config(e.to_string()))
}

fn merge_quench(
    args: &QuenchArgs,
    file_val: Option<FileQuenchConfig>,
    lbfgs: core_config::LbfgsConfig,
    defaults: &DefaultsConfig,
) -> Result<core_config::QuenchConfig> {
    let file_val = file_val.unwrap_or_default();
    core_config::QuenchConfigBuilder::new()
        .lbfgs(lbfgs)
        .max_iterations(
            args.max_iterations
                .or(file_val.max_iterations)
                .unwrap_or(defaults.max_iterations),
        )
        .tolerance(
            args.tolerance
                .or(file_val.tolerance)
                .unwrap_or(defaults.tolerance),
        )
        .max_energy_rise(
            file_val
                .max_energy_rise
                .unwrap_or(defaults.max_energy_rise),
        )
        .max_backtracks(file_val.max_backtracks.unwrap_or(defaults.max_backtracks))
        .build()
        .map_err(|e| CliError::Config(e.to_string()))
}

fn parse_value<T: FromStr>(key: &str, value_str: &str, kind: &str) -> Result<T> {
    value_str.parse().map_err(|_| {
        CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value_str))
    })
}

fn parse_policy(key: &str, value_str: &str) -> Result<CurvaturePolicy> {
    let de: StrDeserializer<'_, ValueError> = value_str.into_deserializer();
    CurvaturePolicy::deserialize(de).map_err(|_| {
        CliError::Config(format!(
            "Invalid value for {}: {} (expected skip-update, reset-history or unguarded)",
            key, value_str
        ))
    })
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };

        match key {
            "system.nrigid" => {
                config.system.get_or_insert_with(Default::default).nrigid =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "system.seed" => {
                config.system.get_or_insert_with(Default::default).seed =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "system.accelerated-path" => {
                config
                    .system
                    .get_or_insert_with(Default::default)
                    .accelerated_path = Some(parse_value(key, value_str, "boolean")?);
            }
            "potential.epsilon" => {
                config.potential.get_or_insert_with(Default::default).epsilon =
                    Some(parse_value(key, value_str, "float")?);
            }
            "potential.sigma" => {
                config.potential.get_or_insert_with(Default::default).sigma =
                    Some(parse_value(key, value_str, "float")?);
            }
            "lbfgs.history-size" => {
                config.lbfgs.get_or_insert_with(Default::default).history_size =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "lbfgs.max-step" => {
                config.lbfgs.get_or_insert_with(Default::default).max_step =
                    Some(parse_value(key, value_str, "float")?);
            }
            "lbfgs.initial-inverse-hessian" => {
                config
                    .lbfgs
                    .get_or_insert_with(Default::default)
                    .initial_inverse_hessian = Some(parse_value(key, value_str, "float")?);
            }
            "lbfgs.scale-inverse-hessian" => {
                config
                    .lbfgs
                    .get_or_insert_with(Default::default)
                    .scale_inverse_hessian = Some(parse_value(key, value_str, "boolean")?);
            }
            "lbfgs.curvature-policy" => {
                config
                    .lbfgs
                    .get_or_insert_with(Default::default)
                    .curvature_policy = Some(parse_policy(key, value_str)?);
            }
            "quench.max-iterations" => {
                config
                    .quench
                    .get_or_insert_with(Default::default)
                    .max_iterations = Some(parse_value(key, value_str, "integer")?);
            }
            "quench.tolerance" => {
                config.quench.get_or_insert_with(Default::default).tolerance =
                    Some(parse_value(key, value_str, "float")?);
            }
            "quench.max-energy-rise" => {
                config
                    .quench
                    .get_or_insert_with(Default::default)
                    .max_energy_rise = Some(parse_value(key, value_str, "float")?);
            }
            "quench.max-backtracks" => {
                config
                    .quench
                    .get_or_insert_with(Default::default)
                    .max_backtracks = Some(parse_value(key, value_str, "integer")?);
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}
