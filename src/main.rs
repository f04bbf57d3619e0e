//! Energy-storage environment entry point: CLI wiring and a single rollout.

use std::path::{Path, PathBuf};
use std::process;

use tracing_subscriber::FmtSubscriber;

use storage_env::config::EnvConfig;
use storage_env::env::{EnergyStorageEnv, ResetOptions, StorageOverride};
use storage_env::io::export::export_csv;
use storage_env::runner::run_episode;
use storage_env::sim::policy::{ConstantPolicy, Policy, PriceThresholdPolicy};

/// Parsed CLI arguments.
struct CliArgs {
    config_path: Option<String>,
    preset: Option<String>,
    start: Option<String>,
    data_dir: Option<PathBuf>,
    seed_override: Option<u64>,
    init_storage: Option<String>,
    policy: String,
    telemetry_out: Option<String>,
    verbose: bool,
}

fn print_help() {
    eprintln!("storage-env: grid-connected energy storage environment");
    eprintln!();
    eprintln!("Usage: storage-env [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>          Load environment config from a TOML file");
    eprintln!("  --preset <name>          Use a built-in preset ({})", EnvConfig::PRESETS.join(", "));
    eprintln!("  --start <timestamp>      Episode start (RFC 3339 or YYYY-MM-DD)");
    eprintln!("  --data-dir <path>        Directory holding the CSV data files");
    eprintln!("  --seed <u64>             Override random seed");
    eprintln!("  --init-storage <value>   Initial stored energy instead of a random draw");
    eprintln!("  --policy <spec>          constant[:<action>] or threshold:<low>,<high>");
    eprintln!("                           (default: constant:-1)");
    eprintln!("  --telemetry-out <path>   Export step results to CSV");
    eprintln!("  --verbose                Log every step");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --config or --preset is given, the baseline preset is used.");
}

/// Returns the value following flag `args[*i]`, exiting if it is missing.
fn flag_value(args: &[String], i: &mut usize, what: &str) -> String {
    *i += 1;
    match args.get(*i) {
        Some(v) => v.clone(),
        None => {
            eprintln!("error: {} requires {what}", args[*i - 1]);
            process::exit(1);
        }
    }
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        config_path: None,
        preset: None,
        start: None,
        data_dir: None,
        seed_override: None,
        init_storage: None,
        policy: "constant".to_string(),
        telemetry_out: None,
        verbose: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--config" => cli.config_path = Some(flag_value(&args, &mut i, "a path argument")),
            "--preset" => cli.preset = Some(flag_value(&args, &mut i, "a name argument")),
            "--start" => cli.start = Some(flag_value(&args, &mut i, "a timestamp argument")),
            "--data-dir" => {
                cli.data_dir = Some(PathBuf::from(flag_value(&args, &mut i, "a path argument")));
            }
            "--seed" => {
                let raw = flag_value(&args, &mut i, "a u64 argument");
                if let Ok(s) = raw.parse::<u64>() {
                    cli.seed_override = Some(s);
                } else {
                    eprintln!("error: --seed value \"{raw}\" is not a valid u64");
                    process::exit(1);
                }
            }
            "--init-storage" => {
                cli.init_storage = Some(flag_value(&args, &mut i, "a value argument"));
            }
            "--policy" => cli.policy = flag_value(&args, &mut i, "a policy argument"),
            "--telemetry-out" => {
                cli.telemetry_out = Some(flag_value(&args, &mut i, "a path argument"));
            }
            "--verbose" | "-v" => cli.verbose = true,
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

/// Parses `constant[:<action>]` or `threshold:<low>,<high>`.
fn parse_policy(spec: &str) -> Result<Box<dyn Policy>, String> {
    let (kind, params) = spec.split_once(':').unwrap_or((spec, ""));
    let number = |s: &str| {
        s.trim()
            .parse::<f64>()
            .map_err(|_| format!("policy parameter \"{s}\" is not a number"))
    };
    match kind {
        "constant" if params.is_empty() => Ok(Box::new(ConstantPolicy::full_charge())),
        "constant" => Ok(Box::new(ConstantPolicy::new(number(params)?))),
        "threshold" => {
            let (low, high) = params
                .split_once(',')
                .ok_or("threshold policy needs <low>,<high>")?;
            let (low, high) = (number(low)?, number(high)?);
            if low > high {
                return Err(format!("threshold low {low} exceeds high {high}"));
            }
            Ok(Box::new(PriceThresholdPolicy::new(low, high)))
        }
        _ => Err(format!("unknown policy \"{kind}\", expected constant or threshold")),
    }
}

fn main() {
    let cli = parse_args();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("error: setting default subscriber failed: {e}");
        process::exit(1);
    }

    // --config takes priority, then --preset, then baseline default
    let loaded = if let Some(ref path) = cli.config_path {
        EnvConfig::from_toml_file(Path::new(path))
    } else if let Some(ref name) = cli.preset {
        EnvConfig::from_preset(name)
    } else {
        Ok(EnvConfig::baseline())
    };
    let mut config = loaded.unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    if let Some(seed) = cli.seed_override {
        config.episode.seed = seed;
    }
    if let Some(start) = cli.start {
        config.episode.start = start;
    }
    if let Some(dir) = cli.data_dir {
        config.data.dir = dir;
    }

    let settings = config.env_settings().unwrap_or_else(|errors| {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    });
    let mut policy = parse_policy(&cli.policy).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        process::exit(1);
    });

    let provider = config.data.provider();
    let mut env = EnergyStorageEnv::new(settings, &provider).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        process::exit(1);
    });

    let options = ResetOptions {
        init_storage: cli.init_storage.map(StorageOverride::Text),
        seed: None,
    };
    let run = run_episode(&mut env, policy.as_mut(), options).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        process::exit(1);
    });

    for r in &run.results {
        println!("{r}");
    }
    println!("\n{}", run.summary);

    if let Some(ref path) = cli.telemetry_out {
        if let Err(e) = export_csv(&run.results, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Telemetry written to {path}");
    }
}
