//! Orbis Desktop - native window for the orbital scene

use anyhow::Result;
use clap::Parser;
use orbis_core::SceneConfig;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "orbis")]
#[command(about = "Textured Earth, orbiting moon and starfield")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "orbis.toml")]
    config: PathBuf,

    /// Seed for a reproducible starfield
    #[arg(short, long)]
    seed: Option<u64>,

    /// Animate star opacity
    #[arg(long)]
    twinkle: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Fold command-line overrides into the loaded configuration
fn apply_args(config: &mut SceneConfig, args: &Args) {
    if let Some(seed) = args.seed {
        config.starfield.seed = Some(seed);
    }
    if args.twinkle {
        config.starfield.twinkle = true;
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_level(&args.log_level))
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Orbis v{}", env!("CARGO_PKG_VERSION"));

    let mut config = SceneConfig::load(&args.config)?;
    apply_args(&mut config, &args);

    info!(
        stars = config.starfield.count,
        seed = ?config.starfield.seed,
        twinkle = config.starfield.twinkle,
        "Configuration loaded"
    );

    orbis_scene::run(config);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level("warn"), Level::WARN);
        assert_eq!(parse_level("verbose"), Level::INFO);
    }

    #[test]
    fn test_args_override_config() {
        let args = Args::parse_from(["orbis", "--seed", "7", "--twinkle"]);
        assert_eq!(args.config, PathBuf::from("orbis.toml"));

        let mut config = SceneConfig::default();
        apply_args(&mut config, &args);
        assert_eq!(config.starfield.seed, Some(7));
        assert!(config.starfield.twinkle);
    }

    #[test]
    fn test_missing_config_file_uses_defaults() {
        let args = Args::parse_from(["orbis", "--config", "/nonexistent/orbis.toml"]);
        let config = SceneConfig::load(&args.config).unwrap();
        assert_eq!(config, SceneConfig::default());
    }
}
