// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Stepmesh CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use env_logger::Env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use stepmesh::{import_step_file, stats, ResourceReclaimer, StepMeshConfig, WorkerBridge};

#[derive(Parser)]
#[command(name = "stepmesh")]
#[command(about = "Stepmesh - STEP import with surface area and volume analytics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input STEP file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Config file (defaults to ./stepmesh.toml when present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Native module executable, overrides the config
    #[arg(short, long, value_name = "PATH")]
    module: Option<PathBuf>,

    /// Give up waiting for the worker after this many seconds
    #[arg(short, long, value_name = "SECS")]
    timeout: Option<f64>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a STEP file and print its analytics
    Inspect {
        /// Input STEP file
        input: PathBuf,

        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a config file with the current settings
    InitConfig {
        /// Output TOML file
        #[arg(short, long, default_value = "stepmesh.toml")]
        output: PathBuf,
    },

    /// Print the SHA-256 of a module executable, for `module_sha256`
    Checksum {
        /// Module executable
        module: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG still wins over the default filter
    env_logger::Builder::from_env(Env::default().default_filter_or(log_filter(cli.verbose)))
        .init();

    let config = resolve_config(&cli)?;

    match &cli.command {
        Some(Commands::Inspect { input, json }) => {
            inspect_command(input, config, *json, cli.verbose)?;
        }
        Some(Commands::InitConfig { output }) => {
            config.save(output)?;
            println!("{} Wrote {}", "✓".green(), output.display());
        }
        Some(Commands::Checksum { module }) => {
            println!("{}", stepmesh::decoder::file_sha256(module)?);
        }
        Some(Commands::Version) => {
            println!("Stepmesh v{}", env!("CARGO_PKG_VERSION"));
        }
        None => {
            if let Some(input) = &cli.input {
                inspect_command(input, config, false, cli.verbose)?;
            } else {
                eprintln!("{} Input file required", "Error:".red());
                eprintln!("Usage: stepmesh <FILE> [--module <PATH>]");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Default log filter; library warnings are always shown
fn log_filter(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}

fn resolve_config(cli: &Cli) -> Result<StepMeshConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = StepMeshConfig::from_file(path)?;
            config.apply_env();
            config
        }
        None => StepMeshConfig::load()?,
    };

    if let Some(module) = &cli.module {
        config.decoder.module_path = Some(module.clone());
    }

    if let Some(secs) = cli.timeout {
        if !(secs.is_finite() && secs > 0.0) {
            anyhow::bail!("--timeout must be a positive number of seconds");
        }
        config.bridge.reply_timeout = Some(Duration::from_secs_f64(secs));
    }

    Ok(config)
}

fn inspect_command(input: &Path, config: StepMeshConfig, json: bool, verbose: bool) -> Result<()> {
    if !input.exists() {
        eprintln!("{} Input file not found: {}", "Error:".red(), input.display());
        std::process::exit(1);
    }

    if verbose {
        println!("{} Importing {}", "ℹ".bright_blue(), input.display());
    }

    let bridge = WorkerBridge::with_process_module(config);
    let start = std::time::Instant::now();
    let mut scene = import_step_file(&bridge, input)?;
    let import_time = start.elapsed();

    let scene_stats = stats(&scene);
    if json {
        println!("{}", serde_json::to_string_pretty(&scene_stats)?);
    } else {
        scene_stats.print();
    }

    let report = ResourceReclaimer::new().dispose(&mut scene);
    if verbose {
        println!("Imported in {:.2?}", import_time);
        println!(
            "Released {} buffers, {} materials, {} textures",
            report.buffers, report.materials, report.textures
        );
    }

    let leaked = bridge.tracker().live_count();
    if leaked > 0 {
        eprintln!("{} {} GPU resources still live", "Warning:".yellow(), leaked);
    }

    Ok(())
}
