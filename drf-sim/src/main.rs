/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! CLI entry point: load a cluster configuration, run the simulation to
//! completion, and print the final per-application/per-node report.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use drf_sim::config::ClusterConfig;
use drf_sim::engine::Simulation;

#[derive(Parser)]
#[command(name = "drf-sim", about = "Discrete-event DRF cluster scheduler simulator")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log verbosity, e.g. "info", "debug", "drf_sim=trace". Overridden by
    /// the `RUST_LOG` environment variable if set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Command {
    /// Run a simulation described by a cluster configuration file.
    Run {
        /// Path to the cluster configuration YAML file.
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Command::Run { config } => run(&config),
    }
}

fn run(config_path: &std::path::Path) -> Result<()> {
    let config = ClusterConfig::load_from_file(config_path)?;

    let mut sim = Simulation::new(config.nodes, config.applications, config.submissions, config.preemption)?;
    sim.run()?;

    println!("--- simulation complete ---");
    println!("total time: {:.2}", sim.current_time());

    println!("final application state:");
    let mut app_ids = sim.app_ids();
    app_ids.sort_unstable();
    for app_id in app_ids {
        println!(
            "  app {}: s_i = {:.3}, running = {}, pending = {}",
            app_id,
            sim.app_share(app_id).unwrap(),
            sim.app_running_count(app_id).unwrap(),
            sim.app_pending_count(app_id).unwrap(),
        );
    }

    println!("final node state:");
    let mut node_ids = sim.node_ids();
    node_ids.sort_unstable();
    for node_id in node_ids {
        println!(
            "  node {}: usage C_k = {} / R_k = {}",
            node_id,
            sim.node_usage(node_id).unwrap(),
            sim.node_capacity(node_id).unwrap(),
        );
    }

    Ok(())
}
