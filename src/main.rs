/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{error, info};

use wakeplace::config::ClusterConfig;
use wakeplace::selector::{ClusterClassifier, CpuSelector};
use wakeplace::snapshot::WakeTrace;
use wakeplace::wakee::WakeeTracker;

// ── CLI argument definition ───────────────────────────────────────────────────

/// wakeplace trace replay.
///
/// Replays a recorded wake trace against a cluster configuration and
/// prints the CPU the placement policy selects for each event.
///
/// Example:
///   wakeplace -c demos/clusters.yaml -t demos/trace.yaml
#[derive(Debug, Parser)]
#[command(
    name = "wakeplace",
    about = "Wake-time CPU placement – trace replay",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML cluster configuration file.
    #[arg(short = 'c', long = "clusters")]
    clusters: PathBuf,

    /// Path to the YAML wake trace to replay.
    #[arg(short = 't', long = "trace")]
    trace: PathBuf,

    /// Fan-out factor for the wide-wake classifier.
    #[arg(short = 'w', long = "wide-factor", default_value_t = 4)]
    wide_factor: u32,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialise structured logging.
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    info!(
        clusters = ?cli.clusters,
        trace = ?cli.trace,
        wide_factor = cli.wide_factor,
        "Configuration"
    );

    // ── Load inputs ───────────────────────────────────────────────────────────
    let clusters = match ClusterConfig::load_from_file(&cli.clusters) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load cluster configuration: {:#}", e);
            process::exit(1);
        }
    };

    let trace = match WakeTrace::load_from_file(&cli.trace) {
        Ok(t) => t,
        Err(e) => {
            error!("Failed to load wake trace: {:#}", e);
            process::exit(1);
        }
    };

    info!(
        performance = ?clusters.performance_set().iter().collect::<Vec<_>>(),
        efficiency = ?clusters.efficiency_set().iter().collect::<Vec<_>>(),
        online = ?clusters.online().iter().collect::<Vec<_>>(),
        tasks = trace.tasks.len(),
        events = trace.events.len(),
        "Replay inputs loaded"
    );

    // ── Replay ────────────────────────────────────────────────────────────────
    let wakee = WakeeTracker::with_factor(cli.wide_factor);
    let selector = CpuSelector::new(
        &clusters,
        &trace.snapshot,
        &wakee,
        &trace.snapshot,
        &trace.snapshot,
    )
    .with_band(clusters.band());

    for (i, event) in trace.events.iter().enumerate() {
        // Validated at load time; every event names a declared task.
        let Some(trace_task) = trace.find_task(event.task) else {
            continue;
        };
        let task = trace_task.to_task();

        let cpu = selector.select_run_queue(
            &task,
            trace_task.prev_cpu,
            event.this_cpu,
            event.kind.flags(),
            event.sibling_count_hint,
        );

        info!(
            event = i,
            task = task.id,
            kind = ?event.kind,
            prev_cpu = trace_task.prev_cpu,
            this_cpu = event.this_cpu,
            selected = cpu,
            "placement"
        );
    }

    info!(events = trace.events.len(), "Replay complete");
}
