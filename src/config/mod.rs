/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Cluster configuration loading.
//!
//! A [`ClusterConfig`] describes the static topology the selector needs:
//! which CPUs form the performance and efficiency clusters, which CPUs
//! are online, and the foreground priority band.  It implements
//! [`ClusterClassifier`] directly, so a loaded config can be handed to
//! [`CpuSelector`](crate::selector::CpuSelector) as-is.
//!
//! The expected YAML structure is:
//! ```yaml
//! clusters:
//!   performance: [4, 5, 6, 7]
//!   efficiency: [0, 1, 2, 3]
//! online: [0, 1, 2, 3, 4, 5, 6, 7]   # optional, defaults to the union
//! foreground_band:                    # optional, defaults to [0, 225)
//!   lower: 0
//!   upper: 225
//! ```

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::cpuset::CpuSet;
use crate::selector::{ClusterClassifier, ForegroundBand};

// ── Private YAML deserialization types ────────────────────────────────────────

/// Top-level wrapper that maps directly onto the YAML file layout.
///
/// Kept private — callers work with [`ClusterConfig`] instead.
#[derive(Debug, Deserialize)]
struct ClusterConfigFile {
    clusters: ClustersEntry,
    #[serde(default)]
    online: Option<Vec<u32>>,
    #[serde(default)]
    foreground_band: Option<BandEntry>,
}

#[derive(Debug, Deserialize)]
struct ClustersEntry {
    #[serde(default)]
    performance: Vec<u32>,
    #[serde(default)]
    efficiency: Vec<u32>,
}

#[derive(Debug, Deserialize)]
struct BandEntry {
    lower: i32,
    upper: i32,
}

// ── ClusterConfig ─────────────────────────────────────────────────────────────

/// Static cluster topology and placement policy thresholds.
#[derive(Debug, Clone, Copy)]
pub struct ClusterConfig {
    performance: CpuSet,
    efficiency: CpuSet,
    online: CpuSet,
    band: ForegroundBand,
}

impl ClusterConfig {
    /// Parse and validate a cluster configuration file.
    ///
    /// * `online` defaults to the union of the two cluster sets when
    ///   absent.
    /// * `foreground_band` defaults to the stock `[0, 225)` thresholds.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, the YAML is
    /// structurally invalid, the band is empty, or the resulting online
    /// set is empty (the selector's one precondition).
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading cluster configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;

        let file: ClusterConfigFile = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML file: {}", path.display()))?;

        let performance: CpuSet = file.clusters.performance.iter().copied().collect();
        let efficiency: CpuSet = file.clusters.efficiency.iter().copied().collect();

        let online = match file.online {
            Some(cpus) => cpus.iter().copied().collect(),
            None => performance.or(efficiency),
        };
        if online.is_empty() {
            bail!(
                "online CPU set is empty in {}: the selector requires at least one online CPU",
                path.display()
            );
        }

        let band = match file.foreground_band {
            Some(entry) => ForegroundBand::new(entry.lower, entry.upper)
                .with_context(|| format!("Invalid foreground_band in {}", path.display()))?,
            None => ForegroundBand::default(),
        };

        debug!(
            performance = ?performance.iter().collect::<Vec<_>>(),
            efficiency = ?efficiency.iter().collect::<Vec<_>>(),
            online = ?online.iter().collect::<Vec<_>>(),
            band_lower = band.lower(),
            band_upper = band.upper(),
            "cluster configuration loaded"
        );

        Ok(ClusterConfig {
            performance,
            efficiency,
            online,
            band,
        })
    }

    /// The configured foreground band.
    pub fn band(&self) -> ForegroundBand {
        self.band
    }
}

impl ClusterClassifier for ClusterConfig {
    fn performance_set(&self) -> CpuSet {
        self.performance
    }

    fn efficiency_set(&self) -> CpuSet {
        self.efficiency
    }

    fn online(&self) -> CpuSet {
        self.online
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
