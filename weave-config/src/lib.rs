//! Node configuration: the constants of spec §6 plus file/environment
//! loading, in the teacher's `config`-crate idiom.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Difficulty is retargeted every `retarget_blocks` blocks.
pub const DEFAULT_RETARGET_BLOCKS: u64 = 10;
/// Upper bound on how far behind a fork-recovery target may sit before it is
/// rejected as too-far-ahead (§4.9: `STORE_BLOCKS_BEHIND_CURRENT`). Must stay
/// `>= 50`.
pub const DEFAULT_STORE_BLOCKS_BEHIND_CURRENT: u64 = 50;
/// Total genesis token supply the static mining reward schedule decays from.
pub const DEFAULT_GENESIS_TOKENS: u128 = 55_000_000_000_000;
/// Base unit cost used by the minimum transaction price formula.
pub const DEFAULT_COST_PER_BYTE: f64 = 0.01;
/// Centre-point difficulty the cost formula's denominator pivots on.
pub const DEFAULT_DIFF_CENTER: u32 = 24;
/// A single retarget cannot multiply or divide difficulty (as a 2^bits
/// hardness scalar) by more than this factor.
pub const DEFAULT_RETARGET_MAX_CHANGE: f64 = 4.0;
/// Target wall-clock spacing between blocks, used by the retarget rule.
pub const DEFAULT_TARGET_BLOCK_TIME_SECS: u64 = 120;
/// How many of the most recent blocks a node keeps fully materialised
/// locally (older blocks remain addressable through the store but are not
/// pinned in memory).
pub const DEFAULT_KEEP_LAST_BLOCKS: u64 = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusParams {
    pub retarget_blocks: u64,
    pub retarget_max_change: f64,
    pub target_block_time_secs: u64,
    pub store_blocks_behind_current: u64,
    pub genesis_tokens: u128,
    pub cost_per_byte: f64,
    pub diff_center: u32,
    pub keep_last_blocks: u64,
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self {
            retarget_blocks: DEFAULT_RETARGET_BLOCKS,
            retarget_max_change: DEFAULT_RETARGET_MAX_CHANGE,
            target_block_time_secs: DEFAULT_TARGET_BLOCK_TIME_SECS,
            store_blocks_behind_current: DEFAULT_STORE_BLOCKS_BEHIND_CURRENT,
            genesis_tokens: DEFAULT_GENESIS_TOKENS,
            cost_per_byte: DEFAULT_COST_PER_BYTE,
            diff_center: DEFAULT_DIFF_CENTER,
            keep_last_blocks: DEFAULT_KEEP_LAST_BLOCKS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutParams {
    pub net_timeout_ms: u64,
    pub rejoin_timeout_ms: u64,
    pub poll_time_ms: u64,
}

impl TimeoutParams {
    pub fn net_timeout(&self) -> Duration {
        Duration::from_millis(self.net_timeout_ms)
    }

    pub fn rejoin_timeout(&self) -> Duration {
        Duration::from_millis(self.rejoin_timeout_ms)
    }

    pub fn poll_time(&self) -> Duration {
        Duration::from_millis(self.poll_time_ms)
    }
}

impl Default for TimeoutParams {
    fn default() -> Self {
        Self {
            net_timeout_ms: 5_000,
            rejoin_timeout_ms: 2_000,
            poll_time_ms: 1_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiningParams {
    pub automine: bool,
    pub mining_delay_ms: u64,
    /// Upper bound on how many mempool transactions a candidate block
    /// includes. Not a consensus rule (a block isn't rejected for
    /// including fewer or differently chosen txs) — purely a local miner
    /// knob, default chosen generously since blocks have no other size cap
    /// in this system.
    pub max_txs_per_block: usize,
}

impl MiningParams {
    pub fn mining_delay(&self) -> Duration {
        Duration::from_millis(self.mining_delay_ms)
    }

    pub fn max_txs_per_block(&self) -> usize {
        self.max_txs_per_block
    }
}

impl Default for MiningParams {
    fn default() -> Self {
        Self {
            automine: false,
            mining_delay_ms: 0,
            max_txs_per_block: 1_000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub consensus: ConsensusParams,
    #[serde(default)]
    pub timeouts: TimeoutParams,
    #[serde(default)]
    pub mining: MiningParams,
}

impl NodeConfig {
    /// Loads configuration from a TOML file, overlaid with `WEAVE__*`
    /// environment variables, matching the teacher's `config`-crate layering
    /// (`dxid-config::DxidConfig::load`).
    pub fn load(path: &Path) -> Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::with_prefix("WEAVE").separator("__"));
        let cfg = builder.build()?;
        Ok(cfg.try_deserialize()?)
    }

    pub fn example() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_respect_minimum_fork_depth() {
        let cfg = NodeConfig::default();
        assert!(cfg.consensus.store_blocks_behind_current >= 50);
    }

    #[test]
    fn load_missing_file_falls_back_to_defaults() {
        let cfg = NodeConfig::load(Path::new("/nonexistent/weave.toml")).unwrap();
        assert_eq!(cfg.consensus.retarget_blocks, DEFAULT_RETARGET_BLOCKS);
    }
}
