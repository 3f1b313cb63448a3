//! Minimum transaction price and the static mining-reward schedule.

use weave_config::ConsensusParams;

/// `min_cost(s, d) = trunc(2*(s+3210)*COST_PER_BYTE / max(effective_diff -
/// (DIFF_CENTER-2), 2) * 1.2^((s+3210)/1048576))`.
///
/// `effective_diff` resolves an ambiguity in the source formula (see
/// DESIGN.md): the high-difficulty branch uses `diff` itself once `diff >=
/// DIFF_CENTER`, and otherwise falls back to `DIFF_CENTER`.
pub fn min_cost(data_size: usize, diff: u32, params: &ConsensusParams) -> u128 {
    let effective_diff = if diff >= params.diff_center {
        diff
    } else {
        params.diff_center
    };
    let denom = (effective_diff as f64 - (params.diff_center as f64 - 2.0)).max(2.0);
    let s = data_size as f64 + 3210.0;
    let cost = 2.0 * s * params.cost_per_byte / denom * 1.2f64.powf(s / 1_048_576.0);
    cost.trunc().max(0.0) as u128
}

/// `static_reward(h) = 0.2 * GENESIS_TOKENS * 2^(-h/105120) * ln(2) / 105120`.
pub fn static_reward(height: u64, params: &ConsensusParams) -> u128 {
    let h = height as f64;
    let decay = 2f64.powf(-h / 105_120.0);
    let reward = 0.2 * params.genesis_tokens as f64 * decay * std::f64::consts::LN_2 / 105_120.0;
    reward.trunc().max(0.0) as u128
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_cost_rises_with_data_size() {
        let params = ConsensusParams::default();
        let small = min_cost(0, params.diff_center, &params);
        let large = min_cost(1_000_000, params.diff_center, &params);
        assert!(large > small);
    }

    #[test]
    fn min_cost_falls_as_difficulty_rises_above_center() {
        let params = ConsensusParams::default();
        let at_center = min_cost(1000, params.diff_center, &params);
        let above_center = min_cost(1000, params.diff_center + 10, &params);
        assert!(above_center < at_center);
    }

    #[test]
    fn static_reward_decays_with_height() {
        let params = ConsensusParams::default();
        let early = static_reward(0, &params);
        let later = static_reward(105_120 * 10, &params);
        assert!(later < early);
    }
}
