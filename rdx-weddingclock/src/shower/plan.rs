//! When petals are emitted.

use serde::Deserialize;
use std::time::Duration;

/// One emission rate: a spawn every `interval`, for `duration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct EmissionTier {
    #[serde(rename = "interval_ms", with = "millis")]
    pub interval: Duration,
    #[serde(rename = "duration_ms", with = "millis")]
    pub duration: Duration,
}

impl EmissionTier {
    pub fn new(interval: Duration, duration: Duration) -> Self {
        Self { interval, duration }
    }

    /// Whole intervals that fit in the tier; the first spawn comes one
    /// interval after the tier opens.
    pub fn spawns(&self) -> usize {
        if self.interval.is_zero() {
            return 0;
        }
        (self.duration.as_millis() / self.interval.as_millis()) as usize
    }
}

/// Back-to-back emission tiers that make up the whole emission window.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct EmissionPlan {
    tiers: Vec<EmissionTier>,
}

impl EmissionPlan {
    pub fn new(tiers: Vec<EmissionTier>) -> Self {
        Self { tiers }
    }

    pub fn tiers(&self) -> &[EmissionTier] {
        &self.tiers
    }

    /// Total length of the emission window.
    pub fn window(&self) -> Duration {
        self.tiers.iter().map(|tier| tier.duration).sum()
    }

    pub fn total_spawns(&self) -> usize {
        self.tiers.iter().map(EmissionTier::spawns).sum()
    }

    /// Offsets from activation at which a petal is spawned, ascending.
    pub fn spawn_offsets(&self) -> Vec<Duration> {
        let mut offsets = Vec::with_capacity(self.total_spawns());
        let mut tier_start = Duration::ZERO;
        for tier in &self.tiers {
            for k in 1..=tier.spawns() as u32 {
                offsets.push(tier_start + tier.interval * k);
            }
            tier_start += tier.duration;
        }
        offsets
    }
}

impl Default for EmissionPlan {
    /// A fast burst for two seconds, then a slower drift for three more.
    fn default() -> Self {
        Self::new(vec![
            EmissionTier::new(Duration::from_millis(100), Duration::from_secs(2)),
            EmissionTier::new(Duration::from_millis(250), Duration::from_secs(3)),
        ])
    }
}

pub(crate) mod millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_plan_counts() {
        let plan = EmissionPlan::default();
        assert_eq!(plan.window(), Duration::from_secs(5));
        assert_eq!(plan.total_spawns(), 20 + 12);
        assert_eq!(plan.spawn_offsets().len(), plan.total_spawns());
    }

    #[test]
    fn offsets_stay_inside_the_window_and_ascend() {
        let plan = EmissionPlan::default();
        let offsets = plan.spawn_offsets();
        assert_eq!(offsets.first(), Some(&Duration::from_millis(100)));
        assert_eq!(offsets[19], Duration::from_secs(2));
        assert_eq!(offsets[20], Duration::from_millis(2250));
        assert_eq!(offsets.last(), Some(&plan.window()));
        assert!(offsets.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn partial_interval_at_tier_end_is_dropped() {
        let tier = EmissionTier::new(Duration::from_millis(300), Duration::from_secs(1));
        assert_eq!(tier.spawns(), 3);
    }

    #[test]
    fn zero_interval_tier_never_spawns() {
        let tier = EmissionTier::new(Duration::ZERO, Duration::from_secs(1));
        assert_eq!(tier.spawns(), 0);
    }
}
