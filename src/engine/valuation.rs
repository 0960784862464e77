//! Fair-value strategies
//!
//! One strategy instance per instrument, selected from configuration. Each
//! strategy is pure given the current book and stored history. Composite
//! (basket) values derive from component fair values after all singles
//! resolve, and are recomputed from scratch every tick, never cached
//! across ticks.

use std::collections::BTreeMap;

use crate::common::types::OrderBookSnapshot;
use crate::config::types::{DecayConfig, ValuationConfig};

/// Time-decay factor for option-like instruments
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecayModel {
    /// `max(floor, time_left / horizon)`
    Linear { floor: f64 },
    /// `exp(-rate * (1 - time_left / horizon))`
    Exponential { rate: f64 },
}

impl DecayModel {
    pub fn from_config(config: &DecayConfig) -> Self {
        match *config {
            DecayConfig::Linear { floor } => Self::Linear { floor },
            DecayConfig::Exponential { rate } => Self::Exponential { rate },
        }
    }

    /// Decay factor for the remaining time, non-increasing as expiry nears
    pub fn factor(&self, time_left: f64, horizon: f64) -> f64 {
        let ratio = if horizon > 0.0 {
            (time_left / horizon).clamp(0.0, 1.0)
        } else {
            0.0
        };
        match *self {
            Self::Linear { floor } => ratio.max(floor),
            Self::Exponential { rate } => (-rate * (1.0 - ratio)).exp(),
        }
    }
}

/// Per-instrument valuation strategy
#[derive(Debug, Clone, PartialEq)]
pub enum FairValueStrategy {
    /// Contractually known constant
    Fixed { value: f64 },
    /// Volume-weighted average over the visible book
    Vwap,
    /// Exponentially recency-weighted average of stored mids
    RecencyWeighted {
        min_observations: usize,
        curve_steepness: f64,
    },
    /// Linear combination of component fair values
    Basket { components: BTreeMap<String, i64> },
    /// Intrinsic value against the underlying, scaled by time decay
    OptionDecay {
        underlying: String,
        strike: i64,
        decay: DecayModel,
    },
}

impl FairValueStrategy {
    pub fn from_config(config: &ValuationConfig) -> Self {
        match config {
            ValuationConfig::Fixed { value } => Self::Fixed { value: *value },
            ValuationConfig::Vwap => Self::Vwap,
            ValuationConfig::RecencyWeighted {
                min_observations,
                curve_steepness,
            } => Self::RecencyWeighted {
                min_observations: *min_observations,
                curve_steepness: *curve_steepness,
            },
            ValuationConfig::Basket { components } => Self::Basket {
                components: components.clone(),
            },
            ValuationConfig::OptionDecay {
                underlying,
                strike,
                decay,
            } => Self::OptionDecay {
                underlying: underlying.clone(),
                strike: *strike,
                decay: DecayModel::from_config(decay),
            },
        }
    }

    /// Baskets resolve only after every single-instrument value is known
    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Basket { .. })
    }
}

/// Volume-weighted average price across all levels of both sides
///
/// Returns 0.0 when the book carries no volume: "no price information",
/// which downstream order generation treats as skip.
pub fn vwap(book: &OrderBookSnapshot) -> f64 {
    let mut total_value = 0.0;
    let mut total_volume = 0.0;
    for (price, quantity) in book.bids.iter().chain(book.asks.iter()) {
        total_value += *price as f64 * quantity.abs() as f64;
        total_volume += quantity.abs() as f64;
    }
    if total_volume > 0.0 {
        total_value / total_volume
    } else {
        0.0
    }
}

/// Recency-weighted average of the stored mids
///
/// Below `min_observations` the weights are uniform; past it they follow
/// an exponential curve over the index range, normalized to sum to one.
/// The switch is a step, not an interpolation: the transition is an
/// intentional, documented discontinuity.
pub fn recency_weighted(mids: &[f64], min_observations: usize, curve_steepness: f64) -> Option<f64> {
    if mids.is_empty() {
        return None;
    }
    let n = mids.len();
    let weights: Vec<f64> = if n < min_observations.max(2) {
        vec![1.0; n]
    } else {
        (0..n)
            .map(|i| (curve_steepness * i as f64 / (n - 1) as f64).exp())
            .collect()
    };
    let total: f64 = weights.iter().sum();
    Some(
        mids.iter()
            .zip(&weights)
            .map(|(mid, weight)| mid * weight)
            .sum::<f64>()
            / total,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_vwap_is_a_true_weighted_average() {
        // bids {10:5, 9:3}, asks {11:4} -> (10*5 + 9*3 + 11*4) / 12
        let book = OrderBookSnapshot {
            bids: [(10, 5), (9, 3)].into_iter().collect(),
            asks: [(11, 4)].into_iter().collect(),
        };
        assert_eq!(vwap(&book), 121.0 / 12.0);
    }

    #[test]
    fn test_vwap_guards_empty_book() {
        assert_eq!(vwap(&OrderBookSnapshot::default()), 0.0);
    }

    #[test]
    fn test_recency_weights_are_uniform_below_threshold() {
        let mids = [100.0, 104.0];
        assert_eq!(recency_weighted(&mids, 5, 2.0), Some(102.0));
        assert_eq!(recency_weighted(&[], 5, 2.0), None);
    }

    #[test]
    fn test_recency_weights_favor_recent_past_threshold() {
        let mids = [100.0, 100.0, 100.0, 100.0, 110.0];
        let uniform = mids.iter().sum::<f64>() / mids.len() as f64;
        let weighted = recency_weighted(&mids, 5, 2.0).unwrap();
        assert!(weighted > uniform);
        assert!(weighted < 110.0);
    }

    #[test]
    fn test_recency_switch_is_a_step() {
        // crossing the threshold swaps the weighting function wholesale
        let four = [100.0, 100.0, 100.0, 108.0];
        let five = [100.0, 100.0, 100.0, 100.0, 108.0];
        assert_eq!(recency_weighted(&four, 5, 2.0), Some(102.0));
        let weighted = recency_weighted(&five, 5, 2.0).unwrap();
        assert!(weighted > 101.6);
    }

    #[test]
    fn test_linear_decay_floors_at_expiry() {
        let floored = DecayModel::Linear { floor: 0.2 };
        assert_eq!(floored.factor(7.0, 7.0), 1.0);
        assert_eq!(floored.factor(3.5, 7.0), 0.5);
        assert_eq!(floored.factor(0.0, 7.0), 0.2);

        let bare = DecayModel::Linear { floor: 0.0 };
        assert_eq!(bare.factor(0.0, 7.0), 0.0);
    }

    #[test]
    fn test_exponential_decay_at_expiry() {
        let decay = DecayModel::Exponential { rate: 1.5 };
        assert_eq!(decay.factor(7.0, 7.0), 1.0);
        assert!((decay.factor(0.0, 7.0) - (-1.5f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_decay_is_monotonic_in_time_left() {
        for model in [
            DecayModel::Linear { floor: 0.2 },
            DecayModel::Exponential { rate: 1.5 },
        ] {
            let mut last = -1.0;
            for step in 0..=7 {
                let factor = model.factor(step as f64, 7.0);
                assert!(factor >= last);
                last = factor;
            }
        }
    }
}
