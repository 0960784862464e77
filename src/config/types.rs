//! Configuration types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level engine configuration
///
/// Loaded once at engine construction; immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Tradable instruments and their valuation strategies
    #[serde(default)]
    pub instruments: Vec<InstrumentConfig>,
    /// Market-making quote parameters
    #[serde(default)]
    pub quoting: QuotingConfig,
    /// Mispricing detector parameters
    #[serde(default)]
    pub arbitrage: ArbitrageConfig,
    /// History windows and derived statistics
    #[serde(default)]
    pub history: HistoryConfig,
    /// Simulated clock and expiry horizon
    #[serde(default)]
    pub clock: ClockConfig,
    /// Instruments settled through the external conversion venue
    #[serde(default)]
    pub conversions: BTreeMap<String, ConversionConfig>,
    /// Limit applied to instruments that appear in a tick without config
    #[serde(default = "default_position_limit")]
    pub default_position_limit: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            instruments: Vec::new(),
            quoting: QuotingConfig::default(),
            arbitrage: ArbitrageConfig::default(),
            history: HistoryConfig::default(),
            clock: ClockConfig::default(),
            conversions: BTreeMap::new(),
            default_position_limit: default_position_limit(),
        }
    }
}

/// One tradable instrument
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentConfig {
    pub name: String,
    /// Maximum absolute inventory the engine may hold
    #[serde(default = "default_position_limit")]
    pub position_limit: i64,
    /// How this instrument's fair value is estimated
    #[serde(default)]
    pub valuation: ValuationConfig,
}

/// Valuation strategy selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ValuationConfig {
    /// Contractually known constant value
    Fixed { value: f64 },
    /// Volume-weighted average over the visible book
    Vwap,
    /// Exponentially recency-weighted average of historical mid-prices
    RecencyWeighted {
        #[serde(default = "default_min_observations")]
        min_observations: usize,
        #[serde(default = "default_curve_steepness")]
        curve_steepness: f64,
    },
    /// Linear combination of component fair values
    Basket { components: BTreeMap<String, i64> },
    /// Intrinsic value against an underlying, scaled by time decay
    OptionDecay {
        underlying: String,
        strike: i64,
        #[serde(default)]
        decay: DecayConfig,
    },
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self::Vwap
    }
}

/// Time-decay model for option-like instruments
///
/// The two models produce materially different values near expiry; the
/// choice is a per-deployment configuration decision, not a runtime
/// heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum DecayConfig {
    /// Remaining-time ratio, clamped to a floor
    Linear {
        #[serde(default = "default_decay_floor")]
        floor: f64,
    },
    /// Exponential decay in the elapsed-time fraction
    Exponential {
        #[serde(default = "default_decay_rate")]
        rate: f64,
    },
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self::Linear {
            floor: default_decay_floor(),
        }
    }
}

/// Market-making quote parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotingConfig {
    /// Quote offset as a multiple of annualized volatility
    #[serde(default = "default_offset_multiplier")]
    pub offset_multiplier: f64,
    /// Offset shrink factor applied when the book is busy
    #[serde(default = "default_tight_offset_factor")]
    pub tight_offset_factor: f64,
    /// Last-tick volume above which the tighter offset applies
    #[serde(default = "default_high_volume_threshold")]
    pub high_volume_threshold: i64,
    /// Stored mid observations required before quoting starts
    #[serde(default = "default_min_observations")]
    pub min_observations: usize,
    /// Hard cap on the base order size
    #[serde(default = "default_size_cap")]
    pub size_cap: i64,
    /// Lower bound on the base order size
    #[serde(default = "default_min_base_size")]
    pub min_base_size: i64,
    /// Volatility damping in the inverse size curve
    #[serde(default = "default_size_damping")]
    pub size_damping: f64,
    /// |position| / limit ratio beyond which the crowded side is halved
    #[serde(default = "default_throttle_ratio")]
    pub throttle_ratio: f64,
}

impl Default for QuotingConfig {
    fn default() -> Self {
        Self {
            offset_multiplier: default_offset_multiplier(),
            tight_offset_factor: default_tight_offset_factor(),
            high_volume_threshold: default_high_volume_threshold(),
            min_observations: default_min_observations(),
            size_cap: default_size_cap(),
            min_base_size: default_min_base_size(),
            size_damping: default_size_damping(),
            throttle_ratio: default_throttle_ratio(),
        }
    }
}

/// Mispricing detector parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbitrageConfig {
    /// Single-instrument mispricing band
    #[serde(default)]
    pub band: BandConfig,
    /// Fractional divergence between a basket quote and its replication
    /// value before the structural opportunity fires
    #[serde(default = "default_basket_divergence")]
    pub basket_divergence: f64,
    /// What to do when a basket divergence crosses the threshold
    #[serde(default)]
    pub basket_policy: BasketPolicy,
}

impl Default for ArbitrageConfig {
    fn default() -> Self {
        Self {
            band: BandConfig::default(),
            basket_divergence: default_basket_divergence(),
            basket_policy: BasketPolicy::default(),
        }
    }
}

/// How far a quote must stray from fair value before the engine crosses
/// the spread
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BandConfig {
    /// Fixed fractional band around fair value
    Fraction {
        #[serde(default = "default_epsilon")]
        epsilon: f64,
    },
    /// Band expressed in rolling standard deviations of the mid series
    ZScore {
        #[serde(default = "default_z_window")]
        window: usize,
        #[serde(default = "default_min_z")]
        min_z: f64,
        #[serde(default = "default_fallback_std")]
        fallback_std: f64,
    },
}

impl Default for BandConfig {
    fn default() -> Self {
        Self::Fraction {
            epsilon: default_epsilon(),
        }
    }
}

/// Policy for basket-versus-components divergence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasketPolicy {
    /// Log the opportunity, trade nothing
    #[default]
    DetectOnly,
    /// Emit simultaneous basket and component legs
    ExecuteMultiLeg,
}

/// History windows and derived statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum entries retained per series (FIFO eviction)
    #[serde(default = "default_history_len")]
    pub max_len: usize,
    /// Volatility reported before two mid observations exist
    #[serde(default = "default_volatility")]
    pub default_volatility: f64,
    /// Periods per year for volatility annualization
    #[serde(default = "default_trading_periods")]
    pub trading_periods: f64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_len: default_history_len(),
            default_volatility: default_volatility(),
            trading_periods: default_trading_periods(),
        }
    }
}

/// Simulated clock and expiry horizon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Total horizon in periods ("days") until option-like instruments expire
    #[serde(default = "default_horizon_periods")]
    pub horizon_periods: f64,
    /// Simulated timestamps per period
    #[serde(default = "default_ticks_per_period")]
    pub ticks_per_period: f64,
}

impl ClockConfig {
    /// Periods remaining until expiry, floored at zero
    pub fn time_left(&self, timestamp: i64) -> f64 {
        (self.horizon_periods - timestamp as f64 / self.ticks_per_period).max(0.0)
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            horizon_periods: default_horizon_periods(),
            ticks_per_period: default_ticks_per_period(),
        }
    }
}

/// Cost model for one convertible instrument
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Cap on conversions requested per tick
    #[serde(default = "default_max_per_tick")]
    pub max_per_tick: i64,
    #[serde(default = "default_transport_fee")]
    pub transport_fee: f64,
    #[serde(default = "default_import_tariff")]
    pub import_tariff: f64,
    #[serde(default = "default_export_tariff")]
    pub export_tariff: f64,
    /// Carry cost per long unit per tick
    #[serde(default = "default_storage_cost")]
    pub storage_cost: f64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            max_per_tick: default_max_per_tick(),
            transport_fee: default_transport_fee(),
            import_tariff: default_import_tariff(),
            export_tariff: default_export_tariff(),
            storage_cost: default_storage_cost(),
        }
    }
}

fn default_position_limit() -> i64 {
    20
}

fn default_min_observations() -> usize {
    5
}

fn default_curve_steepness() -> f64 {
    2.0
}

fn default_decay_floor() -> f64 {
    0.2
}

fn default_decay_rate() -> f64 {
    1.5
}

fn default_offset_multiplier() -> f64 {
    0.7
}

fn default_tight_offset_factor() -> f64 {
    0.8
}

fn default_high_volume_threshold() -> i64 {
    100
}

fn default_size_cap() -> i64 {
    10
}

fn default_min_base_size() -> i64 {
    2
}

fn default_size_damping() -> f64 {
    10.0
}

fn default_throttle_ratio() -> f64 {
    0.6
}

fn default_basket_divergence() -> f64 {
    0.005
}

fn default_epsilon() -> f64 {
    0.003
}

fn default_z_window() -> usize {
    20
}

fn default_min_z() -> f64 {
    1.0
}

fn default_fallback_std() -> f64 {
    2.0
}

fn default_history_len() -> usize {
    300
}

fn default_volatility() -> f64 {
    0.1
}

fn default_trading_periods() -> f64 {
    252.0
}

fn default_horizon_periods() -> f64 {
    7.0
}

fn default_ticks_per_period() -> f64 {
    100_000.0
}

fn default_max_per_tick() -> i64 {
    10
}

fn default_transport_fee() -> f64 {
    1.0
}

fn default_import_tariff() -> f64 {
    1.0
}

fn default_export_tariff() -> f64 {
    1.0
}

fn default_storage_cost() -> f64 {
    0.1
}
