//! tickfair
//!
//! A per-tick decision engine for a simulated multi-instrument market.
//! Given a snapshot of order books and current inventory, the engine
//! estimates a fair value for each tradable instrument, makes two-sided
//! markets around the estimates, takes observable mispricing against
//! them, watches composite instruments for structural divergence from
//! their components, and plans conversions through an external
//! settlement venue.

pub mod common;
pub mod config;
pub mod engine;

// Re-export commonly used types
pub use common::errors::{EngineError, Result};
pub use common::types::{Order, OrderBookSnapshot, TickOutput, TickState};
pub use config::loader::load_config;
pub use config::types::{
    ArbitrageConfig, BandConfig, BasketPolicy, ClockConfig, ConversionConfig, DecayConfig,
    EngineConfig, HistoryConfig, InstrumentConfig, QuotingConfig, ValuationConfig,
};
pub use engine::{
    Capacity, ConversionPlanner, DecayModel, Engine, EngineState, FairValueStrategy,
    HistoryTracker, MispricingDetector, QuoteCalculator, QuoteContext,
};
