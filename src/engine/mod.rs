//! Per-tick decision engine
//!
//! Data flows one way within a tick:
//!
//! ```text
//! snapshot → history update → fair values (singles, then composites)
//!          → market-making quotes → mispricing takes → basket divergence
//!          → conversions → merged output
//! ```
//!
//! Cross-tick state (price history, realized P&L) lives in [`EngineState`],
//! owned by the caller and threaded through every [`Engine::on_tick`] call.
//! The engine itself is immutable after construction.

mod arbitrage;
mod conversion;
mod driver;
mod history;
mod quoting;
mod valuation;

pub use arbitrage::MispricingDetector;
pub use conversion::ConversionPlanner;
pub use driver::{Engine, EngineState};
pub use history::HistoryTracker;
pub use quoting::{QuoteCalculator, QuoteContext};
pub use valuation::{recency_weighted, vwap, DecayModel, FairValueStrategy};

/// Remaining order capacity for one instrument within one tick
///
/// `max_buy = limit − position`, `max_sell = limit + position`. Every
/// emitted order and conversion draws the ledger down, so the union of one
/// tick's emissions cannot push inventory past the limit even if
/// everything fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacity {
    pub max_buy: i64,
    pub max_sell: i64,
}

impl Capacity {
    pub fn new(position: i64, limit: i64) -> Self {
        Self {
            max_buy: (limit - position).max(0),
            max_sell: (limit + position).max(0),
        }
    }

    pub fn take_buy(&mut self, quantity: i64) {
        self.max_buy = (self.max_buy - quantity).max(0);
    }

    pub fn take_sell(&mut self, quantity: i64) {
        self.max_sell = (self.max_sell - quantity).max(0);
    }
}
