//! Inventory-aware quote and size calculation

use tracing::debug;

use crate::common::types::{Order, OrderBookSnapshot};
use crate::config::types::QuotingConfig;

use super::Capacity;

/// Read-only inputs for one instrument's quote decision
#[derive(Debug, Clone, Copy)]
pub struct QuoteContext {
    pub fair_value: f64,
    /// Annualized volatility of the instrument's mid series
    pub volatility: f64,
    /// Stored mid observations for this instrument
    pub observations: usize,
    /// Total book volume recorded on the last tick
    pub last_volume: i64,
    pub position: i64,
    pub position_limit: i64,
}

/// Converts a fair value plus local volatility and inventory into at most
/// one bid and one ask
#[derive(Debug, Clone)]
pub struct QuoteCalculator {
    config: QuotingConfig,
}

impl QuoteCalculator {
    pub fn new(config: QuotingConfig) -> Self {
        Self { config }
    }

    /// Market-making orders for one instrument this tick
    ///
    /// Emits nothing for a one-sided book, before `min_observations` mids
    /// are stored, or when the fair value carries no information. Emitted
    /// sizes are drawn down from `capacity`.
    pub fn quotes(
        &self,
        instrument: &str,
        book: &OrderBookSnapshot,
        ctx: &QuoteContext,
        capacity: &mut Capacity,
    ) -> Vec<Order> {
        let mut orders = Vec::new();
        let (Some(best_bid), Some(best_ask)) = (book.best_bid(), book.best_ask()) else {
            return orders;
        };
        if ctx.observations <= self.config.min_observations || ctx.fair_value <= 0.0 {
            return orders;
        }

        let mut offset = ctx.volatility * self.config.offset_multiplier;
        if ctx.last_volume > self.config.high_volume_threshold {
            offset *= self.config.tight_offset_factor;
        }

        // competitive, but never more than one tick inside the touch
        let my_bid = ((ctx.fair_value - offset).round() as i64).min(best_bid + 1);
        let my_ask = ((ctx.fair_value + offset).round() as i64).max(best_ask - 1);

        let base = self.base_size(ctx.volatility);
        let mut buy_size = base.min(capacity.max_buy);
        let mut sell_size = base.min(capacity.max_sell);

        // the core risk-control rule: a crowded side quotes half size
        let ratio = ctx.position as f64 / ctx.position_limit as f64;
        if ratio > self.config.throttle_ratio {
            buy_size = (buy_size / 2).max(1);
        } else if ratio < -self.config.throttle_ratio {
            sell_size = (sell_size / 2).max(1);
        }

        if capacity.max_buy > 0 && my_bid > 0 {
            let quantity = buy_size.min(capacity.max_buy);
            capacity.take_buy(quantity);
            orders.push(Order::buy(instrument, my_bid, quantity));
        }
        if capacity.max_sell > 0 && my_ask > 0 {
            let quantity = sell_size.min(capacity.max_sell);
            capacity.take_sell(quantity);
            orders.push(Order::sell(instrument, my_ask, quantity));
        }
        if !orders.is_empty() {
            debug!(
                "quoting {} around {:.2}: bid {} / ask {}",
                instrument, ctx.fair_value, my_bid, my_ask
            );
        }
        orders
    }

    /// Base size shrinks as volatility grows
    fn base_size(&self, volatility: f64) -> i64 {
        let scaled = (self.config.size_cap as f64 / (1.0 + volatility * self.config.size_damping)) as i64;
        scaled.clamp(self.config.min_base_size, self.config.size_cap)
    }
}
