//! Unified types shared across the engine

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Visible order book for one instrument at one tick
///
/// Both sides map price to the positive quantity resting at that level.
/// A one-sided or empty book is valid; the mid-price is undefined in that
/// case and callers must treat the instrument as unpriceable this tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    /// Buy interest: price -> quantity available to sell into
    #[serde(default)]
    pub bids: BTreeMap<i64, i64>,
    /// Sell interest: price -> quantity available to buy from
    #[serde(default)]
    pub asks: BTreeMap<i64, i64>,
}

impl OrderBookSnapshot {
    /// Get the best bid price (highest buy order)
    pub fn best_bid(&self) -> Option<i64> {
        self.bids.keys().next_back().copied()
    }

    /// Get the best ask price (lowest sell order)
    pub fn best_ask(&self) -> Option<i64> {
        self.asks.keys().next().copied()
    }

    /// Quantity resting at the best bid, zero for an empty side
    pub fn best_bid_quantity(&self) -> i64 {
        self.bids.values().next_back().copied().unwrap_or(0)
    }

    /// Quantity resting at the best ask, zero for an empty side
    pub fn best_ask_quantity(&self) -> i64 {
        self.asks.values().next().copied().unwrap_or(0)
    }

    /// Calculate the midpoint price
    ///
    /// Defined only when both sides are non-empty.
    pub fn mid_price(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid + ask) as f64 / 2.0),
            _ => None,
        }
    }

    /// Calculate the spread
    pub fn spread(&self) -> Option<i64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Total quantity visible across all levels of both sides
    pub fn total_volume(&self) -> i64 {
        self.bids.values().map(|q| q.abs()).sum::<i64>()
            + self.asks.values().map(|q| q.abs()).sum::<i64>()
    }

    /// True when both sides carry at least one level
    pub fn is_two_sided(&self) -> bool {
        !self.bids.is_empty() && !self.asks.is_empty()
    }
}

/// A single order emitted by the engine
///
/// Positive quantity buys, negative quantity sells. Orders are ephemeral:
/// produced fresh each tick, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub instrument: String,
    pub price: i64,
    pub quantity: i64,
}

impl Order {
    /// Buy order for a positive `quantity`
    pub fn buy(instrument: impl Into<String>, price: i64, quantity: i64) -> Self {
        Self {
            instrument: instrument.into(),
            price,
            quantity,
        }
    }

    /// Sell order for a positive `quantity` (stored negated)
    pub fn sell(instrument: impl Into<String>, price: i64, quantity: i64) -> Self {
        Self {
            instrument: instrument.into(),
            price,
            quantity: -quantity,
        }
    }

    pub fn is_buy(&self) -> bool {
        self.quantity > 0
    }
}

impl std::fmt::Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_buy() {
            write!(f, "BUY {} @ {}", self.quantity, self.price)
        } else {
            write!(f, "SELL {} @ {}", -self.quantity, self.price)
        }
    }
}

/// Read-only market state handed to the engine once per tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickState {
    /// Monotonically increasing simulated timestamp
    pub timestamp: i64,
    /// Per-instrument order books for this tick
    #[serde(default)]
    pub order_books: BTreeMap<String, OrderBookSnapshot>,
    /// Signed inventory per instrument, owned by the external simulator
    #[serde(default)]
    pub positions: BTreeMap<String, i64>,
}

impl TickState {
    /// Current position for an instrument; a missing entry means zero
    pub fn position(&self, instrument: &str) -> i64 {
        self.positions.get(instrument).copied().unwrap_or(0)
    }
}

/// Everything the engine decided for one tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickOutput {
    /// Orders per instrument, in emission order; instruments with no
    /// action are absent
    pub orders: BTreeMap<String, Vec<Order>>,
    /// Net conversion request against the external settlement venue
    pub conversions: i64,
    /// Best-effort telemetry (P&L summary); not a persistence channel
    pub diagnostics: String,
}

impl TickOutput {
    /// Total number of orders across all instruments
    pub fn order_count(&self) -> usize {
        self.orders.values().map(Vec::len).sum()
    }
}
