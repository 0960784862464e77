//! Cross-venue conversion planning
//!
//! A conversion acquires (positive) or disposes (negative) inventory
//! through an external settlement venue rather than the visible book. The
//! venue charges transport, tariffs and storage, so a conversion is only
//! requested when the all-in price beats the local mid.

use std::collections::BTreeMap;

use tracing::debug;

use crate::common::types::TickState;
use crate::config::types::ConversionConfig;

use super::Capacity;

/// Plans the per-tick conversion count for configured instruments
#[derive(Debug, Clone, Default)]
pub struct ConversionPlanner {
    entries: BTreeMap<String, ConversionConfig>,
}

impl ConversionPlanner {
    pub fn new(entries: BTreeMap<String, ConversionConfig>) -> Self {
        Self { entries }
    }

    /// Net conversion request for this tick
    ///
    /// Each instrument's contribution is capped by its `max_per_tick`, by
    /// remaining capacity on the relevant side, and by the resting
    /// quantity at the touched level.
    pub fn plan(&self, tick: &TickState, ledger: &mut BTreeMap<String, Capacity>) -> i64 {
        let mut conversions = 0;
        for (instrument, entry) in &self.entries {
            let Some(book) = tick.order_books.get(instrument) else {
                continue;
            };
            let Some(capacity) = ledger.get_mut(instrument) else {
                continue;
            };
            let (Some(best_bid), Some(best_ask), Some(mid)) =
                (book.best_bid(), book.best_ask(), book.mid_price())
            else {
                continue;
            };

            let effective_buy =
                best_ask as f64 + entry.transport_fee + entry.import_tariff + entry.storage_cost;
            if effective_buy < mid && capacity.max_buy > 0 {
                let quantity = entry
                    .max_per_tick
                    .min(capacity.max_buy)
                    .min(book.best_ask_quantity());
                if quantity > 0 {
                    capacity.take_buy(quantity);
                    conversions += quantity;
                    debug!(
                        "converting in {} x {} at effective {:.1} vs mid {:.1}",
                        quantity, instrument, effective_buy, mid
                    );
                }
            }

            let effective_sell = best_bid as f64 - entry.transport_fee - entry.export_tariff;
            if effective_sell > mid && capacity.max_sell > 0 {
                let quantity = entry
                    .max_per_tick
                    .min(capacity.max_sell)
                    .min(book.best_bid_quantity());
                if quantity > 0 {
                    capacity.take_sell(quantity);
                    conversions -= quantity;
                    debug!(
                        "converting out {} x {} at effective {:.1} vs mid {:.1}",
                        quantity, instrument, effective_sell, mid
                    );
                }
            }
        }
        conversions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::OrderBookSnapshot;
    use pretty_assertions::assert_eq;

    fn planner() -> ConversionPlanner {
        let mut entries = BTreeMap::new();
        entries.insert("TRUFFLE".to_string(), ConversionConfig::default());
        ConversionPlanner::new(entries)
    }

    fn tick_with_book(bids: &[(i64, i64)], asks: &[(i64, i64)]) -> TickState {
        let mut tick = TickState::default();
        tick.order_books.insert(
            "TRUFFLE".to_string(),
            OrderBookSnapshot {
                bids: bids.iter().copied().collect(),
                asks: asks.iter().copied().collect(),
            },
        );
        tick
    }

    fn ledger_with(capacity: Capacity) -> BTreeMap<String, Capacity> {
        [("TRUFFLE".to_string(), capacity)].into_iter().collect()
    }

    #[test]
    fn test_no_conversion_when_fees_exceed_edge() {
        // normal book: the all-in ask is above mid, the net bid below it
        let tick = tick_with_book(&[(99, 30)], &[(101, 30)]);
        let mut ledger = ledger_with(Capacity::new(0, 75));
        assert_eq!(planner().plan(&tick, &mut ledger), 0);
    }

    #[test]
    fn test_converts_in_when_all_in_ask_beats_mid() {
        // crossed quotes leave room even after 2.1 of fees
        let tick = tick_with_book(&[(110, 30)], &[(100, 4)]);
        let mut ledger = ledger_with(Capacity::new(70, 75));
        // buy side: min(10, capacity 5, resting 4) = 4
        // sell side: 110 - 2 = 108 > 105 -> min(10, 145, 30) = 10
        assert_eq!(planner().plan(&tick, &mut ledger), 4 - 10);
        assert_eq!(ledger["TRUFFLE"].max_buy, 1);
        assert_eq!(ledger["TRUFFLE"].max_sell, 135);
    }

    #[test]
    fn test_converts_out_only_when_buy_capacity_is_exhausted() {
        let tick = tick_with_book(&[(110, 30)], &[(100, 20)]);
        let mut ledger = ledger_with(Capacity::new(75, 75));
        assert_eq!(planner().plan(&tick, &mut ledger), -10);
        assert_eq!(ledger["TRUFFLE"].max_sell, 140);
    }

    #[test]
    fn test_one_sided_book_is_skipped() {
        let tick = tick_with_book(&[], &[(100, 20)]);
        let mut ledger = ledger_with(Capacity::new(0, 75));
        assert_eq!(planner().plan(&tick, &mut ledger), 0);
    }
}
