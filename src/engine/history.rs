//! Rolling per-instrument market history and derived statistics

use std::collections::BTreeMap;

use crate::common::types::OrderBookSnapshot;
use crate::config::types::HistoryConfig;

/// Bounded series for one instrument
#[derive(Debug, Clone, Default)]
struct HistorySeries {
    mids: Vec<f64>,
    spreads: Vec<i64>,
    volumes: Vec<i64>,
    volatility: Option<f64>,
}

/// Tracks mid-price, spread and traded-volume history per instrument
///
/// Mid and spread are appended only on two-sided ticks, so the volatility
/// estimate is never polluted by undefined mid-prices. Volume is appended
/// every tick. All series are capped with FIFO eviction.
#[derive(Debug, Clone)]
pub struct HistoryTracker {
    max_len: usize,
    default_volatility: f64,
    annualization: f64,
    series: BTreeMap<String, HistorySeries>,
}

impl HistoryTracker {
    pub fn new(config: &HistoryConfig) -> Self {
        Self {
            max_len: config.max_len,
            default_volatility: config.default_volatility,
            annualization: config.trading_periods.sqrt(),
            series: BTreeMap::new(),
        }
    }

    /// Record one tick of book state for an instrument
    pub fn update(&mut self, instrument: &str, book: &OrderBookSnapshot) {
        let max_len = self.max_len;
        let annualization = self.annualization;
        let series = self.series.entry(instrument.to_string()).or_default();

        if let (Some(spread), Some(mid)) = (book.spread(), book.mid_price()) {
            push_capped(&mut series.mids, mid, max_len);
            push_capped(&mut series.spreads, spread, max_len);
            if series.mids.len() > 1 {
                series.volatility = Some(annualized_volatility(&series.mids, annualization));
            }
        }
        push_capped(&mut series.volumes, book.total_volume(), max_len);
    }

    /// Stored mid-price observations, oldest first
    pub fn mids(&self, instrument: &str) -> &[f64] {
        self.series
            .get(instrument)
            .map(|s| s.mids.as_slice())
            .unwrap_or(&[])
    }

    /// Stored spread observations, oldest first
    pub fn spreads(&self, instrument: &str) -> &[i64] {
        self.series
            .get(instrument)
            .map(|s| s.spreads.as_slice())
            .unwrap_or(&[])
    }

    /// Number of stored mid observations
    pub fn observation_count(&self, instrument: &str) -> usize {
        self.mids(instrument).len()
    }

    /// Most recently recorded total book volume, zero before any tick
    pub fn last_volume(&self, instrument: &str) -> i64 {
        self.series
            .get(instrument)
            .and_then(|s| s.volumes.last().copied())
            .unwrap_or(0)
    }

    /// Annualized log-return volatility of the mid series
    ///
    /// Falls back to the configured default until two observations exist.
    pub fn volatility(&self, instrument: &str) -> f64 {
        self.series
            .get(instrument)
            .and_then(|s| s.volatility)
            .unwrap_or(self.default_volatility)
    }

    /// Standard deviation of the last `window` mids
    ///
    /// Falls back to `fallback` while fewer than `window` observations are
    /// stored.
    pub fn std_dev(&self, instrument: &str, window: usize, fallback: f64) -> f64 {
        let mids = self.mids(instrument);
        if mids.len() < window.max(1) {
            return fallback;
        }
        population_std(&mids[mids.len() - window..])
    }
}

/// Append keeping at most `cap` entries, oldest evicted first
fn push_capped<T>(dst: &mut Vec<T>, value: T, cap: usize) {
    dst.push(value);
    if dst.len() > cap {
        let drop_n = dst.len() - cap;
        dst.drain(0..drop_n);
    }
}

fn population_std(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

fn annualized_volatility(mids: &[f64], annualization: f64) -> f64 {
    let returns: Vec<f64> = mids.windows(2).map(|w| (w[1] / w[0]).ln()).collect();
    population_std(&returns) * annualization
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tracker() -> HistoryTracker {
        HistoryTracker::new(&HistoryConfig::default())
    }

    fn two_sided(bid: i64, ask: i64) -> OrderBookSnapshot {
        OrderBookSnapshot {
            bids: [(bid, 10)].into_iter().collect(),
            asks: [(ask, 10)].into_iter().collect(),
        }
    }

    #[test]
    fn test_two_sided_tick_appends_mid_and_spread() {
        let mut history = tracker();
        history.update("ACORN", &two_sided(99, 101));
        assert_eq!(history.mids("ACORN"), &[100.0]);
        assert_eq!(history.spreads("ACORN"), &[2]);
        assert_eq!(history.last_volume("ACORN"), 20);
    }

    #[test]
    fn test_one_sided_tick_records_volume_only() {
        let mut history = tracker();
        let book = OrderBookSnapshot {
            bids: BTreeMap::new(),
            asks: [(101, 7)].into_iter().collect(),
        };
        history.update("ACORN", &book);
        assert!(history.mids("ACORN").is_empty());
        assert!(history.spreads("ACORN").is_empty());
        assert_eq!(history.last_volume("ACORN"), 7);
    }

    #[test]
    fn test_volatility_defaults_then_tracks_log_returns() {
        let mut history = tracker();
        assert_eq!(history.volatility("ACORN"), 0.1);
        history.update("ACORN", &two_sided(99, 101));
        assert_eq!(history.volatility("ACORN"), 0.1);

        history.update("ACORN", &two_sided(109, 111));
        // one log return -> population std 0, annualized still 0
        assert_eq!(history.volatility("ACORN"), 0.0);

        history.update("ACORN", &two_sided(99, 101));
        assert!(history.volatility("ACORN") > 0.0);
    }

    #[test]
    fn test_series_evict_oldest_at_cap() {
        let config = HistoryConfig {
            max_len: 3,
            ..Default::default()
        };
        let mut history = HistoryTracker::new(&config);
        for price in [100, 102, 104, 106] {
            history.update("ACORN", &two_sided(price - 1, price + 1));
        }
        assert_eq!(history.mids("ACORN"), &[102.0, 104.0, 106.0]);
    }

    #[test]
    fn test_std_dev_falls_back_below_window() {
        let mut history = tracker();
        history.update("ACORN", &two_sided(99, 101));
        assert_eq!(history.std_dev("ACORN", 20, 2.0), 2.0);

        for _ in 0..20 {
            history.update("ACORN", &two_sided(99, 101));
        }
        assert_eq!(history.std_dev("ACORN", 20, 2.0), 0.0);
    }
}
