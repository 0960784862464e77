//! Common test fixtures

use std::collections::BTreeMap;

use tickfair::{
    EngineConfig, InstrumentConfig, OrderBookSnapshot, TickState, ValuationConfig,
};

/// Build a book from (price, quantity) levels
pub fn book(bids: &[(i64, i64)], asks: &[(i64, i64)]) -> OrderBookSnapshot {
    OrderBookSnapshot {
        bids: bids.iter().copied().collect(),
        asks: asks.iter().copied().collect(),
    }
}

/// A tick holding the given books and positions
pub fn tick(
    timestamp: i64,
    books: &[(&str, OrderBookSnapshot)],
    positions: &[(&str, i64)],
) -> TickState {
    let mut state = TickState {
        timestamp,
        ..Default::default()
    };
    for (instrument, snapshot) in books {
        state
            .order_books
            .insert(instrument.to_string(), snapshot.clone());
    }
    for (instrument, position) in positions {
        state.positions.insert(instrument.to_string(), *position);
    }
    state
}

/// Instrument with an explicit valuation strategy
pub fn instrument(name: &str, position_limit: i64, valuation: ValuationConfig) -> InstrumentConfig {
    InstrumentConfig {
        name: name.to_string(),
        position_limit,
        valuation,
    }
}

/// Instrument with a contractually known constant value
pub fn fixed_instrument(name: &str, position_limit: i64, value: f64) -> InstrumentConfig {
    instrument(name, position_limit, ValuationConfig::Fixed { value })
}

/// Basket over the given components
pub fn basket_instrument(
    name: &str,
    position_limit: i64,
    components: &[(&str, i64)],
) -> InstrumentConfig {
    let components: BTreeMap<String, i64> = components
        .iter()
        .map(|(component, multiplicity)| (component.to_string(), *multiplicity))
        .collect();
    instrument(name, position_limit, ValuationConfig::Basket { components })
}

/// Config with the given instruments and defaults everywhere else
pub fn config_with(instruments: Vec<InstrumentConfig>) -> EngineConfig {
    EngineConfig {
        instruments,
        ..Default::default()
    }
}
