//! Engine driver: one invocation per simulated tick

use std::collections::BTreeMap;

use tracing::debug;

use crate::common::errors::{EngineError, Result};
use crate::common::types::{Order, TickOutput, TickState};
use crate::config::types::EngineConfig;

use super::arbitrage::MispricingDetector;
use super::conversion::ConversionPlanner;
use super::history::HistoryTracker;
use super::quoting::{QuoteCalculator, QuoteContext};
use super::valuation::{recency_weighted, vwap, FairValueStrategy};
use super::Capacity;

/// Valuation applied to instruments that show up without configuration
const FALLBACK_STRATEGY: FairValueStrategy = FairValueStrategy::Vwap;

/// Cross-tick state, owned by the caller
///
/// The engine is immutable after construction; everything that persists
/// between ticks lives here and is threaded through `on_tick` explicitly.
/// A caller that rebuilds this every tick gets the documented cold-start
/// fallbacks: default volatility, uniform recency weights, and no
/// market-making until the observation threshold is met.
#[derive(Debug, Clone)]
pub struct EngineState {
    pub history: HistoryTracker,
    realized_pnl: f64,
}

impl EngineState {
    /// Realized P&L accumulated from emitted liquidity-taking orders
    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }
}

/// Per-tick decision engine
///
/// Valuates every instrument in the tick's snapshot, quotes two-sided
/// markets around the estimates, takes observable mispricing, watches
/// baskets for structural divergence, and plans conversions.
pub struct Engine {
    config: EngineConfig,
    strategies: BTreeMap<String, FairValueStrategy>,
    limits: BTreeMap<String, i64>,
    quoter: QuoteCalculator,
    detector: MispricingDetector,
    converter: ConversionPlanner,
}

impl Engine {
    /// Build an engine from configuration, validating cross-references
    pub fn new(config: EngineConfig) -> Result<Self> {
        if config.default_position_limit <= 0 {
            return Err(EngineError::Configuration(format!(
                "default_position_limit must be positive, got {}",
                config.default_position_limit
            )));
        }
        let mut strategies = BTreeMap::new();
        let mut limits = BTreeMap::new();
        for instrument in &config.instruments {
            if strategies.contains_key(&instrument.name) {
                return Err(EngineError::DuplicateInstrument(instrument.name.clone()));
            }
            if instrument.position_limit <= 0 {
                return Err(EngineError::InvalidPositionLimit {
                    instrument: instrument.name.clone(),
                    limit: instrument.position_limit,
                });
            }
            strategies.insert(
                instrument.name.clone(),
                FairValueStrategy::from_config(&instrument.valuation),
            );
            limits.insert(instrument.name.clone(), instrument.position_limit);
        }

        for (name, strategy) in &strategies {
            match strategy {
                FairValueStrategy::Basket { components } => {
                    for (component, multiplicity) in components {
                        if !strategies.contains_key(component) {
                            return Err(EngineError::UnknownComponent {
                                basket: name.clone(),
                                component: component.clone(),
                            });
                        }
                        if *multiplicity <= 0 {
                            return Err(EngineError::Configuration(format!(
                                "basket {name}: multiplicity for {component} must be positive"
                            )));
                        }
                    }
                }
                FairValueStrategy::OptionDecay { underlying, .. } => {
                    if !strategies.contains_key(underlying) {
                        return Err(EngineError::UnknownUnderlying {
                            instrument: name.clone(),
                            underlying: underlying.clone(),
                        });
                    }
                }
                _ => {}
            }
        }
        for instrument in config.conversions.keys() {
            if !strategies.contains_key(instrument) {
                return Err(EngineError::UnknownConversionInstrument(instrument.clone()));
            }
        }

        Ok(Self {
            quoter: QuoteCalculator::new(config.quoting.clone()),
            detector: MispricingDetector::new(config.arbitrage.clone()),
            converter: ConversionPlanner::new(config.conversions.clone()),
            strategies,
            limits,
            config,
        })
    }

    /// Fresh cross-tick state for this engine's configuration
    pub fn new_state(&self) -> EngineState {
        EngineState {
            history: HistoryTracker::new(&self.config.history),
            realized_pnl: 0.0,
        }
    }

    /// Position limit for an instrument (configured, or the default for
    /// instruments that appear without config)
    pub fn position_limit(&self, instrument: &str) -> i64 {
        self.limits
            .get(instrument)
            .copied()
            .unwrap_or(self.config.default_position_limit)
    }

    /// Run one tick
    ///
    /// Phase order is fixed: history update, single-instrument fair
    /// values, composite fair values, market-making quotes, band takes,
    /// basket divergence, conversions, merge. Orders from different
    /// phases for the same instrument are concatenated, never netted.
    /// Never fails: every degraded market condition resolves to "no
    /// action for that instrument this tick".
    pub fn on_tick(&self, state: &mut EngineState, tick: &TickState) -> TickOutput {
        for (instrument, book) in &tick.order_books {
            state.history.update(instrument, book);
        }

        let fair_values = self.fair_values(state, tick);

        // one capacity ledger shared by every order-emitting phase
        let mut ledger: BTreeMap<String, Capacity> = tick
            .order_books
            .keys()
            .map(|instrument| {
                (
                    instrument.clone(),
                    Capacity::new(tick.position(instrument), self.position_limit(instrument)),
                )
            })
            .collect();

        let mut orders: BTreeMap<String, Vec<Order>> = BTreeMap::new();

        for (instrument, book) in &tick.order_books {
            let Some(&fair_value) = fair_values.get(instrument) else {
                continue;
            };
            let Some(capacity) = ledger.get_mut(instrument) else {
                continue;
            };
            let context = QuoteContext {
                fair_value,
                volatility: state.history.volatility(instrument),
                observations: state.history.observation_count(instrument),
                last_volume: state.history.last_volume(instrument),
                position: tick.position(instrument),
                position_limit: self.position_limit(instrument),
            };
            let quotes = self.quoter.quotes(instrument, book, &context, capacity);
            if !quotes.is_empty() {
                orders.entry(instrument.clone()).or_default().extend(quotes);
            }
        }

        for (instrument, book) in &tick.order_books {
            let Some(&fair_value) = fair_values.get(instrument) else {
                continue;
            };
            let Some(capacity) = ledger.get_mut(instrument) else {
                continue;
            };
            let takes = self.detector.single_instrument(
                instrument,
                book,
                fair_value,
                &state.history,
                capacity,
            );
            for order in &takes {
                state.realized_pnl -= order.price as f64 * order.quantity as f64;
            }
            if !takes.is_empty() {
                orders.entry(instrument.clone()).or_default().extend(takes);
            }
        }

        for (instrument, strategy) in &self.strategies {
            if let FairValueStrategy::Basket { components } = strategy {
                let legs = self.detector.basket(
                    instrument,
                    components,
                    &tick.order_books,
                    &fair_values,
                    &mut ledger,
                );
                for order in legs {
                    state.realized_pnl -= order.price as f64 * order.quantity as f64;
                    orders
                        .entry(order.instrument.clone())
                        .or_default()
                        .push(order);
                }
            }
        }

        let conversions = self.converter.plan(tick, &mut ledger);

        let diagnostics = self.diagnostics(state, tick);
        TickOutput {
            orders,
            conversions,
            diagnostics,
        }
    }

    /// Fair values for this tick: singles first, composites second
    ///
    /// The map is rebuilt from scratch every tick; instruments whose
    /// valuation cannot resolve (no underlying mid, unresolved components)
    /// are simply absent.
    pub fn fair_values(&self, state: &EngineState, tick: &TickState) -> BTreeMap<String, f64> {
        let mut fair_values = BTreeMap::new();

        for (instrument, book) in &tick.order_books {
            let strategy = self.strategies.get(instrument).unwrap_or(&FALLBACK_STRATEGY);
            if strategy.is_composite() {
                continue;
            }
            let value = match strategy {
                FairValueStrategy::Fixed { value } => Some(*value),
                FairValueStrategy::Vwap => Some(vwap(book)),
                FairValueStrategy::RecencyWeighted {
                    min_observations,
                    curve_steepness,
                } => recency_weighted(
                    state.history.mids(instrument),
                    *min_observations,
                    *curve_steepness,
                )
                .or_else(|| Some(vwap(book))),
                FairValueStrategy::OptionDecay {
                    underlying,
                    strike,
                    decay,
                } => tick
                    .order_books
                    .get(underlying)
                    .and_then(|b| b.mid_price())
                    .map(|underlying_mid| {
                        let time_left = self.config.clock.time_left(tick.timestamp);
                        let intrinsic = (underlying_mid - *strike as f64).max(0.0);
                        intrinsic * decay.factor(time_left, self.config.clock.horizon_periods)
                    }),
                FairValueStrategy::Basket { .. } => None,
            };
            if let Some(value) = value {
                debug!("fair value {} = {:.2}", instrument, value);
                fair_values.insert(instrument.clone(), value);
            }
        }

        // composites resolve only once every component has a value this tick
        for (instrument, strategy) in &self.strategies {
            if let FairValueStrategy::Basket { components } = strategy {
                let mut value = 0.0;
                let mut resolved = true;
                for (component, multiplicity) in components {
                    match fair_values.get(component) {
                        Some(component_value) => value += *multiplicity as f64 * component_value,
                        None => {
                            resolved = false;
                            break;
                        }
                    }
                }
                if resolved {
                    debug!("fair value {} = {:.2} (replication)", instrument, value);
                    fair_values.insert(instrument.clone(), value);
                }
            }
        }
        fair_values
    }

    /// Realized / floating / total P&L summary for telemetry
    fn diagnostics(&self, state: &EngineState, tick: &TickState) -> String {
        let mut floating = 0.0;
        for (instrument, position) in &tick.positions {
            if *position == 0 {
                continue;
            }
            if let Some(mid) = tick
                .order_books
                .get(instrument)
                .and_then(|b| b.mid_price())
            {
                floating += mid * *position as f64;
            }
        }
        format!(
            "realized {:.2} | floating {:.2} | total {:.2}",
            state.realized_pnl,
            floating,
            state.realized_pnl + floating
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{InstrumentConfig, ValuationConfig};

    fn instrument(name: &str, limit: i64, valuation: ValuationConfig) -> InstrumentConfig {
        InstrumentConfig {
            name: name.to_string(),
            position_limit: limit,
            valuation,
        }
    }

    #[test]
    fn test_rejects_duplicate_instruments() {
        let config = EngineConfig {
            instruments: vec![
                instrument("ACORN", 20, ValuationConfig::Vwap),
                instrument("ACORN", 30, ValuationConfig::Vwap),
            ],
            ..Default::default()
        };
        assert!(matches!(
            Engine::new(config),
            Err(EngineError::DuplicateInstrument(name)) if name == "ACORN"
        ));
    }

    #[test]
    fn test_rejects_non_positive_limit() {
        let config = EngineConfig {
            instruments: vec![instrument("ACORN", 0, ValuationConfig::Vwap)],
            ..Default::default()
        };
        assert!(matches!(
            Engine::new(config),
            Err(EngineError::InvalidPositionLimit { limit: 0, .. })
        ));
    }

    #[test]
    fn test_rejects_unknown_basket_component() {
        let config = EngineConfig {
            instruments: vec![instrument(
                "HAMPER",
                60,
                ValuationConfig::Basket {
                    components: [("GHOST".to_string(), 2)].into_iter().collect(),
                },
            )],
            ..Default::default()
        };
        assert!(matches!(
            Engine::new(config),
            Err(EngineError::UnknownComponent { component, .. }) if component == "GHOST"
        ));
    }

    #[test]
    fn test_rejects_unknown_underlying() {
        let config = EngineConfig {
            instruments: vec![instrument(
                "WARRANT",
                200,
                ValuationConfig::OptionDecay {
                    underlying: "GHOST".to_string(),
                    strike: 9500,
                    decay: Default::default(),
                },
            )],
            ..Default::default()
        };
        assert!(matches!(
            Engine::new(config),
            Err(EngineError::UnknownUnderlying { underlying, .. }) if underlying == "GHOST"
        ));
    }

    #[test]
    fn test_rejects_unknown_conversion_instrument() {
        let config = EngineConfig {
            conversions: [("GHOST".to_string(), Default::default())]
                .into_iter()
                .collect(),
            ..Default::default()
        };
        assert!(matches!(
            Engine::new(config),
            Err(EngineError::UnknownConversionInstrument(name)) if name == "GHOST"
        ));
    }

    #[test]
    fn test_unconfigured_instrument_gets_default_limit() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        assert_eq!(engine.position_limit("ANYTHING"), 20);
    }
}
