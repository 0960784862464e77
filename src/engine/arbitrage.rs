//! Mispricing and structural arbitrage detection
//!
//! Both mechanisms take liquidity: they cross the spread against resting
//! orders rather than posting passively. Every emission is capped by the
//! resting quantity at the touched level and by the shared capacity
//! ledger.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::common::types::{Order, OrderBookSnapshot};
use crate::config::types::{ArbitrageConfig, BandConfig, BasketPolicy};

use super::history::HistoryTracker;
use super::Capacity;

/// Detects observable mispricing and, policy permitting, trades it
#[derive(Debug, Clone)]
pub struct MispricingDetector {
    config: ArbitrageConfig,
}

impl MispricingDetector {
    pub fn new(config: ArbitrageConfig) -> Self {
        Self { config }
    }

    /// Liquidity-taking orders against a single instrument's band breach
    ///
    /// Takes the full resting quantity at the touched level, capped by
    /// remaining capacity. A fair value of zero carries no information and
    /// produces nothing.
    pub fn single_instrument(
        &self,
        instrument: &str,
        book: &OrderBookSnapshot,
        fair_value: f64,
        history: &HistoryTracker,
        capacity: &mut Capacity,
    ) -> Vec<Order> {
        let mut orders = Vec::new();
        let (Some(best_bid), Some(best_ask)) = (book.best_bid(), book.best_ask()) else {
            return orders;
        };
        if fair_value <= 0.0 {
            return orders;
        }

        let (buy_signal, sell_signal) = match self.config.band {
            BandConfig::Fraction { epsilon } => (
                (best_ask as f64) < fair_value * (1.0 - epsilon),
                (best_bid as f64) > fair_value * (1.0 + epsilon),
            ),
            BandConfig::ZScore {
                window,
                min_z,
                fallback_std,
            } => {
                let std_dev = history
                    .std_dev(instrument, window, fallback_std)
                    .max(f64::EPSILON);
                (
                    (fair_value - best_ask as f64) / std_dev > min_z,
                    (best_bid as f64 - fair_value) / std_dev > min_z,
                )
            }
        };

        if buy_signal && capacity.max_buy > 0 {
            let quantity = book.best_ask_quantity().min(capacity.max_buy);
            if quantity > 0 {
                capacity.take_buy(quantity);
                debug!("taking {} x {} at {} (fair {:.2})", quantity, instrument, best_ask, fair_value);
                orders.push(Order::buy(instrument, best_ask, quantity));
            }
        }
        if sell_signal && capacity.max_sell > 0 {
            let quantity = book.best_bid_quantity().min(capacity.max_sell);
            if quantity > 0 {
                capacity.take_sell(quantity);
                debug!("hitting {} x {} at {} (fair {:.2})", quantity, instrument, best_bid, fair_value);
                orders.push(Order::sell(instrument, best_bid, quantity));
            }
        }
        orders
    }

    /// Basket-versus-components divergence
    ///
    /// Compares the basket's quoted mid with the replication value of its
    /// components. Under `DetectOnly` the opportunity is logged and
    /// nothing trades. Under `ExecuteMultiLeg` every leg is emitted at one
    /// common basket multiple (the minimum feasible across leg capacities
    /// and resting quantities), so partial fills can only leave a
    /// smaller-than-planned combined position, never an unmatched
    /// overshoot.
    pub fn basket(
        &self,
        basket: &str,
        components: &BTreeMap<String, i64>,
        books: &BTreeMap<String, OrderBookSnapshot>,
        fair_values: &BTreeMap<String, f64>,
        ledger: &mut BTreeMap<String, Capacity>,
    ) -> Vec<Order> {
        let Some(basket_mid) = books.get(basket).and_then(|b| b.mid_price()) else {
            return Vec::new();
        };
        let mut replication = 0.0;
        for (component, multiplicity) in components {
            match fair_values.get(component) {
                Some(value) => replication += *multiplicity as f64 * value,
                None => return Vec::new(),
            }
        }
        if replication <= 0.0 {
            return Vec::new();
        }

        let divergence = (basket_mid - replication) / replication;
        if divergence.abs() <= self.config.basket_divergence {
            return Vec::new();
        }

        match self.config.basket_policy {
            BasketPolicy::DetectOnly => {
                info!(
                    "basket divergence on {}: quoted {:.1} vs replication {:.1} ({:+.2}%)",
                    basket,
                    basket_mid,
                    replication,
                    divergence * 100.0
                );
                Vec::new()
            }
            BasketPolicy::ExecuteMultiLeg => self
                .multi_leg(basket, components, books, ledger, divergence < 0.0)
                .unwrap_or_default(),
        }
    }

    /// Build the leg set for one basket opportunity
    ///
    /// `buy_basket` buys the basket at its ask and sells every component
    /// at its bid; the opposite direction mirrors all legs. Any missing
    /// book side skips the whole opportunity.
    fn multi_leg(
        &self,
        basket: &str,
        components: &BTreeMap<String, i64>,
        books: &BTreeMap<String, OrderBookSnapshot>,
        ledger: &mut BTreeMap<String, Capacity>,
        buy_basket: bool,
    ) -> Option<Vec<Order>> {
        let basket_book = books.get(basket)?;
        let (basket_price, basket_avail, basket_room) = if buy_basket {
            (
                basket_book.best_ask()?,
                basket_book.best_ask_quantity(),
                ledger.get(basket)?.max_buy,
            )
        } else {
            (
                basket_book.best_bid()?,
                basket_book.best_bid_quantity(),
                ledger.get(basket)?.max_sell,
            )
        };
        let mut feasible = basket_avail.min(basket_room);

        let mut legs = Vec::with_capacity(components.len());
        for (component, &multiplicity) in components {
            let book = books.get(component)?;
            let (price, avail, room) = if buy_basket {
                (
                    book.best_bid()?,
                    book.best_bid_quantity(),
                    ledger.get(component)?.max_sell,
                )
            } else {
                (
                    book.best_ask()?,
                    book.best_ask_quantity(),
                    ledger.get(component)?.max_buy,
                )
            };
            feasible = feasible.min(avail / multiplicity).min(room / multiplicity);
            legs.push((component.clone(), price, multiplicity));
        }
        if feasible <= 0 {
            return None;
        }

        let mut orders = Vec::with_capacity(legs.len() + 1);
        let basket_capacity = ledger.get_mut(basket)?;
        if buy_basket {
            basket_capacity.take_buy(feasible);
            orders.push(Order::buy(basket, basket_price, feasible));
        } else {
            basket_capacity.take_sell(feasible);
            orders.push(Order::sell(basket, basket_price, feasible));
        }
        for (component, price, multiplicity) in legs {
            let quantity = feasible * multiplicity;
            let component_capacity = ledger.get_mut(&component)?;
            if buy_basket {
                component_capacity.take_sell(quantity);
                orders.push(Order::sell(component, price, quantity));
            } else {
                component_capacity.take_buy(quantity);
                orders.push(Order::buy(component, price, quantity));
            }
        }
        debug!("executing {} legs against {} divergence", orders.len(), basket);
        Some(orders)
    }
}
